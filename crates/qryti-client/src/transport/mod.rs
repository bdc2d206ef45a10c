//! Transport seam between the client and the network
//!
//! The client builds [`HttpRequest`]s and hands them to a [`Transport`]. The
//! production transport is reqwest with connection pooling; tests substitute
//! scripted transports or point the reqwest transport at a mock server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};

use qryti_core::error::QrytiError;
use crate::ClientResult;

/// HTTP verbs the client issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A fully built outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests over the network.
///
/// Implementations only move bytes: status classification, retries and
/// timeouts are the client's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse>;
}

/// reqwest-backed transport with connection pooling
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    /// Underlying HTTP client with connection pooling
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with connection pooling
    pub fn new() -> ClientResult<Self> {
        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(10))
            // Enable gzip compression
            .gzip(true)
            // User agent
            .user_agent(concat!("qryti/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QrytiError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        let mut builder = self.client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            QrytiError::network(
                format!("{} {} failed: {}", request.method.as_str(), request.url, e),
                e,
            )
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            QrytiError::network(format!("Failed to read response from {}: {}", request.url, e), e)
        })?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = HttpRequest {
            method: Method::Get,
            url: "http://localhost/x".to_string(),
            headers: vec![("Authorization".to_string(), "Bearer t".to_string())],
            body: None,
        };
        assert_eq!(request.header("authorization"), Some("Bearer t"));
        assert_eq!(request.header("accept"), None);
    }

    #[tokio::test]
    async fn test_reqwest_transport_round_trip() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("X-Test", "1"))
            .and(body_string("{\"a\":1}"))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(HttpRequest {
                method: Method::Post,
                url: format!("{}/echo", mock_server.uri()),
                headers: vec![("X-Test".to_string(), "1".to_string())],
                body: Some("{\"a\":1}".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(response, HttpResponse::new(201, "created"));
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop a listener to get a port nothing is serving on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new().unwrap();
        let err = transport
            .send(HttpRequest {
                method: Method::Get,
                url: format!("http://{}/health", addr),
                headers: Vec::new(),
                body: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, QrytiError::Network { .. }));
    }
}
