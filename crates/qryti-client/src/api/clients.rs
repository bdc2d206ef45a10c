//! Compliance clients API.

use qryti_core::types::{ComplianceClient, NewClient};

use super::decode;
use crate::client::{ApiClient, RequestOptions};
use crate::ClientResult;

/// Clients API client.
pub struct ClientsApi {
    client: ApiClient,
}

impl ClientsApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// List the organizations tracked for compliance.
    pub async fn list(&self) -> ClientResult<Vec<ComplianceClient>> {
        let endpoint = &self.client.config().endpoints.clients;
        decode(self.client.get(endpoint, RequestOptions::new()).await?)
    }

    /// Create a client. Cached client listings are dropped.
    pub async fn create(&self, new_client: &NewClient) -> ClientResult<ComplianceClient> {
        let endpoint = &self.client.config().endpoints.clients;
        decode(self.client.post(endpoint, new_client, RequestOptions::new()).await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use qryti_core::error::QrytiError;
    use qryti_core::types::NewClient;

    use crate::api::test_support::client_for;

    #[tokio::test]
    async fn test_list_accepts_bare_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/clients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "Acme Corp", "industry": "Finance" },
                { "id": "2", "name": "TechStart Inc" }
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let clients = client.clients().list().await.unwrap();

        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].id.as_deref(), Some("1"));
        assert_eq!(clients[0].industry.as_deref(), Some("Finance"));
        assert_eq!(clients[1].name, "TechStart Inc");
    }

    #[tokio::test]
    async fn test_create_invalidates_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/clients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": [] })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/clients"))
            .and(body_json(json!({ "name": "Globex" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": { "id": 3, "name": "Globex" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.clients().list().await.unwrap().is_empty());

        let created = client
            .clients()
            .create(&NewClient {
                name: "Globex".to_string(),
                industry: None,
                contact_email: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id.as_deref(), Some("3"));

        client.clients().list().await.unwrap();
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/clients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "Subscription expired"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.clients().list().await.unwrap_err();
        assert!(matches!(err, QrytiError::Rejected { ref message } if message == "Subscription expired"));
    }
}
