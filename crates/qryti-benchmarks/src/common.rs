//! Common utilities for benchmarks

use std::time::Duration;

use async_trait::async_trait;
use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use qryti_client::{ClientResult, HttpRequest, HttpResponse, Transport};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(3))
        .measurement_time(Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// Transport answering every request with the same body, after an optional delay
pub struct FixedTransport {
    body: String,
    latency: Duration,
}

impl FixedTransport {
    pub fn new(body: impl Into<String>, latency: Duration) -> Self {
        Self {
            body: body.into(),
            latency,
        }
    }
}

#[async_trait]
impl Transport for FixedTransport {
    async fn send(&self, _request: HttpRequest) -> ClientResult<HttpResponse> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(HttpResponse::new(200, self.body.clone()))
    }
}

/// A model listing of `count` entries shaped like the registry returns them
pub fn model_listing(count: usize) -> serde_json::Value {
    let models: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "id": i,
                "name": format!("Model {}", i),
                "client_id": i % 7,
                "client_name": format!("Client {}", i % 7),
                "type": "Classification",
                "risk_level": (["Low", "Medium", "High", "Critical"][i % 4]),
                "status": "Active",
                "created_at": "2025-01-15T10:00:00Z"
            })
        })
        .collect();
    serde_json::json!({ "success": true, "data": models })
}
