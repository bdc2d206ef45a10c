//! Compliance reports API.

use qryti_core::types::{Report, ReportDownload, ReportRequest};

use super::decode;
use crate::client::{ApiClient, RequestOptions};
use crate::ClientResult;

/// Reports API client.
pub struct ReportsApi {
    client: ApiClient,
}

impl ReportsApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// List generated reports.
    pub async fn list(&self) -> ClientResult<Vec<Report>> {
        let endpoint = &self.client.config().endpoints.reports;
        decode(self.client.get(endpoint, RequestOptions::new()).await?)
    }

    /// Start generating a report.
    pub async fn generate(&self, request: &ReportRequest) -> ClientResult<Report> {
        let endpoint = &self.client.config().endpoints.generate_report;
        decode(self.client.post(endpoint, request, RequestOptions::new()).await?)
    }

    /// Fetch a download link. Links expire, so they are never cached.
    pub async fn download(&self, id: &str) -> ClientResult<ReportDownload> {
        let path = format!("{}/{}/download", self.client.config().endpoints.reports, id);
        decode(self.client.get(&path, RequestOptions::new().skip_cache()).await?)
    }
}
