//! AI model registry API.

use qryti_core::types::{AiModel, ModelFilters, ModelUpdate, NewAiModel};

use super::decode;
use crate::client::{ApiClient, RequestOptions};
use crate::ClientResult;

/// Models API client.
pub struct ModelsApi {
    client: ApiClient,
}

impl ModelsApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// List registered models matching the filters.
    ///
    /// Only filters that are set go into the query string, so each distinct
    /// filter combination is cached on its own.
    pub async fn list(&self, filters: &ModelFilters) -> ClientResult<Vec<AiModel>> {
        let endpoint = &self.client.config().endpoints.models;
        let options = RequestOptions::new().with_query(filters.to_query());
        decode(self.client.get(endpoint, options).await?)
    }

    /// Register a new model.
    pub async fn register(&self, model: &NewAiModel) -> ClientResult<AiModel> {
        let endpoint = &self.client.config().endpoints.models;
        decode(self.client.post(endpoint, model, RequestOptions::new()).await?)
    }

    /// Apply a partial update to a registered model.
    pub async fn update(&self, id: &str, update: &ModelUpdate) -> ClientResult<AiModel> {
        let path = format!("{}/{}", self.client.config().endpoints.models, id);
        decode(self.client.put(&path, update, RequestOptions::new()).await?)
    }
}
