//! Typed resource APIs layered over the generic client.

mod clients;
mod models;
mod profile;
mod reports;

pub use clients::ClientsApi;
pub use models::ModelsApi;
pub use profile::ProfileApi;
pub use reports::ReportsApi;

use serde::de::DeserializeOwned;
use serde_json::Value;

use qryti_core::types::ApiResponse;

use crate::ClientResult;

/// Decode a response body, enveloped or bare, into a typed record
fn decode<T: DeserializeOwned>(value: Value) -> ClientResult<T> {
    ApiResponse::from_value(value).into_data()
}
