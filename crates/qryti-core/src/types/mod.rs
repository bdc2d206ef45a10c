//! Core data types for the Qryti compliance client.
//!
//! This module provides the fundamental types used throughout the workspace:
//! - Session types for the authenticated identity
//! - The response envelope every backend payload is normalized to
//! - Resource records for compliance clients, AI models and reports

pub mod envelope;
pub mod resource;
pub mod session;

// Re-export all public types
pub use envelope::ApiResponse;
pub use resource::{
    AiModel, ComplianceClient, ModelFilters, ModelUpdate, NewAiModel, NewClient, Registration,
    Report, ReportDownload, ReportRequest, RiskLevel,
};
pub use session::{Session, UserProfile};

/// Accept ids sent either as JSON strings or numbers.
pub(crate) mod flexible_id {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}
