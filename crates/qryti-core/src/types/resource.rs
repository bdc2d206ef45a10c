//! Compliance resource records.
//!
//! Records the backend returns for the client, AI model registry and report
//! collections, plus the request bodies used to create or change them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An organization whose AI systems are tracked for ISO 42001 compliance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceClient {
    #[serde(default, deserialize_with = "super::flexible_id::deserialize")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body for creating a compliance client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

/// Risk classification of a registered AI model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
            RiskLevel::Unknown => "Unknown",
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            other => Err(format!("unknown risk level '{}'", other)),
        }
    }
}

/// An entry in the AI model registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiModel {
    #[serde(default, deserialize_with = "super::flexible_id::deserialize")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "super::flexible_id::deserialize")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(rename = "type", default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body for registering a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAiModel {
    pub name: String,
    pub client_id: String,
    #[serde(rename = "type")]
    pub model_type: String,
    pub risk_level: RiskLevel,
}

/// Partial update of a registered model; unset fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Query filters for listing models
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelFilters {
    pub client_id: Option<String>,
    pub status: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub model_type: Option<String>,
}

impl ModelFilters {
    /// Query pairs for the filters that are set, in a stable order
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let mut push = |key: &str, value: Option<&str>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                query.push((key.to_string(), value.to_string()));
            }
        };

        push("client_id", self.client_id.as_deref());
        push("status", self.status.as_deref());
        push("risk_level", self.risk_level.as_ref().map(RiskLevel::as_str));
        push("type", self.model_type.as_deref());
        query
    }

    pub fn is_empty(&self) -> bool {
        self.to_query().is_empty()
    }
}

/// A generated compliance or risk report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, deserialize_with = "super::flexible_id::deserialize")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Short-lived download link for a generated report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDownload {
    pub download_url: String,
    /// Seconds until the link stops working
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Body for generating a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub report_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Body for creating an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_from_registry_payload() {
        let model: AiModel = serde_json::from_value(json!({
            "id": "2",
            "name": "Fraud Detection System",
            "client_id": "2",
            "client_name": "TechStart Inc",
            "type": "Classification",
            "risk_level": "High",
            "status": "Under Review",
            "created_at": "2025-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(model.model_type.as_deref(), Some("Classification"));
        assert_eq!(model.risk_level, Some(RiskLevel::High));
        assert!(model.created_at.is_some());
    }

    #[test]
    fn test_unknown_risk_level() {
        let model: AiModel =
            serde_json::from_value(json!({ "name": "x", "risk_level": "Extreme" })).unwrap();
        assert_eq!(model.risk_level, Some(RiskLevel::Unknown));
    }

    #[test]
    fn test_filters_to_query() {
        let filters = ModelFilters {
            status: Some("Active".to_string()),
            risk_level: Some(RiskLevel::Medium),
            client_id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("status".to_string(), "Active".to_string()),
                ("risk_level".to_string(), "Medium".to_string()),
            ]
        );
        assert!(ModelFilters::default().is_empty());
    }

    #[test]
    fn test_model_update_skips_unset() {
        let update = ModelUpdate {
            status: Some("Active".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "status": "Active" }));
    }

    #[test]
    fn test_risk_level_parse() {
        assert_eq!("high".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert!("extreme".parse::<RiskLevel>().is_err());
    }
}
