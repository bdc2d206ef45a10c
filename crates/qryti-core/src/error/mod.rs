//! Error types and result aliases for Qryti operations.
//!
//! Provides a unified error type that covers configuration, session storage
//! and every way a call to the compliance backend can fail. The type is
//! `Clone` so that one failed request can be handed to every caller that was
//! waiting on it.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Unified error type for all Qryti operations
#[derive(Error, Debug, Clone)]
pub enum QrytiError {
    // Config errors
    #[error("Failed to parse qryti.toml: {message}")]
    ConfigParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // API errors
    #[error("Authentication failed: {message}")]
    Auth {
        status: Option<u16>,
        message: String,
        data: Value,
    },

    #[error("Request rejected ({status}): {message}")]
    Validation {
        status: u16,
        message: String,
        data: Value,
    },

    #[error("Server error ({status}): {message}")]
    Server {
        status: u16,
        message: String,
        data: Value,
    },

    #[error("Backend reported failure: {message}")]
    Rejected { message: String },

    #[error("Request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to parse response: {message}")]
    Parse { message: String },

    // Storage errors
    #[error("Session storage error: {message}")]
    Storage { message: String },
}

/// Result type alias for Qryti operations
pub type QrytiResult<T> = Result<T, QrytiError>;

impl QrytiError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Arc::new(source)),
        }
    }

    /// Classify a non-success HTTP status and its (possibly empty) error payload.
    ///
    /// The message is taken from the payload's `error`, `detail` or `message`
    /// field, falling back to `HTTP <status>`.
    pub fn from_status(status: u16, data: Value) -> Self {
        let message = error_message(&data).unwrap_or_else(|| format!("HTTP {}", status));

        match status {
            401 | 403 => Self::Auth {
                status: Some(status),
                message,
                data,
            },
            500..=599 => Self::Server {
                status,
                message,
                data,
            },
            // Any other unexpected status is terminal
            _ => Self::Validation {
                status,
                message,
                data,
            },
        }
    }

    /// HTTP status carried by the error, if the backend produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            QrytiError::Auth { status, .. } => *status,
            QrytiError::Validation { status, .. } | QrytiError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Payload the backend returned alongside the error status
    pub fn data(&self) -> Option<&Value> {
        match self {
            QrytiError::Auth { data, .. }
            | QrytiError::Validation { data, .. }
            | QrytiError::Server { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Check if this error is worth retrying (timeouts, connection failures, 5xx)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QrytiError::Server { .. } | QrytiError::Timeout { .. } | QrytiError::Network { .. }
        )
    }

    /// Check if this is an authentication error
    pub fn is_auth_error(&self) -> bool {
        matches!(self, QrytiError::Auth { .. })
    }

    /// Check if the backend said the current token is no longer valid
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, QrytiError::Auth { status: Some(401), .. })
    }

    /// Message suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            QrytiError::Auth { .. } => {
                "Invalid credentials or expired session. Please sign in again.".to_string()
            }
            QrytiError::Server { .. }
            | QrytiError::Timeout { .. }
            | QrytiError::Network { .. }
            | QrytiError::Parse { .. } => {
                "Unable to reach the compliance service. Please try again shortly.".to_string()
            }
            QrytiError::Validation { message, .. } | QrytiError::Rejected { message } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            QrytiError::Auth { .. } => Some("Run 'qryti login' to start a new session"),
            QrytiError::Network { .. } | QrytiError::Timeout { .. } => {
                Some("Check your internet connection and the configured api.base_url")
            }
            QrytiError::Server { .. } => Some("The service is having trouble; try again later"),
            QrytiError::ConfigParse { .. } | QrytiError::ConfigValidation { .. } => {
                Some("Fix qryti.toml or the QRYTI_* environment variables")
            }
            QrytiError::Storage { .. } => {
                Some("Check permissions on ~/.qryti or run 'qryti logout' to reset the session")
            }
            _ => None,
        }
    }
}

fn error_message(data: &Value) -> Option<String> {
    ["error", "detail", "message"].iter().find_map(|field| {
        match data.get(field)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    })
}

impl From<serde_json::Error> for QrytiError {
    fn from(err: serde_json::Error) -> Self {
        QrytiError::Parse {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_status_classification() {
        assert!(QrytiError::from_status(401, Value::Null).is_auth_error());
        assert!(QrytiError::from_status(403, Value::Null).is_auth_error());
        assert!(matches!(
            QrytiError::from_status(422, Value::Null),
            QrytiError::Validation { status: 422, .. }
        ));
        assert!(matches!(
            QrytiError::from_status(503, Value::Null),
            QrytiError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn test_message_from_payload() {
        let err = QrytiError::from_status(400, json!({ "detail": "email is required" }));
        assert_eq!(err.to_string(), "Request rejected (400): email is required");

        let err = QrytiError::from_status(401, json!({ "error": "Invalid credentials" }));
        assert_eq!(err.to_string(), "Authentication failed: Invalid credentials");
    }

    #[test]
    fn test_message_fallback() {
        let err = QrytiError::from_status(500, Value::Null);
        assert_eq!(err.to_string(), "Server error (500): HTTP 500");
    }

    #[test]
    fn test_transient() {
        assert!(QrytiError::from_status(502, Value::Null).is_transient());
        assert!(QrytiError::Timeout {
            after: Duration::from_secs(1)
        }
        .is_transient());
        assert!(!QrytiError::from_status(404, Value::Null).is_transient());
        assert!(!QrytiError::from_status(401, Value::Null).is_transient());
    }

    #[test]
    fn test_unexpected_status_is_terminal() {
        for status in [102, 304, 307, 600] {
            let err = QrytiError::from_status(status, Value::Null);
            assert!(matches!(err, QrytiError::Validation { .. }), "status {}", status);
            assert!(!err.is_transient());
        }
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(QrytiError::from_status(409, Value::Null).status(), Some(409));
        assert_eq!(
            QrytiError::Timeout {
                after: Duration::from_millis(10)
            }
            .status(),
            None
        );
    }

    #[test]
    fn test_user_message() {
        let auth = QrytiError::from_status(401, Value::Null);
        assert!(auth.user_message().contains("credentials"));

        let timeout = QrytiError::Timeout {
            after: Duration::from_secs(30),
        };
        assert!(timeout.user_message().contains("Unable to reach"));

        let validation = QrytiError::from_status(400, json!({ "message": "name too long" }));
        assert_eq!(validation.user_message(), "name too long");
    }

    #[test]
    fn test_clone_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = QrytiError::network("connect failed".to_string(), io);
        let cloned = err.clone();
        assert!(std::error::Error::source(&cloned).is_some());
    }
}
