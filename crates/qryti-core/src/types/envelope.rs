//! Response envelope.
//!
//! Backend handlers answer either with `{ success, data, message, error }` or
//! with a bare payload. Both shapes are normalized into [`ApiResponse`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{QrytiError, QrytiResult};

/// Normalized backend response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response wrapping `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// Failed response with an error message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

impl ApiResponse<Value> {
    /// Normalize a raw JSON body.
    ///
    /// Objects with a boolean `success` field are read as an envelope; any
    /// other body becomes the `data` of a successful response.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.get("success").map_or(false, Value::is_boolean) => {
                let success = map
                    .remove("success")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                Self {
                    success,
                    data: map.remove("data").filter(|v| !v.is_null()),
                    message: take_string(&mut map, "message"),
                    error: take_string(&mut map, "error"),
                }
            }
            other => Self::ok(other),
        }
    }

    /// Decode the payload into a typed record.
    ///
    /// A `success: false` envelope becomes [`QrytiError::Rejected`]; a payload
    /// that does not match `U` becomes [`QrytiError::Parse`].
    pub fn into_data<U: DeserializeOwned>(self) -> QrytiResult<U> {
        if !self.success {
            return Err(QrytiError::Rejected {
                message: self
                    .error
                    .or(self.message)
                    .unwrap_or_else(|| "request was not successful".to_string()),
            });
        }

        serde_json::from_value(self.data.unwrap_or(Value::Null)).map_err(QrytiError::from)
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let response = ApiResponse::from_value(json!({
            "success": true,
            "data": [{ "id": "1" }],
            "message": "Success",
            "timestamp": "2025-01-01T00:00:00Z"
        }));
        assert!(response.success);
        assert_eq!(response.data, Some(json!([{ "id": "1" }])));
        assert_eq!(response.message.as_deref(), Some("Success"));
    }

    #[test]
    fn test_bare_payload_is_wrapped() {
        let response = ApiResponse::from_value(json!([1, 2, 3]));
        assert!(response.success);
        assert_eq!(response.data, Some(json!([1, 2, 3])));

        // `success` that is not a boolean is just a field of the payload
        let response = ApiResponse::from_value(json!({ "success": "yes" }));
        assert_eq!(response.data, Some(json!({ "success": "yes" })));
    }

    #[test]
    fn test_into_data() {
        let ids: Vec<u32> = ApiResponse::from_value(json!({ "success": true, "data": [1, 2] }))
            .into_data()
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_into_data_failure() {
        let err = ApiResponse::from_value(json!({ "success": false, "error": "Model not found" }))
            .into_data::<Value>()
            .unwrap_err();
        assert!(matches!(err, QrytiError::Rejected { ref message } if message == "Model not found"));
    }

    #[test]
    fn test_into_data_type_mismatch() {
        let err = ApiResponse::from_value(json!({ "success": true, "data": "text" }))
            .into_data::<Vec<u32>>()
            .unwrap_err();
        assert!(matches!(err, QrytiError::Parse { .. }));
    }
}
