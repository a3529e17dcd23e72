//! Common DTOs shared across endpoints

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_new() {
        let err = ErrorResponse::new("not_found", "No credentials found");
        assert_eq!(err.error, "not_found");
        assert_eq!(err.message, "No credentials found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_error_response_serialization_skips_empty_details() {
        let err = ErrorResponse::new("state_mismatch", "State does not match");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("state_mismatch"));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_error_response_with_details() {
        let err = ErrorResponse::with_details(
            "token_exchange_failed",
            "Token exchange with HubSpot failed",
            serde_json::json!({"upstream": "HTTP 400: bad verifier"}),
        );
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("details"));
        assert!(json.contains("bad verifier"));
    }
}
