//! # Service Response Envelope
//!
//! Uniform envelope every service operation can be rendered into at the
//! boundary. The UI never matches on Rust error types; it reads `success`,
//! `message` and the error codes.

use serde::Serialize;
use tracing::error;

use crate::error::{ServiceError, ServiceResult};

/// A single classified error inside the envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    /// Stable machine-readable code (e.g. "VALIDATION").
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Uniform response envelope.
///
/// ## Example
/// ```json
/// { "success": true, "message": "Movement recorded", "data": { ... }, "errors": [] }
/// { "success": false, "message": "Insufficient stock...", "data": null,
///   "errors": [{ "code": "BUSINESS_RULE", "message": "..." }] }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ServiceResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub errors: Vec<ErrorDetail>,
}

impl<T> ServiceResponse<T> {
    /// Successful response carrying data.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        ServiceResponse {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Failed response carrying a classified error. Infrastructure failures
    /// keep their details in the log; the envelope carries the generic
    /// message only.
    pub fn error(err: &ServiceError) -> Self {
        if let ServiceError::Unexpected(details) = err {
            error!(details = %details, "Unexpected service error");
        }
        ServiceResponse {
            success: false,
            message: err.to_string(),
            data: None,
            errors: vec![ErrorDetail {
                code: err.code().to_string(),
                message: err.to_string(),
            }],
        }
    }

    /// Wraps a service result into the envelope.
    pub fn from_result(result: ServiceResult<T>, ok_message: impl Into<String>) -> Self {
        match result {
            Ok(data) => Self::ok(data, ok_message),
            Err(err) => Self::error(&err),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let resp = ServiceResponse::ok(42, "done");
        assert!(resp.success);
        assert_eq!(resp.data, Some(42));
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn test_error_envelope() {
        let err = ServiceError::Validation("quantity must be positive".to_string());
        let resp: ServiceResponse<()> = ServiceResponse::error(&err);
        assert!(!resp.success);
        assert_eq!(resp.errors[0].code, "VALIDATION");
    }

    #[test]
    fn test_envelope_json_shape() {
        let resp = ServiceResponse::ok(7, "recorded");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 7);
        assert_eq!(json["errors"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_from_result() {
        let resp = ServiceResponse::from_result(Ok(1), "ok");
        assert!(resp.success);

        let resp: ServiceResponse<i32> = ServiceResponse::from_result(
            Err(ServiceError::NotFound("Product not found: x".to_string())),
            "ok",
        );
        assert!(!resp.success);
        assert_eq!(resp.errors[0].code, "NOT_FOUND");
    }
}
