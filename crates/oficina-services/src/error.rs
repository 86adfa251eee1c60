//! # Service Error Classification
//!
//! Every failure that crosses the service boundary is classified into one of
//! a small set of categories the UI can act on.
//!
//! ## Error Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Categories                                     │
//! │                                                                         │
//! │  NOT_FOUND      → show "does not exist", offer to go back              │
//! │  VALIDATION     → highlight the offending field                        │
//! │  CONFLICT       → duplicate code / open session already exists         │
//! │  BUSINESS_RULE  → explain the rule that blocked the operation          │
//! │  UNEXPECTED     → apologize, log, show the request id                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use oficina_core::CoreError;
use oficina_db::DbError;

/// A failure classified for the service boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The addressed entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The input failed validation before any business logic ran.
    #[error("{0}")]
    Validation(String),

    /// The operation collided with existing state (duplicate code,
    /// already-open session).
    #[error("{0}")]
    Conflict(String),

    /// A business rule blocked the operation (insufficient stock, wrong
    /// session status, protected movement).
    #[error("{0}")]
    BusinessRule(String),

    /// Infrastructure failure; details go to the log, not the user.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ServiceError {
    /// Stable machine-readable code for the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Validation(_) => "VALIDATION",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::BusinessRule(_) => "BUSINESS_RULE",
            ServiceError::Unexpected(_) => "UNEXPECTED",
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_)
            | CoreError::MovementNotFound(_)
            | CoreError::SessionNotFound(_)
            | CoreError::LineNotFound(_) => ServiceError::NotFound(err.to_string()),

            CoreError::Validation(_) => ServiceError::Validation(err.to_string()),

            CoreError::OpenSessionExists { .. } => ServiceError::Conflict(err.to_string()),

            CoreError::InsufficientStock { .. }
            | CoreError::InvalidSessionStatus { .. }
            | CoreError::EmptySession { .. }
            | CoreError::SessionLinkMismatch { .. }
            | CoreError::NoopCorrection { .. }
            | CoreError::ProductHasHistory { .. } => ServiceError::BusinessRule(err.to_string()),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::NotFound { .. } => ServiceError::NotFound(err.to_string()),

            DbError::UniqueViolation { .. } if err.is_open_session_conflict() => {
                ServiceError::Conflict("An open inventory session already exists".to_string())
            }
            DbError::UniqueViolation { .. } => ServiceError::Conflict(err.to_string()),

            DbError::ForeignKeyViolation { .. } => ServiceError::BusinessRule(err.to_string()),

            _ => ServiceError::Unexpected(err.to_string()),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_classification() {
        let err: ServiceError = CoreError::ProductNotFound("p-1".to_string()).into();
        assert_eq!(err.code(), "NOT_FOUND");

        let err: ServiceError = CoreError::InsufficientStock {
            code: "FLT-001".to_string(),
            available: 70,
            requested: 80,
        }
        .into();
        assert_eq!(err.code(), "BUSINESS_RULE");
    }

    #[test]
    fn test_open_session_index_maps_to_conflict() {
        let err: ServiceError = DbError::duplicate("idx_sessions_single_open", "1").into();
        assert_eq!(err.code(), "CONFLICT");
    }
}
