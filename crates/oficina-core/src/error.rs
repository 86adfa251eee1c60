//! # Error Types
//!
//! Domain-specific error types for oficina-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  oficina-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations, missing entities     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  oficina-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  oficina-services errors                                               │
//! │  └── ServiceError     - Classified for the result envelope             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ServiceError → caller   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, id, quantities)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::session::SessionStatus;
use crate::types::MovementKind;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and domain logic failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id or code doesn't resolve to an existing product.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Stock movement not found.
    #[error("Stock movement not found: {0}")]
    MovementNotFound(String),

    /// Inventory session not found.
    #[error("Inventory session not found: {0}")]
    SessionNotFound(String),

    /// Inventory line not found.
    #[error("Inventory line not found: {0}")]
    LineNotFound(String),

    /// Outbound movement would overdraw the ledger.
    ///
    /// ## When This Occurs
    /// An Exit or Transfer movement requests more than the on-hand quantity.
    /// Adjustments bypass this check and are clamped at zero instead.
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// Session is not in a status that allows the attempted transition.
    #[error("Inventory session {session_id} is {current:?}, cannot {operation} it")]
    InvalidSessionStatus {
        session_id: String,
        current: SessionStatus,
        operation: &'static str,
    },

    /// A Planned or InProgress session already exists.
    #[error("An open inventory session already exists: {session_id}")]
    OpenSessionExists { session_id: String },

    /// Finalization requires at least one line.
    #[error("Inventory session {session_id} has no lines to finalize")]
    EmptySession { session_id: String },

    /// InventoryCount movements must carry a session reference; every other
    /// kind must not.
    #[error("Movement kind {kind:?} and session reference do not agree")]
    SessionLinkMismatch { kind: MovementKind },

    /// A correction that changes nothing.
    #[error("Correction of movement {movement_id} has no effect")]
    NoopCorrection { movement_id: String },

    /// Product has movement history and can only be soft-deactivated.
    #[error("Product {id} has movement history and cannot be deleted")]
    ProductHasHistory { id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, caught before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid UUID, malformed code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set (e.g., unknown sort key).
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate product code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Business timestamps may not be in the future.
    #[error("{field} cannot be in the future")]
    FutureDate { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "FLT-001".to_string(),
            available: 70,
            requested: 80,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for FLT-001: available 70, requested 80"
        );
    }

    #[test]
    fn test_session_status_in_message() {
        let err = CoreError::InvalidSessionStatus {
            session_id: "s-1".to_string(),
            current: SessionStatus::Finalized,
            operation: "cancel",
        };
        assert_eq!(
            err.to_string(),
            "Inventory session s-1 is Finalized, cannot cancel it"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
