//! # Validation Module
//!
//! Input validation for the stock and inventory workflow.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Service boundary (Rust)                                      │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field and business-rule validation                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (product code, single open session)            │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: each layer catches different errors                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::types::MovementKind;
use crate::{MAX_CODE_LEN, MAX_MOVEMENT_QUANTITY, MAX_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use oficina_core::validation::validate_product_code;
///
/// assert!(validate_product_code("FLT-OIL-001").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code("has space").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name or session description.
pub fn validate_name(field: &'static str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a movement quantity (magnitude).
///
/// ## Rules
/// - Must be positive (> 0); direction is carried separately
/// - Must not exceed MAX_MOVEMENT_QUANTITY
pub fn validate_movement_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_MOVEMENT_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_MOVEMENT_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary value in cents.
///
/// ## Rules
/// - Must be non-negative; zero is allowed (e.g. internal transfers)
pub fn validate_value_cents(field: &'static str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a counted quantity submitted for an inventory line.
pub fn validate_counted_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "counted quantity".to_string(),
        });
    }

    if qty > MAX_MOVEMENT_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "counted quantity".to_string(),
            min: 0,
            max: MAX_MOVEMENT_QUANTITY,
        });
    }

    Ok(())
}

/// Validates the min/max replenishment thresholds.
pub fn validate_thresholds(min_quantity: i64, max_quantity: i64) -> ValidationResult<()> {
    if min_quantity < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "min_quantity".to_string(),
        });
    }

    if max_quantity < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "max_quantity".to_string(),
        });
    }

    if max_quantity > 0 && max_quantity < min_quantity {
        return Err(ValidationError::OutOfRange {
            field: "max_quantity".to_string(),
            min: min_quantity,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Movement-Specific Validators
// =============================================================================

/// Validates the movement business timestamp.
///
/// ## Rules
/// - Must not be in the future (movements record things that happened)
pub fn validate_moved_at(moved_at: DateTime<Utc>, now: DateTime<Utc>) -> ValidationResult<()> {
    if moved_at > now {
        return Err(ValidationError::FutureDate {
            field: "moved_at".to_string(),
        });
    }

    Ok(())
}

/// Validates the kind/session pairing.
///
/// ## Rules
/// - InventoryCount movements must carry a session id
/// - Every other kind must not carry one
///
/// ## Example
/// ```rust
/// use oficina_core::validation::validate_session_link;
/// use oficina_core::MovementKind;
///
/// assert!(validate_session_link(MovementKind::Entry, None).is_ok());
/// assert!(validate_session_link(MovementKind::InventoryCount, Some("s-1")).is_ok());
/// assert!(validate_session_link(MovementKind::InventoryCount, None).is_err());
/// assert!(validate_session_link(MovementKind::Exit, Some("s-1")).is_err());
/// ```
pub fn validate_session_link(
    kind: MovementKind,
    session_id: Option<&str>,
) -> ValidationResult<()> {
    match (kind.requires_session(), session_id) {
        (true, None) => Err(ValidationError::Required {
            field: "session_id".to_string(),
        }),
        (false, Some(_)) => Err(ValidationError::InvalidFormat {
            field: "session_id".to_string(),
            reason: format!("only inventory_count movements may reference a session, not {kind:?}"),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(field: &'static str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
