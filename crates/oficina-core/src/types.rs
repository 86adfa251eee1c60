//! # Domain Types
//!
//! Core domain types used throughout Oficina ERP.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  StockMovement  │   │ InventorySession│       │
//! │  │  ─────────────  │   │  ─────────────  │   │  (session.rs)   │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │                 │       │
//! │  │  code (business)│   │  kind/direction │   │                 │       │
//! │  │  quantity       │   │  before/after   │   │                 │       │
//! │  │  min/max        │   │  correction_of  │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │  MovementKind   │   │MovementDirection│                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  Entry          │   │  In  (adds)     │                             │
//! │  │  Exit           │   │  Out (removes)  │                             │
//! │  │  Adjustment     │   └─────────────────┘                             │
//! │  │  Transfer       │                                                   │
//! │  │  InventoryCount │                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID (product `code`) - human-readable, shown in the workshop

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Movement Kind
// =============================================================================

/// The cause of a stock movement.
///
/// Entry and Exit are the everyday receive/consume operations. Adjustment is
/// a manual correction in either direction. Transfer removes stock handed to
/// another location. InventoryCount movements are only ever created by
/// session reconciliation and always carry a session reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received (purchase, return from customer).
    Entry,
    /// Goods consumed (service order, sale).
    Exit,
    /// Manual correction; carries an explicit direction.
    Adjustment,
    /// Stock handed to another location.
    Transfer,
    /// Compensating movement created by inventory reconciliation.
    InventoryCount,
}

impl MovementKind {
    /// Direction fixed by the kind, or `None` when the caller decides
    /// (Adjustment) or the divergence sign decides (InventoryCount).
    pub fn fixed_direction(&self) -> Option<MovementDirection> {
        match self {
            MovementKind::Entry => Some(MovementDirection::In),
            MovementKind::Exit | MovementKind::Transfer => Some(MovementDirection::Out),
            MovementKind::Adjustment | MovementKind::InventoryCount => None,
        }
    }

    /// Outbound kinds must pass the sufficient-stock check before being
    /// recorded. Adjustment deliberately bypasses it and relies on the
    /// zero clamp instead.
    pub fn requires_stock_check(&self) -> bool {
        matches!(self, MovementKind::Exit | MovementKind::Transfer)
    }

    /// Only InventoryCount movements belong to a session; every other kind
    /// must not carry a session reference.
    pub fn requires_session(&self) -> bool {
        matches!(self, MovementKind::InventoryCount)
    }
}

// =============================================================================
// Movement Direction
// =============================================================================

/// Whether a movement adds to or removes from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementDirection {
    In,
    Out,
}

impl MovementDirection {
    /// The opposite direction, used when reversing a movement's effect.
    pub fn inverse(&self) -> Self {
        match self {
            MovementDirection::In => MovementDirection::Out,
            MovementDirection::Out => MovementDirection::In,
        }
    }

    /// Signed delta this direction applies for a positive magnitude.
    pub fn signed(&self, quantity: i64) -> i64 {
        match self {
            MovementDirection::In => quantity,
            MovementDirection::Out => -quantity,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the workshop catalogue, carrying its ledger quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business code - unique, human-readable (e.g. "FLT-OIL-001").
    pub code: String,

    /// Display name.
    pub name: String,

    /// Optional longer description.
    pub description: Option<String>,

    /// Category reference (owned by the catalogue module, id only).
    pub category_id: Option<String>,

    /// Supplier reference (optional, id only).
    pub supplier_id: Option<String>,

    /// Unit cost in cents.
    pub cost_cents: i64,

    /// Unit sale price in cents.
    pub sale_price_cents: i64,

    /// Current on-hand quantity. Never negative at rest.
    pub quantity: i64,

    /// Minimum threshold; below this the product is flagged as low stock.
    pub min_quantity: i64,

    /// Maximum threshold (replenishment ceiling).
    pub max_quantity: i64,

    /// Whether the product is active (soft delete).
    pub is_active: bool,

    /// When the ledger quantity last changed.
    pub last_movement_at: Option<DateTime<Utc>>,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// True when the current quantity covers the requested amount.
    /// Checked before outbound movements only.
    pub fn has_sufficient_stock(&self, requested: i64) -> bool {
        self.quantity >= requested
    }

    /// True when on-hand quantity has fallen below the minimum threshold.
    pub fn is_below_minimum(&self) -> bool {
        self.quantity < self.min_quantity
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// An immutable record of a quantity change and its cause.
///
/// Both quantity snapshots are frozen at creation time: `quantity_after`
/// always equals `quantity_before` adjusted by the direction's signed
/// quantity, clamped at zero. Corrections never edit a movement row; they
/// append a new compensating movement referencing the original.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub kind: MovementKind,
    pub direction: MovementDirection,
    /// Magnitude, always positive.
    pub quantity: i64,
    /// Unit value at movement time, in cents.
    pub unit_value_cents: i64,
    /// Ledger quantity before this movement was applied.
    pub quantity_before: i64,
    /// Ledger quantity after this movement was applied.
    pub quantity_after: i64,
    /// External document reference (invoice, service order).
    pub document_ref: Option<String>,
    /// Owning inventory session; set iff kind = InventoryCount.
    pub session_id: Option<String>,
    /// Movement this one compensates, when it is a correction.
    pub correction_of: Option<String>,
    /// When the movement happened (business time, never in the future).
    pub moved_at: DateTime<Utc>,
    /// When the row was recorded.
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Signed ledger effect of this movement (+quantity or -quantity).
    pub fn effect(&self) -> i64 {
        self.direction.signed(self.quantity)
    }

    /// True when this movement is a correction of an earlier one.
    pub fn is_correction(&self) -> bool {
        self.correction_of.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_direction_by_kind() {
        assert_eq!(
            MovementKind::Entry.fixed_direction(),
            Some(MovementDirection::In)
        );
        assert_eq!(
            MovementKind::Exit.fixed_direction(),
            Some(MovementDirection::Out)
        );
        assert_eq!(
            MovementKind::Transfer.fixed_direction(),
            Some(MovementDirection::Out)
        );
        assert_eq!(MovementKind::Adjustment.fixed_direction(), None);
        assert_eq!(MovementKind::InventoryCount.fixed_direction(), None);
    }

    #[test]
    fn test_stock_check_applies_to_outbound_only() {
        assert!(MovementKind::Exit.requires_stock_check());
        assert!(MovementKind::Transfer.requires_stock_check());
        assert!(!MovementKind::Entry.requires_stock_check());
        assert!(!MovementKind::Adjustment.requires_stock_check());
        assert!(!MovementKind::InventoryCount.requires_stock_check());
    }

    #[test]
    fn test_direction_signed() {
        assert_eq!(MovementDirection::In.signed(5), 5);
        assert_eq!(MovementDirection::Out.signed(5), -5);
        assert_eq!(MovementDirection::Out.inverse(), MovementDirection::In);
    }

    #[test]
    fn test_sufficient_stock() {
        let mut p = sample_product();
        p.quantity = 70;
        assert!(p.has_sufficient_stock(70));
        assert!(p.has_sufficient_stock(30));
        assert!(!p.has_sufficient_stock(80));
    }

    #[test]
    fn test_below_minimum() {
        let mut p = sample_product();
        p.quantity = 5;
        p.min_quantity = 10;
        assert!(p.is_below_minimum());
        p.quantity = 10;
        assert!(!p.is_below_minimum());
    }

    fn sample_product() -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            code: "FLT-001".to_string(),
            name: "Oil filter".to_string(),
            description: None,
            category_id: None,
            supplier_id: None,
            cost_cents: 1500,
            sale_price_cents: 2500,
            quantity: 0,
            min_quantity: 0,
            max_quantity: 0,
            is_active: true,
            last_movement_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
