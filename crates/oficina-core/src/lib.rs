//! # oficina-core: Pure Business Logic for Oficina ERP
//!
//! This crate is the **heart** of the stock and inventory workflow. It holds
//! the ledger invariants as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Oficina Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation (server-rendered UI)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    oficina-services                             │   │
//! │  │    record_movement, open_session, finalize_session, ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ oficina-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ movement  │  │  session  │  │ validation│  │   │
//! │  │   │  Product  │  │ sign rule │  │  machine  │  │   rules   │  │   │
//! │  │   │  Movement │  │  clamping │  │divergence │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    oficina-db (Database Layer)                  │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, StockMovement, enums)
//! - [`movement`] - The movement sign table and zero-clamping
//! - [`session`] - Inventory session state machine and reconciliation plan
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//! - [`context`] - Explicit per-operation context (no ambient state)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, always
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Arithmetic**: quantities in units (i64), money in cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod context;
pub mod error;
pub mod movement;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use context::OperationContext;
pub use error::{CoreError, CoreResult, ValidationError};
pub use session::{
    reconciliation_plan, InventoryLine, InventorySession, ReconciliationEntry, SessionStatus,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// User recorded on operations that run without a logged-in actor
/// (seed scripts, scheduled jobs).
pub const SYSTEM_USER: &str = "system";

/// Maximum quantity accepted on a single stock movement.
///
/// ## Business Reason
/// Prevents fat-finger entries (e.g. typing 1000000 instead of 100) from
/// silently distorting the ledger.
pub const MAX_MOVEMENT_QUANTITY: i64 = 1_000_000;

/// Maximum length of a product code.
pub const MAX_CODE_LEN: usize = 50;

/// Maximum length of a product or session description.
pub const MAX_NAME_LEN: usize = 200;
