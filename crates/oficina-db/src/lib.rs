//! # oficina-db: Database Layer for Oficina ERP
//!
//! SQLite persistence for the product ledger, the movement log and the
//! inventory sessions.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         oficina-db                                      │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────────────────────────────────────┐   │
//! │  │   Database   │──►│              Repositories                    │   │
//! │  │  (pool.rs)   │   │                                              │   │
//! │  │              │   │  products()   → ProductRepository (ledger)   │   │
//! │  │  WAL mode    │   │  movements()  → MovementRepository (log)     │   │
//! │  │  FK on       │   │  sessions()   → SessionRepository (counts)   │   │
//! │  │  migrations  │   │                                              │   │
//! │  └──────────────┘   └──────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Compound writes (movement + ledger, finalization) are single          │
//! │  transactions; cross-repository helpers are pub(crate) and take the    │
//! │  open connection.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use oficina_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./oficina.db")).await?;
//! let low = db.products().list_below_minimum().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    MovementFilter, MovementRepository, MovementSortKey, NewMovement, ProductRepository,
    SessionRepository, SortOrder,
};
