//! # oficina-services: Application Services for Oficina ERP
//!
//! The boundary the UI talks to. One service per aggregate, one async method
//! per workflow step, every failure classified into a small error taxonomy
//! and renderable as a uniform envelope.
//!
//! ## Usage
//! ```rust,ignore
//! use oficina_core::OperationContext;
//! use oficina_db::{Database, DbConfig};
//! use oficina_services::Api;
//!
//! let db = Database::new(DbConfig::new("./oficina.db")).await?;
//! let api = Api::new(db);
//! let ctx = OperationContext::new("mechanic.silva");
//!
//! // Always an envelope, never a panic or a typed error.
//! let response = api.finalize_session(&ctx, &session_id).await;
//! if response.success { /* render response.data */ }
//! ```

pub mod api;
pub mod error;
pub mod inventory;
pub mod products;
pub mod response;
pub mod stock;

pub use api::Api;
pub use error::{ServiceError, ServiceResult};
pub use inventory::{FinalizationReport, InventoryService, SessionDetail};
pub use products::{NewProduct, ProductService, UpdateProduct};
pub use response::{ErrorDetail, ServiceResponse};
pub use stock::{RecordMovement, StockService};

use oficina_db::Database;

/// Bundles the services over one database handle.
#[derive(Debug, Clone)]
pub struct Services {
    db: Database,
}

impl Services {
    pub fn new(db: Database) -> Self {
        Services { db }
    }

    pub fn products(&self) -> ProductService {
        ProductService::new(self.db.clone())
    }

    pub fn stock(&self) -> StockService {
        StockService::new(self.db.clone())
    }

    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(self.db.clone())
    }
}
