//! # Envelope Boundary
//!
//! The surface the UI layer calls. Every method runs the underlying service
//! operation and wraps the outcome into the uniform [`ServiceResponse`]
//! envelope: no panic and no typed Rust error ever crosses this boundary,
//! only `{ success, message, data, errors }`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   UI layer ──► Api (this module) ──► Services ──► repositories          │
//! │                     │                                                   │
//! │                     └── ServiceResult<T> → ServiceResponse<T>           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use oficina_core::{
    InventorySession, OperationContext, Product, ReconciliationEntry, StockMovement,
};
use oficina_db::{Database, MovementFilter, MovementSortKey, SortOrder};

use crate::inventory::{FinalizationReport, SessionDetail};
use crate::products::{NewProduct, UpdateProduct};
use crate::response::ServiceResponse;
use crate::stock::RecordMovement;
use crate::Services;

/// Envelope-returning API over the services.
#[derive(Debug, Clone)]
pub struct Api {
    services: Services,
}

impl Api {
    pub fn new(db: Database) -> Self {
        Api {
            services: Services::new(db),
        }
    }

    /// The raw services, for callers inside the process that want typed
    /// results instead of envelopes.
    pub fn services(&self) -> &Services {
        &self.services
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn create_product(
        &self,
        ctx: &OperationContext,
        input: NewProduct,
    ) -> ServiceResponse<Product> {
        ServiceResponse::from_result(
            self.services.products().create(ctx, input).await,
            "Product created",
        )
    }

    pub async fn update_product(
        &self,
        ctx: &OperationContext,
        id: &str,
        input: UpdateProduct,
    ) -> ServiceResponse<Product> {
        ServiceResponse::from_result(
            self.services.products().update(ctx, id, input).await,
            "Product updated",
        )
    }

    pub async fn get_product(&self, id: &str) -> ServiceResponse<Product> {
        ServiceResponse::from_result(self.services.products().get(id).await, "Product found")
    }

    pub async fn list_products(&self, limit: u32) -> ServiceResponse<Vec<Product>> {
        ServiceResponse::from_result(self.services.products().list(limit).await, "Products listed")
    }

    pub async fn low_stock_report(&self) -> ServiceResponse<Vec<Product>> {
        ServiceResponse::from_result(
            self.services.products().low_stock().await,
            "Low stock report",
        )
    }

    pub async fn deactivate_product(
        &self,
        ctx: &OperationContext,
        id: &str,
    ) -> ServiceResponse<()> {
        ServiceResponse::from_result(
            self.services.products().deactivate(ctx, id).await,
            "Product deactivated",
        )
    }

    pub async fn delete_product(&self, ctx: &OperationContext, id: &str) -> ServiceResponse<()> {
        ServiceResponse::from_result(
            self.services.products().delete(ctx, id).await,
            "Product deleted",
        )
    }

    // =========================================================================
    // Stock Movements
    // =========================================================================

    pub async fn record_movement(
        &self,
        ctx: &OperationContext,
        input: RecordMovement,
    ) -> ServiceResponse<StockMovement> {
        ServiceResponse::from_result(
            self.services.stock().record(ctx, input).await,
            "Movement recorded",
        )
    }

    pub async fn correct_movement(
        &self,
        ctx: &OperationContext,
        movement_id: &str,
        new_quantity: i64,
        document_ref: Option<String>,
    ) -> ServiceResponse<StockMovement> {
        ServiceResponse::from_result(
            self.services
                .stock()
                .correct(ctx, movement_id, new_quantity, document_ref)
                .await,
            "Movement corrected",
        )
    }

    pub async fn delete_movement(
        &self,
        ctx: &OperationContext,
        movement_id: &str,
    ) -> ServiceResponse<()> {
        ServiceResponse::from_result(
            self.services.stock().delete(ctx, movement_id).await,
            "Movement deleted",
        )
    }

    pub async fn movement_history(
        &self,
        filter: &MovementFilter,
        sort_key: MovementSortKey,
        order: SortOrder,
        limit: u32,
        offset: u32,
    ) -> ServiceResponse<Vec<StockMovement>> {
        ServiceResponse::from_result(
            self.services
                .stock()
                .history(filter, sort_key, order, limit, offset)
                .await,
            "Movement history",
        )
    }

    // =========================================================================
    // Inventory Sessions
    // =========================================================================

    pub async fn open_session(
        &self,
        ctx: &OperationContext,
        description: &str,
        notes: Option<String>,
    ) -> ServiceResponse<SessionDetail> {
        ServiceResponse::from_result(
            self.services.inventory().open(ctx, description, notes).await,
            "Inventory session opened",
        )
    }

    pub async fn start_session(
        &self,
        ctx: &OperationContext,
        session_id: &str,
    ) -> ServiceResponse<InventorySession> {
        ServiceResponse::from_result(
            self.services.inventory().start(ctx, session_id).await,
            "Inventory session started",
        )
    }

    pub async fn record_count(
        &self,
        ctx: &OperationContext,
        session_id: &str,
        line_id: &str,
        counted_quantity: i64,
        notes: Option<&str>,
    ) -> ServiceResponse<oficina_core::InventoryLine> {
        ServiceResponse::from_result(
            self.services
                .inventory()
                .count(ctx, session_id, line_id, counted_quantity, notes)
                .await,
            "Count recorded",
        )
    }

    pub async fn session_divergences(
        &self,
        session_id: &str,
    ) -> ServiceResponse<Vec<ReconciliationEntry>> {
        ServiceResponse::from_result(
            self.services.inventory().divergences(session_id).await,
            "Session divergences",
        )
    }

    pub async fn finalize_session(
        &self,
        ctx: &OperationContext,
        session_id: &str,
    ) -> ServiceResponse<FinalizationReport> {
        ServiceResponse::from_result(
            self.services.inventory().finalize(ctx, session_id).await,
            "Inventory session finalized",
        )
    }

    pub async fn cancel_session(
        &self,
        ctx: &OperationContext,
        session_id: &str,
    ) -> ServiceResponse<InventorySession> {
        ServiceResponse::from_result(
            self.services.inventory().cancel(ctx, session_id).await,
            "Inventory session cancelled",
        )
    }

    pub async fn session_detail(&self, session_id: &str) -> ServiceResponse<SessionDetail> {
        ServiceResponse::from_result(
            self.services.inventory().detail(session_id).await,
            "Session detail",
        )
    }

    pub async fn list_sessions(&self, limit: u32) -> ServiceResponse<Vec<InventorySession>> {
        ServiceResponse::from_result(
            self.services.inventory().list(limit).await,
            "Sessions listed",
        )
    }
}
