//! # Stock Service
//!
//! Recording, correcting and deleting stock movements.
//!
//! ## Correction Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A movement row is never edited. "Fixing" one appends a compensating   │
//! │  Adjustment whose effect is exactly (intended - applied), referencing  │
//! │  the original via correction_of. Both rows stay in the history.       │
//! │                                                                         │
//! │    Exit 30 (effect -30)                                                 │
//! │    correct to 20  →  Adjustment In 10, correction_of = <exit id>       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use oficina_core::movement::correction_delta;
use oficina_core::validation::{
    validate_moved_at, validate_movement_quantity, validate_session_link, validate_value_cents,
};
use oficina_core::{
    CoreError, MovementDirection, MovementKind, OperationContext, StockMovement, ValidationError,
};
use oficina_db::{Database, MovementFilter, MovementSortKey, NewMovement, SortOrder};

use crate::error::{ServiceError, ServiceResult};

/// Input for recording a movement.
///
/// `direction` is only consulted for Adjustment; every other kind carries a
/// fixed direction.
///
/// There is deliberately no session field: a session reference is only
/// valid on InventoryCount rows, and those are written exclusively by
/// session finalization. Manual input therefore cannot supply one, and an
/// InventoryCount kind here fails the session-link validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordMovement {
    pub product_id: String,
    pub kind: MovementKind,
    pub direction: Option<MovementDirection>,
    pub quantity: i64,
    pub unit_value_cents: i64,
    pub document_ref: Option<String>,
    /// Business timestamp; defaults to now. Never in the future.
    pub moved_at: Option<DateTime<Utc>>,
}

/// Service for stock movement operations.
#[derive(Debug, Clone)]
pub struct StockService {
    db: Database,
}

impl StockService {
    pub fn new(db: Database) -> Self {
        StockService { db }
    }

    /// Records a movement against the ledger.
    ///
    /// ## Rules
    /// - Quantity is a positive magnitude; direction comes from the kind
    ///   (or the input, for Adjustment)
    /// - Exit and Transfer are rejected when stock is insufficient
    /// - InventoryCount cannot be recorded manually
    pub async fn record(
        &self,
        ctx: &OperationContext,
        input: RecordMovement,
    ) -> ServiceResult<StockMovement> {
        validate_movement_quantity(input.quantity).map_err(CoreError::from)?;
        validate_value_cents("unit_value_cents", input.unit_value_cents)
            .map_err(CoreError::from)?;
        // Manual movements never carry a session, which also rejects
        // InventoryCount here.
        validate_session_link(input.kind, None).map_err(CoreError::from)?;

        let now = Utc::now();
        let moved_at = input.moved_at.unwrap_or(now);
        validate_moved_at(moved_at, now).map_err(CoreError::from)?;

        let direction = match input.kind.fixed_direction().or(input.direction) {
            Some(direction) => direction,
            None => {
                return Err(ServiceError::from(CoreError::from(
                    ValidationError::Required {
                        field: "direction".to_string(),
                    },
                )))
            }
        };

        let product = self
            .db
            .products()
            .get_by_id(&input.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(input.product_id.clone()))?;

        if !product.is_active {
            return Err(ServiceError::BusinessRule(format!(
                "Product {} is inactive and cannot receive movements",
                product.code
            )));
        }

        if input.kind.requires_stock_check() && !product.has_sufficient_stock(input.quantity) {
            return Err(ServiceError::from(CoreError::InsufficientStock {
                code: product.code.clone(),
                available: product.quantity,
                requested: input.quantity,
            }));
        }

        let movement = self
            .db
            .movements()
            .record(NewMovement {
                product_id: product.id.clone(),
                kind: input.kind,
                direction,
                quantity: input.quantity,
                unit_value_cents: input.unit_value_cents,
                document_ref: input.document_ref,
                session_id: None,
                correction_of: None,
                moved_at,
            })
            .await?;

        info!(
            user = %ctx.user,
            request_id = %ctx.request_id,
            movement_id = %movement.id,
            code = %product.code,
            kind = ?movement.kind,
            quantity = %movement.quantity,
            "Movement recorded"
        );
        Ok(movement)
    }

    /// Corrects a movement's quantity by appending a compensating Adjustment.
    /// The original row is never edited.
    pub async fn correct(
        &self,
        ctx: &OperationContext,
        movement_id: &str,
        new_quantity: i64,
        document_ref: Option<String>,
    ) -> ServiceResult<StockMovement> {
        validate_movement_quantity(new_quantity).map_err(CoreError::from)?;

        let original = self.get(movement_id).await?;

        if original.kind == MovementKind::InventoryCount {
            return Err(ServiceError::BusinessRule(
                "Reconciliation movements cannot be corrected; run a new count".to_string(),
            ));
        }

        let (direction, magnitude) = correction_delta(&original, new_quantity)?;

        let correction = self
            .db
            .movements()
            .record(NewMovement {
                product_id: original.product_id.clone(),
                kind: MovementKind::Adjustment,
                direction,
                quantity: magnitude,
                unit_value_cents: original.unit_value_cents,
                document_ref,
                session_id: None,
                correction_of: Some(original.id.clone()),
                moved_at: Utc::now(),
            })
            .await?;

        info!(
            user = %ctx.user,
            request_id = %ctx.request_id,
            movement_id = %original.id,
            correction_id = %correction.id,
            "Movement corrected"
        );
        Ok(correction)
    }

    /// Deletes a movement, reversing its ledger effect (except Adjustment,
    /// whose row is removed with the ledger left as it stands).
    ///
    /// ## Rules
    /// - Session-owned movements can never be deleted
    /// - A movement that has corrections pointing at it is protected
    pub async fn delete(&self, ctx: &OperationContext, movement_id: &str) -> ServiceResult<()> {
        let movement = self.get(movement_id).await?;

        if movement.kind == MovementKind::InventoryCount {
            return Err(ServiceError::BusinessRule(
                "Reconciliation movements belong to their session and cannot be deleted"
                    .to_string(),
            ));
        }

        let corrections = self.db.movements().count_corrections_of(movement_id).await?;
        if corrections > 0 {
            return Err(ServiceError::BusinessRule(format!(
                "Movement {movement_id} has {corrections} correction(s) and cannot be deleted"
            )));
        }

        self.db.movements().delete(&movement).await?;

        info!(
            user = %ctx.user,
            request_id = %ctx.request_id,
            movement_id = %movement_id,
            "Movement deleted"
        );
        Ok(())
    }

    /// Gets a movement by ID.
    pub async fn get(&self, movement_id: &str) -> ServiceResult<StockMovement> {
        self.db
            .movements()
            .get_by_id(movement_id)
            .await?
            .ok_or_else(|| CoreError::MovementNotFound(movement_id.to_string()).into())
    }

    /// Movement history, filtered, sorted and paged.
    pub async fn history(
        &self,
        filter: &MovementFilter,
        sort_key: MovementSortKey,
        order: SortOrder,
        limit: u32,
        offset: u32,
    ) -> ServiceResult<Vec<StockMovement>> {
        Ok(self
            .db
            .movements()
            .list(filter, sort_key, order, limit, offset)
            .await?)
    }
}
