//! # Stock Movement Repository
//!
//! Database operations for the append-oriented movement log.
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    record() Transaction                                 │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. SELECT quantity FROM products        (quantity_before snapshot)  │
//! │    2. INSERT INTO stock_movements          (with before/after)         │
//! │    3. UPDATE products SET quantity = ...   (apply signed effect)       │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  The snapshot and the ledger write land together or not at all, so    │
//! │  quantity_before/quantity_after always agree with the product row.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product;
use oficina_core::movement::quantity_after;
use oficina_core::{MovementDirection, MovementKind, StockMovement};

/// Columns selected for every movement query, in struct order.
const MOVEMENT_COLUMNS: &str = "\
    id, product_id, kind, direction, quantity, unit_value_cents, \
    quantity_before, quantity_after, document_ref, session_id, correction_of, \
    moved_at, created_at";

// =============================================================================
// Query Inputs
// =============================================================================

/// Input for recording a movement. The repository fills in the id, the
/// quantity snapshots and created_at.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: String,
    pub kind: MovementKind,
    pub direction: MovementDirection,
    pub quantity: i64,
    pub unit_value_cents: i64,
    pub document_ref: Option<String>,
    pub session_id: Option<String>,
    pub correction_of: Option<String>,
    pub moved_at: DateTime<Utc>,
}

/// Filter for movement history queries. All fields optional; empty filter
/// returns everything (within the page).
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub product_id: Option<String>,
    pub kind: Option<MovementKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// The columns movement history may be sorted by.
///
/// A closed enum rather than a raw column string: callers can never smuggle
/// arbitrary SQL into the ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementSortKey {
    #[default]
    MovedAt,
    CreatedAt,
    Quantity,
}

impl MovementSortKey {
    fn column(&self) -> &'static str {
        match self {
            MovementSortKey::MovedAt => "moved_at",
            MovementSortKey::CreatedAt => "created_at",
            MovementSortKey::Quantity => "quantity",
        }
    }
}

/// Sort direction for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock movement database operations.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Records a movement and applies its effect to the product ledger in
    /// one transaction.
    ///
    /// The quantity snapshots are taken inside the transaction, so they are
    /// consistent even under concurrent writers.
    pub async fn record(&self, input: NewMovement) -> DbResult<StockMovement> {
        debug!(
            product_id = %input.product_id,
            kind = ?input.kind,
            direction = ?input.direction,
            quantity = %input.quantity,
            "Recording stock movement"
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let before = product::quantity_on(&mut tx, &input.product_id).await?;
        let after = quantity_after(input.direction, before, input.quantity);

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: input.product_id.clone(),
            kind: input.kind,
            direction: input.direction,
            quantity: input.quantity,
            unit_value_cents: input.unit_value_cents,
            quantity_before: before,
            quantity_after: after,
            document_ref: input.document_ref,
            session_id: input.session_id,
            correction_of: input.correction_of,
            moved_at: input.moved_at,
            created_at: now,
        };

        insert_movement(&mut tx, &movement).await?;
        product::apply_delta(&mut tx, &movement.product_id, movement.effect(), now).await?;

        tx.commit().await?;
        Ok(movement)
    }

    /// Gets a movement by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockMovement>> {
        let sql = format!("SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE id = ?1");
        let movement = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(movement)
    }

    /// Lists movements matching the filter, sorted and paged.
    pub async fn list(
        &self,
        filter: &MovementFilter,
        sort_key: MovementSortKey,
        order: SortOrder,
        limit: u32,
        offset: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE 1 = 1"
        ));

        if let Some(product_id) = &filter.product_id {
            builder.push(" AND product_id = ").push_bind(product_id);
        }
        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ").push_bind(kind);
        }
        if let Some(from) = filter.from {
            builder.push(" AND moved_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND moved_at <= ").push_bind(to);
        }

        // Sort column comes from a closed enum, never from caller input.
        builder.push(format!(
            " ORDER BY {} {}",
            sort_key.column(),
            order.keyword()
        ));
        builder.push(" LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let movements = builder
            .build_query_as::<StockMovement>()
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Lists the movements written by an inventory session's finalization.
    pub async fn list_by_session(&self, session_id: &str) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE session_id = ?1 ORDER BY created_at"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Counts the movements referencing a product. Used to decide between
    /// hard delete and deactivation.
    pub async fn count_for_product(&self, product_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE product_id = ?1")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Counts the corrections pointing at a movement.
    pub async fn count_corrections_of(&self, movement_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE correction_of = ?1")
                .bind(movement_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Deletes a movement, reversing its ledger effect in the same
    /// transaction.
    ///
    /// ## Rules
    /// - Adjustment rows are removed without touching the ledger: their
    ///   effect is considered an operator decision, and reversing it would
    ///   silently re-break the count the adjustment fixed.
    /// - Every other kind has its signed effect undone so the ledger stays
    ///   consistent with the surviving log.
    pub async fn delete(&self, movement: &StockMovement) -> DbResult<()> {
        debug!(id = %movement.id, kind = ?movement.kind, "Deleting stock movement");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM stock_movements WHERE id = ?1")
            .bind(&movement.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Movement", &movement.id));
        }

        if movement.kind != MovementKind::Adjustment {
            product::apply_delta(
                &mut tx,
                &movement.product_id,
                oficina_core::movement::reversal_delta(movement),
                now,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Inserts a fully-populated movement row on an open transaction.
pub(crate) async fn insert_movement(
    conn: &mut sqlx::SqliteConnection,
    movement: &StockMovement,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, kind, direction, quantity, unit_value_cents,
            quantity_before, quantity_after, document_ref, session_id,
            correction_of, moved_at, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10,
            ?11, ?12, ?13
        )
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.kind)
    .bind(movement.direction)
    .bind(movement.quantity)
    .bind(movement.unit_value_cents)
    .bind(movement.quantity_before)
    .bind(movement.quantity_after)
    .bind(&movement.document_ref)
    .bind(&movement.session_id)
    .bind(&movement.correction_of)
    .bind(movement.moved_at)
    .bind(movement.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use oficina_core::Product;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, code: &str, quantity: i64) -> Product {
        let now = Utc::now();
        let p = Product {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            name: format!("Part {code}"),
            description: None,
            category_id: None,
            supplier_id: None,
            cost_cents: 1500,
            sale_price_cents: 2500,
            quantity,
            min_quantity: 5,
            max_quantity: 100,
            is_active: true,
            last_movement_at: None,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&p).await.unwrap();
        p
    }

    fn entry(product_id: &str, quantity: i64) -> NewMovement {
        NewMovement {
            product_id: product_id.to_string(),
            kind: MovementKind::Entry,
            direction: MovementDirection::In,
            quantity,
            unit_value_cents: 1500,
            document_ref: Some("NF-100".to_string()),
            session_id: None,
            correction_of: None,
            moved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_snapshots_and_applies() {
        let db = test_db().await;
        let p = seed_product(&db, "FLT-001", 10).await;

        let m = db.movements().record(entry(&p.id, 15)).await.unwrap();
        assert_eq!(m.quantity_before, 10);
        assert_eq!(m.quantity_after, 25);

        let loaded = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.quantity, 25);
    }

    #[tokio::test]
    async fn test_record_unknown_product_rolls_back() {
        let db = test_db().await;

        let err = db.movements().record(entry("missing", 5)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_filters_by_product_and_kind() {
        let db = test_db().await;
        let a = seed_product(&db, "A-1", 0).await;
        let b = seed_product(&db, "B-2", 50).await;

        db.movements().record(entry(&a.id, 5)).await.unwrap();
        db.movements().record(entry(&a.id, 3)).await.unwrap();
        db.movements()
            .record(NewMovement {
                kind: MovementKind::Exit,
                direction: MovementDirection::Out,
                ..entry(&b.id, 2)
            })
            .await
            .unwrap();

        let filter = MovementFilter {
            product_id: Some(a.id.clone()),
            ..Default::default()
        };
        let hits = db
            .movements()
            .list(&filter, MovementSortKey::MovedAt, SortOrder::Desc, 50, 0)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);

        let filter = MovementFilter {
            kind: Some(MovementKind::Exit),
            ..Default::default()
        };
        let hits = db
            .movements()
            .list(&filter, MovementSortKey::MovedAt, SortOrder::Desc, 50, 0)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product_id, b.id);
    }

    #[tokio::test]
    async fn test_sort_by_quantity() {
        let db = test_db().await;
        let p = seed_product(&db, "C-3", 0).await;

        db.movements().record(entry(&p.id, 7)).await.unwrap();
        db.movements().record(entry(&p.id, 2)).await.unwrap();
        db.movements().record(entry(&p.id, 5)).await.unwrap();

        let hits = db
            .movements()
            .list(
                &MovementFilter::default(),
                MovementSortKey::Quantity,
                SortOrder::Asc,
                50,
                0,
            )
            .await
            .unwrap();
        let quantities: Vec<i64> = hits.iter().map(|m| m.quantity).collect();
        assert_eq!(quantities, vec![2, 5, 7]);
    }

    #[tokio::test]
    async fn test_delete_reverses_ledger() {
        let db = test_db().await;
        let p = seed_product(&db, "D-4", 10).await;

        let m = db.movements().record(entry(&p.id, 5)).await.unwrap();
        db.movements().delete(&m).await.unwrap();

        let loaded = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.quantity, 10);
        assert!(db.movements().get_by_id(&m.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_adjustment_keeps_ledger() {
        let db = test_db().await;
        let p = seed_product(&db, "E-5", 10).await;

        let m = db
            .movements()
            .record(NewMovement {
                kind: MovementKind::Adjustment,
                direction: MovementDirection::Out,
                document_ref: None,
                ..entry(&p.id, 4)
            })
            .await
            .unwrap();
        assert_eq!(m.quantity_after, 6);

        db.movements().delete(&m).await.unwrap();

        // Ledger stays where the adjustment left it.
        let loaded = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.quantity, 6);
    }

    #[tokio::test]
    async fn test_count_for_product() {
        let db = test_db().await;
        let p = seed_product(&db, "F-6", 0).await;

        assert_eq!(db.movements().count_for_product(&p.id).await.unwrap(), 0);
        db.movements().record(entry(&p.id, 1)).await.unwrap();
        assert_eq!(db.movements().count_for_product(&p.id).await.unwrap(), 1);
    }
}
