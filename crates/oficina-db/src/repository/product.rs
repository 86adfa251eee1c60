//! # Product Repository
//!
//! Database operations for the product ledger.
//!
//! ## Ledger Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Quantity Update Strategy                             │
//! │                                                                         │
//! │  The on-hand quantity is only ever written through:                    │
//! │                                                                         │
//! │  1. apply_delta()        - movement application (clamped at zero)      │
//! │  2. overwrite_quantity() - inventory reconciliation (direct set)       │
//! │                                                                         │
//! │  The generic update() deliberately excludes `quantity`: catalogue      │
//! │  edits can never bypass the movement log.                              │
//! │                                                                         │
//! │  Every quantity write also stamps last_movement_at.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use oficina_core::Product;

/// Columns selected for every product query, in struct order.
const PRODUCT_COLUMNS: &str = "\
    id, code, name, description, category_id, supplier_id, \
    cost_cents, sale_price_cents, quantity, min_quantity, max_quantity, \
    is_active, last_movement_at, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its business code (e.g. "FLT-OIL-001").
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists active products whose quantity has fallen below the minimum
    /// threshold (replenishment report).
    pub async fn list_below_minimum(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND quantity < min_quantity \
             ORDER BY name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, description, category_id, supplier_id,
                cost_cents, sale_price_cents, quantity, min_quantity, max_quantity,
                is_active, last_movement_at, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.cost_cents)
        .bind(product.sale_price_cents)
        .bind(product.quantity)
        .bind(product.min_quantity)
        .bind(product.max_quantity)
        .bind(product.is_active)
        .bind(product.last_movement_at)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's catalogue fields.
    ///
    /// The ledger quantity is deliberately not written here; it only changes
    /// through movement application or reconciliation.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?2,
                name = ?3,
                description = ?4,
                category_id = ?5,
                supplier_id = ?6,
                cost_cents = ?7,
                sale_price_cents = ?8,
                min_quantity = ?9,
                max_quantity = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.cost_cents)
        .bind(product.sale_price_cents)
        .bind(product.min_quantity)
        .bind(product.max_quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Applies a signed delta to a product's quantity, clamped at zero,
    /// and returns the new quantity.
    ///
    /// Callers enforcing the no-overdraft rule must pre-check; this write
    /// never fails on overdraft, it floors at zero.
    pub async fn adjust_quantity(&self, id: &str, delta: i64) -> DbResult<i64> {
        debug!(id = %id, delta = %delta, "Adjusting product quantity");

        let mut tx = self.pool.begin().await?;
        apply_delta(&mut tx, id, delta, Utc::now()).await?;

        let quantity: i64 = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(quantity)
    }

    /// Soft-deactivates a product (is_active = false).
    ///
    /// ## Why Soft Delete?
    /// Historical movements still reference this product; a product with
    /// ledger history is never hard-deleted.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Hard-deletes a product row. Only legal for products without movement
    /// history; the service layer checks before calling.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================
// Used by the movement and session repositories so that "write movement +
// mutate ledger" always happens on one connection inside one transaction.

/// Applies a signed, zero-clamped delta to a product's quantity on an open
/// transaction, stamping last_movement_at.
pub(crate) async fn apply_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = MAX(0, quantity + ?2),
            last_movement_at = ?3,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Sets a product's quantity directly (reconciliation path), clamped at
/// zero, stamping last_movement_at.
pub(crate) async fn overwrite_quantity(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = MAX(0, ?2),
            last_movement_at = ?3,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Reads a product's quantity on an open transaction.
pub(crate) async fn quantity_on(conn: &mut SqliteConnection, id: &str) -> DbResult<i64> {
    let quantity: Option<i64> = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    quantity.ok_or_else(|| DbError::not_found("Product", id))
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
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

    fn part(code: &str, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            code: code.to_string(),
            name: format!("Part {code}"),
            description: None,
            category_id: None,
            supplier_id: None,
            cost_cents: 1000,
            sale_price_cents: 1800,
            quantity,
            min_quantity: 10,
            max_quantity: 100,
            is_active: true,
            last_movement_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let p = part("FLT-001", 0);

        db.products().insert(&p).await.unwrap();

        let loaded = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.code, "FLT-001");
        assert_eq!(loaded.quantity, 0);

        let by_code = db.products().get_by_code("FLT-001").await.unwrap().unwrap();
        assert_eq!(by_code.id, p.id);
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = test_db().await;
        db.products().insert(&part("FLT-001", 0)).await.unwrap();

        let err = db.products().insert(&part("FLT-001", 0)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_adjust_quantity_clamps_at_zero() {
        let db = test_db().await;
        let p = part("BRK-002", 10);
        db.products().insert(&p).await.unwrap();

        let q = db.products().adjust_quantity(&p.id, 15).await.unwrap();
        assert_eq!(q, 25);

        // Over-draining clamps instead of going negative.
        let q = db.products().adjust_quantity(&p.id, -40).await.unwrap();
        assert_eq!(q, 0);

        let loaded = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert!(loaded.last_movement_at.is_some());
    }

    #[tokio::test]
    async fn test_update_does_not_touch_quantity() {
        let db = test_db().await;
        let mut p = part("OIL-003", 42);
        db.products().insert(&p).await.unwrap();

        p.name = "Renamed".to_string();
        p.quantity = 0; // must be ignored by update()
        db.products().update(&p).await.unwrap();

        let loaded = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Renamed");
        assert_eq!(loaded.quantity, 42);
    }

    #[tokio::test]
    async fn test_low_stock_report() {
        let db = test_db().await;
        db.products().insert(&part("A-1", 5)).await.unwrap(); // below min 10
        db.products().insert(&part("B-2", 50)).await.unwrap();

        let low = db.products().list_below_minimum().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].code, "A-1");
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_active_list() {
        let db = test_db().await;
        let p = part("C-3", 0);
        db.products().insert(&p).await.unwrap();

        db.products().deactivate(&p.id).await.unwrap();

        let active = db.products().list_active(100).await.unwrap();
        assert!(active.is_empty());
        assert_eq!(db.products().count_active().await.unwrap(), 0);
    }
}
