//! # Product Service
//!
//! Catalogue operations over the product ledger. Quantity never changes
//! here; only stock movements and session reconciliation touch it.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use oficina_core::validation::{
    validate_name, validate_product_code, validate_thresholds, validate_value_cents,
};
use oficina_core::{CoreError, OperationContext, Product};
use oficina_db::Database;

use crate::error::{ServiceError, ServiceResult};

/// Input for creating a product. Quantity always starts at zero; stock
/// arrives through an Entry movement.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub cost_cents: i64,
    pub sale_price_cents: i64,
    pub min_quantity: i64,
    pub max_quantity: i64,
}

/// Input for updating a product's catalogue fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProduct {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub cost_cents: i64,
    pub sale_price_cents: i64,
    pub min_quantity: i64,
    pub max_quantity: i64,
}

/// Service for product catalogue operations.
#[derive(Debug, Clone)]
pub struct ProductService {
    db: Database,
}

impl ProductService {
    pub fn new(db: Database) -> Self {
        ProductService { db }
    }

    /// Creates a product with a zero ledger quantity.
    pub async fn create(
        &self,
        ctx: &OperationContext,
        input: NewProduct,
    ) -> ServiceResult<Product> {
        validate_product_code(&input.code).map_err(CoreError::from)?;
        validate_name("name", &input.name).map_err(CoreError::from)?;
        validate_value_cents("cost_cents", input.cost_cents).map_err(CoreError::from)?;
        validate_value_cents("sale_price_cents", input.sale_price_cents)
            .map_err(CoreError::from)?;
        validate_thresholds(input.min_quantity, input.max_quantity).map_err(CoreError::from)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            category_id: input.category_id,
            supplier_id: input.supplier_id,
            cost_cents: input.cost_cents,
            sale_price_cents: input.sale_price_cents,
            quantity: 0,
            min_quantity: input.min_quantity,
            max_quantity: input.max_quantity,
            is_active: true,
            last_movement_at: None,
            created_at: now,
            updated_at: now,
        };

        self.db.products().insert(&product).await?;

        info!(
            user = %ctx.user,
            request_id = %ctx.request_id,
            code = %product.code,
            "Product created"
        );
        Ok(product)
    }

    /// Updates catalogue fields. The ledger quantity is untouchable here.
    pub async fn update(
        &self,
        ctx: &OperationContext,
        id: &str,
        input: UpdateProduct,
    ) -> ServiceResult<Product> {
        validate_name("name", &input.name).map_err(CoreError::from)?;
        validate_value_cents("cost_cents", input.cost_cents).map_err(CoreError::from)?;
        validate_value_cents("sale_price_cents", input.sale_price_cents)
            .map_err(CoreError::from)?;
        validate_thresholds(input.min_quantity, input.max_quantity).map_err(CoreError::from)?;

        let mut product = self.get(id).await?;
        product.name = input.name.trim().to_string();
        product.description = input.description;
        product.category_id = input.category_id;
        product.supplier_id = input.supplier_id;
        product.cost_cents = input.cost_cents;
        product.sale_price_cents = input.sale_price_cents;
        product.min_quantity = input.min_quantity;
        product.max_quantity = input.max_quantity;

        self.db.products().update(&product).await?;

        info!(
            user = %ctx.user,
            request_id = %ctx.request_id,
            id = %product.id,
            "Product updated"
        );
        self.get(id).await
    }

    /// Gets a product by ID.
    pub async fn get(&self, id: &str) -> ServiceResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    /// Gets a product by its business code.
    pub async fn get_by_code(&self, code: &str) -> ServiceResult<Product> {
        self.db
            .products()
            .get_by_code(code)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(code.to_string()).into())
    }

    /// Lists active products.
    pub async fn list(&self, limit: u32) -> ServiceResult<Vec<Product>> {
        Ok(self.db.products().list_active(limit).await?)
    }

    /// Replenishment report: active products below their minimum.
    pub async fn low_stock(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.db.products().list_below_minimum().await?)
    }

    /// Deactivates a product (soft delete). Always legal.
    pub async fn deactivate(&self, ctx: &OperationContext, id: &str) -> ServiceResult<()> {
        self.get(id).await?;
        self.db.products().deactivate(id).await?;

        info!(user = %ctx.user, request_id = %ctx.request_id, id = %id, "Product deactivated");
        Ok(())
    }

    /// Hard-deletes a product. Rejected once the product has any movement
    /// history; deactivate instead.
    pub async fn delete(&self, ctx: &OperationContext, id: &str) -> ServiceResult<()> {
        self.get(id).await?;

        let history = self.db.movements().count_for_product(id).await?;
        if history > 0 {
            return Err(ServiceError::from(CoreError::ProductHasHistory {
                id: id.to_string(),
            }));
        }

        self.db.products().delete(id).await?;

        info!(user = %ctx.user, request_id = %ctx.request_id, id = %id, "Product deleted");
        Ok(())
    }
}
