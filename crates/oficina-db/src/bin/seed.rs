//! # Development Data Seeder
//!
//! Populates a database with demo parts and a few movements so the stock
//! screens have something to show.
//!
//! ## Usage
//! ```bash
//! cargo run -p oficina-db --bin seed
//! OFICINA_DB=/tmp/demo.db cargo run -p oficina-db --bin seed
//! ```

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use oficina_core::{MovementDirection, MovementKind, Product};
use oficina_db::{Database, DbConfig, DbError, NewMovement};

fn part(code: &str, name: &str, cost_cents: i64, sale_price_cents: i64, min: i64) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        name: name.to_string(),
        description: None,
        category_id: None,
        supplier_id: None,
        cost_cents,
        sale_price_cents,
        quantity: 0,
        min_quantity: min,
        max_quantity: min * 10,
        is_active: true,
        last_movement_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db = Database::new(DbConfig::from_env("./oficina.db")).await?;

    let parts = vec![
        part("FLT-OIL-001", "Oil filter", 1450, 2890, 10),
        part("FLT-AIR-002", "Air filter", 2200, 4100, 8),
        part("BRK-PAD-010", "Brake pad set (front)", 8900, 15900, 4),
        part("OIL-5W30-1L", "Engine oil 5W30 1L", 3200, 5400, 24),
        part("SPK-PLG-004", "Spark plug", 1800, 3300, 16),
    ];

    let mut seeded = 0;
    for p in &parts {
        match db.products().insert(p).await {
            Ok(()) => {
                // Initial purchase so the shelf isn't empty.
                db.movements()
                    .record(NewMovement {
                        product_id: p.id.clone(),
                        kind: MovementKind::Entry,
                        direction: MovementDirection::In,
                        quantity: p.min_quantity * 3,
                        unit_value_cents: p.cost_cents,
                        document_ref: Some("SEED-001".to_string()),
                        session_id: None,
                        correction_of: None,
                        moved_at: Utc::now(),
                    })
                    .await?;
                seeded += 1;
            }
            Err(DbError::UniqueViolation { .. }) => {
                info!(code = %p.code, "Already seeded, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(seeded, total = parts.len(), "Seed complete");
    db.close().await;
    Ok(())
}
