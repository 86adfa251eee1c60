//! # Inventory Session Repository
//!
//! Database operations for counting sessions and their lines.
//!
//! ## Finalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    finalize() Transaction                               │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    for each reconciliation entry:                                       │
//! │      1. SELECT quantity, cost_cents FROM products   (live snapshot)    │
//! │      2. INSERT inventory_count movement             (session-linked)   │
//! │      3. UPDATE products SET quantity = counted      (direct overwrite) │
//! │    4. UPDATE session → finalized                    (status-guarded)   │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Either every divergence is reconciled and the session flips to        │
//! │  finalized, or nothing changes. A session is never left half-applied. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The single-open-session rule is enforced here by the storage layer: the
//! partial unique index on open rows makes concurrent creation collide
//! instead of racing past an application-level check.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::movement::insert_movement;
use crate::repository::product;
use oficina_core::{
    InventoryLine, InventorySession, MovementKind, ReconciliationEntry, SessionStatus,
    StockMovement,
};

const SESSION_COLUMNS: &str =
    "id, description, status, started_at, finalized_at, notes, created_at";

const LINE_COLUMNS: &str = "\
    id, session_id, product_id, system_quantity, counted_quantity, \
    counted_at, notes, created_at";

/// Repository for inventory session database operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    // =========================================================================
    // Session Lifecycle
    // =========================================================================

    /// Creates a session and freezes one line per given product snapshot, all
    /// in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - another open session exists
    ///   (single-open-session index)
    pub async fn create_with_lines(
        &self,
        session: &InventorySession,
        lines: &[InventoryLine],
    ) -> DbResult<()> {
        info!(
            session_id = %session.id,
            line_count = lines.len(),
            "Creating inventory session"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_sessions (
                id, description, status, started_at, finalized_at, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&session.id)
        .bind(&session.description)
        .bind(session.status)
        .bind(session.started_at)
        .bind(session.finalized_at)
        .bind(&session.notes)
        .bind(session.created_at)
        .execute(&mut *tx)
        .await?;

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO inventory_lines (
                    id, session_id, product_id, system_quantity,
                    counted_quantity, counted_at, notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&line.id)
            .bind(&line.session_id)
            .bind(&line.product_id)
            .bind(line.system_quantity)
            .bind(line.counted_quantity)
            .bind(line.counted_at)
            .bind(&line.notes)
            .bind(line.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets a session by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventorySession>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM inventory_sessions WHERE id = ?1");
        let session = sqlx::query_as::<_, InventorySession>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Returns the open (planned or in-progress) session, if any.
    /// The unique index guarantees at most one row can match.
    pub async fn find_open(&self) -> DbResult<Option<InventorySession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM inventory_sessions \
             WHERE status IN ('planned', 'in_progress')"
        );
        let session = sqlx::query_as::<_, InventorySession>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Lists sessions, most recent first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<InventorySession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM inventory_sessions \
             ORDER BY created_at DESC LIMIT ?1"
        );
        let sessions = sqlx::query_as::<_, InventorySession>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }

    /// Flips a session from Planned to InProgress, stamping started_at.
    /// The WHERE clause carries the status guard; a stale or wrong-status
    /// session matches zero rows.
    pub async fn mark_started(&self, id: &str, started_at: DateTime<Utc>) -> DbResult<()> {
        debug!(session_id = %id, "Starting inventory session");

        let result = sqlx::query(
            r#"
            UPDATE inventory_sessions
            SET status = 'in_progress', started_at = ?2
            WHERE id = ?1 AND status = 'planned'
            "#,
        )
        .bind(id)
        .bind(started_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open session", id));
        }

        Ok(())
    }

    /// Cancels an open session. No reconciliation happens; the lines are
    /// kept for audit.
    pub async fn mark_cancelled(&self, id: &str) -> DbResult<()> {
        debug!(session_id = %id, "Cancelling inventory session");

        let result = sqlx::query(
            r#"
            UPDATE inventory_sessions
            SET status = 'cancelled'
            WHERE id = ?1 AND status IN ('planned', 'in_progress')
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open session", id));
        }

        Ok(())
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Gets a line by ID, scoped to its session.
    pub async fn get_line(&self, session_id: &str, line_id: &str) -> DbResult<Option<InventoryLine>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM inventory_lines WHERE id = ?1 AND session_id = ?2"
        );
        let line = sqlx::query_as::<_, InventoryLine>(&sql)
            .bind(line_id)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(line)
    }

    /// Lists a session's lines in creation order.
    pub async fn list_lines(&self, session_id: &str) -> DbResult<Vec<InventoryLine>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM inventory_lines \
             WHERE session_id = ?1 ORDER BY created_at, id"
        );
        let lines = sqlx::query_as::<_, InventoryLine>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Records (or re-records) a counted quantity on a line. Re-counting
    /// before finalization simply overwrites the previous count.
    pub async fn record_count(
        &self,
        session_id: &str,
        line_id: &str,
        counted_quantity: i64,
        counted_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> DbResult<()> {
        debug!(
            session_id = %session_id,
            line_id = %line_id,
            counted = %counted_quantity,
            "Recording count"
        );

        let result = sqlx::query(
            r#"
            UPDATE inventory_lines
            SET counted_quantity = ?3,
                counted_at = ?4,
                notes = COALESCE(?5, notes)
            WHERE id = ?2 AND session_id = ?1
            "#,
        )
        .bind(session_id)
        .bind(line_id)
        .bind(counted_quantity)
        .bind(counted_at)
        .bind(notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory line", line_id));
        }

        Ok(())
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    /// Applies a reconciliation plan and flips the session to Finalized, all
    /// in one transaction. Returns the compensating movements written.
    ///
    /// Each entry produces one InventoryCount movement whose before snapshot
    /// is the live ledger quantity at commit time and whose after is the
    /// counted quantity the ledger is overwritten to.
    pub async fn finalize(
        &self,
        session_id: &str,
        plan: &[ReconciliationEntry],
        finalized_at: DateTime<Utc>,
    ) -> DbResult<Vec<StockMovement>> {
        info!(
            session_id = %session_id,
            divergences = plan.len(),
            "Finalizing inventory session"
        );

        let mut tx = self.pool.begin().await?;
        let mut movements = Vec::with_capacity(plan.len());

        for entry in plan {
            let (live_quantity, cost_cents): (i64, i64) =
                sqlx::query_as("SELECT quantity, cost_cents FROM products WHERE id = ?1")
                    .bind(&entry.product_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| DbError::not_found("Product", &entry.product_id))?;

            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                product_id: entry.product_id.clone(),
                kind: MovementKind::InventoryCount,
                direction: entry.direction(),
                quantity: entry.magnitude(),
                unit_value_cents: cost_cents,
                quantity_before: live_quantity,
                quantity_after: entry.counted_quantity,
                document_ref: None,
                session_id: Some(session_id.to_string()),
                correction_of: None,
                moved_at: finalized_at,
                created_at: finalized_at,
            };

            insert_movement(&mut tx, &movement).await?;
            product::overwrite_quantity(
                &mut tx,
                &entry.product_id,
                entry.counted_quantity,
                finalized_at,
            )
            .await?;

            movements.push(movement);
        }

        let result = sqlx::query(
            r#"
            UPDATE inventory_sessions
            SET status = 'finalized', finalized_at = ?2
            WHERE id = ?1 AND status = 'in_progress'
            "#,
        )
        .bind(session_id)
        .bind(finalized_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Not in progress any more; roll everything back.
            return Err(DbError::not_found("In-progress session", session_id));
        }

        tx.commit().await?;

        info!(
            session_id = %session_id,
            movements = movements.len(),
            "Session finalized"
        );
        Ok(movements)
    }
}

/// Helper to build a frozen line for a product snapshot.
pub fn new_line(session_id: &str, product_id: &str, system_quantity: i64) -> InventoryLine {
    InventoryLine {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        product_id: product_id.to_string(),
        system_quantity,
        counted_quantity: None,
        counted_at: None,
        notes: None,
        created_at: Utc::now(),
    }
}

/// Helper to build a fresh session in the Planned state.
pub fn new_session(description: &str, notes: Option<String>) -> InventorySession {
    InventorySession {
        id: Uuid::new_v4().to_string(),
        description: description.to_string(),
        status: SessionStatus::Planned,
        started_at: None,
        finalized_at: None,
        notes,
        created_at: Utc::now(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
