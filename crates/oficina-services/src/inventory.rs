//! # Inventory Service
//!
//! The counting workflow: open a session over the active products, record
//! counts, then finalize into compensating movements or cancel.
//!
//! ## Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open()     → session Planned, one frozen line per active product     │
//! │  start()    → Planned → InProgress                                     │
//! │  count()    → record/overwrite a line's counted quantity              │
//! │  finalize() → divergences become InventoryCount movements, ledger     │
//! │               overwritten to counted, session Finalized (one tx)      │
//! │  cancel()   → session Cancelled, nothing reconciled                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use oficina_core::validation::{validate_counted_quantity, validate_name};
use oficina_core::{
    reconciliation_plan, CoreError, InventoryLine, InventorySession, OperationContext,
    ReconciliationEntry, StockMovement,
};
use oficina_db::repository::session::{new_line, new_session};
use oficina_db::Database;

use crate::error::{ServiceError, ServiceResult};

/// A session together with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    pub session: InventorySession,
    pub lines: Vec<InventoryLine>,
}

/// What a finalization did.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizationReport {
    pub session: InventorySession,
    /// Lines that had a count recorded.
    pub lines_counted: usize,
    /// Lines skipped because no count was ever recorded.
    pub lines_uncounted: usize,
    /// Compensating movements written (one per non-zero divergence).
    pub movements: Vec<StockMovement>,
}

/// Service for the inventory counting workflow.
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
}

impl InventoryService {
    pub fn new(db: Database) -> Self {
        InventoryService { db }
    }

    /// Opens a session, freezing one line per active product.
    ///
    /// At most one session may be open; the application check here is backed
    /// by a unique index, so a concurrent open loses cleanly.
    pub async fn open(
        &self,
        ctx: &OperationContext,
        description: &str,
        notes: Option<String>,
    ) -> ServiceResult<SessionDetail> {
        validate_name("description", description).map_err(CoreError::from)?;

        if let Some(existing) = self.db.sessions().find_open().await? {
            return Err(ServiceError::from(CoreError::OpenSessionExists {
                session_id: existing.id,
            }));
        }

        let products = self.db.products().list_active(u32::MAX).await?;
        let session = new_session(description.trim(), notes);
        let lines: Vec<InventoryLine> = products
            .iter()
            .map(|p| new_line(&session.id, &p.id, p.quantity))
            .collect();

        self.db.sessions().create_with_lines(&session, &lines).await?;

        info!(
            user = %ctx.user,
            request_id = %ctx.request_id,
            session_id = %session.id,
            line_count = lines.len(),
            "Inventory session opened"
        );
        Ok(SessionDetail { session, lines })
    }

    /// Starts counting: Planned → InProgress.
    pub async fn start(
        &self,
        ctx: &OperationContext,
        session_id: &str,
    ) -> ServiceResult<InventorySession> {
        let session = self.get_session(session_id).await?;
        session.ensure_can_start()?;

        self.db.sessions().mark_started(session_id, Utc::now()).await?;

        info!(
            user = %ctx.user,
            request_id = %ctx.request_id,
            session_id = %session_id,
            "Inventory session started"
        );
        self.get_session(session_id).await
    }

    /// Records (or overwrites) a counted quantity on a line.
    pub async fn count(
        &self,
        ctx: &OperationContext,
        session_id: &str,
        line_id: &str,
        counted_quantity: i64,
        notes: Option<&str>,
    ) -> ServiceResult<InventoryLine> {
        validate_counted_quantity(counted_quantity).map_err(CoreError::from)?;

        let session = self.get_session(session_id).await?;
        session.ensure_counting()?;

        self.db
            .sessions()
            .record_count(session_id, line_id, counted_quantity, Utc::now(), notes)
            .await?;

        let line = self
            .db
            .sessions()
            .get_line(session_id, line_id)
            .await?
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

        info!(
            user = %ctx.user,
            request_id = %ctx.request_id,
            session_id = %session_id,
            line_id = %line_id,
            counted = %counted_quantity,
            "Count recorded"
        );
        Ok(line)
    }

    /// The divergences a finalization would reconcile right now. Uncounted
    /// lines and exact matches are absent.
    pub async fn divergences(&self, session_id: &str) -> ServiceResult<Vec<ReconciliationEntry>> {
        self.get_session(session_id).await?;
        let lines = self.db.sessions().list_lines(session_id).await?;
        Ok(reconciliation_plan(&lines))
    }

    /// Finalizes the session: every non-zero divergence becomes an
    /// InventoryCount movement and the ledger is overwritten to the counted
    /// quantity, all in one transaction. Irreversible.
    pub async fn finalize(
        &self,
        ctx: &OperationContext,
        session_id: &str,
    ) -> ServiceResult<FinalizationReport> {
        let session = self.get_session(session_id).await?;
        let lines = self.db.sessions().list_lines(session_id).await?;
        session.ensure_can_finalize(lines.len())?;

        let counted = lines.iter().filter(|l| l.counted_quantity.is_some()).count();
        let plan = reconciliation_plan(&lines);

        let movements = self
            .db
            .sessions()
            .finalize(session_id, &plan, Utc::now())
            .await?;

        let session = self.get_session(session_id).await?;

        info!(
            user = %ctx.user,
            request_id = %ctx.request_id,
            session_id = %session_id,
            lines_counted = counted,
            movements = movements.len(),
            "Inventory session finalized"
        );
        Ok(FinalizationReport {
            session,
            lines_counted: counted,
            lines_uncounted: lines.len() - counted,
            movements,
        })
    }

    /// Cancels an open session. Counts are kept for audit; nothing is
    /// reconciled.
    pub async fn cancel(
        &self,
        ctx: &OperationContext,
        session_id: &str,
    ) -> ServiceResult<InventorySession> {
        let session = self.get_session(session_id).await?;
        session.ensure_can_cancel()?;

        self.db.sessions().mark_cancelled(session_id).await?;

        info!(
            user = %ctx.user,
            request_id = %ctx.request_id,
            session_id = %session_id,
            "Inventory session cancelled"
        );
        self.get_session(session_id).await
    }

    /// Gets a session with its lines.
    pub async fn detail(&self, session_id: &str) -> ServiceResult<SessionDetail> {
        let session = self.get_session(session_id).await?;
        let lines = self.db.sessions().list_lines(session_id).await?;
        Ok(SessionDetail { session, lines })
    }

    /// Lists sessions, most recent first.
    pub async fn list(&self, limit: u32) -> ServiceResult<Vec<InventorySession>> {
        Ok(self.db.sessions().list(limit).await?)
    }

    /// The currently open session, if any.
    pub async fn open_session(&self) -> ServiceResult<Option<InventorySession>> {
        Ok(self.db.sessions().find_open().await?)
    }

    async fn get_session(&self, session_id: &str) -> ServiceResult<InventorySession> {
        self.db
            .sessions()
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()).into())
    }
}
