//! # Inventory Session State Machine
//!
//! An inventory session snapshots the ledger into count lines, accepts
//! counted quantities, and - on finalization - turns each divergence into a
//! compensating stock movement.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Planned ──── start ────► InProgress ──── finalize ────► Finalized    │
//! │      │                         │                                        │
//! │      │                         │                                        │
//! │      └──────── cancel ─────────┴──── cancel ────► Cancelled            │
//! │                                                                         │
//! │   Finalize is irreversible. Cancel performs no reconciliation.         │
//! │   At most one session may be open (Planned or InProgress) at a time.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Divergence is always derived as `counted - system`; it is never stored.
//! A line that was never counted has no divergence and is skipped by the
//! reconciliation plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::MovementDirection;

// =============================================================================
// Session Status
// =============================================================================

/// Lifecycle status of an inventory session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, lines materialized, counting not yet started.
    Planned,
    /// Counting underway; counts may be recorded.
    InProgress,
    /// Reconciled. Terminal.
    Finalized,
    /// Abandoned without reconciliation. Terminal.
    Cancelled,
}

impl SessionStatus {
    /// Open sessions block the creation of a new one.
    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Planned | SessionStatus::InProgress)
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Planned
    }
}

// =============================================================================
// Inventory Session
// =============================================================================

/// A counting cycle over the active products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventorySession {
    pub id: String,
    pub description: String,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventorySession {
    /// Guard for Planned → InProgress.
    pub fn ensure_can_start(&self) -> CoreResult<()> {
        if self.status != SessionStatus::Planned {
            return Err(self.wrong_status("start"));
        }
        Ok(())
    }

    /// Guard for recording a count: only legal while InProgress.
    pub fn ensure_counting(&self) -> CoreResult<()> {
        if self.status != SessionStatus::InProgress {
            return Err(self.wrong_status("record a count on"));
        }
        Ok(())
    }

    /// Guard for InProgress → Finalized. Requires at least one line;
    /// re-finalizing an already finalized session is rejected here.
    pub fn ensure_can_finalize(&self, line_count: usize) -> CoreResult<()> {
        if self.status != SessionStatus::InProgress {
            return Err(self.wrong_status("finalize"));
        }
        if line_count == 0 {
            return Err(CoreError::EmptySession {
                session_id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Guard for cancellation: legal from Planned or InProgress only.
    pub fn ensure_can_cancel(&self) -> CoreResult<()> {
        if !self.status.is_open() {
            return Err(self.wrong_status("cancel"));
        }
        Ok(())
    }

    fn wrong_status(&self, operation: &'static str) -> CoreError {
        CoreError::InvalidSessionStatus {
            session_id: self.id.clone(),
            current: self.status,
            operation,
        }
    }
}

// =============================================================================
// Inventory Line
// =============================================================================

/// One product's count within a session.
///
/// `system_quantity` is frozen when the session is created; the live ledger
/// keeps moving underneath. `counted_quantity` stays `None` until a count is
/// recorded, so an uncounted line never produces a divergence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryLine {
    pub id: String,
    pub session_id: String,
    pub product_id: String,
    /// Ledger quantity at session creation time.
    pub system_quantity: i64,
    /// Counted quantity; `None` until a count is submitted.
    pub counted_quantity: Option<i64>,
    pub counted_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventoryLine {
    /// Derived divergence: `counted - system`. `None` while uncounted.
    pub fn divergence(&self) -> Option<i64> {
        self.counted_quantity.map(|c| c - self.system_quantity)
    }
}

// =============================================================================
// Reconciliation Plan
// =============================================================================

/// One compensating action produced by session finalization: create an
/// InventoryCount movement of `|divergence|` in `direction`, then set the
/// product's quantity to `counted_quantity` (direct overwrite, not a delta).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationEntry {
    pub line_id: String,
    pub product_id: String,
    pub system_quantity: i64,
    pub counted_quantity: i64,
    pub divergence: i64,
}

impl ReconciliationEntry {
    /// In when the count found more than the ledger, Out when less.
    pub fn direction(&self) -> MovementDirection {
        if self.divergence > 0 {
            MovementDirection::In
        } else {
            MovementDirection::Out
        }
    }

    /// Movement magnitude: `|divergence|`.
    pub fn magnitude(&self) -> i64 {
        self.divergence.abs()
    }
}

/// Walks the session's lines and returns the compensating actions for every
/// counted line with a non-zero divergence. Uncounted lines and exact
/// matches produce nothing.
pub fn reconciliation_plan(lines: &[InventoryLine]) -> Vec<ReconciliationEntry> {
    lines
        .iter()
        .filter_map(|line| {
            let counted = line.counted_quantity?;
            let divergence = counted - line.system_quantity;
            if divergence == 0 {
                return None;
            }
            Some(ReconciliationEntry {
                line_id: line.id.clone(),
                product_id: line.product_id.clone(),
                system_quantity: line.system_quantity,
                counted_quantity: counted,
                divergence,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session(status: SessionStatus) -> InventorySession {
        InventorySession {
            id: "s-1".to_string(),
            description: "quarterly count".to_string(),
            status,
            started_at: None,
            finalized_at: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn line(id: &str, system: i64, counted: Option<i64>) -> InventoryLine {
        InventoryLine {
            id: id.to_string(),
            session_id: "s-1".to_string(),
            product_id: format!("p-{}", id),
            system_quantity: system,
            counted_quantity: counted,
            counted_at: counted.map(|_| Utc::now()),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_start_only_from_planned() {
        assert!(session(SessionStatus::Planned).ensure_can_start().is_ok());
        assert!(session(SessionStatus::InProgress).ensure_can_start().is_err());
        assert!(session(SessionStatus::Finalized).ensure_can_start().is_err());
        assert!(session(SessionStatus::Cancelled).ensure_can_start().is_err());
    }

    #[test]
    fn test_counting_only_in_progress() {
        assert!(session(SessionStatus::InProgress).ensure_counting().is_ok());
        assert!(session(SessionStatus::Planned).ensure_counting().is_err());
        assert!(session(SessionStatus::Finalized).ensure_counting().is_err());
    }

    #[test]
    fn test_finalize_guards() {
        assert!(session(SessionStatus::InProgress).ensure_can_finalize(3).is_ok());
        // Needs at least one line.
        assert!(matches!(
            session(SessionStatus::InProgress).ensure_can_finalize(0),
            Err(CoreError::EmptySession { .. })
        ));
        // Only reachable from InProgress; re-finalize is rejected.
        assert!(session(SessionStatus::Planned).ensure_can_finalize(3).is_err());
        assert!(session(SessionStatus::Finalized).ensure_can_finalize(3).is_err());
    }

    #[test]
    fn test_cancel_unreachable_once_finalized() {
        assert!(session(SessionStatus::Planned).ensure_can_cancel().is_ok());
        assert!(session(SessionStatus::InProgress).ensure_can_cancel().is_ok());
        assert!(session(SessionStatus::Finalized).ensure_can_cancel().is_err());
        assert!(session(SessionStatus::Cancelled).ensure_can_cancel().is_err());
    }

    #[test]
    fn test_divergence_is_derived() {
        assert_eq!(line("a", 70, Some(65)).divergence(), Some(-5));
        assert_eq!(line("b", 70, Some(70)).divergence(), Some(0));
        assert_eq!(line("c", 70, None).divergence(), None);
    }

    #[test]
    fn test_plan_skips_uncounted_and_exact_lines() {
        let lines = vec![
            line("a", 70, Some(65)), // shortage of 5
            line("b", 10, Some(10)), // exact
            line("c", 40, None),     // never counted
            line("d", 3, Some(9)),   // surplus of 6
        ];
        let plan = reconciliation_plan(&lines);
        assert_eq!(plan.len(), 2);

        assert_eq!(plan[0].line_id, "a");
        assert_eq!(plan[0].divergence, -5);
        assert_eq!(plan[0].direction(), MovementDirection::Out);
        assert_eq!(plan[0].magnitude(), 5);

        assert_eq!(plan[1].line_id, "d");
        assert_eq!(plan[1].divergence, 6);
        assert_eq!(plan[1].direction(), MovementDirection::In);
        assert_eq!(plan[1].magnitude(), 6);
    }
}
