//! # Movement Sign Rules
//!
//! The arithmetic at the heart of the ledger: how a movement's direction and
//! magnitude produce the next on-hand quantity, and how an existing
//! movement's effect is reversed or corrected.
//!
//! ## Sign Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Kind             Direction     quantity_after                          │
//! │  ──────────────   ──────────    ───────────────────────────             │
//! │  Entry            In            before + qty                            │
//! │  Exit             Out           before - qty   (clamped at 0)           │
//! │  Adjustment       In | Out      before ± qty   (clamped at 0)           │
//! │  Transfer         Out           before - qty   (clamped at 0)           │
//! │  InventoryCount   In | Out      set directly from session data          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The clamp is a safety net, not a business rule: outbound movements that
//! would overdraw stock are rejected with InsufficientStock before this
//! arithmetic ever runs. Adjustments bypass that rejection and rely on the
//! clamp alone.

use crate::error::{CoreError, CoreResult};
use crate::types::{MovementDirection, StockMovement};

/// Applies a movement's signed delta to a ledger quantity, clamped at zero.
///
/// ## Example
/// ```rust
/// use oficina_core::movement::quantity_after;
/// use oficina_core::MovementDirection;
///
/// assert_eq!(quantity_after(MovementDirection::In, 100, 30), 130);
/// assert_eq!(quantity_after(MovementDirection::Out, 100, 30), 70);
/// // Clamp: an out-adjustment larger than the balance floors at zero.
/// assert_eq!(quantity_after(MovementDirection::Out, 10, 30), 0);
/// ```
pub fn quantity_after(direction: MovementDirection, before: i64, quantity: i64) -> i64 {
    (before + direction.signed(quantity)).max(0)
}

/// The signed delta a movement actually applied to the ledger.
///
/// For most movements this equals `effect()`, but a clamped movement applied
/// less than its nominal signed quantity: an Out 25 against a balance of 10
/// only removed 10. The snapshots are the record of what really happened.
fn applied_delta(movement: &StockMovement) -> i64 {
    movement.quantity_after - movement.quantity_before
}

/// The ledger delta that undoes an existing movement.
///
/// Used when a movement is deleted: the product's quantity receives the
/// inverse of what the movement actually applied (its snapshot difference,
/// so a clamped movement is not over-reversed).
pub fn reversal_delta(movement: &StockMovement) -> i64 {
    -applied_delta(movement)
}

/// Computes the compensating movement that corrects `original` to a new
/// intended quantity, without editing the original row.
///
/// The correction's effect is exactly the difference between the new
/// intended effect and what the original actually applied — the snapshot
/// difference, not the nominal signed quantity, so corrections against a
/// clamped movement never mint stock that was never removed:
///
/// ```text
/// original: Exit 30   (applied -30)
/// intended: Exit 20   (effect  -20)
/// correction: In 10   (effect  +10) referencing the original
///
/// original: Adjustment Out 25 on a balance of 10   (applied -10, clamped)
/// intended: Adjustment Out 5                        (effect  -5)
/// correction: In 5                                  (effect  +5)
/// ```
///
/// Returns the `(direction, magnitude)` pair for the correction movement.
/// A correction with no net change is rejected.
pub fn correction_delta(
    original: &StockMovement,
    new_quantity: i64,
) -> CoreResult<(MovementDirection, i64)> {
    let intended = original.direction.signed(new_quantity);
    let delta = intended - applied_delta(original);

    if delta == 0 {
        return Err(CoreError::NoopCorrection {
            movement_id: original.id.clone(),
        });
    }

    if delta > 0 {
        Ok((MovementDirection::In, delta))
    } else {
        Ok((MovementDirection::Out, -delta))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
