//! # Operation Context
//!
//! Explicit per-operation context, passed into every service call instead of
//! reading an ambient "current user" or static logger. Makes every operation
//! attributable and testable in isolation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::SYSTEM_USER;

/// Who is performing an operation and under which request.
///
/// ## Usage
/// ```rust
/// use oficina_core::OperationContext;
///
/// let ctx = OperationContext::new("mechanic.silva");
/// assert_eq!(ctx.user, "mechanic.silva");
/// assert!(!ctx.request_id.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// Acting user (login name or id). Recorded in log fields.
    pub user: String,

    /// Correlation id for the request; generated when not supplied.
    pub request_id: String,
}

impl OperationContext {
    /// Context for a named user with a fresh request id.
    pub fn new(user: impl Into<String>) -> Self {
        OperationContext {
            user: user.into(),
            request_id: Uuid::new_v4().to_string(),
        }
    }

    /// Context carrying an externally assigned correlation id.
    pub fn with_request_id(user: impl Into<String>, request_id: impl Into<String>) -> Self {
        OperationContext {
            user: user.into(),
            request_id: request_id.into(),
        }
    }

    /// Context for operations without a logged-in actor (seeds, jobs).
    pub fn system() -> Self {
        Self::new(SYSTEM_USER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_request_ids() {
        let a = OperationContext::new("ana");
        let b = OperationContext::new("ana");
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_system_context() {
        let ctx = OperationContext::system();
        assert_eq!(ctx.user, SYSTEM_USER);
    }
}
