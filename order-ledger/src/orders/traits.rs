//! Action plumbing shared by every order command
//!
//! An action receives the order loaded inside the write transaction,
//! mutates it in place and reports what kind of change it made. The
//! manager recalculates totals, bumps the revision and persists.

use shared::error::ErrorCode;
use shared::models::Actor;
use shared::order::{OrderChangeKind, OrderSnapshot};
use thiserror::Error;

/// Errors raised by actions and boundary validation
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Alternate {index} not found for product {product_id}")]
    AlternateNotFound { product_id: String, index: usize },

    /// Bad input shape or range
    #[error("{1}")]
    Validation(ErrorCode, String),

    /// Operation not allowed in the order's current state
    #[error("{1}")]
    StateConflict(ErrorCode, String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Per-command context handed to actions
#[derive(Debug, Clone)]
pub struct CommandContext<'a> {
    pub actor: &'a Actor,
    /// Reject transitions out of terminal states
    pub strict_status_transitions: bool,
}

/// A single order mutation
pub trait CommandHandler {
    /// Apply the command to `snapshot`
    ///
    /// On error the manager discards the working copy, so partial edits
    /// never reach storage.
    fn execute(
        &self,
        snapshot: &mut OrderSnapshot,
        ctx: &CommandContext<'_>,
    ) -> Result<OrderChangeKind, OrderError>;
}
