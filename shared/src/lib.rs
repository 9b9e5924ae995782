//! Shared types for the pharmacy order ledger
//!
//! Data types used by the ledger and by anything that talks to it:
//! order snapshots, line items, statuses, catalog products, carts and
//! the unified error system.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
