//! Order types
//!
//! - Snapshots: the persisted state of an order
//! - Line items and their frozen product details
//! - Command inputs accepted by the ledger
//! - Change notifications broadcast after commits

pub mod snapshot;
pub mod types;

// Re-exports
pub use snapshot::{OrderSnapshot, OrderStatus, PaymentStatus};
pub use types::*;
