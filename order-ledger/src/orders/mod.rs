//! Order ledger
//!
//! - **manager**: `OrdersManager`, the entry point for every order operation
//! - **actions**: one handler per mutating command
//! - **storage**: redb persistence for orders, order numbers and carts
//! - **traits**: command plumbing shared by the actions
//!
//! # Architecture
//!
//! ```text
//! Call → OrdersManager → Action → Storage (redb)
//!              ↓
//!          Broadcast (OrderChange)
//! ```

pub mod actions;
pub mod manager;
pub mod storage;
pub mod traits;

// Re-exports
pub use manager::{GeneratedInvoice, ManagerError, ManagerResult, OrdersManager};
pub use storage::{OrderStorage, StorageError};
pub use traits::{CommandContext, CommandHandler, OrderError};

// Re-export shared types for convenience
pub use shared::order::{
    LineItem, OrderChange, OrderChangeKind, OrderSnapshot, OrderStatus, PaymentStatus,
};
