//! Data models
//!
//! Catalog, cart and caller types consumed by the order ledger.

pub mod cart;
pub mod product;
pub mod role;

// Re-exports
pub use cart::*;
pub use product::*;
pub use role::*;
