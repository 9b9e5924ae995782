//! Unified error system
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`ErrorKind`]: What the caller should do about it
//! - [`AppError`]: Code, message and structured details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors (validation, not found)
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product and file errors
//! - 9xxx: System and dependency errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ErrorKind};
//!
//! let err = AppError::with_message(ErrorCode::PaymentRequired, "Order is not paid")
//!     .with_detail("order_id", "abc");
//! assert_eq!(err.code.kind(), ErrorKind::StateConflict);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::{ErrorCategory, ErrorKind};
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
