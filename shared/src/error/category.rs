//! Error classification
//!
//! Two views over an [`ErrorCode`]:
//! - [`ErrorCategory`] groups codes by domain (leading digit of the code)
//! - [`ErrorKind`] groups codes by how a caller should react

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// - 0xxx: General errors
/// - 2xxx: Permission errors
/// - 4xxx: Order errors
/// - 5xxx: Payment errors
/// - 6xxx: Product errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Permission errors (2xxx)
    Permission,
    /// Order errors (4xxx)
    Order,
    /// Payment errors (5xxx)
    Payment,
    /// Product errors (6xxx)
    Product,
    /// System errors (everything else)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            2000..3000 => Self::Permission,
            4000..5000 => Self::Order,
            5000..6000 => Self::Payment,
            6000..7000 => Self::Product,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Permission => "permission",
            Self::Order => "order",
            Self::Payment => "payment",
            Self::Product => "product",
            Self::System => "system",
        }
    }
}

/// Caller-facing error taxonomy
///
/// Every error the ledger returns falls into exactly one kind. None of
/// them is retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Referenced order, item, product or alternate does not exist
    NotFound,
    /// Operation not allowed in the order's current state
    StateConflict,
    /// Catalog, file store or renderer failed or timed out
    Dependency,
    /// Caller lacks the role or ownership
    Permission,
    /// Storage or unexpected internal failure
    Internal,
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }

    /// Get the caller-facing kind for this error code
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationFailed
            | Self::RequiredField
            | Self::ValueOutOfRange
            | Self::AddressRequired
            | Self::PrescriptionRequired
            | Self::ProductInvalidPrice
            | Self::EmptyFile => ErrorKind::Validation,

            Self::NotFound
            | Self::OrderNotFound
            | Self::OrderItemNotFound
            | Self::ProductNotFound
            | Self::AlternateNotFound => ErrorKind::NotFound,

            Self::AlreadyExists
            | Self::InvalidStatusTransition
            | Self::OrderNotProcessing
            | Self::RevisionConflict
            | Self::PaymentRequired => ErrorKind::StateConflict,

            Self::CatalogUnavailable
            | Self::FileStorageFailed
            | Self::TimeoutError
            | Self::RenderFailed => ErrorKind::Dependency,

            Self::PermissionDenied | Self::NotOrderOwner => ErrorKind::Permission,

            Self::Success
            | Self::InternalError
            | Self::DatabaseError
            | Self::StorageFull
            | Self::OutOfMemory
            | Self::StorageCorrupted
            | Self::SystemBusy => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Order);
        assert_eq!(ErrorCategory::from_code(5006), ErrorCategory::Payment);
        assert_eq!(ErrorCategory::from_code(6505), ErrorCategory::Product);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(ErrorCode::ValueOutOfRange.kind(), ErrorKind::Validation);
        assert_eq!(ErrorCode::AlternateNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(ErrorCode::PaymentRequired.kind(), ErrorKind::StateConflict);
        assert_eq!(ErrorCode::RevisionConflict.kind(), ErrorKind::StateConflict);
        assert_eq!(ErrorCode::TimeoutError.kind(), ErrorKind::Dependency);
        assert_eq!(ErrorCode::NotOrderOwner.kind(), ErrorKind::Permission);
        assert_eq!(ErrorCode::SystemBusy.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Permission).unwrap();
        assert_eq!(json, "\"permission\"");
        let kind: ErrorKind = serde_json::from_str("\"state_conflict\"").unwrap();
        assert_eq!(kind, ErrorKind::StateConflict);
    }
}
