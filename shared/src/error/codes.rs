//! Ledger error codes
//!
//! The leading digit picks the domain (see [`super::ErrorCategory`]):
//! 0 general, 2 permission, 4 order, 5 payment, 6 product and file,
//! 9 system and storage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error code, serialized as a bare `u16`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    Success = 0,
    ValidationFailed = 2,
    /// Generic lookup miss (prefer the specific *NotFound codes)
    NotFound = 3,
    AlreadyExists = 4,
    RequiredField = 7,
    ValueOutOfRange = 8,

    // ==================== 2xxx: Permission ====================
    /// Caller's role does not allow the operation
    PermissionDenied = 2001,
    /// Order belongs to someone else
    NotOrderOwner = 2006,

    // ==================== 4xxx: Order ====================
    OrderNotFound = 4001,
    OrderItemNotFound = 4006,
    /// Rejected by the strict transition table
    InvalidStatusTransition = 4010,
    /// Proofs can only be attached while processing
    OrderNotProcessing = 4011,
    /// Stale `expected_revision`
    RevisionConflict = 4012,
    AddressRequired = 4014,
    PrescriptionRequired = 4015,

    // ==================== 5xxx: Payment ====================
    /// `confirmed` needs `paid`
    PaymentRequired = 5006,

    // ==================== 6xxx: Product ====================
    ProductNotFound = 6001,
    ProductInvalidPrice = 6002,
    /// `alternate_index` past the end of `alternate_medicines`
    AlternateNotFound = 6004,
    CatalogUnavailable = 6005,

    // ==================== 65xx: Files ====================
    EmptyFile = 6505,
    FileStorageFailed = 6509,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    /// A collaborator call exceeded `upload_timeout_ms`
    TimeoutError = 9004,
    RenderFailed = 9201,

    // ==================== 94xx: Storage ====================
    StorageFull = 9401,
    OutOfMemory = 9402,
    StorageCorrupted = 9403,
    /// Transient I/O failure; the caller may retry
    SystemBusy = 9404,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default English message, used when no specific message is given
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "OK",
            ErrorCode::ValidationFailed => "Invalid input",
            ErrorCode::NotFound => "Not found",
            ErrorCode::AlreadyExists => "Already exists",
            ErrorCode::RequiredField => "A required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            ErrorCode::PermissionDenied => "Not allowed for this role",
            ErrorCode::NotOrderOwner => "Order belongs to another user",

            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderItemNotFound => "Line item not found",
            ErrorCode::InvalidStatusTransition => "Status transition is not allowed",
            ErrorCode::OrderNotProcessing => "Order is not in processing state",
            ErrorCode::RevisionConflict => "Order was modified concurrently",
            ErrorCode::AddressRequired => "Complete delivery address is required",
            ErrorCode::PrescriptionRequired => "Prescription is required",

            ErrorCode::PaymentRequired => "Order must be paid first",

            ErrorCode::ProductNotFound => "Product not in catalog",
            ErrorCode::ProductInvalidPrice => "Price is negative or too large",
            ErrorCode::AlternateNotFound => "Alternate medicine not found",
            ErrorCode::CatalogUnavailable => "Catalog is unavailable",

            ErrorCode::EmptyFile => "Uploaded file is empty",
            ErrorCode::FileStorageFailed => "File store rejected the upload",

            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::RenderFailed => "Document rendering failed",

            ErrorCode::StorageFull => "Disk is full",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::StorageCorrupted => "Database file is damaged",
            ErrorCode::SystemBusy => "Busy, retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A `u16` that is not a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            7 => ErrorCode::RequiredField,
            8 => ErrorCode::ValueOutOfRange,
            2001 => ErrorCode::PermissionDenied,
            2006 => ErrorCode::NotOrderOwner,
            4001 => ErrorCode::OrderNotFound,
            4006 => ErrorCode::OrderItemNotFound,
            4010 => ErrorCode::InvalidStatusTransition,
            4011 => ErrorCode::OrderNotProcessing,
            4012 => ErrorCode::RevisionConflict,
            4014 => ErrorCode::AddressRequired,
            4015 => ErrorCode::PrescriptionRequired,
            5006 => ErrorCode::PaymentRequired,
            6001 => ErrorCode::ProductNotFound,
            6002 => ErrorCode::ProductInvalidPrice,
            6004 => ErrorCode::AlternateNotFound,
            6005 => ErrorCode::CatalogUnavailable,
            6505 => ErrorCode::EmptyFile,
            6509 => ErrorCode::FileStorageFailed,
            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            9004 => ErrorCode::TimeoutError,
            9201 => ErrorCode::RenderFailed,
            9401 => ErrorCode::StorageFull,
            9402 => ErrorCode::OutOfMemory,
            9403 => ErrorCode::StorageCorrupted,
            9404 => ErrorCode::SystemBusy,
            _ => return Err(InvalidErrorCode(value)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
