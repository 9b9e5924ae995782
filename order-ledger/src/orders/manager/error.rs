use super::super::storage::StorageError;
use super::super::traits::OrderError;
use crate::services::{CatalogError, RenderError, UploadError};
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Alternate {index} not found for product {product_id}")]
    AlternateNotFound { product_id: String, index: usize },

    #[error("{1}")]
    Validation(ErrorCode, String),

    #[error("{1}")]
    StateConflict(ErrorCode, String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Order {order_id} was modified (expected revision {expected}, found {actual})")]
    RevisionConflict {
        order_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invoice rendering failed: {0}")]
    RenderFailed(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Map a storage error to an error code
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    match e {
        StorageError::Serialization(_) => return ErrorCode::InternalError,
        StorageError::DuplicateOrderNumber(_) => return ErrorCode::AlreadyExists,
        _ => {}
    }

    // redb errors are classified by message
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return ErrorCode::StorageFull;
    }

    if err_str.contains("out of memory") || err_str.contains("cannot allocate") {
        return ErrorCode::OutOfMemory;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    // Database/Transaction/Table/Storage/Commit errors
    ErrorCode::DatabaseError
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                AppError::with_message(code, e.to_string())
            }
            ManagerError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order not found: {}", id))
                    .with_detail("order_id", id)
            }
            ManagerError::ItemNotFound(id) => AppError::with_message(
                ErrorCode::OrderItemNotFound,
                format!("Item not found: {}", id),
            )
            .with_detail("item_id", id),
            ManagerError::ProductNotFound(id) => AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product not found: {}", id),
            )
            .with_detail("product_id", id),
            ManagerError::AlternateNotFound { product_id, index } => AppError::with_message(
                ErrorCode::AlternateNotFound,
                format!("Alternate {} not found for product {}", index, product_id),
            )
            .with_detail("product_id", product_id)
            .with_detail("alternate_index", index),
            ManagerError::Validation(code, msg) => AppError::with_message(code, msg),
            ManagerError::StateConflict(code, msg) => AppError::state_conflict(code, msg),
            ManagerError::PermissionDenied(msg) => AppError::permission_denied(msg),
            ManagerError::RevisionConflict {
                order_id,
                expected,
                actual,
            } => AppError::state_conflict(
                ErrorCode::RevisionConflict,
                format!(
                    "Order {} was modified (expected revision {}, found {})",
                    order_id, expected, actual
                ),
            )
            .with_detail("order_id", order_id)
            .with_detail("expected_revision", expected)
            .with_detail("actual_revision", actual),
            ManagerError::CatalogUnavailable(msg) => {
                AppError::dependency(ErrorCode::CatalogUnavailable, msg)
            }
            ManagerError::UploadFailed(msg) => AppError::dependency(ErrorCode::FileStorageFailed, msg),
            ManagerError::RenderFailed(msg) => AppError::dependency(ErrorCode::RenderFailed, msg),
            ManagerError::Timeout(msg) => AppError::dependency(ErrorCode::TimeoutError, msg),
            ManagerError::Internal(msg) => AppError::internal(msg),
        }
    }
}

impl From<OrderError> for ManagerError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::ItemNotFound(id) => ManagerError::ItemNotFound(id),
            OrderError::AlternateNotFound { product_id, index } => {
                ManagerError::AlternateNotFound { product_id, index }
            }
            OrderError::Validation(code, msg) => ManagerError::Validation(code, msg),
            OrderError::StateConflict(code, msg) => ManagerError::StateConflict(code, msg),
            OrderError::PermissionDenied(msg) => ManagerError::PermissionDenied(msg),
        }
    }
}

impl From<CatalogError> for ManagerError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => ManagerError::ProductNotFound(id),
            CatalogError::Unavailable(msg) => ManagerError::CatalogUnavailable(msg),
        }
    }
}

impl From<UploadError> for ManagerError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Empty => {
                ManagerError::Validation(ErrorCode::EmptyFile, "file is empty".to_string())
            }
            e @ UploadError::TooLarge { .. } => {
                ManagerError::Validation(ErrorCode::ValueOutOfRange, e.to_string())
            }
            e @ UploadError::InvalidDestination(_) => ManagerError::Internal(e.to_string()),
            e => ManagerError::UploadFailed(e.to_string()),
        }
    }
}

impl From<RenderError> for ManagerError {
    fn from(err: RenderError) -> Self {
        ManagerError::RenderFailed(err.to_string())
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
