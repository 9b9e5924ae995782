//! AppError - the error every ledger operation reports

use super::category::ErrorKind;
use super::codes::ErrorCode;
use http::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Coded error with an optional map of structured details
///
/// `details` carries the identifiers a caller needs to act on the error
/// (order id, expected and actual revision, product id, ...).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Look up one detail entry
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref()?.get(key)
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    // ==================== Constructors by kind ====================

    pub fn state_conflict(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::with_message(code, msg)
    }

    pub fn dependency(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::with_message(code, msg)
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

pub type AppResult<T> = Result<T, AppError>;
