//! HTTP status code mapping for error codes

use super::category::ErrorKind;
use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 402 Payment Required
            Self::PaymentRequired => StatusCode::PAYMENT_REQUIRED,

            // 504 Gateway Timeout
            Self::TimeoutError => StatusCode::GATEWAY_TIMEOUT,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::SystemBusy => StatusCode::SERVICE_UNAVAILABLE,

            _ => match self.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::StateConflict => StatusCode::CONFLICT,
                ErrorKind::Permission => StatusCode::FORBIDDEN,
                ErrorKind::Dependency => StatusCode::BAD_GATEWAY,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}
