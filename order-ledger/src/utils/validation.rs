//! Input validation helpers
//!
//! Centralized text length constants and validation functions used by
//! order actions before anything is persisted.

use crate::orders::traits::OrderError;
use shared::error::ErrorCode;
use shared::order::DeliveryAddress;

// ── Text length limits ──────────────────────────────────────────────

/// Identifiers: product ids, user ids, payment ids
pub const MAX_ID_LEN: usize = 128;

/// URLs / storage paths
pub const MAX_URL_LEN: usize = 2048;

/// Address lines
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers (Order actions) ──────────────────────────────

/// Validate a required string for order actions (non-empty + max length).
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), OrderError> {
    if value.trim().is_empty() {
        return Err(OrderError::Validation(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        ));
    }
    if value.len() > max_len {
        return Err(OrderError::Validation(
            ErrorCode::ValueOutOfRange,
            format!("{field} is too long ({} chars, max {max_len})", value.len()),
        ));
    }
    Ok(())
}

/// Validate a delivery address: present, every field filled, within limits.
pub fn validate_address(address: Option<&DeliveryAddress>) -> Result<(), OrderError> {
    let Some(address) = address else {
        return Err(OrderError::Validation(
            ErrorCode::AddressRequired,
            "delivery address is required".to_string(),
        ));
    };
    if let Some(field) = address.missing_field() {
        return Err(OrderError::Validation(
            ErrorCode::AddressRequired,
            format!("address {field} is required"),
        ));
    }
    for (field, value) in [
        ("street", &address.street),
        ("city", &address.city),
        ("state", &address.state),
        ("zip_code", &address.zip_code),
    ] {
        if value.len() > MAX_ADDRESS_LEN {
            return Err(OrderError::Validation(
                ErrorCode::ValueOutOfRange,
                format!("address {field} is too long ({} chars, max {MAX_ADDRESS_LEN})", value.len()),
            ));
        }
    }
    Ok(())
}

/// Validate the prescription URL attached at checkout.
pub fn validate_prescription_url(url: Option<&str>) -> Result<(), OrderError> {
    match url {
        Some(url) if !url.trim().is_empty() => {
            validate_required_text(url, "prescription_url", MAX_URL_LEN)
        }
        _ => Err(OrderError::Validation(
            ErrorCode::PrescriptionRequired,
            "prescription is required".to_string(),
        )),
    }
}
