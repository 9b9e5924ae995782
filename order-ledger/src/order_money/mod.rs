//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` (rounded to 2 decimal places, half away from zero) for storage and
//! serialization.
//!
//! # Pricing rules
//!
//! ```text
//! subtotal        = Σ price × quantity
//! item gst        = round(price × quantity × gst% / 100)
//! gst_total       = Σ item gst
//! discount_amount = round(base × discount% / 100)      base: see DiscountBase
//! final_total     = max(0, subtotal + gst_total − discount_amount + delivery_charge)
//! ```

use crate::orders::traits::OrderError;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use shared::error::ErrorCode;
use shared::order::{LineItem, OrderSnapshot};
use std::str::FromStr;

/// Rounding precision for monetary values
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed unit price (₹1,000,000)
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line item
pub const MAX_QUANTITY: i32 = 9999;
/// Maximum allowed delivery charge
pub const MAX_DELIVERY_CHARGE: f64 = 100_000.0;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

// ============================================================================
// Discount base
// ============================================================================

/// Amount the discount percentage is applied to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountBase {
    /// Item subtotal only
    Subtotal,
    /// Item subtotal plus GST
    #[default]
    SubtotalWithGst,
    /// Item subtotal plus GST plus delivery charge
    SubtotalWithGstAndDelivery,
}

impl FromStr for DiscountBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subtotal" => Ok(DiscountBase::Subtotal),
            "subtotal_with_gst" => Ok(DiscountBase::SubtotalWithGst),
            "subtotal_with_gst_and_delivery" => Ok(DiscountBase::SubtotalWithGstAndDelivery),
            other => Err(format!("unknown discount base: {other}")),
        }
    }
}

// ============================================================================
// Boundary validation
// ============================================================================

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
pub fn require_finite(value: f64, field_name: &str) -> Result<(), OrderError> {
    if !value.is_finite() {
        return Err(OrderError::Validation(
            ErrorCode::ValidationFailed,
            format!("{} must be a finite number, got {}", field_name, value),
        ));
    }
    Ok(())
}

/// Clamp a percentage (discount or GST) into [0, 100]
///
/// Non-finite input is rejected rather than clamped.
pub fn clamp_percentage(value: f64, field_name: &str) -> Result<f64, OrderError> {
    require_finite(value, field_name)?;
    let clamped = value.clamp(0.0, 100.0);
    if clamped != value {
        tracing::debug!(field = field_name, value, clamped, "Percentage clamped");
    }
    Ok(clamped)
}

/// Clamp a delivery charge to ≥ 0
pub fn clamp_delivery_charge(value: f64) -> Result<f64, OrderError> {
    require_finite(value, "delivery_charge")?;
    if value > MAX_DELIVERY_CHARGE {
        return Err(OrderError::Validation(
            ErrorCode::ValueOutOfRange,
            format!(
                "delivery_charge exceeds maximum allowed ({}), got {}",
                MAX_DELIVERY_CHARGE, value
            ),
        ));
    }
    Ok(value.max(0.0))
}

/// Validate a unit price: finite, non-negative, within bounds
pub fn validate_price(price: f64) -> Result<(), OrderError> {
    require_finite(price, "price")?;
    if price < 0.0 {
        return Err(OrderError::Validation(
            ErrorCode::ProductInvalidPrice,
            format!("price must be non-negative, got {}", price),
        ));
    }
    if price > MAX_PRICE {
        return Err(OrderError::Validation(
            ErrorCode::ProductInvalidPrice,
            format!("price exceeds maximum allowed ({}), got {}", MAX_PRICE, price),
        ));
    }
    Ok(())
}

/// Validate the quantity of a new line item (must be ≥ 1)
pub fn validate_new_quantity(quantity: i32) -> Result<(), OrderError> {
    if quantity <= 0 {
        return Err(OrderError::Validation(
            ErrorCode::ValueOutOfRange,
            format!("quantity must be positive, got {}", quantity),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(OrderError::Validation(
            ErrorCode::ValueOutOfRange,
            format!(
                "quantity exceeds maximum allowed ({}), got {}",
                MAX_QUANTITY, quantity
            ),
        ));
    }
    Ok(())
}

/// Clamp the quantity of an edited line item to ≥ 1
pub fn clamp_edit_quantity(quantity: i32) -> Result<i32, OrderError> {
    if quantity > MAX_QUANTITY {
        return Err(OrderError::Validation(
            ErrorCode::ValueOutOfRange,
            format!(
                "quantity exceeds maximum allowed ({}), got {}",
                MAX_QUANTITY, quantity
            ),
        ));
    }
    Ok(quantity.max(1))
}

// ============================================================================
// Conversion
// ============================================================================

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or_default()
}

#[inline]
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

// ============================================================================
// Calculator
// ============================================================================

/// Everything the totals depend on
#[derive(Debug, Clone, Copy)]
pub struct PricingInputs<'a> {
    pub items: &'a [LineItem],
    pub discount_percentage: f64,
    pub delivery_charge: f64,
    pub base: DiscountBase,
}

/// Derived money fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingBreakdown {
    pub subtotal: f64,
    pub gst_total: f64,
    pub discount_amount: f64,
    pub delivery_charge: f64,
    pub final_total: f64,
}

/// price × quantity of one item
pub fn calculate_line_total(item: &LineItem) -> Decimal {
    to_decimal(item.price) * Decimal::from(item.quantity)
}

/// GST of one item, rounded to 2 decimal places
pub fn calculate_item_gst(item: &LineItem) -> Decimal {
    round_money(calculate_line_total(item) * to_decimal(item.gst_percentage) / HUNDRED)
}

/// Σ price × quantity
pub fn compute_subtotal(items: &[LineItem]) -> Decimal {
    items.iter().map(calculate_line_total).sum()
}

/// Σ per-item GST (each already rounded)
pub fn compute_gst(items: &[LineItem]) -> Decimal {
    items.iter().map(calculate_item_gst).sum()
}

/// The amount the discount percentage applies to
pub fn discount_base_amount(
    base: DiscountBase,
    subtotal: Decimal,
    gst_total: Decimal,
    delivery_charge: Decimal,
) -> Decimal {
    match base {
        DiscountBase::Subtotal => subtotal,
        DiscountBase::SubtotalWithGst => subtotal + gst_total,
        DiscountBase::SubtotalWithGstAndDelivery => subtotal + gst_total + delivery_charge,
    }
}

/// base × pct / 100, rounded to 2 decimal places
pub fn compute_discount(base_amount: Decimal, discount_percentage: Decimal) -> Decimal {
    round_money(base_amount * discount_percentage / HUNDRED)
}

/// subtotal + gst − discount + delivery, never below zero
pub fn compute_final_total(
    subtotal: Decimal,
    gst_total: Decimal,
    discount_amount: Decimal,
    delivery_charge: Decimal,
) -> Decimal {
    round_money(subtotal + gst_total - discount_amount + delivery_charge).max(Decimal::ZERO)
}

/// Run the full calculation
pub fn compute_breakdown(inputs: &PricingInputs<'_>) -> PricingBreakdown {
    let subtotal = round_money(compute_subtotal(inputs.items));
    let gst_total = compute_gst(inputs.items);
    let delivery = round_money(to_decimal(inputs.delivery_charge).max(Decimal::ZERO));
    let pct = to_decimal(inputs.discount_percentage).clamp(Decimal::ZERO, HUNDRED);

    let base_amount = discount_base_amount(inputs.base, subtotal, gst_total, delivery);
    let discount = compute_discount(base_amount, pct);
    let final_total = compute_final_total(subtotal, gst_total, discount, delivery);

    PricingBreakdown {
        subtotal: to_f64(subtotal),
        gst_total: to_f64(gst_total),
        discount_amount: to_f64(discount),
        delivery_charge: to_f64(delivery),
        final_total: to_f64(final_total),
    }
}

/// Recalculate every derived money field of an order
///
/// Writes per-item `line_total` and `gst_amount`, then the order-level
/// subtotal, GST, discount and final total.
pub fn recalculate_totals(snapshot: &mut OrderSnapshot, base: DiscountBase) {
    for item in &mut snapshot.items {
        item.line_total = to_f64(calculate_line_total(item));
        item.gst_amount = to_f64(calculate_item_gst(item));
    }

    let breakdown = compute_breakdown(&PricingInputs {
        items: &snapshot.items,
        discount_percentage: snapshot.discount_percentage,
        delivery_charge: snapshot.delivery_charge,
        base,
    });

    snapshot.subtotal = breakdown.subtotal;
    snapshot.gst_total = breakdown.gst_total;
    snapshot.discount_amount = breakdown.discount_amount;
    snapshot.delivery_charge = breakdown.delivery_charge;
    snapshot.final_total = breakdown.final_total;

    tracing::debug!(
        order_id = %snapshot.order_id,
        subtotal = snapshot.subtotal,
        gst_total = snapshot.gst_total,
        discount_amount = snapshot.discount_amount,
        final_total = snapshot.final_total,
        "Order totals recalculated"
    );
}

/// Compare two monetary values within [`MONEY_TOLERANCE`]
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}
