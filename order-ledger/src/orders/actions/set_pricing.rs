//! Order-level pricing handlers: discount percentage and delivery charge
//!
//! Both clamp instead of rejecting out-of-range input. Setting the value an
//! order already has is a no-op and is not persisted.

use crate::order_money::{clamp_delivery_charge, clamp_percentage};
use crate::orders::traits::{CommandContext, CommandHandler, OrderError};
use shared::order::{OrderChangeKind, OrderSnapshot};

/// SetDiscount action
#[derive(Debug, Clone)]
pub struct SetDiscountAction {
    pub discount_percentage: f64,
}

impl CommandHandler for SetDiscountAction {
    fn execute(
        &self,
        snapshot: &mut OrderSnapshot,
        _ctx: &CommandContext<'_>,
    ) -> Result<OrderChangeKind, OrderError> {
        snapshot.discount_percentage =
            clamp_percentage(self.discount_percentage, "discount_percentage")?;
        Ok(OrderChangeKind::PricingChanged)
    }
}

/// SetDeliveryCharge action
#[derive(Debug, Clone)]
pub struct SetDeliveryChargeAction {
    pub delivery_charge: f64,
}

impl CommandHandler for SetDeliveryChargeAction {
    fn execute(
        &self,
        snapshot: &mut OrderSnapshot,
        _ctx: &CommandContext<'_>,
    ) -> Result<OrderChangeKind, OrderError> {
        snapshot.delivery_charge = clamp_delivery_charge(self.delivery_charge)?;
        Ok(OrderChangeKind::PricingChanged)
    }
}
