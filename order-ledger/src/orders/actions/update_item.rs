//! UpdateItem command handler
//!
//! Edits quantity, unit price or GST rate of one line item. Quantity is
//! floored to 1 rather than rejected; the GST rate is clamped into [0, 100].

use crate::order_money::{clamp_edit_quantity, clamp_percentage, validate_price};
use crate::orders::traits::{CommandContext, CommandHandler, OrderError};
use shared::error::ErrorCode;
use shared::order::{ItemChanges, OrderChangeKind, OrderSnapshot};

/// UpdateItem action
#[derive(Debug, Clone)]
pub struct UpdateItemAction {
    pub item_id: String,
    pub changes: ItemChanges,
}

impl CommandHandler for UpdateItemAction {
    fn execute(
        &self,
        snapshot: &mut OrderSnapshot,
        _ctx: &CommandContext<'_>,
    ) -> Result<OrderChangeKind, OrderError> {
        if self.changes.is_empty() {
            return Err(OrderError::Validation(
                ErrorCode::RequiredField,
                "at least one of quantity, price or gst_percentage is required".to_string(),
            ));
        }

        // Validate everything before touching the item
        let quantity = self.changes.quantity.map(clamp_edit_quantity).transpose()?;
        if let Some(price) = self.changes.price {
            validate_price(price)?;
        }
        let gst = self
            .changes
            .gst_percentage
            .map(|v| clamp_percentage(v, "gst_percentage"))
            .transpose()?;

        let item = snapshot
            .find_item_mut(&self.item_id)
            .ok_or_else(|| OrderError::ItemNotFound(self.item_id.clone()))?;

        if let Some(quantity) = quantity {
            item.quantity = quantity;
        }
        if let Some(price) = self.changes.price {
            item.price = price;
            item.product_details.margin = item.product_details.mrp - price;
        }
        if let Some(gst) = gst {
            item.gst_percentage = gst;
        }

        Ok(OrderChangeKind::ItemsChanged)
    }
}
