//! ConfirmPayment command handler
//!
//! The owner reports a successful payment: the order becomes paid and
//! confirmed and keeps the gateway payment id.

use super::set_status::ensure_transition;
use crate::orders::traits::{CommandContext, CommandHandler, OrderError};
use crate::utils::validation::{validate_required_text, MAX_ID_LEN};
use shared::order::{OrderChangeKind, OrderSnapshot, OrderStatus, PaymentStatus};

/// ConfirmPayment action
#[derive(Debug, Clone)]
pub struct ConfirmPaymentAction {
    pub payment_id: String,
}

impl CommandHandler for ConfirmPaymentAction {
    fn execute(
        &self,
        snapshot: &mut OrderSnapshot,
        ctx: &CommandContext<'_>,
    ) -> Result<OrderChangeKind, OrderError> {
        validate_required_text(&self.payment_id, "payment_id", MAX_ID_LEN)?;
        if ctx.actor.id != snapshot.user_id {
            return Err(OrderError::PermissionDenied(format!(
                "only the owner may confirm payment for order {}",
                snapshot.order_id
            )));
        }
        ensure_transition(snapshot, OrderStatus::Confirmed, ctx)?;

        snapshot.payment_status = PaymentStatus::Paid;
        snapshot.order_status = OrderStatus::Confirmed;
        snapshot.payment_id = Some(self.payment_id.clone());

        Ok(OrderChangeKind::StatusChanged)
    }
}
