//! SetStatus command handler
//!
//! Admin update of fulfillment and/or payment status. `confirmed` is only
//! reachable once the order is paid, judged after this command's own
//! payment change is applied.
//!
//! A payment-only change (refund, chargeback) on a confirmed order leaves
//! it confirmed and unpaid, unless strict transitions are on, in which case
//! the payment can only leave `paid` together with an order status change.

use crate::orders::traits::{CommandContext, CommandHandler, OrderError};
use shared::error::ErrorCode;
use shared::order::{OrderChangeKind, OrderSnapshot, OrderStatus, PaymentStatus, StatusChange};

/// SetStatus action
#[derive(Debug, Clone)]
pub struct SetStatusAction {
    pub change: StatusChange,
}

impl CommandHandler for SetStatusAction {
    fn execute(
        &self,
        snapshot: &mut OrderSnapshot,
        ctx: &CommandContext<'_>,
    ) -> Result<OrderChangeKind, OrderError> {
        if self.change.order_status.is_none() && self.change.payment_status.is_none() {
            return Err(OrderError::Validation(
                ErrorCode::RequiredField,
                "order_status or payment_status is required".to_string(),
            ));
        }

        let next_payment = self.change.payment_status.unwrap_or(snapshot.payment_status);

        if let Some(next) = self.change.order_status {
            if next == OrderStatus::Confirmed && next_payment != PaymentStatus::Paid {
                return Err(OrderError::StateConflict(
                    ErrorCode::PaymentRequired,
                    format!(
                        "order {} cannot be confirmed while payment is {}",
                        snapshot.order_id, next_payment
                    ),
                ));
            }
            ensure_transition(snapshot, next, ctx)?;
        } else if ctx.strict_status_transitions
            && snapshot.order_status == OrderStatus::Confirmed
            && next_payment != PaymentStatus::Paid
        {
            // A confirmed order stays paid unless the same command moves it
            return Err(OrderError::StateConflict(
                ErrorCode::PaymentRequired,
                format!(
                    "confirmed order {} cannot change payment to {}",
                    snapshot.order_id, next_payment
                ),
            ));
        }

        if let Some(next) = self.change.order_status {
            snapshot.order_status = next;
        }
        snapshot.payment_status = next_payment;
        snapshot.updated_by = Some(ctx.actor.id.clone());

        Ok(OrderChangeKind::StatusChanged)
    }
}

/// Apply the transition table when strict transitions are enabled
pub(crate) fn ensure_transition(
    snapshot: &OrderSnapshot,
    next: OrderStatus,
    ctx: &CommandContext<'_>,
) -> Result<(), OrderError> {
    if ctx.strict_status_transitions && !snapshot.order_status.can_transition_to(next) {
        tracing::warn!(
            order_id = %snapshot.order_id,
            from = %snapshot.order_status,
            to = %next,
            "Rejected status transition"
        );
        return Err(OrderError::StateConflict(
            ErrorCode::InvalidStatusTransition,
            format!(
                "order {} cannot move from {} to {}",
                snapshot.order_id, snapshot.order_status, next
            ),
        ));
    }
    Ok(())
}
