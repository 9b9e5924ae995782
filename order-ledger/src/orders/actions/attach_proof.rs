//! AttachProof command handler
//!
//! The owner attaches a payment or address proof while the order is being
//! processed. A payment proof moves the payment into verification.

use crate::orders::traits::{CommandContext, CommandHandler, OrderError};
use shared::error::ErrorCode;
use shared::order::{
    OrderChangeKind, OrderSnapshot, OrderStatus, PaymentStatus, ProofKind, StoredFile,
};

/// AttachProof action
#[derive(Debug, Clone)]
pub struct AttachProofAction {
    pub kind: ProofKind,
    pub file: StoredFile,
}

impl CommandHandler for AttachProofAction {
    fn execute(
        &self,
        snapshot: &mut OrderSnapshot,
        ctx: &CommandContext<'_>,
    ) -> Result<OrderChangeKind, OrderError> {
        ensure_can_attach(snapshot, ctx)?;

        match self.kind {
            ProofKind::Payment => {
                snapshot.payment_proof = Some(self.file.clone());
                snapshot.payment_status = PaymentStatus::PendingVerification;
            }
            ProofKind::Address => {
                snapshot.address_proof = Some(self.file.clone());
            }
        }

        Ok(OrderChangeKind::ProofAttached)
    }
}

/// Owner-only, `processing`-only
///
/// Also used by the manager before uploading, so a doomed upload never
/// starts.
pub(crate) fn ensure_can_attach(
    snapshot: &OrderSnapshot,
    ctx: &CommandContext<'_>,
) -> Result<(), OrderError> {
    if ctx.actor.id != snapshot.user_id {
        return Err(OrderError::PermissionDenied(format!(
            "only the owner may attach proofs to order {}",
            snapshot.order_id
        )));
    }
    if snapshot.order_status != OrderStatus::Processing {
        return Err(OrderError::StateConflict(
            ErrorCode::OrderNotProcessing,
            format!(
                "proofs can only be attached while processing (order {} is {})",
                snapshot.order_id, snapshot.order_status
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::{admin, ctx, owner, test_order};

    fn file(name: &str) -> StoredFile {
        StoredFile {
            url: format!("https://files.example/{name}"),
            storage_id: name.to_string(),
            uploaded_at: 42,
        }
    }

    fn processing_order() -> OrderSnapshot {
        let mut order = test_order();
        order.order_status = OrderStatus::Processing;
        order
    }

    #[test]
    fn test_payment_proof_sets_pending_verification() {
        let actor = owner();
        let mut order = processing_order();
        AttachProofAction {
            kind: ProofKind::Payment,
            file: file("pay.png"),
        }
        .execute(&mut order, &ctx(&actor))
        .unwrap();

        assert_eq!(order.payment_status, PaymentStatus::PendingVerification);
        assert_eq!(order.payment_proof.unwrap().storage_id, "pay.png");
    }

    #[test]
    fn test_address_proof_keeps_payment_status() {
        let actor = owner();
        let mut order = processing_order();
        AttachProofAction {
            kind: ProofKind::Address,
            file: file("addr.pdf"),
        }
        .execute(&mut order, &ctx(&actor))
        .unwrap();

        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.address_proof.is_some());
        assert!(order.payment_proof.is_none());
    }

    #[test]
    fn test_rejected_unless_processing() {
        let actor = owner();
        let mut order = test_order();
        let result = AttachProofAction {
            kind: ProofKind::Payment,
            file: file("pay.png"),
        }
        .execute(&mut order, &ctx(&actor));
        assert!(matches!(
            result,
            Err(OrderError::StateConflict(ErrorCode::OrderNotProcessing, _))
        ));
        assert!(order.payment_proof.is_none());
    }

    #[test]
    fn test_rejected_for_non_owner() {
        let actor = admin();
        let mut order = processing_order();
        let result = AttachProofAction {
            kind: ProofKind::Address,
            file: file("addr.pdf"),
        }
        .execute(&mut order, &ctx(&actor));
        assert!(matches!(result, Err(OrderError::PermissionDenied(_))));
    }
}
