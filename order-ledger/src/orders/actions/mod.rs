//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific order mutation.

use crate::orders::traits::{CommandContext, CommandHandler, OrderError};
use shared::order::{OrderChangeKind, OrderSnapshot};

mod add_item;
mod attach_proof;
mod confirm_payment;
mod delete_item;
mod record_invoice;
mod set_pricing;
mod set_status;
mod update_item;

pub use add_item::{snapshot_line_item, AddItemAction};
pub use attach_proof::AttachProofAction;
pub(crate) use attach_proof::ensure_can_attach;
pub use confirm_payment::ConfirmPaymentAction;
pub use delete_item::DeleteItemAction;
pub use record_invoice::RecordInvoiceAction;
pub use set_pricing::{SetDeliveryChargeAction, SetDiscountAction};
pub use set_status::SetStatusAction;
pub use update_item::UpdateItemAction;

/// CommandAction enum - dispatches to concrete action implementations
#[derive(Debug, Clone)]
pub enum CommandAction {
    AddItem(AddItemAction),
    UpdateItem(UpdateItemAction),
    DeleteItem(DeleteItemAction),
    SetDiscount(SetDiscountAction),
    SetDeliveryCharge(SetDeliveryChargeAction),
    SetStatus(SetStatusAction),
    AttachProof(AttachProofAction),
    RecordInvoice(RecordInvoiceAction),
    ConfirmPayment(ConfirmPaymentAction),
}

impl CommandAction {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            CommandAction::AddItem(_) => "add_item",
            CommandAction::UpdateItem(_) => "update_item",
            CommandAction::DeleteItem(_) => "delete_item",
            CommandAction::SetDiscount(_) => "set_discount",
            CommandAction::SetDeliveryCharge(_) => "set_delivery_charge",
            CommandAction::SetStatus(_) => "set_status",
            CommandAction::AttachProof(_) => "attach_proof",
            CommandAction::RecordInvoice(_) => "record_invoice",
            CommandAction::ConfirmPayment(_) => "confirm_payment",
        }
    }
}

impl CommandHandler for CommandAction {
    fn execute(
        &self,
        snapshot: &mut OrderSnapshot,
        ctx: &CommandContext<'_>,
    ) -> Result<OrderChangeKind, OrderError> {
        match self {
            CommandAction::AddItem(action) => action.execute(snapshot, ctx),
            CommandAction::UpdateItem(action) => action.execute(snapshot, ctx),
            CommandAction::DeleteItem(action) => action.execute(snapshot, ctx),
            CommandAction::SetDiscount(action) => action.execute(snapshot, ctx),
            CommandAction::SetDeliveryCharge(action) => action.execute(snapshot, ctx),
            CommandAction::SetStatus(action) => action.execute(snapshot, ctx),
            CommandAction::AttachProof(action) => action.execute(snapshot, ctx),
            CommandAction::RecordInvoice(action) => action.execute(snapshot, ctx),
            CommandAction::ConfirmPayment(action) => action.execute(snapshot, ctx),
        }
    }
}
