//! RecordInvoice command handler
//!
//! Stores the reference of an already uploaded invoice. The manager only
//! runs this after the upload succeeded.

use crate::orders::traits::{CommandContext, CommandHandler, OrderError};
use shared::order::{OrderChangeKind, OrderSnapshot, StoredFile};

/// RecordInvoice action
#[derive(Debug, Clone)]
pub struct RecordInvoiceAction {
    pub file: StoredFile,
}

impl CommandHandler for RecordInvoiceAction {
    fn execute(
        &self,
        snapshot: &mut OrderSnapshot,
        ctx: &CommandContext<'_>,
    ) -> Result<OrderChangeKind, OrderError> {
        snapshot.invoice = Some(self.file.clone());
        snapshot.updated_by = Some(ctx.actor.id.clone());
        Ok(OrderChangeKind::InvoiceGenerated)
    }
}
