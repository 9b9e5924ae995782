//! DeleteItem command handler

use crate::orders::traits::{CommandContext, CommandHandler, OrderError};
use shared::order::{OrderChangeKind, OrderSnapshot};

/// DeleteItem action
#[derive(Debug, Clone)]
pub struct DeleteItemAction {
    pub item_id: String,
}

impl CommandHandler for DeleteItemAction {
    fn execute(
        &self,
        snapshot: &mut OrderSnapshot,
        _ctx: &CommandContext<'_>,
    ) -> Result<OrderChangeKind, OrderError> {
        let idx = snapshot
            .items
            .iter()
            .position(|i| i.item_id == self.item_id)
            .ok_or_else(|| OrderError::ItemNotFound(self.item_id.clone()))?;
        snapshot.items.remove(idx);
        Ok(OrderChangeKind::ItemsChanged)
    }
}
