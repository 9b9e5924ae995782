//! OrdersManager - order lifecycle, pricing and persistence
//!
//! This module handles:
//! - Validation of caller input and permissions
//! - Catalog resolution and file uploads (before any write transaction)
//! - Applying actions to the stored order (inside one redb write transaction)
//! - Order number assignment
//! - Change broadcasting
//!
//! # Mutation Flow
//!
//! ```text
//! mutate(action)
//!     ├─ 1. Begin write transaction
//!     ├─ 2. Load order, check expected revision
//!     ├─ 3. Execute action on a working copy
//!     ├─ 4. Recalculate totals
//!     ├─ 5. Clear the owner's cart (if asked)
//!     ├─ 6. No-op? skip the order write, return stored order
//!     ├─ 7. Bump revision, store
//!     ├─ 8. Commit transaction
//!     └─ 9. Broadcast OrderChange (changed orders only)
//! ```
//!
//! Async collaborators (catalog, file store) are always awaited before the
//! write transaction opens, so no transaction is held across an await.

mod error;
pub use error::*;

use super::actions::{
    ensure_can_attach, snapshot_line_item, AddItemAction, AttachProofAction, CommandAction,
    ConfirmPaymentAction, DeleteItemAction, RecordInvoiceAction, SetDeliveryChargeAction,
    SetDiscountAction, SetStatusAction, UpdateItemAction,
};
use super::storage::{OrderStorage, StorageError};
use super::traits::{CommandContext, CommandHandler};
use crate::core::LedgerConfig;
use crate::order_money::{self, clamp_delivery_charge, require_finite, validate_new_quantity};
use crate::services::{CatalogLookup, FileStore, InvoiceRenderer, StoredFileRef};
use crate::utils::time::{business_date_from_millis, date_key, order_number_date};
use crate::utils::validation::{
    validate_address, validate_prescription_url, validate_required_text, MAX_ID_LEN,
};
use redb::WriteTransaction;
use shared::error::ErrorCode;
use shared::models::{Actor, Cart, CatalogProduct};
use shared::order::{
    AddItemInput, CreateFromPrescriptionInput, CreateOrderInput, ItemChanges, LineItem,
    OrderChange, OrderChangeKind, OrderItemInput, OrderSnapshot, OrderSource, ProofKind,
    ReorderInput, StatusChange, StoredFile,
};
use shared::util::{new_id, now_millis};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Change broadcast channel capacity
const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// A rendered and stored invoice
#[derive(Debug, Clone)]
pub struct GeneratedInvoice {
    pub order: OrderSnapshot,
    pub document: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
}

/// OrdersManager - the order ledger
pub struct OrdersManager {
    storage: OrderStorage,
    change_tx: broadcast::Sender<OrderChange>,
    catalog: Arc<dyn CatalogLookup>,
    files: Arc<dyn FileStore>,
    renderer: Arc<dyn InvoiceRenderer>,
    config: LedgerConfig,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<OrderStorage>")
            .field("change_tx", &"<broadcast::Sender>")
            .field("config", &self.config)
            .finish()
    }
}

impl OrdersManager {
    /// Open the ledger database from `config` and wire the collaborators
    pub fn new(
        config: LedgerConfig,
        catalog: Arc<dyn CatalogLookup>,
        files: Arc<dyn FileStore>,
        renderer: Arc<dyn InvoiceRenderer>,
    ) -> ManagerResult<Self> {
        let storage = OrderStorage::open(config.db_path())?;
        tracing::info!(db = %config.db_path().display(), timezone = %config.timezone, "OrdersManager started");
        Ok(Self::with_storage(storage, config, catalog, files, renderer))
    }

    /// Create an OrdersManager over existing storage
    pub fn with_storage(
        storage: OrderStorage,
        config: LedgerConfig,
        catalog: Arc<dyn CatalogLookup>,
        files: Arc<dyn FileStore>,
        renderer: Arc<dyn InvoiceRenderer>,
    ) -> Self {
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            storage,
            change_tx,
            catalog,
            files,
            renderer,
            config,
        }
    }

    /// Subscribe to committed order changes
    pub fn subscribe(&self) -> broadcast::Receiver<OrderChange> {
        self.change_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ========== Creation ==========

    /// Customer checkout
    ///
    /// Items are priced from the catalog, never from the client. The
    /// client's `total_amount` is kept as `quoted_total` for audit only.
    pub async fn create_order(
        &self,
        actor: &Actor,
        input: CreateOrderInput,
    ) -> ManagerResult<OrderSnapshot> {
        validate_address(input.address.as_ref())?;
        validate_prescription_url(input.prescription_url.as_deref())?;
        validate_item_inputs(&input.items)?;
        require_finite(input.total_amount, "total_amount")?;
        if input.total_amount <= 0.0 {
            return Err(ManagerError::Validation(
                ErrorCode::ValueOutOfRange,
                format!("total_amount must be positive, got {}", input.total_amount),
            ));
        }
        let delivery_charge = clamp_delivery_charge(input.delivery_charge)?;

        let items = self.resolve_items(&input.items, |item| item.gst_percentage.unwrap_or(0.0)).await?;

        let mut snapshot = OrderSnapshot::new(new_id(), actor.id.clone(), OrderSource::Checkout);
        snapshot.items = items;
        snapshot.address = input.address;
        snapshot.prescription_url = input.prescription_url;
        snapshot.delivery_charge = delivery_charge;
        snapshot.quoted_total = Some(input.total_amount);
        order_money::recalculate_totals(&mut snapshot, self.config.discount_base);

        if !order_money::money_eq(snapshot.final_total, input.total_amount) {
            tracing::warn!(
                user_id = %actor.id,
                quoted = input.total_amount,
                computed = snapshot.final_total,
                "Client total differs from computed total"
            );
        }

        self.insert_new_order(snapshot, true)
    }

    /// Admin opens an empty order for a customer's prescription
    pub async fn create_from_prescription(
        &self,
        actor: &Actor,
        input: CreateFromPrescriptionInput,
    ) -> ManagerResult<OrderSnapshot> {
        require_admin(actor)?;
        validate_required_text(&input.user_id, "user_id", MAX_ID_LEN)?;
        validate_prescription_url(Some(&input.prescription_url))?;
        if input.address.is_some() {
            validate_address(input.address.as_ref())?;
        }

        let mut snapshot =
            OrderSnapshot::new(new_id(), input.user_id, OrderSource::Prescription);
        snapshot.prescription_url = Some(input.prescription_url);
        snapshot.address = input.address;
        snapshot.updated_by = Some(actor.id.clone());
        order_money::recalculate_totals(&mut snapshot, self.config.discount_base);

        self.insert_new_order(snapshot, false)
    }

    /// Re-buy products at today's catalog prices
    ///
    /// Every line gets the configured default GST rate. Without an explicit
    /// address the address of the customer's latest addressed order is used.
    pub async fn reorder(&self, actor: &Actor, input: ReorderInput) -> ManagerResult<OrderSnapshot> {
        validate_item_inputs(&input.items)?;
        let address = match input.address {
            Some(address) => {
                validate_address(Some(&address))?;
                Some(address)
            }
            None => self
                .storage
                .list_user_orders(&actor.id)?
                .into_iter()
                .find_map(|o| o.address),
        };

        let gst = self.config.default_gst_percentage;
        let items = self.resolve_items(&input.items, |_| gst).await?;

        let mut snapshot = OrderSnapshot::new(new_id(), actor.id.clone(), OrderSource::Reorder);
        snapshot.items = items;
        snapshot.address = address;
        order_money::recalculate_totals(&mut snapshot, self.config.discount_base);

        self.insert_new_order(snapshot, false)
    }

    // ========== Item editing (admin) ==========

    /// Append a catalog product (or one of its alternates)
    pub async fn add_item(
        &self,
        actor: &Actor,
        order_id: &str,
        input: AddItemInput,
        expected_revision: Option<u64>,
    ) -> ManagerResult<OrderSnapshot> {
        require_admin(actor)?;
        validate_required_text(&input.product_id, "product_id", MAX_ID_LEN)?;
        validate_new_quantity(input.quantity)?;
        // Fail on a missing order before hitting the catalog
        self.load_order(order_id)?;

        let alternate_index = if input.is_alternate {
            Some(input.alternate_index.unwrap_or(0))
        } else {
            None
        };
        let product = self.lookup_product(&input.product_id).await?;
        let item = snapshot_line_item(&product, input.quantity, input.gst_percentage, alternate_index)?;

        self.mutate(
            actor,
            order_id,
            expected_revision,
            CommandAction::AddItem(AddItemAction { item }),
            false,
        )
    }

    pub fn update_item_quantity(
        &self,
        actor: &Actor,
        order_id: &str,
        item_id: &str,
        quantity: i32,
        expected_revision: Option<u64>,
    ) -> ManagerResult<OrderSnapshot> {
        self.update_item(
            actor,
            order_id,
            item_id,
            ItemChanges {
                quantity: Some(quantity),
                ..Default::default()
            },
            expected_revision,
        )
    }

    pub fn update_item(
        &self,
        actor: &Actor,
        order_id: &str,
        item_id: &str,
        changes: ItemChanges,
        expected_revision: Option<u64>,
    ) -> ManagerResult<OrderSnapshot> {
        require_admin(actor)?;
        self.mutate(
            actor,
            order_id,
            expected_revision,
            CommandAction::UpdateItem(UpdateItemAction {
                item_id: item_id.to_string(),
                changes,
            }),
            false,
        )
    }

    pub fn delete_item(
        &self,
        actor: &Actor,
        order_id: &str,
        item_id: &str,
        expected_revision: Option<u64>,
    ) -> ManagerResult<OrderSnapshot> {
        require_admin(actor)?;
        self.mutate(
            actor,
            order_id,
            expected_revision,
            CommandAction::DeleteItem(DeleteItemAction {
                item_id: item_id.to_string(),
            }),
            false,
        )
    }

    // ========== Pricing (admin) ==========

    pub fn set_discount(
        &self,
        actor: &Actor,
        order_id: &str,
        discount_percentage: f64,
        expected_revision: Option<u64>,
    ) -> ManagerResult<OrderSnapshot> {
        require_admin(actor)?;
        self.mutate(
            actor,
            order_id,
            expected_revision,
            CommandAction::SetDiscount(SetDiscountAction { discount_percentage }),
            false,
        )
    }

    pub fn set_delivery_charge(
        &self,
        actor: &Actor,
        order_id: &str,
        delivery_charge: f64,
        expected_revision: Option<u64>,
    ) -> ManagerResult<OrderSnapshot> {
        require_admin(actor)?;
        self.mutate(
            actor,
            order_id,
            expected_revision,
            CommandAction::SetDeliveryCharge(SetDeliveryChargeAction { delivery_charge }),
            false,
        )
    }

    // ========== Status ==========

    pub fn set_status(
        &self,
        actor: &Actor,
        order_id: &str,
        change: StatusChange,
        expected_revision: Option<u64>,
    ) -> ManagerResult<OrderSnapshot> {
        require_admin(actor)?;
        let order = self.mutate(
            actor,
            order_id,
            expected_revision,
            CommandAction::SetStatus(SetStatusAction { change }),
            false,
        )?;
        tracing::info!(
            order_id,
            order_status = %order.order_status,
            payment_status = %order.payment_status,
            updated_by = %actor.id,
            "Order status updated"
        );
        Ok(order)
    }

    /// Owner reports a successful payment; clears the owner's cart
    pub fn confirm_payment(
        &self,
        actor: &Actor,
        order_id: &str,
        payment_id: &str,
        expected_revision: Option<u64>,
    ) -> ManagerResult<OrderSnapshot> {
        let order = self.mutate(
            actor,
            order_id,
            expected_revision,
            CommandAction::ConfirmPayment(ConfirmPaymentAction {
                payment_id: payment_id.to_string(),
            }),
            true,
        )?;
        tracing::info!(order_id, payment_id, "Payment confirmed");
        Ok(order)
    }

    // ========== Attachments ==========

    /// Record an already stored proof document
    pub fn attach_proof(
        &self,
        actor: &Actor,
        order_id: &str,
        kind: ProofKind,
        file: StoredFile,
        expected_revision: Option<u64>,
    ) -> ManagerResult<OrderSnapshot> {
        self.mutate(
            actor,
            order_id,
            expected_revision,
            CommandAction::AttachProof(AttachProofAction { kind, file }),
            false,
        )
    }

    /// Upload a proof document, then attach it
    ///
    /// Ownership and status are checked before the upload starts and again
    /// when the reference is persisted.
    pub async fn upload_proof(
        &self,
        actor: &Actor,
        order_id: &str,
        kind: ProofKind,
        bytes: Vec<u8>,
        file_name: &str,
        expected_revision: Option<u64>,
    ) -> ManagerResult<OrderSnapshot> {
        let order = self.load_order(order_id)?;
        ensure_can_attach(&order, &self.context(actor))?;

        let destination = format!(
            "users/{}/{kind}-proofs/{kind}-{}.{}",
            order.user_id,
            order.order_id,
            file_extension(file_name)
        );
        let stored = self.upload(bytes, &destination).await?;
        tracing::info!(order_id, %kind, url = %stored.url, "Proof uploaded");

        self.attach_proof(
            actor,
            order_id,
            kind,
            stored_file(stored, now_millis()),
            expected_revision,
        )
    }

    /// Render the invoice, upload it and record its URL
    ///
    /// The URL is persisted only if the order is still at the revision that
    /// was rendered; otherwise the call fails with a revision conflict.
    pub async fn generate_invoice(
        &self,
        actor: &Actor,
        order_id: &str,
    ) -> ManagerResult<GeneratedInvoice> {
        require_admin(actor)?;
        let order = self.load_order(order_id)?;
        let rendered_revision = order.revision;

        let document = self.renderer.render(&order)?;
        let file_name = format!("invoice-{}.{}", order.order_id, self.renderer.file_extension());
        let destination = format!("users/{}/invoices/{}", order.user_id, file_name);
        let stored = self.upload(document.clone(), &destination).await?;

        let order = self
            .mutate(
                actor,
                order_id,
                Some(rendered_revision),
                CommandAction::RecordInvoice(RecordInvoiceAction {
                    file: stored_file(stored, now_millis()),
                }),
                false,
            )
            .inspect_err(|e| {
                if matches!(e, ManagerError::RevisionConflict { .. }) {
                    tracing::warn!(order_id, rendered_revision, "Order changed while invoice was rendered");
                }
            })?;

        tracing::info!(order_id, revision = order.revision, "Invoice generated");
        Ok(GeneratedInvoice {
            order,
            document,
            content_type: self.renderer.content_type(),
            file_name,
        })
    }

    // ========== Queries ==========

    /// One order, visible to its owner and to admins
    pub fn get_order(&self, actor: &Actor, order_id: &str) -> ManagerResult<OrderSnapshot> {
        let order = self.load_order(order_id)?;
        ensure_access(actor, &order)?;
        Ok(order)
    }

    pub fn get_order_by_number(
        &self,
        actor: &Actor,
        order_number: &str,
    ) -> ManagerResult<OrderSnapshot> {
        let order_id = self
            .storage
            .find_order_id_by_number(order_number)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_number.to_string()))?;
        self.get_order(actor, &order_id)
    }

    /// Every order, newest first (admin)
    pub fn list_orders(&self, actor: &Actor) -> ManagerResult<Vec<OrderSnapshot>> {
        require_admin(actor)?;
        Ok(self.storage.list_orders()?)
    }

    /// The caller's orders, newest first
    pub fn order_history(&self, actor: &Actor) -> ManagerResult<Vec<OrderSnapshot>> {
        Ok(self.storage.list_user_orders(&actor.id)?)
    }

    /// The caller's most recent order
    pub fn latest_order(&self, actor: &Actor) -> ManagerResult<Option<OrderSnapshot>> {
        Ok(self.storage.list_user_orders(&actor.id)?.into_iter().next())
    }

    // ========== Cart ==========

    pub fn get_cart(&self, actor: &Actor) -> ManagerResult<Cart> {
        Ok(self.storage.get_cart(&actor.id)?)
    }

    /// Replace the caller's cart
    pub fn save_cart(&self, actor: &Actor, mut cart: Cart) -> ManagerResult<Cart> {
        for item in &cart.items {
            validate_required_text(&item.product_id, "product_id", MAX_ID_LEN)?;
            validate_new_quantity(item.quantity)?;
        }
        cart.updated_at = now_millis();
        self.storage.save_cart(&actor.id, &cart)?;
        Ok(cart)
    }

    // ========== Internals ==========

    fn context<'a>(&self, actor: &'a Actor) -> CommandContext<'a> {
        CommandContext {
            actor,
            strict_status_transitions: self.config.strict_status_transitions,
        }
    }

    fn load_order(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    /// Apply one action to a stored order inside a single write transaction
    fn mutate(
        &self,
        actor: &Actor,
        order_id: &str,
        expected_revision: Option<u64>,
        action: CommandAction,
        clear_owner_cart: bool,
    ) -> ManagerResult<OrderSnapshot> {
        let now = now_millis();
        let ctx = self.context(actor);
        tracing::debug!(order_id, action = action.name(), actor = %actor.id, "Processing command");

        let txn = self.storage.begin_write()?;
        let current = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;

        if let Some(expected) = expected_revision
            && expected != current.revision
        {
            return Err(ManagerError::RevisionConflict {
                order_id: order_id.to_string(),
                expected,
                actual: current.revision,
            });
        }

        let mut working = current.clone();
        let kind = action.execute(&mut working, &ctx)?;
        order_money::recalculate_totals(&mut working, self.config.discount_base);

        // The cart is cleared even when the order itself is unchanged
        if clear_owner_cart {
            self.storage.clear_cart_txn(&txn, &current.user_id)?;
        }

        if working.same_content(&current) {
            if clear_owner_cart {
                txn.commit().map_err(StorageError::from)?;
            } else {
                txn.abort().map_err(StorageError::from)?;
            }
            tracing::debug!(order_id, action = action.name(), "Command changed nothing, not persisted");
            return Ok(current);
        }

        working.revision = current.revision + 1;
        working.updated_at = now;
        self.storage.store_order(&txn, &working)?;
        txn.commit().map_err(StorageError::from)?;

        self.broadcast(&working, kind);
        Ok(working)
    }

    /// Assign the order number and insert, all in one write transaction
    fn insert_new_order(
        &self,
        mut snapshot: OrderSnapshot,
        clear_owner_cart: bool,
    ) -> ManagerResult<OrderSnapshot> {
        let now = now_millis();
        snapshot.created_at = now;
        snapshot.updated_at = now;
        snapshot.revision = 1;

        let txn = self.storage.begin_write()?;
        snapshot.order_number = self.next_order_number(&txn, now)?;
        self.storage.insert_order(&txn, &snapshot)?;
        if clear_owner_cart {
            self.storage.clear_cart_txn(&txn, &snapshot.user_id)?;
        }
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = %snapshot.order_id,
            order_number = %snapshot.order_number,
            user_id = %snapshot.user_id,
            source = ?snapshot.source,
            items = snapshot.items.len(),
            final_total = snapshot.final_total,
            "Order created"
        );
        self.broadcast(&snapshot, OrderChangeKind::Created);
        Ok(snapshot)
    }

    /// `{prefix}({type})({DDMMYY})({seq:06})` for the business date of `created_at`
    fn next_order_number(&self, txn: &WriteTransaction, created_at: i64) -> ManagerResult<String> {
        let date = business_date_from_millis(created_at, self.config.timezone);
        let seq = self.storage.next_daily_sequence(txn, &date_key(date))?;
        Ok(format!(
            "{}({})({})({:06})",
            self.config.order_number_prefix,
            self.config.order_type_code,
            order_number_date(date),
            seq
        ))
    }

    fn broadcast(&self, order: &OrderSnapshot, kind: OrderChangeKind) {
        let change = OrderChange {
            order_id: order.order_id.clone(),
            order_number: order.order_number.clone(),
            revision: order.revision,
            kind,
            timestamp: order.updated_at,
        };
        if self.change_tx.send(change).is_err() {
            tracing::trace!("No active change subscribers");
        }
    }

    async fn lookup_product(&self, product_id: &str) -> ManagerResult<CatalogProduct> {
        match tokio::time::timeout(self.config.upload_timeout(), self.catalog.get_product(product_id)).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!(product_id, error = %e, "Catalog lookup failed");
                ManagerError::from(e)
            }),
            Err(_) => {
                tracing::error!(product_id, "Catalog lookup timed out");
                Err(ManagerError::Timeout(format!("catalog lookup for {product_id}")))
            }
        }
    }

    /// Resolve every requested item through the catalog, concurrently
    ///
    /// Unlike `add_item`, a selection never fails on a missing alternate.
    async fn resolve_items(
        &self,
        inputs: &[OrderItemInput],
        gst_for: impl Fn(&OrderItemInput) -> f64,
    ) -> ManagerResult<Vec<LineItem>> {
        let products = futures::future::try_join_all(
            inputs.iter().map(|input| self.lookup_product(&input.product_id)),
        )
        .await?;

        inputs
            .iter()
            .zip(products.iter())
            .map(|(input, product)| {
                // A recommended pick of a product without alternates is the base product
                let alternate_index = input
                    .selection
                    .alternate_index()
                    .filter(|index| *index < product.alternate_medicines.len());
                snapshot_line_item(product, input.quantity, gst_for(input), alternate_index)
                .map_err(ManagerError::from)
            })
            .collect()
    }

    async fn upload(&self, bytes: Vec<u8>, destination: &str) -> ManagerResult<StoredFileRef> {
        match tokio::time::timeout(self.config.upload_timeout(), self.files.upload(bytes, destination)).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!(destination, error = %e, "Upload failed");
                ManagerError::from(e)
            }),
            Err(_) => {
                tracing::error!(destination, timeout_ms = self.config.upload_timeout_ms, "Upload timed out");
                Err(ManagerError::Timeout(format!("upload to {destination}")))
            }
        }
    }
}

fn require_admin(actor: &Actor) -> ManagerResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ManagerError::PermissionDenied(format!(
            "admin role required (caller {})",
            actor.id
        )))
    }
}

fn ensure_access(actor: &Actor, order: &OrderSnapshot) -> ManagerResult<()> {
    if actor.can_access(&order.user_id) {
        Ok(())
    } else {
        Err(ManagerError::PermissionDenied(format!(
            "order {} belongs to another user",
            order.order_id
        )))
    }
}

fn validate_item_inputs(items: &[OrderItemInput]) -> ManagerResult<()> {
    if items.is_empty() {
        return Err(ManagerError::Validation(
            ErrorCode::RequiredField,
            "at least one item is required".to_string(),
        ));
    }
    for item in items {
        validate_required_text(&item.product_id, "product_id", MAX_ID_LEN)?;
        validate_new_quantity(item.quantity)?;
    }
    Ok(())
}

fn stored_file(stored: StoredFileRef, uploaded_at: i64) -> StoredFile {
    StoredFile {
        url: stored.url,
        storage_id: stored.storage_id,
        uploaded_at,
    }
}

/// Lowercased extension of an uploaded file name, `bin` if none
fn file_extension(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests;
