use super::*;
use crate::services::{InMemoryCatalog, TextInvoiceRenderer, UploadError};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared::models::{AlternateMedicine, CartItem, Selection};
use shared::order::{DeliveryAddress, OrderStatus, PaymentStatus};
use std::collections::HashMap;
use std::time::Duration;

// ========================================================================
// Test collaborators
// ========================================================================

/// File store keeping uploads in memory
#[derive(Default)]
struct MemoryFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    fail: bool,
    delay: Option<Duration>,
    /// Storage whose order is bumped mid-upload (simulates a concurrent edit)
    race: Option<(OrderStorage, String)>,
}

impl MemoryFileStore {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    fn stored(&self, destination: &str) -> Option<Vec<u8>> {
        self.files.lock().get(destination).cloned()
    }

    fn len(&self) -> usize {
        self.files.lock().len()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn upload(&self, bytes: Vec<u8>, destination: &str) -> Result<StoredFileRef, UploadError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(UploadError::Rejected("store offline".to_string()));
        }
        crate::services::file_store::validate_upload(&bytes)?;
        if let Some((storage, order_id)) = &self.race {
            bump_revision(storage, order_id);
        }

        let stored = StoredFileRef {
            url: format!("https://files.test/{destination}"),
            storage_id: destination.to_string(),
            content_type: "application/octet-stream".to_string(),
            sha256: crate::services::file_store::calculate_hash(&bytes),
            size: bytes.len(),
        };
        self.files.lock().insert(destination.to_string(), bytes);
        Ok(stored)
    }
}

/// Write the stored order back with a higher revision, bypassing the manager
fn bump_revision(storage: &OrderStorage, order_id: &str) {
    let txn = storage.begin_write().unwrap();
    let mut order = storage.get_order_txn(&txn, order_id).unwrap().unwrap();
    order.revision += 1;
    order.discount_percentage = 5.0;
    storage.store_order(&txn, &order).unwrap();
    txn.commit().unwrap();
}

// ========================================================================
// Harness
// ========================================================================

struct Harness {
    manager: OrdersManager,
    catalog: Arc<InMemoryCatalog>,
    files: Arc<MemoryFileStore>,
}

fn test_config() -> LedgerConfig {
    LedgerConfig {
        upload_timeout_ms: 2_000,
        ..Default::default()
    }
}

fn harness() -> Harness {
    harness_with(test_config(), MemoryFileStore::default())
}

fn harness_with(config: LedgerConfig, files: MemoryFileStore) -> Harness {
    let storage = OrderStorage::open_in_memory().unwrap();
    harness_on(storage, config, files)
}

fn harness_on(storage: OrderStorage, config: LedgerConfig, files: MemoryFileStore) -> Harness {
    let catalog = Arc::new(InMemoryCatalog::with_products(test_products()));
    let files = Arc::new(files);
    let renderer = Arc::new(TextInvoiceRenderer::new(48, config.timezone));
    let manager = OrdersManager::with_storage(
        storage,
        config,
        catalog.clone(),
        files.clone(),
        renderer,
    );
    Harness {
        manager,
        catalog,
        files,
    }
}

fn customer() -> Actor {
    Actor::user("user-1")
}

fn other_customer() -> Actor {
    Actor::user("user-2")
}

fn admin() -> Actor {
    Actor::admin("admin-1")
}

// ========================================================================
// Catalog fixtures
// ========================================================================

fn product(id: &str, name: &str, price: f64, mrp: f64) -> CatalogProduct {
    CatalogProduct {
        id: id.to_string(),
        drug_name: name.to_string(),
        image_url: None,
        size: Some("10 tablets".to_string()),
        manufacturer: Some("Acme Pharma".to_string()),
        category: Some("General".to_string()),
        salt: None,
        price,
        mrp,
        alternate_medicines: vec![],
    }
}

fn test_products() -> Vec<CatalogProduct> {
    let mut with_alt = product("p-alt", "Augmentin 625", 50.0, 60.0);
    with_alt.alternate_medicines = vec![AlternateMedicine {
        name: "Amoxyclav 625".to_string(),
        size: Some("10 tablets".to_string()),
        manufacturer: Some("Generic Labs".to_string()),
        price: 30.0,
        mrp: 45.0,
        image_url: None,
    }];
    vec![
        product("p-a", "Product A", 100.0, 120.0),
        product("p-b", "Product B", 50.0, 55.0),
        with_alt,
    ]
}

// ========================================================================
// Input helpers
// ========================================================================

fn address() -> DeliveryAddress {
    DeliveryAddress {
        street: "12 MG Road".to_string(),
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        zip_code: "560001".to_string(),
    }
}

fn item_input(product_id: &str, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        product_id: product_id.to_string(),
        quantity,
        selection: Selection::Original,
        gst_percentage: None,
    }
}

fn checkout(items: Vec<OrderItemInput>) -> CreateOrderInput {
    CreateOrderInput {
        address: Some(address()),
        items,
        prescription_url: Some("https://files.test/rx/1.jpg".to_string()),
        total_amount: 100.0,
        delivery_charge: 0.0,
    }
}

fn add_input(product_id: &str, quantity: i32, gst_percentage: f64) -> AddItemInput {
    AddItemInput {
        product_id: product_id.to_string(),
        quantity,
        gst_percentage,
        is_alternate: false,
        alternate_index: None,
    }
}

/// Empty prescription order for `customer()`, ready for admin edits
async fn prescription_order(h: &Harness) -> OrderSnapshot {
    h.manager
        .create_from_prescription(
            &admin(),
            CreateFromPrescriptionInput {
                user_id: customer().id,
                prescription_url: "https://files.test/rx/2.jpg".to_string(),
                address: Some(address()),
            },
        )
        .await
        .unwrap()
}

/// A(100 × 2, 5%) + B(50 × 1, 0%)
async fn two_item_order(h: &Harness) -> OrderSnapshot {
    let order = prescription_order(h).await;
    h.manager
        .add_item(&admin(), &order.order_id, add_input("p-a", 2, 5.0), None)
        .await
        .unwrap();
    h.manager
        .add_item(&admin(), &order.order_id, add_input("p-b", 1, 0.0), None)
        .await
        .unwrap()
}

fn assert_total_identity(order: &OrderSnapshot) {
    use crate::order_money::{to_decimal, to_f64};
    let expected = to_decimal(order.subtotal) + to_decimal(order.gst_total)
        - to_decimal(order.discount_amount)
        + to_decimal(order.delivery_charge);
    assert_eq!(
        order.final_total,
        to_f64(expected).max(0.0),
        "final total identity broken for {:?}",
        order.order_id
    );
}

fn processing(h: &Harness, order_id: &str) -> OrderSnapshot {
    h.manager
        .set_status(
            &admin(),
            order_id,
            StatusChange {
                order_status: Some(OrderStatus::Processing),
                payment_status: None,
            },
            None,
        )
        .unwrap()
}

mod test_flows;
