//! Order snapshot - the persisted state of one order
//!
//! Every money field is derived from `items`, `discount_percentage` and
//! `delivery_charge` by the ledger's pricing calculator. `revision` is
//! bumped on every persisted mutation and is the optimistic concurrency
//! token handed back to callers.

use super::types::{DeliveryAddress, LineItem, OrderSource, StoredFile};
use serde::{Deserialize, Serialize};

/// Fulfillment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    OnHold,
    Processing,
    Confirmed,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
    Failed,
}

impl OrderStatus {
    /// States after which fulfillment is over
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered
                | OrderStatus::Cancelled
                | OrderStatus::Returned
                | OrderStatus::Failed
        )
    }

    /// Transition table used when strict transitions are enabled
    ///
    /// Non-terminal states may move anywhere. A delivered order may only
    /// be returned; cancelled, returned and failed orders are final.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            OrderStatus::Delivered => next == OrderStatus::Returned,
            OrderStatus::Cancelled | OrderStatus::Returned | OrderStatus::Failed => false,
            _ => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::OnHold => "on_hold",
            OrderStatus::Processing => "processing",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
            OrderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status, independent of fulfillment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    PendingVerification,
    Failed,
    Paid,
    Refunded,
    Chargeback,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::PendingVerification => "pending_verification",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Chargeback => "chargeback",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order ID (UUID v4)
    pub order_id: String,
    /// Human-readable number, assigned once at creation
    pub order_number: String,
    /// Purchasing user (immutable)
    pub user_id: String,
    /// Line items in insertion order
    pub items: Vec<LineItem>,
    /// Σ price × quantity
    pub subtotal: f64,
    /// Σ per-item GST
    #[serde(default)]
    pub gst_total: f64,
    /// 0-100
    #[serde(default)]
    pub discount_percentage: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub delivery_charge: f64,
    pub final_total: f64,
    /// Total the client quoted at checkout (audit only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_total: Option<f64>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<DeliveryAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<StoredFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_proof: Option<StoredFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_proof: Option<StoredFile>,
    #[serde(default)]
    pub source: OrderSource,
    /// Last admin who changed the status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Optimistic concurrency version
    pub revision: u64,
}

impl OrderSnapshot {
    /// Create a new empty pending order
    ///
    /// `order_number` is left empty; storage assigns it inside the insert
    /// transaction.
    pub fn new(order_id: String, user_id: String, source: OrderSource) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            order_id,
            order_number: String::new(),
            user_id,
            items: Vec::new(),
            subtotal: 0.0,
            gst_total: 0.0,
            discount_percentage: 0.0,
            discount_amount: 0.0,
            delivery_charge: 0.0,
            final_total: 0.0,
            quoted_total: None,
            order_status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            address: None,
            prescription_url: None,
            invoice: None,
            payment_proof: None,
            address_proof: None,
            source,
            updated_by: None,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    /// Find an item by id
    pub fn find_item(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    /// Find an item by id (mutable)
    pub fn find_item_mut(&mut self, item_id: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.item_id == item_id)
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Content equality ignoring bookkeeping fields
    ///
    /// Used to detect no-op commands so they are not persisted.
    pub fn same_content(&self, other: &OrderSnapshot) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        for s in [&mut a, &mut b] {
            s.updated_at = 0;
            s.revision = 0;
        }
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_defaults() {
        let order = OrderSnapshot::new("o1".to_string(), "u1".to_string(), OrderSource::Checkout);
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.items.is_empty());
        assert_eq!(order.revision, 0);
        assert!(order.order_number.is_empty());
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"out_for_delivery\"");
        let status: PaymentStatus = serde_json::from_str("\"pending_verification\"").unwrap();
        assert_eq!(status, PaymentStatus::PendingVerification);
    }

    #[test]
    fn test_transition_table() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Returned));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_same_content_ignores_revision() {
        let a = OrderSnapshot::new("o1".to_string(), "u1".to_string(), OrderSource::Checkout);
        let mut b = a.clone();
        b.revision = 7;
        b.updated_at += 1000;
        assert!(a.same_content(&b));

        b.discount_percentage = 5.0;
        assert!(!a.same_content(&b));
    }
}
