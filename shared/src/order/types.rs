//! Order line items, attachments and command inputs

use crate::models::Selection;
use serde::{Deserialize, Serialize};

// ============================================================================
// Line items
// ============================================================================

/// Product details captured when a line item is added
///
/// Frozen at add-time so later catalog edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProductDetails {
    pub drug_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Salt / composition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub mrp: f64,
    /// mrp - price of the selected variant
    pub margin: f64,
}

/// One priced product entry in an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Stable id within the order
    pub item_id: String,
    /// Base product id, even when an alternate was chosen
    pub product_id: String,
    pub quantity: i32,
    /// Unit price snapshot
    pub price: f64,
    /// Tax rate in percentage (0-100)
    #[serde(default)]
    pub gst_percentage: f64,
    /// price * quantity * gst_percentage / 100 (computed)
    #[serde(default)]
    pub gst_amount: f64,
    /// price * quantity (computed)
    #[serde(default)]
    pub line_total: f64,
    pub product_details: ProductDetails,
    #[serde(default)]
    pub is_alternate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_index: Option<usize>,
}

/// Partial edit of a line item
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_percentage: Option<f64>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.price.is_none() && self.gst_percentage.is_none()
    }
}

// ============================================================================
// Address and attachments
// ============================================================================

/// Delivery address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl DeliveryAddress {
    /// Returns the first blank field name, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zip_code", &self.zip_code),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Reference to an uploaded file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredFile {
    pub url: String,
    /// Identifier in the file store (used to replace or delete)
    pub storage_id: String,
    pub uploaded_at: i64,
}

/// Which proof document is being attached
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    Payment,
    Address,
}

impl ProofKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofKind::Payment => "payment",
            ProofKind::Address => "address",
        }
    }
}

impl std::fmt::Display for ProofKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the order came into existence
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderSource {
    /// Customer checkout from the cart
    #[default]
    Checkout,
    /// Admin-created from an uploaded prescription
    Prescription,
    /// Customer re-bought a previous order
    Reorder,
}

// ============================================================================
// Command inputs
// ============================================================================

/// One requested product in a checkout or reorder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemInput {
    pub product_id: String,
    pub quantity: i32,
    #[serde(default)]
    pub selection: Selection,
    /// Tax rate for checkout lines (reorder applies the configured default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_percentage: Option<f64>,
}

/// Checkout request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateOrderInput {
    #[serde(default)]
    pub address: Option<DeliveryAddress>,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub prescription_url: Option<String>,
    /// Total the client displayed; audit only
    pub total_amount: f64,
    #[serde(default)]
    pub delivery_charge: f64,
}

/// Admin adds a product to an existing order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddItemInput {
    pub product_id: String,
    pub quantity: i32,
    #[serde(default)]
    pub gst_percentage: f64,
    #[serde(default)]
    pub is_alternate: bool,
    #[serde(default)]
    pub alternate_index: Option<usize>,
}

/// Admin status update; either part may be omitted
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_status: Option<super::OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<super::PaymentStatus>,
}

/// Customer re-buys products from a previous order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReorderInput {
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub address: Option<DeliveryAddress>,
}

/// Admin opens an empty order for a customer's prescription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateFromPrescriptionInput {
    pub user_id: String,
    pub prescription_url: String,
    #[serde(default)]
    pub address: Option<DeliveryAddress>,
}

// ============================================================================
// Change notifications
// ============================================================================

/// What kind of mutation produced an [`OrderChange`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderChangeKind {
    Created,
    ItemsChanged,
    PricingChanged,
    StatusChanged,
    ProofAttached,
    InvoiceGenerated,
}

/// Broadcast after every committed mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderChange {
    pub order_id: String,
    pub order_number: String,
    pub revision: u64,
    pub kind: OrderChangeKind,
    pub timestamp: i64,
}
