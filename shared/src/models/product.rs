//! Catalog Product Model

use serde::{Deserialize, Serialize};

/// Catalog product as returned by the catalog lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogProduct {
    pub id: String,
    pub drug_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub salt: Option<String>,
    /// Selling price
    pub price: f64,
    /// Maximum retail price
    pub mrp: f64,
    /// Cheaper substitutes, in catalog order
    #[serde(default)]
    pub alternate_medicines: Vec<AlternateMedicine>,
}

/// Alternate (generic) medicine variant of a base product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlternateMedicine {
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    pub price: f64,
    pub mrp: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CatalogProduct {
    /// Alternate at `index`, if any
    pub fn alternate(&self, index: usize) -> Option<&AlternateMedicine> {
        self.alternate_medicines.get(index)
    }
}
