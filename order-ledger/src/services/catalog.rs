//! Catalog lookup
//!
//! The ledger only reads the catalog: it snapshots a product's current
//! price and details into a line item. Product CRUD and search live
//! elsewhere.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::CatalogProduct;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read-only product lookup
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn get_product(&self, product_id: &str) -> Result<CatalogProduct, CatalogError>;
}

/// Catalog held in memory
///
/// Useful for embedding the ledger next to a catalog cache and for tests.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<String, CatalogProduct>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
        let catalog = Self::new();
        for product in products {
            catalog.upsert(product);
        }
        catalog
    }

    /// Insert or replace a product
    pub fn upsert(&self, product: CatalogProduct) {
        self.products.write().insert(product.id.clone(), product);
    }

    pub fn remove(&self, product_id: &str) -> Option<CatalogProduct> {
        self.products.write().remove(product_id)
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn get_product(&self, product_id: &str) -> Result<CatalogProduct, CatalogError> {
        self.products
            .read()
            .get(product_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(product_id.to_string()))
    }
}
