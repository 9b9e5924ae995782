//! Cart Model

use serde::{Deserialize, Serialize};

/// Which variant of a product the customer picked
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// The base product
    #[default]
    Original,
    /// The first alternate medicine
    Recommended,
}

impl Selection {
    /// Alternate index implied by this selection
    pub fn alternate_index(&self) -> Option<usize> {
        match self {
            Selection::Original => None,
            Selection::Recommended => Some(0),
        }
    }
}

/// One line in a user's cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i32,
    #[serde(default)]
    pub selection: Selection,
}

/// A user's cart, cleared when an order is placed or paid
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub updated_at: i64,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
