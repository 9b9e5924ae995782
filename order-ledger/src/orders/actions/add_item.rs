//! AddItem command handler
//!
//! Appends a catalog-resolved line item. The manager looks the product up
//! before opening the write transaction and hands the frozen snapshot to
//! this action.

use crate::order_money::{clamp_percentage, validate_new_quantity, validate_price};
use crate::orders::traits::{CommandContext, CommandHandler, OrderError};
use shared::models::CatalogProduct;
use shared::order::{LineItem, OrderChangeKind, OrderSnapshot, ProductDetails};

/// AddItem action
#[derive(Debug, Clone)]
pub struct AddItemAction {
    pub item: LineItem,
}

impl CommandHandler for AddItemAction {
    fn execute(
        &self,
        snapshot: &mut OrderSnapshot,
        _ctx: &CommandContext<'_>,
    ) -> Result<OrderChangeKind, OrderError> {
        validate_new_quantity(self.item.quantity)?;
        validate_price(self.item.price)?;

        let mut item = self.item.clone();
        item.gst_percentage = clamp_percentage(item.gst_percentage, "gst_percentage")?;
        snapshot.items.push(item);

        Ok(OrderChangeKind::ItemsChanged)
    }
}

/// Freeze a catalog product (or one of its alternates) into a new line item
///
/// `alternate_index` selects from `alternate_medicines`; out of range is
/// `AlternateNotFound`. Money fields are filled in by the next recalculation.
pub fn snapshot_line_item(
    product: &CatalogProduct,
    quantity: i32,
    gst_percentage: f64,
    alternate_index: Option<usize>,
) -> Result<LineItem, OrderError> {
    validate_new_quantity(quantity)?;
    let gst_percentage = clamp_percentage(gst_percentage, "gst_percentage")?;

    let (price, details) = match alternate_index {
        Some(index) => {
            let alt = product
                .alternate(index)
                .ok_or_else(|| OrderError::AlternateNotFound {
                    product_id: product.id.clone(),
                    index,
                })?;
            (
                alt.price,
                ProductDetails {
                    drug_name: alt.name.clone(),
                    manufacturer: alt.manufacturer.clone(),
                    size: alt.size.clone(),
                    category: product.category.clone(),
                    salt: product.salt.clone(),
                    image_url: alt.image_url.clone().or_else(|| product.image_url.clone()),
                    mrp: alt.mrp,
                    margin: alt.mrp - alt.price,
                },
            )
        }
        None => (
            product.price,
            ProductDetails {
                drug_name: product.drug_name.clone(),
                manufacturer: product.manufacturer.clone(),
                size: product.size.clone(),
                category: product.category.clone(),
                salt: product.salt.clone(),
                image_url: product.image_url.clone(),
                mrp: product.mrp,
                margin: product.mrp - product.price,
            },
        ),
    };
    validate_price(price)?;

    Ok(LineItem {
        item_id: shared::util::new_id(),
        product_id: product.id.clone(),
        quantity,
        price,
        gst_percentage,
        gst_amount: 0.0,
        line_total: 0.0,
        product_details: details,
        is_alternate: alternate_index.is_some(),
        alternate_index,
    })
}
