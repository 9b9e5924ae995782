//! Invoice rendering
//!
//! Turns an order snapshot into a document. The ledger only depends on the
//! [`InvoiceRenderer`] trait; [`TextInvoiceRenderer`] produces a fixed-width
//! plain-text invoice. Production deployments are expected to plug in a PDF
//! renderer (`application/pdf`, `pdf`); the manager stores whatever
//! `content_type` and `file_extension` the renderer reports.

use crate::utils::time::format_display;
use chrono_tz::Tz;
use shared::order::{LineItem, OrderSnapshot};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Nothing to render: {0}")]
    Empty(String),

    #[error("Render failed: {0}")]
    Failed(String),
}

/// Renders an order into invoice bytes
pub trait InvoiceRenderer: Send + Sync {
    fn render(&self, order: &OrderSnapshot) -> Result<Vec<u8>, RenderError>;

    /// MIME type of the rendered document
    fn content_type(&self) -> &'static str;

    /// File extension without the dot
    fn file_extension(&self) -> &'static str;
}

/// Plain-text invoice
///
/// Meant for development, tests and receipt printers; customer-facing
/// invoices should come from a PDF implementation of [`InvoiceRenderer`].
/// Common widths: 48 for receipt paper, 80 for a terminal or A4 text page.
pub struct TextInvoiceRenderer {
    width: usize,
    timezone: Tz,
    seller: String,
}

impl TextInvoiceRenderer {
    pub fn new(width: usize, timezone: Tz) -> Self {
        Self {
            width: width.max(40),
            timezone,
            seller: "Pharmacy".to_string(),
        }
    }

    pub fn with_seller(mut self, seller: impl Into<String>) -> Self {
        self.seller = seller.into();
        self
    }

    fn render_header(&self, out: &mut String, order: &OrderSnapshot) {
        push_centered(out, &self.seller, self.width);
        push_centered(out, "TAX INVOICE", self.width);
        push_sep(out, '=', self.width);

        push_pair(out, "Invoice No:", &order.order_number, self.width);
        push_pair(
            out,
            "Date:",
            &format_display(order.created_at, self.timezone),
            self.width,
        );
        push_pair(out, "Status:", order.order_status.as_str(), self.width);
        push_pair(out, "Payment:", order.payment_status.as_str(), self.width);

        if let Some(address) = &order.address {
            out.push_str("Ship to:\n");
            out.push_str(&format!("  {}\n", address.street));
            out.push_str(&format!(
                "  {}, {} {}\n",
                address.city, address.state, address.zip_code
            ));
        }
        push_sep(out, '=', self.width);
    }

    fn render_items(&self, out: &mut String, items: &[LineItem]) {
        for (idx, item) in items.iter().enumerate() {
            let mut name = item.product_details.drug_name.clone();
            if let Some(size) = &item.product_details.size {
                name.push_str(&format!(" ({})", size));
            }
            if item.is_alternate {
                name.push_str(" [alt]");
            }
            out.push_str(&format!("{:>2}. {}\n", idx + 1, name));

            let qty = format!("    {} x {:.2}", item.quantity, item.price);
            push_pair(out, &qty, &format!("{:.2}", item.line_total), self.width);
            if item.gst_percentage > 0.0 {
                push_pair(
                    out,
                    &format!("    GST {}%", item.gst_percentage),
                    &format!("{:.2}", item.gst_amount),
                    self.width,
                );
            }
        }
        push_sep(out, '-', self.width);
    }

    fn render_footer(&self, out: &mut String, order: &OrderSnapshot) {
        push_pair(out, "Subtotal", &format!("{:.2}", order.subtotal), self.width);
        push_pair(out, "GST", &format!("{:.2}", order.gst_total), self.width);
        if order.discount_amount > 0.0 {
            push_pair(
                out,
                &format!("Discount ({}%)", order.discount_percentage),
                &format!("-{:.2}", order.discount_amount),
                self.width,
            );
        }
        push_pair(
            out,
            "Delivery",
            &format!("{:.2}", order.delivery_charge),
            self.width,
        );
        push_sep(out, '=', self.width);
        push_pair(out, "TOTAL", &format!("{:.2}", order.final_total), self.width);
    }
}

impl InvoiceRenderer for TextInvoiceRenderer {
    fn render(&self, order: &OrderSnapshot) -> Result<Vec<u8>, RenderError> {
        if order.order_number.is_empty() {
            return Err(RenderError::Empty(format!(
                "order {} has no order number",
                order.order_id
            )));
        }

        let mut out = String::new();
        self.render_header(&mut out, order);
        self.render_items(&mut out, &order.items);
        self.render_footer(&mut out, order);
        Ok(out.into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

fn push_sep(out: &mut String, ch: char, width: usize) {
    out.extend(std::iter::repeat_n(ch, width));
    out.push('\n');
}

fn push_centered(out: &mut String, text: &str, width: usize) {
    let len = text.chars().count();
    let pad = width.saturating_sub(len) / 2;
    out.extend(std::iter::repeat_n(' ', pad));
    out.push_str(text);
    out.push('\n');
}

/// Left label, right-aligned value
fn push_pair(out: &mut String, left: &str, right: &str, width: usize) {
    let used = left.chars().count() + right.chars().count();
    let gap = width.saturating_sub(used).max(1);
    out.push_str(left);
    out.extend(std::iter::repeat_n(' ', gap));
    out.push_str(right);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_money::{recalculate_totals, DiscountBase};
    use shared::order::{OrderSource, ProductDetails};

    fn sample_order() -> OrderSnapshot {
        let mut order =
            OrderSnapshot::new("o1".to_string(), "u1".to_string(), OrderSource::Checkout);
        order.order_number = "ORD(O1)(191026)(000003)".to_string();
        order.created_at = 1_792_400_000_000;
        order.discount_percentage = 10.0;
        order.delivery_charge = 20.0;
        order.items = vec![LineItem {
            item_id: "i1".to_string(),
            product_id: "p1".to_string(),
            quantity: 2,
            price: 100.0,
            gst_percentage: 5.0,
            gst_amount: 0.0,
            line_total: 0.0,
            product_details: ProductDetails {
                drug_name: "Amoxicillin".to_string(),
                size: Some("10 capsules".to_string()),
                mrp: 120.0,
                margin: 20.0,
                ..Default::default()
            },
            is_alternate: false,
            alternate_index: None,
        }];
        recalculate_totals(&mut order, DiscountBase::SubtotalWithGst);
        order
    }

    #[test]
    fn test_render_contains_totals() {
        let renderer = TextInvoiceRenderer::new(48, chrono_tz::Asia::Kolkata);
        let bytes = renderer.render(&sample_order()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("ORD(O1)(191026)(000003)"));
        assert!(text.contains("Amoxicillin (10 capsules)"));
        assert!(text.contains("200.00"));
        assert!(text.contains("-21.00"));
        assert!(text.lines().last().unwrap().ends_with("209.00"));
        assert!(text.lines().all(|l| l.chars().count() <= 48));
    }

    #[test]
    fn test_render_requires_order_number() {
        let renderer = TextInvoiceRenderer::new(48, chrono_tz::Asia::Kolkata);
        let mut order = sample_order();
        order.order_number.clear();
        assert!(matches!(renderer.render(&order), Err(RenderError::Empty(_))));
    }

    #[test]
    fn test_reports_plain_text_format() {
        let renderer = TextInvoiceRenderer::new(80, chrono_tz::UTC);
        assert_eq!(renderer.content_type(), "text/plain");
        assert_eq!(renderer.file_extension(), "txt");
    }
}
