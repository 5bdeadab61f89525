//! Invoice renderer.
//!
//! Lays an order out as a printable PDF: a heading, one line per purchased
//! product (title, quantity, line price), and a closing total. The same
//! bytes go to two sinks - a file under the invoice directory and the HTTP
//! response - with no guarantee between them: a failed disk write is logged
//! by the caller and never blocks the response.

use std::path::{Path, PathBuf};

use printpdf::{BuiltinFont, Mm, PdfDocument};
use thiserror::Error;

use clementine_core::{OrderId, Price};

use crate::models::Order;

/// Errors that can occur while rendering an invoice.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// PDF assembly failed.
    #[error("PDF error: {0}")]
    Pdf(String),
}

/// One printed invoice line.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub title: String,
    pub quantity: u32,
    pub line_total: Price,
}

/// The computed content of an invoice, independent of its rendering.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub order_id: OrderId,
    pub lines: Vec<InvoiceLine>,
    pub total: Price,
}

impl InvoiceDocument {
    /// Compute the invoice for an order from its frozen line snapshots.
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        let lines = order
            .lines
            .iter()
            .map(|line| InvoiceLine {
                title: line.product.title.clone(),
                quantity: line.quantity,
                line_total: line.line_total(),
            })
            .collect();

        Self {
            order_id: order.id,
            lines,
            total: order.total(),
        }
    }

    /// The printed body: exactly one string per purchased product.
    #[must_use]
    pub fn line_strings(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| format!("{} x {} ... {}", line.title, line.quantity, line.line_total))
            .collect()
    }

    /// The printed total line.
    #[must_use]
    pub fn total_string(&self) -> String {
        format!("Total: {}", self.total)
    }
}

/// Render an invoice document to PDF bytes (A4, builtin Helvetica).
///
/// # Errors
///
/// Returns `InvoiceError::Pdf` if PDF assembly fails.
pub fn render_pdf(invoice: &InvoiceDocument) -> Result<Vec<u8>, InvoiceError> {
    let title = format!("Invoice #{}", invoice.order_id);
    let (doc, page, layer) = PdfDocument::new(&title, Mm(210.0), Mm(297.0), "invoice");

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| InvoiceError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| InvoiceError::Pdf(e.to_string()))?;

    let layer = doc.get_page(page).get_layer(layer);

    let mut y = 270.0;
    layer.use_text(&title, 24.0, Mm(20.0), Mm(y), &bold);
    y -= 14.0;

    for line in invoice.line_strings() {
        layer.use_text(line, 12.0, Mm(20.0), Mm(y), &regular);
        y -= 8.0;
    }

    y -= 6.0;
    layer.use_text(invoice.total_string(), 16.0, Mm(20.0), Mm(y), &bold);

    doc.save_to_bytes()
        .map_err(|e| InvoiceError::Pdf(e.to_string()))
}

/// On-disk invoice storage: one `<order_id>.pdf` per order, never rewritten.
#[derive(Clone)]
pub struct InvoiceStore {
    dir: PathBuf,
}

impl InvoiceStore {
    /// Create a store rooted at `dir` (e.g. `invoices/`).
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Path of the invoice file for an order.
    #[must_use]
    pub fn path_for(&self, order_id: OrderId) -> PathBuf {
        self.dir.join(format!("{order_id}.pdf"))
    }

    /// Write the invoice file unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the directory or file cannot be written.
    pub async fn persist_if_absent(
        &self,
        order_id: OrderId,
        bytes: &[u8],
    ) -> std::io::Result<()> {
        let path = self.path_for(order_id);
        if tokio::fs::try_exists(&path).await? {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, bytes).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clementine_core::{Currency, Email, ProductId, UserId};
    use crate::models::{OrderBuyer, OrderLine, ProductSnapshot};

    fn order_with_lines(lines: Vec<(u32, &str)>) -> Order {
        let lines = lines
            .into_iter()
            .enumerate()
            .map(|(i, (quantity, price))| OrderLine {
                product: ProductSnapshot {
                    product_id: ProductId::new(i32::try_from(i).unwrap() + 1),
                    title: format!("Product {}", i + 1),
                    price: Price::new(price.parse().unwrap(), Currency::USD),
                    description: String::new(),
                    image_url: String::new(),
                },
                quantity,
            })
            .collect();

        Order {
            id: OrderId::new(17),
            buyer: OrderBuyer {
                email: Email::parse("shopper@example.com").unwrap(),
                user_id: UserId::new(1),
            },
            lines,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_invoice_total() {
        let invoice = InvoiceDocument::from_order(&order_with_lines(vec![(2, "10"), (1, "5")]));
        assert_eq!(invoice.total.to_string(), "$25.00");
        assert_eq!(invoice.total_string(), "Total: $25.00");
    }

    #[test]
    fn test_one_line_per_product_plus_total() {
        let invoice = InvoiceDocument::from_order(&order_with_lines(vec![(2, "10"), (1, "5")]));

        let lines = invoice.line_strings();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.first().unwrap(), "Product 1 x 2 ... $20.00");
        assert_eq!(lines.get(1).unwrap(), "Product 2 x 1 ... $5.00");
    }

    #[test]
    fn test_render_pdf_produces_pdf_bytes() {
        let invoice = InvoiceDocument::from_order(&order_with_lines(vec![(2, "10")]));
        let bytes = render_pdf(&invoice).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_store_path_is_keyed_by_order_id() {
        let store = InvoiceStore::new(Path::new("invoices"));
        assert_eq!(
            store.path_for(OrderId::new(17)),
            PathBuf::from("invoices/17.pdf")
        );
    }
}
