//! Order domain types.
//!
//! An order is a denormalized snapshot of what was bought: each line copies
//! the full product record at purchase time instead of referencing it. The
//! copies are what keeps invoices stable when the catalog changes later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clementine_core::{Currency, Email, OrderId, Price, ProductId, UserId};

use super::Product;

/// Frozen copy of a product at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// The product this was copied from. Kept for traceability only - the
    /// source row may since have been edited or deleted.
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    pub description: String,
    pub image_url: String,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            title: product.title.clone(),
            price: product.price,
            description: product.description.clone(),
            image_url: product.image_url.clone(),
        }
    }
}

/// One purchased line: a product snapshot and how many were bought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: ProductSnapshot,
    pub quantity: u32,
}

impl OrderLine {
    /// Quantity times the unit price captured in the snapshot.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.line_total(self.quantity)
    }
}

/// Who placed an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBuyer {
    /// Buyer email at purchase time (a copy, like the product fields).
    pub email: Email,
    /// The buying account. Invoice access is granted only to this user.
    pub user_id: UserId,
}

/// A completed purchase. Immutable after creation.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub buyer: OrderBuyer,
    /// Purchased lines, in cart order.
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines
            .iter()
            .fold(Price::zero(Currency::default()), |acc, line| {
                acc + line.line_total()
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, title: &str, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_owned(),
            price: Price::new(price.parse().unwrap(), Currency::USD),
            description: format!("{title} description"),
            image_url: format!("/images/{id}.png"),
            owner_id: UserId::new(1),
        }
    }

    #[test]
    fn test_snapshot_copies_all_fields() {
        let source = product(7, "Teapot", "24.99");
        let snapshot = ProductSnapshot::from(&source);

        assert_eq!(snapshot.product_id, source.id);
        assert_eq!(snapshot.title, source.title);
        assert_eq!(snapshot.price, source.price);
        assert_eq!(snapshot.description, source.description);
        assert_eq!(snapshot.image_url, source.image_url);
    }

    #[test]
    fn test_snapshot_survives_source_mutation() {
        // The snapshot owns its data: editing (or dropping) the source
        // product afterwards must not be observable through the order line.
        let mut source = product(7, "Teapot", "24.99");
        let line = OrderLine {
            product: ProductSnapshot::from(&source),
            quantity: 2,
        };

        source.title = "Renamed teapot".to_owned();
        source.price = Price::new("99".parse().unwrap(), Currency::USD);
        drop(source);

        assert_eq!(line.product.title, "Teapot");
        assert_eq!(line.product.price.to_string(), "$24.99");
        assert_eq!(line.line_total().to_string(), "$49.98");
    }

    #[test]
    fn test_order_total() {
        let order = Order {
            id: OrderId::new(1),
            buyer: OrderBuyer {
                email: Email::parse("shopper@example.com").unwrap(),
                user_id: UserId::new(1),
            },
            lines: vec![
                OrderLine {
                    product: ProductSnapshot::from(&product(1, "First", "10")),
                    quantity: 2,
                },
                OrderLine {
                    product: ProductSnapshot::from(&product(2, "Second", "5")),
                    quantity: 1,
                },
            ],
            created_at: Utc::now(),
        };

        assert_eq!(order.total().to_string(), "$25.00");
    }

    #[test]
    fn test_empty_order_total_is_zero() {
        let order = Order {
            id: OrderId::new(1),
            buyer: OrderBuyer {
                email: Email::parse("shopper@example.com").unwrap(),
                user_id: UserId::new(1),
            },
            lines: Vec::new(),
            created_at: Utc::now(),
        };

        assert_eq!(order.total().to_string(), "$0.00");
    }

    #[test]
    fn test_order_line_serde_roundtrip() {
        let line = OrderLine {
            product: ProductSnapshot::from(&product(3, "Mug", "8.50")),
            quantity: 4,
        };

        let json = serde_json::to_string(&line).unwrap();
        let back: OrderLine = serde_json::from_str(&json).unwrap();
        assert_eq!(back, line);
    }
}
