//! Checkout orchestrator.
//!
//! Turns a cart into a priced line-item list for the payment provider, and
//! on the provider's success redirect turns the same cart into a persisted
//! order. The order is durably saved *before* the cart is cleared: if the
//! second write fails the cart survives and the purchase record is already
//! on disk, so retrying is safe. The two writes are intentionally not a
//! transaction - ordering alone carries the guarantee.

use sqlx::PgPool;
use thiserror::Error;

use clementine_core::{Currency, Price};

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::models::{Order, OrderBuyer, OrderLine, ProductSnapshot, User};
use crate::services::cart::{CartService, ExpandedCartItem};
use crate::services::payment::{CheckoutSession, PaymentClient, PaymentError, PaymentLineItem};

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A storage operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The payment provider rejected the session.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Checkout was requested with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,
}

/// What the checkout page shows: the expanded cart, its total, and the
/// payment session to hand the shopper to.
#[derive(Debug)]
pub struct CheckoutPreview {
    pub items: Vec<ExpandedCartItem>,
    pub total: Price,
    pub session: CheckoutSession,
}

/// Orchestrates cart → payment session → order.
pub struct CheckoutService<'a> {
    cart: CartService<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            cart: CartService::new(pool),
            orders: OrderRepository::new(pool),
        }
    }

    /// Price the user's cart and open a payment session for it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if nothing in the cart prices,
    /// or an error from storage / the payment provider.
    pub async fn build_checkout_session(
        &self,
        payments: &PaymentClient,
        base_url: &str,
        user: &User,
    ) -> Result<CheckoutPreview, CheckoutError> {
        let items = self.cart.expand(user).await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let total = cart_total(&items);
        let line_items = payment_line_items(&items)?;

        let session = payments
            .create_checkout_session(
                &line_items,
                &format!("{base_url}/checkout/success"),
                &format!("{base_url}/checkout/cancel"),
            )
            .await?;

        Ok(CheckoutPreview {
            items,
            total,
            session,
        })
    }

    /// Convert the user's cart into a persisted order, then clear the cart.
    ///
    /// Returns `None` when the cart is already empty, which is what a
    /// replayed success redirect looks like after the cart was cleared -
    /// no second order is created for it. (This is not an idempotency key:
    /// a replay racing the first completion can still record twice; see
    /// DESIGN.md.)
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if either write fails. A failure
    /// after the order insert leaves the cart intact.
    pub async fn complete_checkout(
        &self,
        user: &mut User,
    ) -> Result<Option<Order>, CheckoutError> {
        let items = self.cart.expand(user).await?;
        if items.is_empty() {
            return Ok(None);
        }

        let buyer = OrderBuyer {
            email: user.email.clone(),
            user_id: user.id,
        };
        let lines = snapshot_lines(&items);

        // Order first, cart second. Never the other way around.
        let order = self.orders.create(&buyer, &lines).await?;
        self.cart.clear_cart(user).await?;

        Ok(Some(order))
    }
}

/// Sum of quantity × unit price over the expanded cart.
fn cart_total(items: &[ExpandedCartItem]) -> Price {
    items
        .iter()
        .fold(Price::zero(Currency::default()), |acc, item| {
            acc + item.line_total()
        })
}

/// Provider line items, one per cart line, amounts in minor units.
fn payment_line_items(
    items: &[ExpandedCartItem],
) -> Result<Vec<PaymentLineItem>, PaymentError> {
    items
        .iter()
        .map(|item| {
            let unit_amount = item
                .product
                .price
                .minor_units()
                .ok_or_else(|| PaymentError::BadAmount(item.product.title.clone()))?;

            Ok(PaymentLineItem {
                name: item.product.title.clone(),
                description: item.product.description.clone(),
                unit_amount,
                currency: item.product.price.currency.code(),
                quantity: item.quantity,
            })
        })
        .collect()
}

/// Order lines with full product snapshots, one per cart line.
fn snapshot_lines(items: &[ExpandedCartItem]) -> Vec<OrderLine> {
    items
        .iter()
        .map(|item| OrderLine {
            product: ProductSnapshot::from(&item.product),
            quantity: item.quantity,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clementine_core::{ProductId, UserId};
    use crate::models::Product;

    fn expanded(id: i32, title: &str, price: &str, quantity: u32) -> ExpandedCartItem {
        ExpandedCartItem {
            product: Product {
                id: ProductId::new(id),
                title: title.to_owned(),
                price: Price::new(price.parse().unwrap(), Currency::USD),
                description: format!("{title} description"),
                image_url: format!("/images/{id}.png"),
                owner_id: UserId::new(1),
            },
            quantity,
        }
    }

    #[test]
    fn test_cart_total() {
        let items = vec![expanded(1, "First", "10", 2), expanded(2, "Second", "5", 1)];
        assert_eq!(cart_total(&items).to_string(), "$25.00");
    }

    #[test]
    fn test_cart_total_empty() {
        assert_eq!(cart_total(&[]).to_string(), "$0.00");
    }

    #[test]
    fn test_payment_line_items_use_minor_units() {
        let items = vec![expanded(1, "Teapot", "19.99", 3)];
        let lines = payment_line_items(&items).unwrap();

        assert_eq!(
            lines,
            vec![PaymentLineItem {
                name: "Teapot".to_owned(),
                description: "Teapot description".to_owned(),
                unit_amount: 1999,
                currency: "usd",
                quantity: 3,
            }]
        );
    }

    #[test]
    fn test_snapshot_lines_copy_products() {
        let items = vec![expanded(1, "First", "10", 2), expanded(2, "Second", "5", 1)];
        let lines = snapshot_lines(&items);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines.first().unwrap().product.title, "First");
        assert_eq!(lines.first().unwrap().quantity, 2);
        assert_eq!(lines.first().unwrap().line_total().to_string(), "$20.00");
        assert_eq!(lines.get(1).unwrap().product.product_id, ProductId::new(2));
    }
}
