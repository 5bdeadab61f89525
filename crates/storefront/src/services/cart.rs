//! Cart engine.
//!
//! The only place cart lines are mutated. Each operation rewrites the
//! user's embedded cart in memory and persists it with a single
//! whole-document write; there is no per-item update path and no
//! concurrency token, so concurrent edits are last-write-wins.

use sqlx::PgPool;

use clementine_core::ProductId;

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::models::{CartItem, Product, User};

/// A cart line expanded to its full product record.
#[derive(Debug, Clone)]
pub struct ExpandedCartItem {
    pub product: Product,
    pub quantity: u32,
}

impl ExpandedCartItem {
    /// Quantity times the unit price.
    #[must_use]
    pub fn line_total(&self) -> clementine_core::Price {
        self.product.price.line_total(self.quantity)
    }
}

/// Cart engine operating on a user's embedded cart.
pub struct CartService<'a> {
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Add one unit of `product` to the user's cart.
    ///
    /// If the product is already in the cart its quantity is incremented,
    /// otherwise a new line with quantity 1 is appended. The updated cart
    /// is persisted before returning.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if persisting the cart fails.
    pub async fn add_to_cart(
        &self,
        user: &mut User,
        product: &Product,
    ) -> Result<(), RepositoryError> {
        add_item(&mut user.cart, product.id);
        self.users.save_cart(user.id, &user.cart).await
    }

    /// Remove any line referencing `product_id` from the user's cart.
    ///
    /// Removing a product that is not in the cart is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if persisting the cart fails.
    pub async fn remove_from_cart(
        &self,
        user: &mut User,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        remove_item(&mut user.cart, product_id);
        self.users.save_cart(user.id, &user.cart).await
    }

    /// Empty the user's cart. Called exactly once, right after a checkout
    /// has been persisted as an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if persisting the cart fails.
    pub async fn clear_cart(&self, user: &mut User) -> Result<(), RepositoryError> {
        user.cart.clear();
        self.users.save_cart(user.id, &user.cart).await
    }

    /// Expand the cart's weak product references into full product records.
    ///
    /// Lines whose product has since been deleted are skipped - the weak
    /// reference dangles and the line simply no longer prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the product lookup fails.
    pub async fn expand(&self, user: &User) -> Result<Vec<ExpandedCartItem>, RepositoryError> {
        let ids: Vec<ProductId> = user.cart.iter().map(|item| item.product_id).collect();
        let found = self.products.get_many(&ids).await?;

        Ok(user
            .cart
            .iter()
            .filter_map(|item| {
                found
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(|product| ExpandedCartItem {
                        product: product.clone(),
                        quantity: item.quantity,
                    })
            })
            .collect())
    }
}

/// Increment the line for `product_id`, or append a fresh one at quantity 1.
fn add_item(items: &mut Vec<CartItem>, product_id: ProductId) {
    match items.iter_mut().find(|item| item.product_id == product_id) {
        Some(item) => item.quantity += 1,
        None => items.push(CartItem {
            product_id,
            quantity: 1,
        }),
    }
}

/// Drop every line referencing `product_id`. Idempotent.
fn remove_item(items: &mut Vec<CartItem>, product_id: ProductId) {
    items.retain(|item| item.product_id != product_id);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_same_product_twice_increments_quantity() {
        let mut items = Vec::new();
        add_item(&mut items, ProductId::new(1));
        add_item(&mut items, ProductId::new(1));

        assert_eq!(
            items,
            vec![CartItem {
                product_id: ProductId::new(1),
                quantity: 2
            }]
        );
    }

    #[test]
    fn test_add_distinct_products_appends_in_order() {
        let mut items = Vec::new();
        add_item(&mut items, ProductId::new(2));
        add_item(&mut items, ProductId::new(1));
        add_item(&mut items, ProductId::new(2));

        assert_eq!(
            items,
            vec![
                CartItem {
                    product_id: ProductId::new(2),
                    quantity: 2
                },
                CartItem {
                    product_id: ProductId::new(1),
                    quantity: 1
                },
            ]
        );
    }

    #[test]
    fn test_remove_absent_product_is_a_noop() {
        let mut items = vec![
            CartItem {
                product_id: ProductId::new(1),
                quantity: 3,
            },
            CartItem {
                product_id: ProductId::new(2),
                quantity: 1,
            },
        ];
        let before = items.clone();

        remove_item(&mut items, ProductId::new(99));

        assert_eq!(items, before);
    }

    #[test]
    fn test_remove_drops_matching_line() {
        let mut items = vec![
            CartItem {
                product_id: ProductId::new(1),
                quantity: 3,
            },
            CartItem {
                product_id: ProductId::new(2),
                quantity: 1,
            },
        ];

        remove_item(&mut items, ProductId::new(1));

        assert_eq!(
            items,
            vec![CartItem {
                product_id: ProductId::new(2),
                quantity: 1
            }]
        );
    }

    #[test]
    fn test_clear_empties_any_cart() {
        let mut items = vec![
            CartItem {
                product_id: ProductId::new(1),
                quantity: 3,
            },
            CartItem {
                product_id: ProductId::new(2),
                quantity: 1,
            },
        ];

        items.clear();

        assert!(items.is_empty());
    }
}
