//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clementine_core::{Email, ProductId, UserId};

/// One line of a user's cart: a weak reference to a product plus a quantity.
///
/// The product is expanded on demand (cart page, checkout); a `CartItem`
/// never embeds product data, so edits to the catalog are always reflected
/// in the cart. Uniqueness invariant: at most one `CartItem` per distinct
/// `product_id` per user, enforced by the cart service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// The referenced product.
    pub product_id: ProductId,
    /// Always at least 1; items at quantity zero are removed, not kept.
    pub quantity: u32,
}

/// A storefront user (domain type).
///
/// The cart is embedded in the user record and persisted as a whole on every
/// mutation - there is no per-item storage and no concurrency token, so two
/// simultaneous edits to the same cart are last-write-wins.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// The user's (unique) email address.
    pub email: Email,
    /// Embedded cart lines, in insertion order.
    pub cart: Vec<CartItem>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
