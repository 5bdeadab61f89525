//! Product domain type.

use clementine_core::{Price, ProductId, UserId};

/// A catalog product.
///
/// Orders never reference these rows - they copy the fields they need into
/// a [`super::ProductSnapshot`] at purchase time, so a product can be edited
/// or deleted without disturbing past orders.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Long-form description.
    pub description: String,
    /// Public path of the product image (e.g. `/images/abc123.png`).
    pub image_url: String,
    /// The user who listed this product.
    pub owner_id: UserId,
}
