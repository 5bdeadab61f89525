//! Catalog route handlers: shop front and product detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use clementine_core::ProductId;

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::Product;
use crate::state::AppState;

/// Catalog page size.
pub const ITEMS_PER_PAGE: u32 = 6;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub price: String,
    pub description: String,
    pub image_url: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price.to_string(),
            description: product.description.clone(),
            image_url: product.image_url.clone(),
        }
    }
}

/// Pagination state for the catalog pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub last_page: u32,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: u32,
    pub next_page: u32,
}

impl Pagination {
    /// Compute pagination for `total_items` items at `per_page` per page.
    ///
    /// An out-of-range page still renders (empty), with the links pointing
    /// back into range.
    #[must_use]
    pub fn new(current_page: u32, total_items: i64, per_page: u32) -> Self {
        let current_page = current_page.max(1);
        let pages = total_items
            .max(0)
            .div_ceil(i64::from(per_page))
            .clamp(1, i64::from(u32::MAX));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped above
        let last_page = pages as u32;

        Self {
            current_page,
            last_page,
            has_previous: current_page > 1,
            has_next: current_page < last_page,
            previous_page: current_page.saturating_sub(1).max(1),
            next_page: current_page.saturating_add(1).min(last_page),
        }
    }

    /// The `OFFSET` for the current page.
    #[must_use]
    pub fn offset(&self, per_page: u32) -> i64 {
        i64::from(self.current_page - 1) * i64::from(per_page)
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
}

/// Catalog listing template, shared by the shop front and /products.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page_title: &'static str,
    pub products: Vec<ProductView>,
    pub pagination: Pagination,
    pub logged_in: bool,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub logged_in: bool,
}

async fn listing(
    state: &AppState,
    page_title: &'static str,
    query: PaginationQuery,
    logged_in: bool,
) -> Result<ProductsIndexTemplate> {
    let products = ProductRepository::new(state.pool());

    let total_items = products.count().await?;
    let pagination = Pagination::new(query.page.unwrap_or(1), total_items, ITEMS_PER_PAGE);
    let page = products
        .page(i64::from(ITEMS_PER_PAGE), pagination.offset(ITEMS_PER_PAGE))
        .await?;

    Ok(ProductsIndexTemplate {
        page_title,
        products: page.iter().map(ProductView::from).collect(),
        pagination,
        logged_in,
    })
}

/// Shop front page.
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    listing(&state, "Shop", query, user.is_some()).await
}

/// Full catalog listing.
pub async fn list(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    listing(&state, "Products", query, user.is_some()).await
}

/// Product detail page.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductShowTemplate {
        product: ProductView::from(&product),
        logged_in: user.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_first_of_many() {
        let p = Pagination::new(1, 13, 6);
        assert_eq!(p.last_page, 3);
        assert!(!p.has_previous);
        assert!(p.has_next);
        assert_eq!(p.next_page, 2);
        assert_eq!(p.offset(6), 0);
    }

    #[test]
    fn test_pagination_middle_page() {
        let p = Pagination::new(2, 13, 6);
        assert!(p.has_previous);
        assert!(p.has_next);
        assert_eq!(p.previous_page, 1);
        assert_eq!(p.next_page, 3);
        assert_eq!(p.offset(6), 6);
    }

    #[test]
    fn test_pagination_last_page() {
        let p = Pagination::new(3, 13, 6);
        assert!(p.has_previous);
        assert!(!p.has_next);
        assert_eq!(p.next_page, 3);
    }

    #[test]
    fn test_pagination_exact_multiple() {
        let p = Pagination::new(1, 12, 6);
        assert_eq!(p.last_page, 2);
    }

    #[test]
    fn test_pagination_empty_catalog() {
        let p = Pagination::new(1, 0, 6);
        assert_eq!(p.last_page, 1);
        assert!(!p.has_previous);
        assert!(!p.has_next);
    }

    #[test]
    fn test_pagination_clamps_page_zero() {
        let p = Pagination::new(0, 10, 6);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.offset(6), 0);
    }
}
