//! Cart route handlers.
//!
//! Every mutation goes through the cart service and then redirects back to
//! the cart page - no fragments, plain form posts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;

use clementine_core::{Currency, Price, ProductId};

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::auth::AuthService;
use crate::services::cart::{CartService, ExpandedCartItem};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub image_url: String,
}

impl From<&ExpandedCartItem> for CartItemView {
    fn from(item: &ExpandedCartItem) -> Self {
        Self {
            product_id: item.product.id,
            title: item.product.title.clone(),
            quantity: item.quantity,
            price: item.product.price.to_string(),
            line_total: item.line_total().to_string(),
            image_url: item.product.image_url.clone(),
        }
    }
}

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
}

/// Remove-from-cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub logged_in: bool,
}

/// Display the cart page.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;
    let items = CartService::new(state.pool()).expand(&user).await?;

    let subtotal = items
        .iter()
        .fold(Price::zero(Currency::default()), |acc, item| {
            acc + item.line_total()
        });

    Ok(CartShowTemplate {
        items: items.iter().map(CartItemView::from).collect(),
        subtotal: subtotal.to_string(),
        logged_in: true,
    })
}

/// Add one unit of a product to the cart.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<impl IntoResponse> {
    let mut user = AuthService::new(state.pool()).get_user(current.id).await?;

    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(form.product_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    CartService::new(state.pool())
        .add_to_cart(&mut user, &product)
        .await?;

    Ok(Redirect::to("/cart"))
}

/// Remove a product from the cart. Removing something that is not there is
/// fine - the redirect is the same either way.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<impl IntoResponse> {
    let mut user = AuthService::new(state.pool()).get_user(current.id).await?;

    CartService::new(state.pool())
        .remove_from_cart(&mut user, ProductId::new(form.product_id))
        .await?;

    Ok(Redirect::to("/cart"))
}
