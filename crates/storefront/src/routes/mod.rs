//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Shop front (paginated)
//! GET  /health                  - Health check
//!
//! # Catalog
//! GET  /products                - Product listing (paginated)
//! GET  /products/{id}           - Product detail
//!
//! # Cart (requires login)
//! GET  /cart                    - Cart page
//! POST /cart                    - Add product to cart
//! POST /cart/delete-item        - Remove product from cart
//!
//! # Checkout (requires login)
//! GET  /checkout                - Checkout page + payment session
//! GET  /checkout/success        - Payment success redirect target
//! GET  /checkout/cancel         - Payment cancel redirect target
//!
//! # Orders (requires login)
//! GET  /orders                  - Order history
//! GET  /orders/{id}/invoice     - PDF invoice
//!
//! # Auth
//! GET  /signup                  - Signup page
//! POST /signup                  - Signup action
//! GET  /login                   - Login page
//! POST /login                   - Login action
//! POST /logout                  - Logout action
//! GET  /reset                   - Forgot-password page
//! POST /reset                   - Send reset link
//! GET  /reset/{token}           - New-password page
//! POST /new-password            - Set new password
//!
//! # Product management (requires login)
//! GET  /admin/products          - Own listings
//! GET  /admin/add-product       - Add form
//! POST /admin/add-product       - Add action (multipart)
//! GET  /admin/edit-product/{id} - Edit form
//! POST /admin/edit-product      - Edit action (multipart)
//! POST /admin/delete-product    - Delete action
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/reset", get(auth::reset_page).post(auth::reset))
        .route("/reset/{token}", get(auth::new_password_page))
        .route("/new-password", post(auth::new_password))
}

/// Create the cart and checkout routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show).post(cart::add))
        .route("/cart/delete-item", post(cart::remove))
        .route("/checkout", get(checkout::show))
        .route("/checkout/success", get(checkout::success))
        .route("/checkout/cancel", get(checkout::cancel))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::index))
        .route("/orders/{id}/invoice", get(orders::invoice))
}

/// Create the product management router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin::products))
        .route(
            "/add-product",
            get(admin::add_product_page).post(admin::add_product),
        )
        .route("/edit-product/{id}", get(admin::edit_product_page))
        .route("/edit-product", post(admin::edit_product))
        .route("/delete-product", post(admin::delete_product))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::show))
        .merge(cart_routes())
        .merge(order_routes())
        .merge(auth_routes())
        .nest("/admin", admin_routes())
}

/// 404 page template.
#[derive(Template, WebTemplate)]
#[template(path = "error/not_found.html")]
struct NotFoundTemplate {
    logged_in: bool,
}

/// Fallback handler for unknown paths.
pub async fn not_found(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            logged_in: user.is_some(),
        },
    )
}
