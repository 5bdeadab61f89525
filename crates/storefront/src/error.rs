//! Unified request error handling.
//!
//! Handlers return `Result<T, AppError>`. Per the error taxonomy:
//! validation problems never reach this type (forms re-render with field
//! messages), missing resources redirect to the safe default page, and
//! authorization or infrastructure failures end the request on a generic
//! error page - the specific cause is logged and captured to Sentry, not
//! shown.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::email::EmailError;
use crate::services::invoice::InvoiceError;
use crate::services::payment::PaymentError;
use crate::services::uploads::UploadError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment provider operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Email delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Invoice rendering failed.
    #[error("Invoice error: {0}")]
    Invoice(#[from] InvoiceError),

    /// Image upload failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The resource belongs to someone else.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Repository(inner) => Self::Database(inner),
            CheckoutError::Payment(inner) => Self::Payment(inner),
            CheckoutError::EmptyCart => Self::BadRequest("cart is empty".to_owned()),
        }
    }
}

/// Generic error page.
#[derive(Template, WebTemplate)]
#[template(path = "error/error.html")]
struct ErrorTemplate {
    message: &'static str,
    logged_in: bool,
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Payment(_) | Self::Email(_) | Self::Invoice(_)
                | Self::Upload(_) | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture infrastructure failures to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        match &self {
            // Missing product/order: safe default page, not an error screen
            Self::NotFound(what) => {
                tracing::debug!("not found: {what}");
                Redirect::to("/").into_response()
            }
            Self::Auth(
                AuthError::UserNotFound
                | AuthError::InvalidCredentials
                | AuthError::InvalidResetToken,
            ) => Redirect::to("/login").into_response(),
            Self::Forbidden(_) => (
                StatusCode::FORBIDDEN,
                ErrorTemplate {
                    message: "You are not allowed to access this page.",
                    logged_in: false,
                },
            )
                .into_response(),
            Self::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                ErrorTemplate {
                    message: "The request could not be processed.",
                    logged_in: false,
                },
            )
                .into_response(),
            // Everything else is a generic failure; the cause stays in the logs
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorTemplate {
                    message: "Something went wrong. Please try again later.",
                    logged_in: false,
                },
            )
                .into_response(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_not_found_redirects_to_safe_default() {
        assert_eq!(
            status_of(AppError::NotFound("order 7".to_owned())),
            StatusCode::SEE_OTHER
        );
    }

    #[test]
    fn test_forbidden_is_fatal_for_request() {
        assert_eq!(
            status_of(AppError::Forbidden("not your order".to_owned())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_infrastructure_errors_are_generic_500s() {
        assert_eq!(
            status_of(AppError::Internal("boom".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Invoice(InvoiceError::Pdf("bad".to_owned()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request_status() {
        assert_eq!(
            status_of(AppError::BadRequest("nope".to_owned())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_stale_session_redirects_to_login() {
        assert_eq!(
            status_of(AppError::Auth(AuthError::UserNotFound)),
            StatusCode::SEE_OTHER
        );
    }
}
