//! Stripe Checkout client.
//!
//! Talks to the Checkout Sessions REST endpoint directly over reqwest; the
//! session is created server-side and the shopper is handed the hosted
//! payment page URL. Success and cancel URLs are plain redirect targets
//! back on this service.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::config::StripeConfig;

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Errors that can occur when talking to the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A line item amount did not fit the provider's integer minor units.
    #[error("unrepresentable amount for line item: {0}")]
    BadAmount(String),
}

/// One line of a checkout session, in provider terms: minor currency units
/// and a plain quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLineItem {
    pub name: String,
    pub description: String,
    /// Unit amount in minor currency units (price × 100).
    pub unit_amount: i64,
    /// Lowercase ISO currency code (e.g. "usd").
    pub currency: &'static str,
    pub quantity: u32,
}

/// A created checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Provider session ID.
    pub id: String,
    /// Hosted payment page the shopper is redirected to.
    pub url: String,
}

/// Stripe Checkout API client.
#[derive(Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    secret_key: SecretString,
}

impl PaymentClient {
    /// Create a new payment client.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: config.secret_key.clone(),
        }
    }

    /// Create a checkout session for the given line items.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if the request fails or the provider rejects
    /// the session.
    pub async fn create_checkout_session(
        &self,
        line_items: &[PaymentLineItem],
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let params = session_params(line_items, success_url, cancel_url);

        let response = self
            .client
            .post(format!("{BASE_URL}/checkout/sessions"))
            .basic_auth(self.secret_key.expose_secret(), None::<&str>)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<CheckoutSession>().await?)
    }
}

/// Build the form-encoded parameter list for a checkout session request.
///
/// Stripe's form encoding addresses nested fields with bracketed indices,
/// e.g. `line_items[0][price_data][unit_amount]`.
fn session_params(
    line_items: &[PaymentLineItem],
    success_url: &str,
    cancel_url: &str,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_owned(), "payment".to_owned()),
        ("success_url".to_owned(), success_url.to_owned()),
        ("cancel_url".to_owned(), cancel_url.to_owned()),
    ];

    for (i, item) in line_items.iter().enumerate() {
        params.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        params.push((
            format!("line_items[{i}][price_data][currency]"),
            item.currency.to_owned(),
        ));
        params.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        params.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            item.name.clone(),
        ));
        params.push((
            format!("line_items[{i}][price_data][product_data][description]"),
            item.description.clone(),
        ));
    }

    params
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_params_layout() {
        let items = vec![
            PaymentLineItem {
                name: "Teapot".to_owned(),
                description: "A teapot".to_owned(),
                unit_amount: 1000,
                currency: "usd",
                quantity: 2,
            },
            PaymentLineItem {
                name: "Mug".to_owned(),
                description: "A mug".to_owned(),
                unit_amount: 500,
                currency: "usd",
                quantity: 1,
            },
        ];

        let params = session_params(&items, "https://shop/checkout/success", "https://shop/checkout/cancel");

        assert!(params.contains(&("mode".to_owned(), "payment".to_owned())));
        assert!(params.contains(&(
            "success_url".to_owned(),
            "https://shop/checkout/success".to_owned()
        )));
        assert!(params.contains(&(
            "line_items[0][price_data][unit_amount]".to_owned(),
            "1000".to_owned()
        )));
        assert!(params.contains(&("line_items[0][quantity]".to_owned(), "2".to_owned())));
        assert!(params.contains(&(
            "line_items[1][price_data][product_data][name]".to_owned(),
            "Mug".to_owned()
        )));
        // 3 session-level params + 5 per line item
        assert_eq!(params.len(), 3 + 2 * 5);
    }
}
