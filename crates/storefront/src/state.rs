//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::email::EmailService;
use crate::services::invoice::InvoiceStore;
use crate::services::payment::PaymentClient;
use crate::services::uploads::ImageStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the database pool, configuration,
/// and the collaborator clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    payments: PaymentClient,
    mailer: EmailService,
    images: ImageStore,
    invoices: InvoiceStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport cannot be configured.
    pub fn new(
        config: StorefrontConfig,
        pool: PgPool,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let payments = PaymentClient::new(&config.stripe);
        let mailer = EmailService::new(&config.email)?;
        let images = ImageStore::new(&config.upload_dir);
        let invoices = InvoiceStore::new(&config.invoice_dir);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                payments,
                mailer,
                images,
                invoices,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the payment provider client.
    #[must_use]
    pub fn payments(&self) -> &PaymentClient {
        &self.inner.payments
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn mailer(&self) -> &EmailService {
        &self.inner.mailer
    }

    /// Get a reference to the product image store.
    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }

    /// Get a reference to the invoice file store.
    #[must_use]
    pub fn invoices(&self) -> &InvoiceStore {
        &self.inner.invoices
    }
}
