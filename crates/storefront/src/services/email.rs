//! Transactional email delivery.
//!
//! SMTP via lettre with Askama HTML + plain-text templates. Delivery is
//! fire-and-forget from the caller's point of view: signup and password
//! reset never fail because the mail could not be sent.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::MultiPart,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use clementine_core::Email;

use crate::config::EmailConfig;

/// HTML template for the signup welcome email.
#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmailHtml<'a> {
    shop_url: &'a str,
}

/// Plain text template for the signup welcome email.
#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeEmailText<'a> {
    shop_url: &'a str,
}

/// HTML template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    reset_url: &'a str,
}

/// Plain text template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    reset_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build the email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// An address did not parse as a mailbox.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for transactional mail.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_owned(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the signup welcome email.
    ///
    /// # Errors
    ///
    /// Returns an error if the message fails to render, build, or send.
    pub async fn send_welcome(&self, to: &Email, shop_url: &str) -> Result<(), EmailError> {
        let html = WelcomeEmailHtml { shop_url }.render()?;
        let text = WelcomeEmailText { shop_url }.render()?;

        self.send(to, "Welcome to Clementine", text, html).await
    }

    /// Send the password-reset link.
    ///
    /// # Errors
    ///
    /// Returns an error if the message fails to render, build, or send.
    pub async fn send_password_reset(
        &self,
        to: &Email,
        reset_url: &str,
    ) -> Result<(), EmailError> {
        let html = PasswordResetEmailHtml { reset_url }.render()?;
        let text = PasswordResetEmailText { reset_url }.render()?;

        self.send(to, "Reset your Clementine password", text, html)
            .await
    }

    async fn send(
        &self,
        to: &Email,
        subject: &str,
        text: String,
        html: String,
    ) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.as_str().to_owned()))?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))?;

        self.mailer.send(message).await?;

        Ok(())
    }
}
