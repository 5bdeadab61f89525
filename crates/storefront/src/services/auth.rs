//! Authentication service.
//!
//! Password signup/login and the reset-token flow. Passwords are hashed
//! with Argon2id; reset tokens are 32 random bytes, hex-encoded, valid for
//! one hour.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;
use thiserror::Error;

use clementine_core::{Email, EmailError, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 5;

/// How long a password-reset token stays valid.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Errors from the authentication flows.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email address does not parse.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The password does not meet requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// The email is already registered.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The reset token is unknown or expired.
    #[error("invalid or expired reset token")]
    InvalidResetToken,

    /// The user does not exist.
    #[error("user not found")]
    UserNotFound,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// A storage operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword`, or
    /// `AuthError::UserAlreadyExists` on invalid input; storage errors
    /// otherwise.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a
    /// wrong password; storage errors otherwise.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Load a user by ID (e.g. from the session).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Begin a password reset: mint a token, store it with its expiry, and
    /// return it for the email link.
    ///
    /// Returns `Ok(None)` when no account has this email, so the form can
    /// say so without this being an error path.
    ///
    /// # Errors
    ///
    /// Returns storage errors; an unparseable email is reported as no
    /// account.
    pub async fn start_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };

        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
        self.users
            .set_reset_token(user.id, &token, expires_at)
            .await?;

        Ok(Some((user, token)))
    }

    /// Look up the user behind an unexpired reset token.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn user_for_reset_token(&self, token: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.get_by_reset_token(token).await?)
    }

    /// Finish a password reset: validate the new password, re-hash it, and
    /// clear the token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if the token is unknown or
    /// expired, `AuthError::WeakPassword` on a bad new password.
    pub async fn complete_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<User, AuthError> {
        let user = self
            .users
            .get_by_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;
        self.users.update_password(user.id, &password_hash).await?;

        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long!"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Mint a 32-byte random token, hex-encoded.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("abcd"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("abcde").is_ok());
    }

    #[test]
    fn test_reset_token_shape() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_reset_token());
    }
}
