//! User repository.
//!
//! The cart is a `JSONB` column on the user row and is always written as a
//! whole. That gives the embedded-document semantics the cart service
//! relies on: one atomic write per mutation, last-write-wins between
//! concurrent requests for the same user.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use clementine_core::{Email, UserId};

use super::RepositoryError;
use crate::models::{CartItem, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: Email,
    cart: Json<Vec<CartItem>>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            cart: row.cart.0,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserWithPasswordRow {
    id: UserId,
    email: Email,
    password_hash: String,
    cart: Json<Vec<CartItem>>,
    created_at: DateTime<Utc>,
}

/// Repository for user rows.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, cart, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Get a user by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, cart, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Create a new user with an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken,
    /// `RepositoryError::Database` for other failures.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email, password_hash, cart) VALUES ($1, $2, '[]'::jsonb) \
             RETURNING id, email, cart, created_at",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(User::from(row))
    }

    /// Get a user together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(
            "SELECT id, email, password_hash, cart, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| {
            let hash = r.password_hash;
            (
                User {
                    id: r.id,
                    email: r.email,
                    cart: r.cart.0,
                    created_at: r.created_at,
                },
                hash,
            )
        }))
    }

    /// Replace the user's cart with `items` (whole-document write).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist,
    /// `RepositoryError::Database` for other failures.
    pub async fn save_cart(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET cart = $1 WHERE id = $2")
            .bind(Json(items))
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Store a password-reset token and its expiry on the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist,
    /// `RepositoryError::Database` for other failures.
    pub async fn set_reset_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET reset_token = $1, reset_token_expires_at = $2 WHERE id = $3",
        )
        .bind(token)
        .bind(expires_at)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Look up the user holding an unexpired reset token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_reset_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, cart, created_at FROM users \
             WHERE reset_token = $1 AND reset_token_expires_at > now()",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Set a new password hash and clear any outstanding reset token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist,
    /// `RepositoryError::Database` for other failures.
    pub async fn update_password(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, reset_token = NULL, \
             reset_token_expires_at = NULL WHERE id = $2",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
