//! Order repository.
//!
//! Order lines are a `JSONB` array of product snapshots. Rows are inserted
//! once by the checkout flow and never updated afterwards.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use clementine_core::{Email, OrderId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderBuyer, OrderLine};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    buyer_email: Email,
    buyer_user_id: UserId,
    lines: Json<Vec<OrderLine>>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            buyer: OrderBuyer {
                email: row.buyer_email,
                user_id: row.buyer_user_id,
            },
            lines: row.lines.0,
            created_at: row.created_at,
        }
    }
}

/// Repository for order rows.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        buyer: &OrderBuyer,
        lines: &[OrderLine],
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders (buyer_email, buyer_user_id, lines) VALUES ($1, $2, $3) \
             RETURNING id, buyer_email, buyer_user_id, lines, created_at",
        )
        .bind(&buyer.email)
        .bind(buyer.user_id)
        .bind(Json(lines))
        .fetch_one(self.pool)
        .await?;

        Ok(Order::from(row))
    }

    /// All orders placed by one buyer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_buyer(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, buyer_email, buyer_user_id, lines, created_at \
             FROM orders WHERE buyer_user_id = $1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, buyer_email, buyer_user_id, lines, created_at \
             FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }
}
