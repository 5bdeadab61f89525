//! Product repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use clementine_core::{Currency, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::Product;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    price: Decimal,
    description: String,
    image_url: String,
    owner_id: UserId,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            // The catalog is single-currency; prices are stored as bare
            // NUMERIC and the currency is fixed at the type boundary.
            price: Price::new(row.price, Currency::USD),
            description: row.description,
            image_url: row.image_url,
            owner_id: row.owner_id,
        }
    }
}

/// Fields for a new or updated product listing.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub image_url: String,
}

/// Repository for catalog rows.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Total number of products in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// One page of the catalog, oldest listing first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn page(&self, limit: i64, offset: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, title, price, description, image_url, owner_id \
             FROM products ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, title, price, description, image_url, owner_id \
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Fetch several products at once (cart expansion). Missing IDs are
    /// simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw_ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();

        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, title, price, description, image_url, owner_id \
             FROM products WHERE id = ANY($1) ORDER BY id",
        )
        .bind(raw_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// All products listed by one user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, title, price, description, image_url, owner_id \
             FROM products WHERE owner_id = $1 ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Create a new product listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        owner_id: UserId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (title, price, description, image_url, owner_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, title, price, description, image_url, owner_id",
        )
        .bind(&input.title)
        .bind(input.price)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(owner_id)
        .fetch_one(self.pool)
        .await?;

        Ok(Product::from(row))
    }

    /// Update a product. The owner filter makes this a no-op on rows the
    /// user does not own.
    ///
    /// # Returns
    ///
    /// `true` if a row was updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        owner_id: UserId,
        input: &ProductInput,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET title = $1, price = $2, description = $3, image_url = $4 \
             WHERE id = $5 AND owner_id = $6",
        )
        .bind(&input.title)
        .bind(input.price)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(id)
        .bind(owner_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a product owned by `owner_id`.
    ///
    /// # Returns
    ///
    /// `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ProductId, owner_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
