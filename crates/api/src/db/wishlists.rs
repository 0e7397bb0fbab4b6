//! Wishlist repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use hardware_store_core::{ProductId, UserId, WishlistItemId};

use super::RepositoryError;
use crate::models::{ProductSummary, WishlistItem};

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    id: WishlistItemId,
    created_at: DateTime<Utc>,
    product_id: ProductId,
    sku: String,
    name: String,
    slug: String,
    price: Decimal,
    stock_quantity: i32,
    images: Json<Vec<String>>,
    is_active: bool,
}

impl From<WishlistRow> for WishlistItem {
    fn from(row: WishlistRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            product: ProductSummary {
                id: row.product_id,
                sku: row.sku,
                name: row.name,
                slug: row.slug,
                price: row.price,
                stock_quantity: row.stock_quantity,
                images: row.images.0,
                is_active: row.is_active,
            },
        }
    }
}

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's wishlist, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<WishlistItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistRow>(
            r"
            SELECT w.id, w.created_at,
                   p.id AS product_id, p.sku, p.name, p.slug, p.price,
                   p.stock_quantity, p.images, p.is_active
            FROM wishlists w
            JOIN products p ON p.id = w.product_id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product is already wishlisted.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<WishlistItemId, RepositoryError> {
        let id = sqlx::query_scalar::<_, WishlistItemId>(
            "INSERT INTO wishlists (user_id, product_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product is already in your wishlist"))?;

        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn remove(&self, id: WishlistItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlists WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
