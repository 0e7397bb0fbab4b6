//! Category repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use hardware_store_core::CategoryId;

use super::RepositoryError;
use crate::models::{Category, CategoryUpdate, NewCategory};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CategoryRow {
    pub(crate) id: CategoryId,
    pub(crate) name: String,
    pub(crate) slug: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SLUG_TAKEN: &str = "category slug already exists";

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, created_at, updated_at FROM categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO categories (name, slug)
            VALUES ($1, $2)
            RETURNING id, name, slug, created_at, updated_at
            ",
        )
        .bind(input.name.trim())
        .bind(input.slug.trim())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, SLUG_TAKEN))?;

        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryUpdate,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE categories
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, slug, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.slug.as_deref().map(str::trim))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, SLUG_TAKEN))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Whether any product still belongs to the category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_products(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM products WHERE category_id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert or refresh a category by slug. Used by the seeder.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_by_slug(&self, name: &str, slug: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO categories (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name, updated_at = NOW()
            RETURNING id, name, slug, created_at, updated_at
            ",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
