//! Saved addresses shown on the user profile.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use hardware_store_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, ShippingAddress};

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    label: String,
    line: String,
    city: String,
    country: String,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            label: row.label,
            line: row.line,
            city: row.city,
            country: row.country,
            is_default: row.is_default,
            created_at: row.created_at,
        }
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, label, line, city, country, is_default, created_at
            FROM addresses
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Remember a shipping address used at checkout, unless the user already
    /// has an identical one. The first address saved becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remember(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO addresses (user_id, label, line, city, country, is_default)
            SELECT $1, $2, $3, $4, $5,
                   NOT EXISTS (SELECT 1 FROM addresses WHERE user_id = $1)
            WHERE NOT EXISTS (
                SELECT 1 FROM addresses
                WHERE user_id = $1 AND line = $3 AND city = $4 AND country = $5
            )
            ",
        )
        .bind(user_id)
        .bind(address.label.trim())
        .bind(address.line.trim())
        .bind(address.city.trim())
        .bind(address.country.trim())
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
