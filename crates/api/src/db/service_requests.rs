//! Service request repository.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use hardware_store_core::{ServiceRequestId, ServiceStatus, UserId};

use super::RepositoryError;
use crate::models::{NewServiceRequest, ServiceQuote, ServiceRequest, ServiceRequestFilter};

const REQUEST_COLUMNS: &str = "id, user_id, type, details, location, requested_date, \
     instructions, status, quote_amount, assigned_to, scheduled_date, notes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ServiceRequestRow {
    id: ServiceRequestId,
    user_id: UserId,
    #[sqlx(rename = "type")]
    kind: String,
    details: Json<serde_json::Map<String, serde_json::Value>>,
    location: String,
    requested_date: Option<NaiveDate>,
    instructions: Option<String>,
    status: ServiceStatus,
    quote_amount: Option<Decimal>,
    assigned_to: Option<UserId>,
    scheduled_date: Option<NaiveDate>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ServiceRequestRow> for ServiceRequest {
    fn from(row: ServiceRequestRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind,
            details: row.details.0,
            location: row.location,
            requested_date: row.requested_date,
            instructions: row.instructions,
            status: row.status,
            quote_amount: row.quote_amount,
            assigned_to: row.assigned_to,
            scheduled_date: row.scheduled_date,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for service request database operations.
pub struct ServiceRequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ServiceRequestRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &NewServiceRequest,
    ) -> Result<ServiceRequest, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRequestRow>(&format!(
            r"
            INSERT INTO service_requests
                (user_id, type, details, location, requested_date, instructions, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'requested')
            RETURNING {REQUEST_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(input.kind.trim())
        .bind(Json(&input.details))
        .bind(input.location.trim())
        .bind(input.requested_date)
        .bind(input.instructions.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: ServiceRequestId,
    ) -> Result<Option<ServiceRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// The user's requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ServiceRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, ServiceRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Admin list, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_admin(
        &self,
        filter: &ServiceRequestFilter,
    ) -> Result<(Vec<ServiceRequest>, i64), RepositoryError> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM service_requests WHERE TRUE");
        push_request_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE TRUE"
        ));
        push_request_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.page.limit)
            .push(" OFFSET ")
            .push_bind(filter.page.offset());

        let rows: Vec<ServiceRequestRow> = query.build_query_as().fetch_all(self.pool).await?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Move a request from `from` to `to`. Returns `None` if it was no longer
    /// in `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn transition(
        &self,
        id: ServiceRequestId,
        from: ServiceStatus,
        to: ServiceStatus,
    ) -> Result<Option<ServiceRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRequestRow>(&format!(
            r"
            UPDATE service_requests SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {REQUEST_COLUMNS}
            "
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Attach a quote to a `requested` job and move it to `quoted`. Returns
    /// `None` if the request was not in `requested`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quote(
        &self,
        id: ServiceRequestId,
        quote: &ServiceQuote,
    ) -> Result<Option<ServiceRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRequestRow>(&format!(
            r"
            UPDATE service_requests
            SET status = 'quoted',
                quote_amount = $2,
                assigned_to = COALESCE($3, assigned_to),
                scheduled_date = COALESCE($4, scheduled_date),
                notes = COALESCE($5, notes),
                updated_at = NOW()
            WHERE id = $1 AND status = 'requested'
            RETURNING {REQUEST_COLUMNS}
            "
        ))
        .bind(id)
        .bind(quote.amount)
        .bind(quote.assigned_to)
        .bind(quote.scheduled_date)
        .bind(quote.notes.as_deref())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}

fn push_request_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ServiceRequestFilter) {
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(kind) = filter.kind.as_deref().filter(|s| !s.is_empty()) {
        query.push(" AND type = ").push_bind(kind.to_owned());
    }
}
