//! Notification log repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use hardware_store_core::{NotificationChannel, NotificationId, NotificationStatus, UserId};

use super::RepositoryError;
use crate::models::Notification;

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: NotificationId,
    user_id: Option<UserId>,
    channel: NotificationChannel,
    subject: String,
    message: String,
    status: NotificationStatus,
    sent_at: Option<DateTime<Utc>>,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            channel: row.channel,
            subject: row.subject,
            message: row.message,
            status: row.status,
            sent_at: row.sent_at,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

/// Repository for notification database operations.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a `pending` notification before delivery is attempted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_pending(
        &self,
        user_id: Option<UserId>,
        channel: NotificationChannel,
        subject: &str,
        message: &str,
    ) -> Result<NotificationId, RepositoryError> {
        let id = sqlx::query_scalar::<_, NotificationId>(
            r"
            INSERT INTO notifications (user_id, channel, subject, message, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(channel)
        .bind(subject)
        .bind(message)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Record the delivery result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_delivery(
        &self,
        id: NotificationId,
        status: NotificationStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE notifications
            SET status = $2,
                sent_at = CASE WHEN $2 = 'sent'::notification_status THEN NOW() ELSE sent_at END,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// A page of the user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r"
            SELECT id, user_id, channel, subject, message, status, sent_at, read_at, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Set `read_at` if not already set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the notification does not exist.
    pub async fn mark_read(&self, id: NotificationId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE notifications
            SET read_at = COALESCE(read_at, NOW()), updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
