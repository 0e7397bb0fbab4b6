//! Notification log entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use hardware_store_core::{NotificationChannel, NotificationId, NotificationStatus, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    /// `None` for messages to staff addresses such as low-stock alerts.
    pub user_id: Option<UserId>,
    pub channel: NotificationChannel,
    pub subject: String,
    pub message: String,
    pub status: NotificationStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
