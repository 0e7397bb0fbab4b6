//! Notification dispatch.
//!
//! Every attempt is logged in the `notifications` table before delivery and
//! marked `sent` or `failed` afterwards, whatever the provider does.

mod email;
mod messages;
mod sms;

pub use email::EmailClient;
pub use messages::{LowStockLine, Message};
pub use sms::SmsClient;

use sqlx::PgPool;
use thiserror::Error;

use hardware_store_core::{NotificationChannel, NotificationId, NotificationStatus, UserId};

use crate::config::ApiConfig;
use crate::db::{NotificationRepository, RepositoryError};
use crate::models::User;

/// Errors that can occur when sending notifications.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Provider credentials are missing.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the request.
    #[error("{provider} API error: {status} - {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Sends and records email and SMS notifications.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    email: EmailClient,
    sms: SmsClient,
    low_stock_alert_email: Option<String>,
}

impl NotificationService {
    /// # Errors
    ///
    /// Returns error if a provider HTTP client fails to build.
    pub fn new(pool: PgPool, config: &ApiConfig) -> Result<Self, NotificationError> {
        Ok(Self {
            pool,
            email: EmailClient::new(&config.sendgrid)?,
            sms: SmsClient::new(&config.twilio)?,
            low_stock_alert_email: config.low_stock_alert_email.clone(),
        })
    }

    #[must_use]
    pub const fn email_configured(&self) -> bool {
        self.email.is_configured()
    }

    #[must_use]
    pub const fn sms_configured(&self) -> bool {
        self.sms.is_configured()
    }

    /// Record, deliver and mark one notification.
    ///
    /// # Errors
    ///
    /// Returns the delivery error after the row has been marked `failed`.
    pub async fn send(
        &self,
        user_id: Option<UserId>,
        channel: NotificationChannel,
        recipient: &str,
        message: &Message,
    ) -> Result<NotificationId, NotificationError> {
        let repo = NotificationRepository::new(&self.pool);
        let body = match channel {
            NotificationChannel::Email => &message.text,
            NotificationChannel::Sms => &message.sms,
        };
        let id = repo
            .create_pending(user_id, channel, &message.subject, body)
            .await?;

        let delivery = match channel {
            NotificationChannel::Email => {
                self.email
                    .send(recipient, &message.subject, &message.text, &message.html)
                    .await
            }
            NotificationChannel::Sms => self.sms.send(recipient, &message.sms).await,
        };

        let status = if delivery.is_ok() {
            NotificationStatus::Sent
        } else {
            NotificationStatus::Failed
        };
        repo.mark_delivery(id, status).await?;

        delivery.map(|()| id)
    }

    /// Email the user, then text them if they have a phone and SMS is set up.
    ///
    /// SMS is attempted whatever happened to the email. SMS failures are
    /// logged, never returned.
    ///
    /// # Errors
    ///
    /// Returns the email delivery error.
    pub async fn send_multi_channel(
        &self,
        user: &User,
        message: &Message,
    ) -> Result<(), NotificationError> {
        let email = self
            .send(
                Some(user.id),
                NotificationChannel::Email,
                user.email.as_str(),
                message,
            )
            .await;

        if let Some(phone) = &user.phone
            && self.sms.is_configured()
            && let Err(e) = self
                .send(Some(user.id), NotificationChannel::Sms, phone.as_str(), message)
                .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "SMS notification failed");
        }

        email.map(|_| ())
    }

    /// Fire-and-forget [`send_multi_channel`](Self::send_multi_channel) on a
    /// background task.
    pub fn dispatch(&self, user: User, message: Result<Message, askama::Error>) {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to render notification");
                return;
            }
        };

        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.send_multi_channel(&user, &message).await {
                tracing::warn!(
                    user_id = %user.id,
                    subject = %message.subject,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        });
    }

    /// Email the staff low-stock address in the background, if one is set.
    pub fn alert_low_stock(&self, items: Vec<LowStockLine>) {
        let Some(recipient) = self.low_stock_alert_email.clone() else {
            return;
        };
        if items.is_empty() {
            return;
        }

        let service = self.clone();
        tokio::spawn(async move {
            let result = match Message::low_stock(&items) {
                Ok(message) => service
                    .send(None, NotificationChannel::Email, &recipient, &message)
                    .await
                    .map(|_| ()),
                Err(e) => Err(e.into()),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "Low-stock alert failed");
            }
        });
    }
}
