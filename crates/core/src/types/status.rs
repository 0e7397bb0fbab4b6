//! Status enums for users, orders, payments, service requests and notifications.
//!
//! Each lifecycle enum owns its transition rules so that handlers, services and
//! the CLI agree on what moves are legal:
//!
//! ```text
//! Order:    pending -> confirmed -> shipped -> delivered
//!              \           \
//!               +-----------+--> cancelled
//!
//! Payment:  pending -> completed -> refunded
//!              \
//!               +--> failed -> pending (customer retries)
//!
//! Service:  requested -> quoted -> accepted -> scheduled -> in_progress
//!           -> completed -> billed        (any non-final state -> cancelled)
//! ```

use serde::{Deserialize, Serialize};

/// Error returned when parsing a status string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Implements `Display`, `FromStr` and `as_str` for a snake_case status enum.
macro_rules! status_strings {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// All variants, in lifecycle order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire and database representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $ty {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError::new($kind, s)),
                }
            }
        }
    };
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular shopper.
    #[default]
    Customer,
    /// Store staff with access to `/api/admin`.
    Admin,
}

status_strings!(UserRole, "user role", {
    Customer => "customer",
    Admin => "admin",
});

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

status_strings!(OrderStatus, "order status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Whether a customer (or admin) may still cancel the order.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether the order has reached a state it can never leave.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Confirmed)
            | (Self::Confirmed, Self::Shipped)
            | (Self::Shipped, Self::Delivered) => true,
            (_, Self::Cancelled) => self.is_cancellable(),
            _ => false,
        }
    }
}

/// Payment status as reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

status_strings!(PaymentStatus, "payment status", {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Refunded => "refunded",
});

impl PaymentStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Webhooks only ever move a payment out of `Pending`; a failed payment
    /// returns to `Pending` only when the customer initiates a new attempt.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed)
                | (Self::Failed, Self::Pending)
                | (Self::Completed, Self::Refunded)
        )
    }
}

/// Service request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "service_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    Requested,
    Quoted,
    Accepted,
    Scheduled,
    InProgress,
    Completed,
    Billed,
    Cancelled,
}

status_strings!(ServiceStatus, "service status", {
    Requested => "requested",
    Quoted => "quoted",
    Accepted => "accepted",
    Scheduled => "scheduled",
    InProgress => "in_progress",
    Completed => "completed",
    Billed => "billed",
    Cancelled => "cancelled",
});

impl ServiceStatus {
    /// The next status in the normal progression, if any.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Requested => Some(Self::Quoted),
            Self::Quoted => Some(Self::Accepted),
            Self::Accepted => Some(Self::Scheduled),
            Self::Scheduled => Some(Self::InProgress),
            Self::InProgress => Some(Self::Completed),
            Self::Completed => Some(Self::Billed),
            Self::Billed | Self::Cancelled => None,
        }
    }

    /// Work has finished (or was abandoned) and the ticket is closed.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Completed | Self::Billed | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// `Completed -> Billed` is the one move allowed out of a final state.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if next == Self::Cancelled {
            return !self.is_final();
        }
        self.successor() == Some(next)
    }
}

/// Outbound notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "notification_channel", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
}

status_strings!(NotificationChannel, "notification channel", {
    Email => "email",
    Sms => "sms",
});

/// Delivery status of a notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "notification_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

status_strings!(NotificationStatus, "notification status", {
    Pending => "pending",
    Sent => "sent",
    Failed => "failed",
});
