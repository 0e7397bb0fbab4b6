//! Payment records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use hardware_store_core::{OrderId, PaymentId, PaymentStatus, UserId};

/// One payment attempt for an order. `reference` is the order id, which keeps
/// a single payment row per order.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub provider: String,
    pub reference: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
