//! Payment repository.
//!
//! A payment's `reference` is its order id, so each order has at most one
//! payment row. Webhook results only ever move a payment out of `pending`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use hardware_store_core::{OrderId, OrderStatus, PaymentId, PaymentStatus, UserId};

use super::RepositoryError;
use crate::models::Payment;

const PAYMENT_COLUMNS: &str = "id, order_id, user_id, provider, reference, amount, status, \
     paid_at, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: PaymentId,
    order_id: OrderId,
    user_id: UserId,
    provider: String,
    reference: String,
    amount: Decimal,
    status: PaymentStatus,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            user_id: row.user_id,
            provider: row.provider,
            reference: row.reference,
            amount: row.amount,
            status: row.status,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// What a provider charge event did to our records.
#[derive(Debug)]
pub enum ChargeOutcome {
    /// The payment left `pending`. `order_confirmed` is set when the order
    /// moved from `pending` to `confirmed` in the same transaction.
    Applied {
        payment: Payment,
        order_confirmed: bool,
    },
    /// The payment had already left `pending`; nothing changed.
    Duplicate,
    /// No payment carries this reference.
    UnknownReference,
}

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create the order's payment, or reset a failed one for a new attempt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order is already paid (or refunded).
    pub async fn upsert_pending(
        &self,
        order_id: OrderId,
        user_id: UserId,
        provider: &str,
        amount: Decimal,
    ) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            INSERT INTO payments (order_id, user_id, provider, reference, amount, status)
            VALUES ($1, $2, $3, $1::text, $4, 'pending')
            ON CONFLICT (reference) DO UPDATE
            SET provider = EXCLUDED.provider,
                amount = EXCLUDED.amount,
                status = 'pending',
                updated_at = NOW()
            WHERE payments.status IN ('pending', 'failed')
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(order_id)
        .bind(user_id)
        .bind(provider)
        .bind(amount)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("order has already been paid".to_owned()))?;

        Ok(row.into())
    }

    /// Apply a provider charge result exactly once.
    ///
    /// On success the payment becomes `completed` and a `pending` order becomes
    /// `confirmed`, in one transaction. On failure the payment becomes
    /// `failed`. Replays find the payment no longer `pending` and change nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back.
    pub async fn apply_charge(
        &self,
        reference: &str,
        succeeded: bool,
    ) -> Result<ChargeOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let next = if succeeded {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Failed
        };

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            UPDATE payments
            SET status = $2,
                paid_at = CASE WHEN $2 = 'completed'::payment_status THEN NOW() ELSE paid_at END,
                updated_at = NOW()
            WHERE reference = $1 AND status = 'pending'
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(reference)
        .bind(next)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM payments WHERE reference = $1)",
            )
            .bind(reference)
            .fetch_one(&mut *tx)
            .await?;
            tx.rollback().await?;

            return Ok(if exists {
                ChargeOutcome::Duplicate
            } else {
                ChargeOutcome::UnknownReference
            });
        };

        let order_confirmed = if succeeded {
            sqlx::query(
                r"
                UPDATE orders SET status = $3, updated_at = NOW()
                WHERE id = $1 AND status = $2
                ",
            )
            .bind(row.order_id)
            .bind(OrderStatus::Pending)
            .bind(OrderStatus::Confirmed)
            .execute(&mut *tx)
            .await?
            .rows_affected()
                == 1
        } else {
            false
        };

        tx.commit().await?;

        Ok(ChargeOutcome::Applied {
            payment: row.into(),
            order_confirmed,
        })
    }
}
