//! Paystack payments: checkout initiation, webhook and status.
//!
//! The webhook is public; Paystack authenticates it with an HMAC signature
//! instead of a bearer token.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use hardware_store_core::{OrderId, OrderStatus, PaymentId};

use super::extract::{Json, Path};
use super::{notify_user, require_owned};
use crate::db::{OrderRepository, OwnedResource, PaymentRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Payment;
use crate::services::checkout::DEFAULT_PAYMENT_METHOD;
use crate::services::notifications::Message;
use crate::services::payments::{
    PaymentError, PaymentService, PaystackCheckout, SIGNATURE_HEADER, WebhookOutcome,
};
use crate::state::AppState;

/// Routes that need a signed-in customer.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/initiate", post(initiate))
        .route("/{id}/status", get(status))
}

/// The provider callback, mounted without authentication.
pub fn webhook_router() -> Router<AppState> {
    Router::new().route("/webhook", post(webhook))
}

/// Client-sent amounts are ignored; the order total is charged.
#[derive(Debug, Deserialize)]
pub struct InitiatePayment {
    pub order_id: OrderId,
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentInitiated {
    pub message: &'static str,
    pub payment_id: PaymentId,
    pub amount: Decimal,
    pub paystack: PaystackCheckout,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub message: &'static str,
    pub outcome: &'static str,
}

#[instrument(skip(state))]
pub async fn initiate(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<InitiatePayment>,
) -> Result<Json<PaymentInitiated>> {
    let paystack = state.paystack();
    if !paystack.is_configured() {
        return Err(PaymentError::NotConfigured.into());
    }

    require_owned(&state, OwnedResource::Order, body.order_id, user.id).await?;
    let order = OrderRepository::new(state.pool())
        .get(body.order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    if order.status != OrderStatus::Pending {
        return Err(AppError::BadRequest(format!(
            "Order is {} and cannot be paid",
            order.status
        )));
    }

    let provider = body
        .payment_method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_PAYMENT_METHOD);

    let payment = PaymentRepository::new(state.pool())
        .upsert_pending(order.id, user.id, provider, order.total)
        .await?;

    let checkout = paystack
        .initialize(user.email.as_str(), payment.amount, &payment.reference)
        .await?;

    tracing::info!(
        payment_id = %payment.id,
        order_id = %order.id,
        amount = %payment.amount,
        "Payment initiated"
    );

    Ok(Json(PaymentInitiated {
        message: "Payment initiated",
        payment_id: payment.id,
        amount: payment.amount,
        paystack: checkout,
    }))
}

/// Apply a Paystack event. The signature is checked against the raw bytes
/// before anything is parsed.
#[instrument(skip_all)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = PaymentService::new(state.pool(), state.paystack())
        .handle_webhook(&body, signature)
        .await?;

    if let WebhookOutcome::Applied {
        payment,
        succeeded: true,
    } = &outcome
    {
        notify_user(&state, payment.user_id, |user| {
            Message::payment_confirmation(
                &user.full_name,
                payment.order_id,
                payment.amount,
                &payment.reference,
            )
        })
        .await;
    }

    Ok(Json(WebhookAck {
        message: "Webhook processed",
        outcome: outcome.as_str(),
    }))
}

#[instrument(skip(state))]
pub async fn status(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>> {
    require_owned(&state, OwnedResource::Payment, id, user.id).await?;

    let payment = PaymentRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
    Ok(Json(payment))
}
