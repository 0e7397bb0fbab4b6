//! Checkout: shipping options and order placement.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use hardware_store_core::{OrderId, PaymentId};

use super::extract::Json;
use crate::db::{AddressRepository, PaymentRepository};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::checkout::{
    CheckoutService, PlaceOrder, PlacedOrder, SHIPPING_OPTIONS, ShippingOption,
};
use crate::services::notifications::Message;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shipping-options", get(shipping_options))
        .route("/place", post(place))
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub message: &'static str,
    pub order_id: OrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<PaymentId>,
    pub total: Decimal,
}

pub async fn shipping_options() -> Json<[ShippingOption; 3]> {
    Json(SHIPPING_OPTIONS)
}

#[instrument(skip(state))]
pub async fn place(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let (placed, payment_id) = place_order(&state, user, &body).await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            message: "Order placed successfully",
            order_id: placed.order.id,
            payment_id,
            total: placed.order.total,
        }),
    ))
}

/// Commit the order, then run the follow-ups that must never fail it.
///
/// Returns the placed order and, when it could be recorded, its pending
/// payment.
pub(crate) async fn place_order(
    state: &AppState,
    user: User,
    request: &PlaceOrder,
) -> Result<(PlacedOrder, Option<PaymentId>)> {
    let placed = CheckoutService::new(state.pool())
        .place_order(user.id, request)
        .await?;
    let order = &placed.order;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", &order.id.to_string())]),
    );

    let payment_id = match PaymentRepository::new(state.pool())
        .upsert_pending(order.id, user.id, request.payment_method(), order.total)
        .await
    {
        Ok(payment) => Some(payment.id),
        Err(e) => {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to record pending payment");
            None
        }
    };

    if let Err(e) = AddressRepository::new(state.pool())
        .remember(user.id, &request.address)
        .await
    {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to save shipping address");
    }

    state.notifications().alert_low_stock(placed.low_stock.clone());

    let message = Message::order_confirmation(&user.full_name, order.id, order.total);
    state.notifications().dispatch(user, message);

    Ok((placed, payment_id))
}
