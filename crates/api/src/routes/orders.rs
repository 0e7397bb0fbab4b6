//! Customer order history, placement and cancellation.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use hardware_store_core::{OrderId, OrderStatus};

use super::checkout::place_order;
use super::extract::{Json, Path};
use super::require_owned;
use crate::db::{CancelOutcome, OrderRepository, OwnedResource};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderWithItems, ServiceRequestSnapshot, ShippingAddress};
use crate::services::checkout::PlaceOrder;
use crate::services::notifications::Message;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show))
        .route("/{id}/cancel", post(cancel))
}

/// `POST /api/orders` body. Same as checkout with the payment method left to
/// the default.
#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    pub address: ShippingAddress,
    pub service_request: Option<ServiceRequestSnapshot>,
    pub shipping_method: Option<String>,
    pub payment_method: Option<String>,
}

impl From<CreateOrder> for PlaceOrder {
    fn from(body: CreateOrder) -> Self {
        Self {
            address: body.address,
            service_request: body.service_request,
            payment_method: body.payment_method,
            shipping_method: body.shipping_method,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub message: &'static str,
    pub order_id: OrderId,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderCancelled {
    pub message: &'static str,
    pub order: Order,
}

#[instrument(skip(state))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderWithItems>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

#[instrument(skip(state))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateOrder>,
) -> Result<(StatusCode, Json<OrderCreated>)> {
    let request = PlaceOrder::from(body);
    let (placed, _) = place_order(&state, user, &request).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            message: "Order created successfully",
            order_id: placed.order.id,
            total: placed.order.total,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithItems>> {
    require_owned(&state, OwnedResource::Order, id, user.id).await?;

    let order = OrderRepository::new(state.pool())
        .get_with_items(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn cancel(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderCancelled>> {
    let outcome = OrderRepository::new(state.pool())
        .cancel(id, Some(user.id))
        .await?;
    let order = cancelled_or_error(outcome)?;

    tracing::info!(order_id = %order.id, user_id = %user.id, "Order cancelled by customer");
    let message = Message::order_status(&user.full_name, order.id, order.status);
    state.notifications().dispatch(user, message);

    Ok(Json(OrderCancelled {
        message: "Order cancelled successfully",
        order,
    }))
}

/// Map a cancellation attempt to the order or the matching client error.
pub(crate) fn cancelled_or_error(outcome: CancelOutcome) -> Result<Order> {
    match outcome {
        CancelOutcome::Cancelled(order) => Ok(order),
        CancelOutcome::NotFound => Err(AppError::NotFound("Order not found".to_string())),
        CancelOutcome::NotCancellable(status) => Err(AppError::BadRequest(not_cancellable(status))),
    }
}

fn not_cancellable(status: OrderStatus) -> String {
    format!("Order cannot be cancelled once it is {status}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn test_cancel_outcomes_map_to_errors() {
        let err = cancelled_or_error(CancelOutcome::NotFound).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = cancelled_or_error(CancelOutcome::NotCancellable(OrderStatus::Shipped))
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.public_message(),
            "Order cannot be cancelled once it is shipped"
        );
    }

    #[test]
    fn test_create_body_defaults_payment_method() {
        let body: CreateOrder = serde_json::from_str(
            r#"{"address":{"label":"Shop","line":"12 Broad St","city":"Lagos","country":"NG"}}"#,
        )
        .unwrap();
        let request = PlaceOrder::from(body);
        assert_eq!(request.payment_method(), "paystack");
        assert!(request.validate().is_ok());
    }
}
