//! Order fulfilment.

use axum::{
    Router,
    extract::State,
    routing::{get, put},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use hardware_store_core::{OrderId, OrderStatus, Paginated};

use super::page_window;
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{AdminOrderFilter, Order, OrderWithItems};
use crate::routes::extract::{Json, Path, Query};
use crate::routes::notify_user;
use crate::routes::orders::cancelled_or_error;
use crate::services::notifications::Message;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show))
        .route("/{id}/status", put(update_status))
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminOrderQuery {
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[instrument(skip(state))]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AdminOrderQuery>,
) -> Result<Json<Paginated<Order>>> {
    let filter = AdminOrderFilter {
        status: query.status,
        start_date: query.start_date,
        end_date: query.end_date,
        page: page_window(query.page, query.limit),
    };
    let (orders, total) = OrderRepository::new(state.pool())
        .list_admin(&filter)
        .await?;
    Ok(Json(Paginated::new(orders, total, filter.page)))
}

#[instrument(skip(state))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithItems>> {
    let order = OrderRepository::new(state.pool())
        .get_with_items(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    Ok(Json(order))
}

/// Move an order along its lifecycle. Cancelling returns its stock.
#[instrument(skip(state))]
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let orders = OrderRepository::new(state.pool());
    let current = orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let next = body.status;
    if !current.status.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot change order status from {} to {next}",
            current.status
        )));
    }

    let order = if next == OrderStatus::Cancelled {
        cancelled_or_error(orders.cancel(id, None).await?)?
    } else {
        orders
            .transition(id, current.status, next)
            .await?
            .ok_or_else(|| AppError::Conflict("Order status changed concurrently".to_string()))?
    };

    tracing::info!(
        admin_id = %admin.id,
        order_id = %order.id,
        from = %current.status,
        to = %order.status,
        "Order status updated"
    );

    notify_user(&state, order.user_id, |customer| {
        Message::order_status(&customer.full_name, order.id, order.status)
    })
    .await;

    Ok(Json(order))
}
