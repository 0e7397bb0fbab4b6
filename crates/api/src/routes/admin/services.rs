//! Service request triage: quoting and job progress.

use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use serde::Deserialize;
use tracing::instrument;

use hardware_store_core::{Paginated, ServiceRequestId, ServiceStatus};

use super::page_window;
use crate::db::ServiceRequestRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{ServiceQuote, ServiceRequest, ServiceRequestFilter};
use crate::routes::catalog::non_blank;
use crate::routes::notify_user;
use crate::routes::extract::{Json, Path, Query};
use crate::services::notifications::Message;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list))
        .route("/requests/{id}/status", put(update_status))
        .route("/requests/{id}/quote", post(quote))
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceQuery {
    pub status: Option<ServiceStatus>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ServiceStatus,
}

#[instrument(skip(state))]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ServiceQuery>,
) -> Result<Json<Paginated<ServiceRequest>>> {
    let filter = ServiceRequestFilter {
        status: query.status,
        kind: non_blank(query.kind),
        page: page_window(query.page, query.limit),
    };
    let (requests, total) = ServiceRequestRepository::new(state.pool())
        .list_admin(&filter)
        .await?;
    Ok(Json(Paginated::new(requests, total, filter.page)))
}

async fn load(state: &AppState, id: ServiceRequestId) -> Result<ServiceRequest> {
    ServiceRequestRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Service request not found".to_string()))
}

#[instrument(skip(state))]
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ServiceRequestId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<ServiceRequest>> {
    let current = load(&state, id).await?;
    let next = body.status;
    if !current.status.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot change service request status from {} to {next}",
            current.status
        )));
    }

    let request = ServiceRequestRepository::new(state.pool())
        .transition(id, current.status, next)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("Service request status changed concurrently".to_string())
        })?;

    tracing::info!(admin_id = %admin.id, request_id = %id, from = %current.status, to = %next, "Service request updated");
    Ok(Json(request))
}

/// Price a job. Only a freshly `requested` job can be quoted.
#[instrument(skip(state))]
pub async fn quote(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ServiceRequestId>,
    Json(body): Json<ServiceQuote>,
) -> Result<Json<ServiceRequest>> {
    body.validate().map_err(AppError::Validation)?;
    load(&state, id).await?;

    let request = ServiceRequestRepository::new(state.pool())
        .quote(id, &body)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("Only a requested service can be quoted".to_string())
        })?;

    tracing::info!(admin_id = %admin.id, request_id = %id, amount = %body.amount, "Service quoted");

    notify_user(&state, request.user_id, |customer| {
        Message::service_quote(
            &customer.full_name,
            &request.kind,
            request.id,
            body.amount,
            request.scheduled_date,
        )
    })
    .await;

    Ok(Json(request))
}
