//! Customer service requests (installation, repair and similar jobs).

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use tracing::instrument;

use hardware_store_core::{ServiceRequestId, ServiceStatus};

use super::extract::{Json, Path};
use super::require_owned;
use crate::db::{OwnedResource, ServiceRequestRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{NewServiceRequest, ServiceRequest};
use crate::services::notifications::Message;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request", post(create))
        .route("/requests", get(list))
        .route("/requests/{id}", get(show))
        .route("/requests/{id}/accept-quote", post(accept_quote))
}

#[derive(Debug, Serialize)]
pub struct RequestCreated {
    pub message: &'static str,
    pub request_id: ServiceRequestId,
}

#[derive(Debug, Serialize)]
pub struct QuoteAccepted {
    pub message: &'static str,
    pub request: ServiceRequest,
}

#[instrument(skip(state))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<NewServiceRequest>,
) -> Result<(StatusCode, Json<RequestCreated>)> {
    body.validate().map_err(AppError::Validation)?;

    let request = ServiceRequestRepository::new(state.pool())
        .create(user.id, &body)
        .await?;

    tracing::info!(request_id = %request.id, kind = %request.kind, "Service request created");
    let message = Message::service_received(&user.full_name, &request.kind, request.id);
    state.notifications().dispatch(user, message);

    Ok((
        StatusCode::CREATED,
        Json(RequestCreated {
            message: "Service request submitted",
            request_id: request.id,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<ServiceRequest>>> {
    let requests = ServiceRequestRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(requests))
}

#[instrument(skip(state))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ServiceRequestId>,
) -> Result<Json<ServiceRequest>> {
    require_owned(&state, OwnedResource::ServiceRequest, id, user.id).await?;

    let request = ServiceRequestRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Service request not found".to_string()))?;
    Ok(Json(request))
}

/// `quoted -> accepted`, and nothing else.
#[instrument(skip(state))]
pub async fn accept_quote(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ServiceRequestId>,
) -> Result<Json<QuoteAccepted>> {
    require_owned(&state, OwnedResource::ServiceRequest, id, user.id).await?;

    let request = ServiceRequestRepository::new(state.pool())
        .transition(id, ServiceStatus::Quoted, ServiceStatus::Accepted)
        .await?
        .ok_or_else(|| AppError::BadRequest("Only a quoted request can be accepted".to_string()))?;

    tracing::info!(request_id = %request.id, "Service quote accepted");
    Ok(Json(QuoteAccepted {
        message: "Quote accepted",
        request,
    }))
}
