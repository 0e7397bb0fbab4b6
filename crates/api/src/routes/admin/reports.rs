//! Sales, inventory and user reports.

use axum::{Router, extract::State, routing::get};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use crate::db::ReportRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{InventoryReport, SalesReport, UserReport};
use crate::routes::extract::{Json, Query};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sales))
        .route("/inventory", get(inventory))
        .route("/users", get(users))
}

/// Both dates are required, as `YYYY-MM-DD`; the range is inclusive.
#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[instrument(skip(state))]
pub async fn sales(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> Result<Json<SalesReport>> {
    if query.start_date > query.end_date {
        return Err(AppError::Validation(
            "start_date must not be after end_date".to_string(),
        ));
    }

    let report = ReportRepository::new(state.pool())
        .sales(query.start_date, query.end_date)
        .await?;
    Ok(Json(report))
}

#[instrument(skip(state))]
pub async fn inventory(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<InventoryReport>> {
    Ok(Json(ReportRepository::new(state.pool()).inventory().await?))
}

#[instrument(skip(state))]
pub async fn users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserReport>> {
    Ok(Json(ReportRepository::new(state.pool()).users().await?))
}
