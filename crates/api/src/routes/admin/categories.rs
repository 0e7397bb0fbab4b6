//! Category management.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use serde_json::{Value, json};
use tracing::instrument;

use hardware_store_core::CategoryId;

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryUpdate, NewCategory};
use crate::routes::extract::{Json, Path};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", put(update).delete(remove))
}

#[instrument(skip(state))]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

#[instrument(skip(state))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    body.validate().map_err(AppError::Validation)?;

    let category = CategoryRepository::new(state.pool()).create(&body).await?;
    state.cache().invalidate_all().await;

    tracing::info!(admin_id = %admin.id, category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(body): Json<CategoryUpdate>,
) -> Result<Json<Category>> {
    body.validate().map_err(AppError::Validation)?;

    let category = CategoryRepository::new(state.pool())
        .update(id, &body)
        .await?;
    state.cache().invalidate_all().await;

    tracing::info!(admin_id = %admin.id, category_id = %id, "Category updated");
    Ok(Json(category))
}

#[instrument(skip(state))]
pub async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Value>> {
    let categories = CategoryRepository::new(state.pool());
    if categories.has_products(id).await? {
        return Err(AppError::Conflict(
            "Category still has products".to_string(),
        ));
    }

    categories.delete(id).await?;
    state.cache().invalidate_all().await;

    tracing::info!(admin_id = %admin.id, category_id = %id, "Category deleted");
    Ok(Json(json!({ "message": "Category deleted" })))
}
