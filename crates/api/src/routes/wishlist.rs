//! Wishlist.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use hardware_store_core::{ProductId, WishlistItemId};

use super::extract::{Json, Path};
use super::require_owned;
use crate::db::{OwnedResource, ProductRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::WishlistItem;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/items", post(add))
        .route("/items/{id}", delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct AddToWishlist {
    pub product_id: ProductId,
}

#[instrument(skip(state))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<WishlistItem>>> {
    let items = WishlistRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn add(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<AddToWishlist>,
) -> Result<(StatusCode, Json<Value>)> {
    ProductRepository::new(state.pool())
        .get_active(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let id = WishlistRepository::new(state.pool())
        .add(user.id, body.product_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Added to wishlist", "id": id })),
    ))
}

#[instrument(skip(state))]
pub async fn remove(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<WishlistItemId>,
) -> Result<Json<Value>> {
    require_owned(&state, OwnedResource::WishlistItem, id, user.id).await?;
    WishlistRepository::new(state.pool()).remove(id).await?;
    Ok(Json(json!({ "message": "Removed from wishlist" })))
}
