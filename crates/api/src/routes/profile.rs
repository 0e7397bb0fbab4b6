//! The signed-in user's profile and saved addresses.

use axum::{Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::extract::Json;
use crate::db::{AddressRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Address, User};
use crate::services::auth::parse_optional_phone;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show).put(update))
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub user: User,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[instrument(skip(state))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Profile>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(Profile { user, addresses }))
}

#[instrument(skip(state))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let full_name = match body.full_name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::Validation("full_name must not be blank".to_string())),
        other => other,
    };
    let phone = parse_optional_phone(body.phone.as_deref())?;

    let updated = UserRepository::new(state.pool())
        .update_profile(user.id, full_name, phone.as_ref())
        .await?;

    tracing::info!(user_id = %updated.id, "Profile updated");
    Ok(Json(updated))
}
