//! Account registration, login and password reset.
//!
//! Mounted at `/api/auth` behind the strict rate limiter.

use axum::{Router, extract::State, http::StatusCode, routing::post};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use super::extract::Json;
use crate::error::{Result, add_breadcrumb, clear_sentry_user};
use crate::services::auth::reset::reset_link;
use crate::services::auth::{AuthService, Registration, Session};
use crate::services::notifications::Message;
use crate::state::AppState;

/// Same body whether or not the account exists.
const RESET_REQUESTED_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent";

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/password/reset", post(request_reset))
        .route("/password/reset/confirm", post(confirm_reset))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirm {
    pub token: String,
    pub password: String,
}

/// Create an account and return a session.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Registration>,
) -> Result<(StatusCode, Json<Session>)> {
    let session = AuthService::new(state.pool(), state.jwt())
        .register(&body)
        .await?;

    tracing::info!(user_id = %session.user.id, "User registered");
    add_breadcrumb("auth", "User registered", None);

    state.notifications().dispatch(
        session.user.clone(),
        Message::welcome(&session.user.full_name),
    );

    Ok((StatusCode::CREATED, Json(session)))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Session>> {
    let session = AuthService::new(state.pool(), state.jwt())
        .login(&body.email, &body.password)
        .await?;

    tracing::info!(user_id = %session.user.id, "User logged in");
    Ok(Json(session))
}

/// Tokens are stateless; clients drop theirs.
pub async fn logout() -> Json<Value> {
    clear_sentry_user();
    Json(json!({ "message": "Logged out successfully" }))
}

#[instrument(skip_all)]
pub async fn request_reset(
    State(state): State<AppState>,
    Json(body): Json<ResetRequest>,
) -> Result<Json<Value>> {
    let issued = AuthService::new(state.pool(), state.jwt())
        .request_password_reset(&body.email)
        .await?;

    if let Some((user, token)) = issued {
        let link = reset_link(&state.config().frontend_url, &token.token);
        tracing::info!(user_id = %user.id, "Password reset requested");
        let message = Message::password_reset(&user.full_name, &link);
        state.notifications().dispatch(user, message);
    }

    Ok(Json(json!({ "message": RESET_REQUESTED_MESSAGE })))
}

#[instrument(skip_all)]
pub async fn confirm_reset(
    State(state): State<AppState>,
    Json(body): Json<ResetConfirm>,
) -> Result<Json<Value>> {
    AuthService::new(state.pool(), state.jwt())
        .confirm_password_reset(&body.token, &body.password)
        .await?;

    Ok(Json(json!({ "message": "Password has been reset" })))
}
