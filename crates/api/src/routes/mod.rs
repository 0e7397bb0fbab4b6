//! HTTP route handlers for the hardware store API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/{db,cache,services,full}   - Health checks
//!
//! # Auth (strict rate limit)
//! POST /api/auth/register                  - Create account, returns token
//! POST /api/auth/login                     - Exchange credentials for token
//! POST /api/auth/logout                    - Stateless logout
//! POST /api/auth/password/reset            - Request a reset link
//! POST /api/auth/password/reset/confirm    - Set a new password
//!
//! # Catalog (public)
//! GET  /api/catalog/products               - Filtered, sorted, paged listing
//! GET  /api/catalog/products/{slug}        - Product detail
//! GET  /api/catalog/categories             - Category list
//! GET  /api/catalog/search                 - Listing plus SKU match and stock filter
//!
//! # Customer (requires auth)
//! GET|PUT /api/profile
//! GET|DELETE /api/cart, POST /api/cart/items, PUT|DELETE /api/cart/items/{id}
//! GET     /api/wishlist, POST /api/wishlist/items, DELETE /api/wishlist/items/{id}
//! GET     /api/checkout/shipping-options, POST /api/checkout/place
//! GET|POST /api/orders, GET /api/orders/{id}, POST /api/orders/{id}/cancel
//! POST    /api/services/request, GET /api/services/requests[/{id}]
//! POST    /api/services/requests/{id}/accept-quote
//! POST    /api/payments/initiate, GET /api/payments/{id}/status
//! POST    /api/upload/{file,files}, GET|DELETE /api/upload/file/{public_id}[/urls]
//! GET     /api/notifications, PUT /api/notifications/{id}/read
//!
//! # Provider callbacks (public, signature checked)
//! POST /api/payments/webhook
//!
//! # Admin (requires admin role)
//! /api/admin/{categories,products,inventory,orders,services,users,reports}
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod extract;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod profile;
pub mod services;
pub mod uploads;
pub mod wishlist;

use axum::{Router, middleware::map_response};
use uuid::Uuid;

use hardware_store_core::UserId;

use crate::config::ApiConfig;
use crate::db::{OwnedResource, RepositoryError, UserRepository, ensure_owned};
use crate::error::{AppError, Result};
use crate::middleware::{api_rate_limiter, auth_rate_limiter, rate_limited_json};
use crate::models::User;
use crate::services::notifications::Message;
use crate::state::AppState;

/// Everything mounted under `/api`.
pub fn api_routes(config: &ApiConfig) -> Router<AppState> {
    let auth = Router::new()
        .nest("/auth", auth::router())
        .layer(auth_rate_limiter());

    let api = Router::new()
        .nest("/catalog", catalog::router())
        .nest("/profile", profile::router())
        .nest("/cart", cart::router())
        .nest("/wishlist", wishlist::router())
        .nest("/checkout", checkout::router())
        .nest("/orders", orders::router())
        .nest("/services", services::router())
        .nest("/payments", payments::router())
        .nest("/upload", uploads::router(&config.cloudinary))
        .nest("/notifications", notifications::router())
        .nest("/admin", admin::router())
        .layer(api_rate_limiter(&config.rate_limit));

    auth.merge(api)
        .layer(map_response(rate_limited_json))
        // Paystack retries on failure; never throttle its callbacks.
        .nest("/payments", payments::webhook_router())
}

/// 404 unless the row exists and belongs to `user`.
pub(crate) async fn require_owned(
    state: &AppState,
    resource: OwnedResource,
    id: impl Into<Uuid>,
    user: UserId,
) -> Result<()> {
    ensure_owned(state.pool(), resource, id, user)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => {
                AppError::NotFound(format!("{} not found", resource.label()))
            }
            other => AppError::Database(other),
        })
}

/// Send a message to a user other than the caller, in the background.
///
/// Lookup failures are logged; the triggering request has already succeeded.
pub(crate) async fn notify_user<F>(state: &AppState, user_id: UserId, build: F)
where
    F: FnOnce(&User) -> std::result::Result<Message, askama::Error>,
{
    match UserRepository::new(state.pool()).get_by_id(user_id).await {
        Ok(Some(user)) => {
            let message = build(&user);
            state.notifications().dispatch(user, message);
        }
        Ok(None) => tracing::warn!(user_id = %user_id, "Notification skipped, user no longer exists"),
        Err(e) => tracing::error!(user_id = %user_id, error = %e, "Failed to load user for notification"),
    }
}
