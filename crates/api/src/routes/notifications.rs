//! The signed-in user's notification inbox.

use axum::{
    Router,
    extract::State,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use hardware_store_core::NotificationId;

use super::extract::{Json, Path, Query};
use super::require_owned;
use crate::db::{NotificationRepository, OwnedResource};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Notification;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}/read", put(mark_read))
}

#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl InboxQuery {
    fn window(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Serialize)]
pub struct Inbox {
    pub notifications: Vec<Notification>,
    pub limit: i64,
    pub offset: i64,
    pub count: usize,
}

#[instrument(skip(state))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<InboxQuery>,
) -> Result<Json<Inbox>> {
    let (limit, offset) = query.window();
    let notifications = NotificationRepository::new(state.pool())
        .list_for_user(user.id, limit, offset)
        .await?;

    Ok(Json(Inbox {
        count: notifications.len(),
        notifications,
        limit,
        offset,
    }))
}

#[instrument(skip(state))]
pub async fn mark_read(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<NotificationId>,
) -> Result<Json<Value>> {
    require_owned(&state, OwnedResource::Notification, id, user.id).await?;
    NotificationRepository::new(state.pool()).mark_read(id).await?;
    Ok(Json(json!({ "message": "Notification marked as read" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults_and_bounds() {
        assert_eq!(InboxQuery::default().window(), (20, 0));

        let query = InboxQuery {
            limit: Some(1000),
            offset: Some(-5),
        };
        assert_eq!(query.window(), (100, 0));
    }
}
