//! User administration.

use axum::{
    Router,
    extract::State,
    routing::{delete, get, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use hardware_store_core::{Paginated, UserId, UserRole};

use super::page_window;
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{User, UserFilter};
use crate::routes::catalog::non_blank;
use crate::routes::extract::{Json, Path, Query};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}/role", put(set_role))
        .route("/{id}", delete(remove))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<UserRole>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: UserRole,
}

/// An admin may not lock themselves out.
fn check_self_demotion(admin: &User, target: UserId, role: UserRole) -> Result<()> {
    if admin.id == target && role != UserRole::Admin {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin role".to_string(),
        ));
    }
    Ok(())
}

fn check_self_deletion(admin: &User, target: UserId) -> Result<()> {
    if admin.id == target {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Paginated<User>>> {
    let filter = UserFilter {
        role: query.role,
        search: non_blank(query.search),
        page: page_window(query.page, query.limit),
    };
    let (users, total) = UserRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(Paginated::new(users, total, filter.page)))
}

#[instrument(skip(state))]
pub async fn set_role(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(body): Json<RoleUpdate>,
) -> Result<Json<User>> {
    check_self_demotion(&admin, id, body.role)?;

    let user = UserRepository::new(state.pool())
        .set_role(id, body.role)
        .await?;

    tracing::info!(admin_id = %admin.id, user_id = %id, role = %body.role, "User role changed");
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<Value>> {
    check_self_deletion(&admin, id)?;

    let users = UserRepository::new(state.pool());
    if users.has_orders(id).await? {
        return Err(AppError::Conflict(
            "User has orders and cannot be deleted".to_string(),
        ));
    }
    users.delete(id).await?;

    tracing::info!(admin_id = %admin.id, user_id = %id, "User deleted");
    Ok(Json(json!({ "message": "User deleted" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use chrono::Utc;

    use hardware_store_core::Email;

    use super::*;

    fn admin() -> User {
        User {
            id: UserId::new_random(),
            email: Email::parse("ops@hardwarestore.com").unwrap(),
            full_name: "Ops".to_string(),
            phone: None,
            role: UserRole::Admin,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_cannot_demote_self() {
        let admin = admin();
        let err = check_self_demotion(&admin, admin.id, UserRole::Customer).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        assert!(check_self_demotion(&admin, admin.id, UserRole::Admin).is_ok());
        assert!(check_self_demotion(&admin, UserId::new_random(), UserRole::Customer).is_ok());
    }

    #[test]
    fn test_admin_cannot_delete_self() {
        let admin = admin();
        assert!(check_self_deletion(&admin, admin.id).is_err());
        assert!(check_self_deletion(&admin, UserId::new_random()).is_ok());
    }
}
