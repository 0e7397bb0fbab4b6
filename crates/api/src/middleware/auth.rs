//! Authentication extractors.
//!
//! Both extractors read `Authorization: Bearer <jwt>`, verify it and reload
//! the user row, so deleted or deactivated accounts lose access immediately.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use hardware_store_core::UserRole;

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::{AuthService, Claims};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.full_name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub User);

/// Extractor that requires a valid bearer token for an admin account.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Authorization header required".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))
}

fn verified_claims(parts: &Parts, state: &AppState) -> Result<Claims, AppError> {
    let token = bearer_token(parts)?;
    Ok(state.jwt().verify(token)?)
}

async fn load_user(state: &AppState, claims: &Claims) -> Result<User, AppError> {
    let user = AuthService::new(state.pool(), state.jwt())
        .current_user(claims)
        .await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(user)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = verified_claims(parts, state)?;
        Ok(Self(load_user(state, &claims).await?))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = verified_claims(parts, state)?;

        // Reject customer tokens without a database round trip.
        if claims.role != UserRole::Admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        let user = load_user(state, &claims).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/profile");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def.ghi"))).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        assert!(matches!(bearer_token(&parts(None)), Err(AppError::Unauthorized(_))));
        assert!(matches!(
            bearer_token(&parts(Some("Basic dXNlcjpwYXNz"))),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Bearer   "))),
            Err(AppError::Unauthorized(_))
        ));
    }
}
