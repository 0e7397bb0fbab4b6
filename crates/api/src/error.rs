//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`, and every error body is `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::MultipartRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::notifications::NotificationError;
use crate::services::payments::PaymentError;
use crate::services::uploads::UploadError;

const INTERNAL_MESSAGE: &str = "Internal server error";
const UPSTREAM_MESSAGE: &str = "External service error";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order placement failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment provider or webhook failure.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Email or SMS delivery failure.
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// File upload failure.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Request body or query failed validation.
    #[error("{0}")]
    Validation(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// User is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the required role.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (or not owned by the caller).
    #[error("{0}")]
    NotFound(String),

    /// Request conflicts with existing state.
    #[error("{0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Too many requests")]
    RateLimited,

    /// An optional provider is not configured.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// A provider call failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => repository_status(err),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::Inactive
                | AuthError::InvalidToken
                | AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidPhone(_)
                | AuthError::InvalidResetToken
                | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(err) => repository_status(err),
                AuthError::PasswordHash(_) | AuthError::TokenEncoding(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::InvalidRequest(_) => {
                    StatusCode::BAD_REQUEST
                }
                CheckoutError::InsufficientStock { .. } => StatusCode::CONFLICT,
                CheckoutError::Repository(err) => repository_status(err),
            },
            Self::Payment(err) => match err {
                PaymentError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                PaymentError::MissingSignature | PaymentError::InvalidPayload(_) => {
                    StatusCode::BAD_REQUEST
                }
                PaymentError::InvalidSignature => StatusCode::UNAUTHORIZED,
                PaymentError::Http(_) | PaymentError::Api { .. } | PaymentError::Parse(_) => {
                    StatusCode::BAD_GATEWAY
                }
                PaymentError::Repository(err) => repository_status(err),
            },
            Self::Notification(err) => match err {
                NotificationError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
                NotificationError::Http(_) | NotificationError::Api { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                NotificationError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
                NotificationError::Repository(err) => repository_status(err),
            },
            Self::Upload(err) => match err {
                UploadError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                UploadError::MissingFile(_)
                | UploadError::TooManyFiles { .. }
                | UploadError::UnsupportedFormat(_)
                | UploadError::TooLarge { .. }
                | UploadError::Multipart(_) => StatusCode::BAD_REQUEST,
                UploadError::Http(_) | UploadError::Api { .. } | UploadError::Parse(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client.
    ///
    /// 500 and 502 details are only exposed by debug builds.
    #[must_use]
    pub fn public_message(&self) -> String {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR && !cfg!(debug_assertions) {
            return INTERNAL_MESSAGE.to_string();
        }
        if status == StatusCode::BAD_GATEWAY && !cfg!(debug_assertions) {
            return UPSTREAM_MESSAGE.to_string();
        }

        match self {
            Self::Database(err) | Self::Auth(AuthError::Repository(err)) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                other => other.to_string(),
            },
            Self::Auth(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Payment(err) => err.to_string(),
            Self::Notification(err) => err.to_string(),
            Self::Upload(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                status = status.as_u16(),
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

// Extractor rejections keep the `{"error": ...}` shape.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Order placed", Some(&[("order_id", "…")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Order not found".to_string());
        assert_eq!(err.to_string(), "Order not found");

        let err = AppError::Validation("quantity must be greater than zero".to_string());
        assert_eq!(err.public_message(), "quantity must be greater than zero");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Conflict("x".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::ServiceUnavailable("x".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Upstream("x".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_to_status() {
        assert_eq!(
            get_status(RepositoryError::Conflict("sku".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(RepositoryError::DataCorruption("bad email".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_errors_map_to_status() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::Inactive.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(
                CheckoutError::InsufficientStock {
                    product: "Claw Hammer".to_string()
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(PaymentError::InvalidSignature.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(PaymentError::NotConfigured.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(UploadError::UnsupportedFormat("exe".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_user_facing_auth_messages() {
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).public_message(),
            "Invalid credentials"
        );
        assert_eq!(
            AppError::from(AuthError::Inactive).public_message(),
            "Account is deactivated"
        );
        assert_eq!(
            AppError::from(AuthError::InvalidResetToken).public_message(),
            "Invalid or expired reset token"
        );
    }

    #[test]
    fn test_internal_details_hidden_outside_debug_builds() {
        let message = AppError::Internal("connection refused on 10.0.0.3".to_string())
            .public_message();
        if cfg!(debug_assertions) {
            assert!(message.contains("connection refused"));
        } else {
            assert_eq!(message, INTERNAL_MESSAGE);
        }
    }
}
