//! Hardware store API library.
//!
//! The HTTP server for a hardware retail shop: catalog, carts, wishlists,
//! checkout, Paystack payments, on-site service requests, notifications and
//! an admin back office. Everything lives here so the binary, the CLI and the
//! integration tests build the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::any::Any;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, Request, header},
    middleware::from_fn,
    response::{IntoResponse, Response},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::error::AppError;
use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Largest JSON body accepted outside the upload routes.
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Build the complete application: health checks at the root, the API under
/// `/api`, and the shared middleware stack around both.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_allowed_origins);
    let api = routes::api_routes(state.config());
    let hard_limit = routes::uploads::body_limit(state.config().cloudinary.max_file_size);

    Router::new()
        .merge(routes::health::router())
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(RequestBodyLimitLayer::new(hard_limit))
        .layer(cors)
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the configured browser origins. A `*` entry allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(middleware::request_id::REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(
            middleware::request_id::REQUEST_ID_HEADER,
        )])
}

/// Turn a handler panic into the usual JSON 500.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    tracing::error!(panic = detail, "Handler panicked");
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}
