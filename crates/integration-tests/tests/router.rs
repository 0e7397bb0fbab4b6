//! Router tests: the full middleware stack without a database.
//!
//! Every request here is answered before any handler reaches the pool.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha512;

use hardware_store_integration_tests::{
    TEST_PAYSTACK_SECRET, json_body, send, test_config, test_router,
};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_liveness() {
    let app = test_router(test_config());
    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "hardware-store-api");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_provider_flags() {
    let app = test_router(test_config());
    let body = json_body(send(&app, get("/health/services")).await).await;
    assert_eq!(
        body,
        json!({ "paystack": true, "sendgrid": false, "twilio": false, "cloudinary": false })
    );
}

#[tokio::test]
async fn test_cache_health() {
    let app = test_router(test_config());
    let response = send(&app, get("/health/cache")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

// =============================================================================
// Middleware
// =============================================================================

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = test_router(test_config());
    let response = send(&app, get("/health")).await;
    let headers = response.headers();

    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("strict-transport-security"));
    assert!(!headers["x-request-id"].is_empty());
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let app = test_router(test_config());
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "lb-1234")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers()["x-request-id"], "lb-1234");
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let app = test_router(test_config());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/cart")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_cors_ignores_unknown_origin() {
    let app = test_router(test_config());
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert!(
        !response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = test_router(test_config());
    for uri in [
        "/api/profile",
        "/api/cart",
        "/api/wishlist",
        "/api/orders",
        "/api/notifications",
        "/api/services/requests",
        "/api/admin/users",
        "/api/admin/reports/inventory",
    ] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let body = json_body(response).await;
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = test_router(test_config());
    let request = Request::builder()
        .uri("/api/cart")
        .header(header::AUTHORIZATION, "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_login_body_is_bad_request() {
    let app = test_router(test_config());
    let response = send(&app, post_json("/api/auth/login", "{not json")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_auth_routes_are_throttled() {
    let app = test_router(test_config());

    // Burst of 10; the bodies never reach the database.
    for _ in 0..10 {
        let response = send(&app, post_json("/api/auth/login", "{}")).await;
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let response = send(&app, post_json("/api/auth/login", "{}")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(
        json_body(response).await["error"],
        json!("Too many requests")
    );

    // Other API routes have their own budget.
    let response = send(&app, get("/api/catalog/products?min_price=9&max_price=1")).await;
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

// =============================================================================
// Catalog validation
// =============================================================================

#[tokio::test]
async fn test_inverted_price_range() {
    let app = test_router(test_config());
    let response = send(&app, get("/api/catalog/products?min_price=50&max_price=10")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_sort_column() {
    let app = test_router(test_config());
    let response = send(&app, get("/api/catalog/products?sort=password_hash")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Payment webhook
// =============================================================================

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha512>::new_from_slice(TEST_PAYSTACK_SECRET.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn webhook(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/payments/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-paystack-signature", signature);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

#[tokio::test]
async fn test_webhook_requires_signature() {
    let app = test_router(test_config());
    let body = r#"{"event":"charge.success","data":{"reference":"HS-1"}}"#;
    let response = send(&app, webhook(body, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let app = test_router(test_config());
    let body = r#"{"event":"charge.success","data":{"reference":"HS-1"}}"#;
    let forged = sign(b"something else");
    let response = send(&app, webhook(body, Some(&forged))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_ignores_unrelated_events() {
    let app = test_router(test_config());
    let body = r#"{"event":"transfer.success","data":{"reference":"TRF-1"}}"#;
    let response = send(&app, webhook(body, Some(&sign(body.as_bytes())))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["outcome"], "ignored");
}

#[tokio::test]
async fn test_webhook_disabled_without_paystack() {
    let mut config = test_config();
    config.paystack.secret_key = None;
    let app = test_router(config);

    let body = r#"{"event":"charge.success","data":{"reference":"HS-1"}}"#;
    let response = send(&app, webhook(body, Some(&sign(body.as_bytes())))).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
