//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Two limiters, both keyed by client IP and held in process memory:
//! - `auth_rate_limiter`: Strict limits for `/api/auth` (~10/min)
//! - `api_rate_limiter`: `RATE_LIMIT_REQUESTS` per `RATE_LIMIT_WINDOW` for the rest of `/api`

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::config::RateLimitConfig;
use crate::error::AppError;

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Proxy headers checked in order, before falling back to the peer address.
const CLIENT_IP_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

/// Key extractor that prefers proxy-supplied client IPs.
///
/// `X-Forwarded-For` contributes its first (client-most) entry.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        for name in CLIENT_IP_HEADERS {
            if let Some(ip) = headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
            {
                return Ok(ip);
            }
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 10.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(10)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(10)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(10) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create the general API limiter: `requests` per `window` per IP.
///
/// The bucket holds `requests` tokens and refills evenly over the window.
///
/// # Panics
///
/// This function will not panic. Both the replenish period and the burst size
/// are clamped to at least 1, which `GovernorConfigBuilder` always accepts.
#[must_use]
pub fn api_rate_limiter(limits: &RateLimitConfig) -> RateLimiterLayer {
    let (period_ms, burst) = replenish_schedule(limits);
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_millisecond(period_ms)
        .burst_size(burst)
        .finish()
        .expect("rate limiter config with non-zero period and burst is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Rewrite the limiter's plain-text 429 into the API's JSON error body.
///
/// `Retry-After` and the `x-ratelimit-*` headers set by the limiter are kept.
pub async fn rate_limited_json(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    let (json_parts, body) = AppError::RateLimited.into_response().into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    if let Some(content_type) = json_parts.headers.get(header::CONTENT_TYPE) {
        parts.headers.insert(header::CONTENT_TYPE, content_type.clone());
    }
    Response::from_parts(parts, body)
}

/// Milliseconds per replenished token, and bucket size.
fn replenish_schedule(limits: &RateLimitConfig) -> (u64, u32) {
    let burst = limits.requests.max(1);
    let window_ms = u64::try_from(limits.window.as_millis()).unwrap_or(u64::MAX);
    ((window_ms / u64::from(burst)).max(1), burst)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/api/cart");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_header_precedence() {
        let req = request(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("cf-connecting-ip", "198.51.100.2"),
        ]);
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.2".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_forwarded_for_uses_first_hop() {
        let req = request(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_peer_address_fallback() {
        let mut req = request(&[("x-real-ip", "not-an-ip")]);
        let peer: SocketAddr = "192.0.2.10:51000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(ClientIpKeyExtractor.extract(&req).unwrap(), peer.ip());
    }

    #[test]
    fn test_no_ip_at_all() {
        assert!(ClientIpKeyExtractor.extract(&request(&[])).is_err());
    }

    #[tokio::test]
    async fn test_rate_limited_response_becomes_json() {
        let limited = Response::builder()
            .status(StatusCode::TOO_MANY_REQUESTS)
            .header(header::RETRY_AFTER, "6")
            .body(axum::body::Body::from("Too Many Requests! Wait for 6s"))
            .unwrap();

        let response = rate_limited_json(limited).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "6");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_other_responses_untouched() {
        let ok = Response::builder()
            .status(StatusCode::OK)
            .body(axum::body::Body::from("fine"))
            .unwrap();
        let response = rate_limited_json(ok).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_replenish_schedule() {
        let default = RateLimitConfig {
            requests: 100,
            window: Duration::from_secs(60),
        };
        assert_eq!(replenish_schedule(&default), (600, 100));

        let zero = RateLimitConfig {
            requests: 0,
            window: Duration::from_millis(0),
        };
        assert_eq!(replenish_schedule(&zero), (1, 1));
    }
}
