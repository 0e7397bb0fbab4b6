//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `CatchPanicLayer` (panics become JSON 500s)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Security headers
//! 6. CORS and body limit
//! 7. Rate limiting (governor), on `/api` routes only

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{RequireAdmin, RequireAuth};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter, rate_limited_json};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
