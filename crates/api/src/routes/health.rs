//! Liveness and dependency health checks.

use std::time::Instant;

use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::extract::Json;
use crate::services::cache::CacheStats;
use crate::state::AppState;

const SERVICE_NAME: &str = "hardware-store-api";

/// Build the health router (mounted outside `/api`, never rate limited).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(database))
        .route("/health/cache", get(cache))
        .route("/health/services", get(services))
        .route("/health/full", get(full))
}

#[derive(Debug, Serialize)]
struct Liveness {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: DateTime<Utc>,
}

impl Liveness {
    fn now() -> Self {
        Self {
            status: "healthy",
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DatabaseHealth {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    pool_size: u32,
    pool_idle: usize,
}

impl DatabaseHealth {
    const fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Serialize)]
struct CacheHealth {
    status: &'static str,
    #[serde(flatten)]
    stats: CacheStats,
}

/// Which optional providers have credentials.
#[derive(Debug, Serialize)]
struct ProviderStatus {
    paystack: bool,
    sendgrid: bool,
    twilio: bool,
    cloudinary: bool,
}

#[derive(Debug, Serialize)]
struct FullHealth {
    #[serde(flatten)]
    liveness: Liveness,
    database: DatabaseHealth,
    cache: CacheHealth,
    services: ProviderStatus,
}

/// Liveness: the process is up. Does not check dependencies.
async fn health() -> Json<Liveness> {
    Json(Liveness::now())
}

async fn database(State(state): State<AppState>) -> impl IntoResponse {
    let report = check_database(&state).await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

async fn cache(State(state): State<AppState>) -> Json<CacheHealth> {
    Json(CacheHealth {
        status: "healthy",
        stats: state.cache().stats().await,
    })
}

async fn services(State(state): State<AppState>) -> Json<ProviderStatus> {
    Json(provider_status(&state))
}

/// Everything at once. Only the database can make this unhealthy; missing
/// optional providers are reported but never fail the check.
async fn full(State(state): State<AppState>) -> impl IntoResponse {
    let database = check_database(&state).await;
    let healthy = database.is_healthy();

    let mut liveness = Liveness::now();
    if !healthy {
        liveness.status = "unhealthy";
    }

    let body = FullHealth {
        liveness,
        database,
        cache: CacheHealth {
            status: "healthy",
            stats: state.cache().stats().await,
        },
        services: provider_status(&state),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

async fn check_database(state: &AppState) -> DatabaseHealth {
    let pool = state.pool();
    let started = Instant::now();
    let result = sqlx::query("SELECT 1").execute(pool).await;

    match result {
        Ok(_) => DatabaseHealth {
            status: "healthy",
            latency_ms: Some(started.elapsed().as_millis()),
            error: None,
            pool_size: pool.size(),
            pool_idle: pool.num_idle(),
        },
        Err(err) => {
            tracing::warn!(error = %err, "Database health check failed");
            DatabaseHealth {
                status: "unhealthy",
                latency_ms: None,
                error: Some("database unreachable".to_string()),
                pool_size: pool.size(),
                pool_idle: pool.num_idle(),
            }
        }
    }
}

fn provider_status(state: &AppState) -> ProviderStatus {
    ProviderStatus {
        paystack: state.paystack().is_configured(),
        sendgrid: state.notifications().email_configured(),
        twilio: state.notifications().sms_configured(),
        cloudinary: state.uploads().is_configured(),
    }
}
