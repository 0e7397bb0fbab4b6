//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use url::Url;

use crate::config::ApiConfig;
use crate::services::auth::JwtKeys;
use crate::services::cache::CatalogCache;
use crate::services::notifications::{NotificationError, NotificationService};
use crate::services::payments::{PaymentError, PaystackClient};
use crate::services::uploads::{UploadError, UploadService};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },
    #[error("notification client: {0}")]
    Notification(#[from] NotificationError),
    #[error("payment client: {0}")]
    Payment(#[from] PaymentError),
    #[error("upload client: {0}")]
    Upload(#[from] UploadError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and provider clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    jwt: JwtKeys,
    paystack: PaystackClient,
    notifications: NotificationService,
    uploads: UploadService,
    cache: CatalogCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if `BASE_URL` or `FRONTEND_URL` is not a URL, or a
    /// provider HTTP client cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        for (name, value) in [("BASE_URL", &config.base_url), ("FRONTEND_URL", &config.frontend_url)] {
            Url::parse(value).map_err(|source| StateError::InvalidUrl { name, source })?;
        }

        let jwt = JwtKeys::new(&config.jwt);
        let paystack = PaystackClient::new(config.paystack.secret_key.clone(), &config.base_url)?;
        let notifications = NotificationService::new(pool.clone(), &config)?;
        let uploads = UploadService::new(&config.cloudinary)?;
        let cache = CatalogCache::new(&config.cache);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                jwt,
                paystack,
                notifications,
                uploads,
                cache,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    #[must_use]
    pub fn paystack(&self) -> &PaystackClient {
        &self.inner.paystack
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationService {
        &self.inner.notifications
    }

    #[must_use]
    pub fn uploads(&self) -> &UploadService {
        &self.inner.uploads
    }

    /// Get a reference to the catalog cache.
    #[must_use]
    pub fn cache(&self) -> &CatalogCache {
        &self.inner.cache
    }
}
