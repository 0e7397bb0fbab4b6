//! Database operations for the Hardware Store `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users`, `addresses` - Accounts, credentials and saved addresses
//! - `categories`, `products` - Catalog and stock levels
//! - `carts`, `cart_items`, `wishlists` - Per-user shopping state
//! - `orders`, `order_items`, `payments` - Placed orders and their payments
//! - `notifications` - Log of every email/SMS attempt
//! - `service_requests` - Installation and repair tickets
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p hardware-store-cli -- migrate
//! ```

pub mod addresses;
pub mod carts;
pub mod categories;
pub mod notifications;
pub mod orders;
pub mod ownership;
pub mod payments;
pub mod products;
pub mod reports;
pub mod service_requests;
pub mod users;
pub mod wishlists;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use notifications::NotificationRepository;
pub use orders::{CancelOutcome, OrderRepository};
pub use ownership::{OwnedResource, ensure_owned};
pub use payments::{ChargeOutcome, PaymentRepository};
pub use products::ProductRepository;
pub use reports::ReportRepository;
pub use service_requests::ServiceRequestRepository;
pub use users::UserRepository;
pub use wishlists::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, everything else to `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_string());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options()
        .connect(database_url.expose_secret())
        .await
}

/// Create a pool that connects on first use.
///
/// Used by tests that exercise the router without a database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection string cannot be parsed.
pub fn create_lazy_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options()
        .min_connections(0)
        .connect_lazy(database_url.expose_secret())
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
}
