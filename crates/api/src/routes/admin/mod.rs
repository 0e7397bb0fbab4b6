//! Staff-only endpoints under `/api/admin`.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin), so a
//! customer token gets 403 and no token gets 401.
//!
//! ```text
//! /categories            catalog taxonomy
//! /products              catalog CRUD
//! /inventory             stock adjustments and low-stock list
//! /orders                fulfilment
//! /services/requests     quotes and job progress
//! /users                 roles and account removal
//! /reports               sales, inventory and user statistics
//! ```

pub mod categories;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod reports;
pub mod services;
pub mod users;

use axum::Router;
use hardware_store_core::{Page, PageRequest};

use crate::state::AppState;

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/inventory", inventory::router())
        .nest("/orders", orders::router())
        .nest("/services", services::router())
        .nest("/users", users::router())
        .nest("/reports", reports::router())
}

/// Normalize `page`/`limit` query values.
pub(super) fn page_window(page: Option<i64>, limit: Option<i64>) -> Page {
    Page::from(PageRequest { page, limit })
}
