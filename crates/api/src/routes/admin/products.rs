//! Product management. Every write drops the catalog cache.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use hardware_store_core::{Paginated, ProductId, SortOrder};

use super::page_window;
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, Product, ProductFilter, ProductSort, ProductUpdate};
use crate::routes::catalog::non_blank;
use crate::routes::extract::{Json, Path, Query};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", put(update).delete(remove))
}

/// Admin listing includes inactive products unless `active` says otherwise.
#[derive(Debug, Default, Deserialize)]
pub struct AdminProductQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub active: Option<bool>,
    pub sort: Option<ProductSort>,
    pub order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<AdminProductQuery> for ProductFilter {
    fn from(query: AdminProductQuery) -> Self {
        Self {
            category: non_blank(query.category),
            query: non_blank(query.q),
            match_sku: true,
            active: query.active,
            sort: query.sort.unwrap_or(ProductSort::CreatedAt),
            order: query.order.unwrap_or(SortOrder::Desc),
            page: page_window(query.page, query.limit),
            ..Self::default()
        }
    }
}

#[instrument(skip(state))]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AdminProductQuery>,
) -> Result<Json<Paginated<Product>>> {
    let filter = ProductFilter::from(query);
    let (products, total) = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(Paginated::new(products, total, filter.page)))
}

#[instrument(skip(state))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    body.validate().map_err(AppError::Validation)?;

    let product = ProductRepository::new(state.pool()).create(&body).await?;
    state.cache().invalidate_all().await;

    tracing::info!(admin_id = %admin.id, product_id = %product.id, sku = %product.sku, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    body.validate().map_err(AppError::Validation)?;

    let product = ProductRepository::new(state.pool()).update(id, &body).await?;
    state.cache().invalidate_all().await;

    tracing::info!(admin_id = %admin.id, product_id = %id, "Product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    let products = ProductRepository::new(state.pool());
    if products.has_order_items(id).await? {
        return Err(AppError::Conflict(
            "Product has been ordered and cannot be deleted; deactivate it instead".to_string(),
        ));
    }

    products.delete(id).await?;
    state.cache().invalidate_all().await;

    tracing::info!(admin_id = %admin.id, product_id = %id, "Product deleted");
    Ok(Json(json!({ "message": "Product deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_defaults() {
        let filter = ProductFilter::from(AdminProductQuery::default());
        assert_eq!(filter.sort, ProductSort::CreatedAt);
        assert_eq!(filter.order, SortOrder::Desc);
        assert_eq!(filter.active, None);
        assert!(filter.match_sku);
    }
}
