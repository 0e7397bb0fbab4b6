//! Stock adjustments.

use axum::{
    Router,
    extract::State,
    routing::{get, put},
};
use serde::Deserialize;
use tracing::instrument;

use hardware_store_core::ProductId;

use crate::db::ProductRepository;
use crate::db::reports::LOW_STOCK_THRESHOLD;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Product, StockOperation};
use crate::routes::extract::{Json, Query};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stock", put(adjust))
        .route("/low-stock", get(low_stock))
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub quantity: i32,
    pub operation: StockOperation,
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

#[instrument(skip(state))]
pub async fn adjust(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<StockAdjustment>,
) -> Result<Json<Product>> {
    if body.quantity < 0 {
        return Err(AppError::Validation(
            "quantity must not be negative".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .adjust_stock(body.product_id, body.operation, body.quantity)
        .await?;
    state.cache().invalidate_all().await;

    tracing::info!(
        admin_id = %admin.id,
        product_id = %product.id,
        operation = ?body.operation,
        quantity = body.quantity,
        stock = product.stock_quantity,
        "Stock adjusted"
    );
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn low_stock(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<Vec<Product>>> {
    let threshold = query.threshold.unwrap_or(LOW_STOCK_THRESHOLD).max(0);
    let products = ProductRepository::new(state.pool())
        .low_stock(threshold)
        .await?;
    Ok(Json(products))
}
