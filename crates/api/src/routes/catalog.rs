//! Public catalog: categories, product listing, product detail and search.

use std::sync::Arc;

use axum::{Router, extract::State, routing::get};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use hardware_store_core::{Page, PageRequest, SortOrder};

use super::extract::{Json, Path, Query};
use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{Category, Product, ProductDetail, ProductFilter, ProductSort};
use crate::state::AppState;

/// Build the catalog router, mounted at `/api/catalog`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories))
        .route("/products", get(products))
        .route("/products/{slug}", get(product))
        .route("/search", get(search))
}

/// Query string shared by the listing and search endpoints.
///
/// `sort` only accepts the [`ProductSort`] names, so an unknown column fails
/// extraction with a 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: ProductSort,
    #[serde(default)]
    pub order: SortOrder,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub in_stock: bool,
}

impl CatalogQuery {
    /// Storefront filter: active products only.
    fn into_filter(self, search: bool) -> Result<ProductFilter> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(AppError::Validation(
                "min_price must not exceed max_price".to_string(),
            ));
        }

        Ok(ProductFilter {
            category: non_blank(self.category),
            query: non_blank(self.q),
            match_sku: search,
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock: search && self.in_stock,
            active: Some(true),
            sort: self.sort,
            order: self.order,
            page: Page::from(PageRequest {
                page: self.page,
                limit: self.limit,
            }),
        })
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A page of products.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl ProductPage {
    pub(crate) const fn new(products: Vec<Product>, total: i64, page: Page) -> Self {
        Self {
            products,
            total,
            page: page.page,
            limit: page.limit,
            pages: page.page_count(total),
        }
    }
}

#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Arc<Vec<Category>>>> {
    if let Some(cached) = state.cache().categories().await {
        return Ok(Json(cached));
    }

    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(state.cache().put_categories(categories).await))
}

#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<ProductPage>> {
    list(&state, query.into_filter(false)?).await
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<ProductPage>> {
    list(&state, query.into_filter(true)?).await
}

async fn list(state: &AppState, filter: ProductFilter) -> Result<Json<ProductPage>> {
    let (products, total) = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(ProductPage::new(products, total, filter.page)))
}

#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Arc<ProductDetail>>> {
    if let Some(cached) = state.cache().product(&slug).await {
        return Ok(Json(cached));
    }

    let detail = ProductRepository::new(state.pool())
        .get_active_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(state.cache().put_product(&slug, detail).await))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(qs: &str) -> std::result::Result<CatalogQuery, ()> {
        let uri: axum::http::Uri = format!("/api/catalog/products?{qs}").parse().unwrap();
        axum::extract::Query::<CatalogQuery>::try_from_uri(&uri)
            .map(|q| q.0)
            .map_err(|_| ())
    }

    #[test]
    fn test_defaults() {
        let filter = parse("").unwrap().into_filter(false).unwrap();
        assert_eq!(filter.sort, ProductSort::Name);
        assert_eq!(filter.order, SortOrder::Asc);
        assert_eq!(filter.page, Page { page: 1, limit: 20 });
        assert_eq!(filter.active, Some(true));
        assert!(!filter.match_sku);
    }

    #[test]
    fn test_unknown_sort_rejected() {
        assert!(parse("sort=password_hash").is_err());
        assert!(parse("sort=price%3BDROP%20TABLE%20products").is_err());
        assert_eq!(
            parse("sort=stock_quantity&order=desc").unwrap().sort,
            ProductSort::StockQuantity
        );
    }

    #[test]
    fn test_search_only_flags() {
        let query = parse("q=hammer&in_stock=true").unwrap();
        let listing = query.clone().into_filter(false).unwrap();
        assert!(!listing.in_stock);

        let search = query.into_filter(true).unwrap();
        assert!(search.in_stock);
        assert!(search.match_sku);
        assert_eq!(search.query.as_deref(), Some("hammer"));
    }

    #[test]
    fn test_blank_text_ignored() {
        let filter = parse("q=%20%20&category=").unwrap().into_filter(false).unwrap();
        assert!(filter.query.is_none());
        assert!(filter.category.is_none());
    }

    #[test]
    fn test_inverted_price_range() {
        let query = parse("min_price=5000&max_price=100").unwrap();
        assert!(query.into_filter(false).is_err());
    }

    #[test]
    fn test_limit_clamped() {
        let filter = parse("limit=500&page=0").unwrap().into_filter(false).unwrap();
        assert_eq!(filter.page, Page { page: 1, limit: 100 });
    }
}
