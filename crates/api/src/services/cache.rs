//! In-process catalog cache.
//!
//! Caches the category list and product detail pages using `moka`. The
//! database stays authoritative: every admin write to products or categories
//! calls [`CatalogCache::invalidate_all`].

use std::sync::Arc;

use moka::future::Cache;
use serde::Serialize;
use tracing::debug;

use crate::config::CacheConfig;
use crate::models::{Category, ProductDetail};

const CATEGORIES_KEY: &str = "categories";

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Product(Arc<ProductDetail>),
}

/// Entry counts reported by `/health/cache`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub max_entries: u64,
}

/// Catalog read cache.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<String, CacheValue>,
    max_entries: u64,
}

impl CatalogCache {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();

        Self {
            cache,
            max_entries: config.max_entries,
        }
    }

    pub async fn categories(&self) -> Option<Arc<Vec<Category>>> {
        match self.cache.get(CATEGORIES_KEY).await {
            Some(CacheValue::Categories(categories)) => {
                debug!("Cache hit for categories");
                Some(categories)
            }
            _ => None,
        }
    }

    pub async fn put_categories(&self, categories: Vec<Category>) -> Arc<Vec<Category>> {
        let categories = Arc::new(categories);
        self.cache
            .insert(
                CATEGORIES_KEY.to_string(),
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;
        categories
    }

    pub async fn product(&self, slug: &str) -> Option<Arc<ProductDetail>> {
        match self.cache.get(&product_key(slug)).await {
            Some(CacheValue::Product(product)) => {
                debug!(slug = %slug, "Cache hit for product");
                Some(product)
            }
            _ => None,
        }
    }

    pub async fn put_product(&self, slug: &str, product: ProductDetail) -> Arc<ProductDetail> {
        let product = Arc::new(product);
        self.cache
            .insert(product_key(slug), CacheValue::Product(Arc::clone(&product)))
            .await;
        product
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        CacheStats {
            entries: self.cache.entry_count(),
            max_entries: self.max_entries,
        }
    }
}

fn product_key(slug: &str) -> String {
    format!("product:{slug}")
}
