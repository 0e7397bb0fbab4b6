//! Seed the catalog with demo categories and products.
//!
//! Categories are matched on slug and products on SKU, so the command can be
//! re-run after editing the YAML. Existing rows are updated in place, except
//! stock, which is only set when a product is first created.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use hardware_store_api::db::{CategoryRepository, ProductRepository, RepositoryError};
use hardware_store_api::models::NewProduct;

use super::{ConnectError, connect};

/// The catalog bundled with the binary.
const DEMO_CATALOG: &str = include_str!("../../seed/catalog.yaml");

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Product {sku} references unknown category {category}")]
    UnknownCategory { sku: String, category: String },

    #[error("Product {sku}: {reason}")]
    InvalidProduct { sku: String, reason: String },
}

#[derive(Debug, Deserialize)]
pub struct SeedCatalog {
    pub categories: Vec<SeedCategory>,
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub sku: String,
    pub name: String,
    pub slug: String,
    /// Slug of one of the catalog's categories.
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
}

impl SeedCatalog {
    /// Parse and check a catalog before anything touches the database.
    pub fn parse(content: &str) -> Result<Self, SeedError> {
        let catalog: Self = serde_yaml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), SeedError> {
        for product in &self.products {
            if !self.categories.iter().any(|c| c.slug == product.category) {
                return Err(SeedError::UnknownCategory {
                    sku: product.sku.clone(),
                    category: product.category.clone(),
                });
            }
            if product.price.is_sign_negative() {
                return Err(SeedError::InvalidProduct {
                    sku: product.sku.clone(),
                    reason: "price must not be negative".to_string(),
                });
            }
            if product.stock < 0 {
                return Err(SeedError::InvalidProduct {
                    sku: product.sku.clone(),
                    reason: "stock must not be negative".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Load a catalog file (or the bundled demo catalog) into the database.
pub async fn catalog(file: Option<&Path>) -> Result<(), SeedError> {
    let catalog = match file {
        Some(path) => {
            info!(path = %path.display(), "Loading catalog from file");
            let content =
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SeedError::Read {
                        path: path.display().to_string(),
                        source,
                    })?;
            SeedCatalog::parse(&content)?
        }
        None => SeedCatalog::parse(DEMO_CATALOG)?,
    };

    info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Catalog validated"
    );

    let pool = connect().await?;
    upsert(&pool, &catalog).await?;

    info!("Seeding complete!");
    Ok(())
}

async fn upsert(pool: &PgPool, catalog: &SeedCatalog) -> Result<(), SeedError> {
    let categories = CategoryRepository::new(pool);
    let products = ProductRepository::new(pool);

    let mut ids = HashMap::new();
    for category in &catalog.categories {
        let saved = categories
            .upsert_by_slug(&category.name, &category.slug)
            .await?;
        info!("  Category: {}", saved.name);
        ids.insert(category.slug.as_str(), saved.id);
    }

    for product in &catalog.products {
        let category_id = ids.get(product.category.as_str()).copied().ok_or_else(|| {
            SeedError::UnknownCategory {
                sku: product.sku.clone(),
                category: product.category.clone(),
            }
        })?;

        let saved = products
            .upsert_by_sku(&NewProduct {
                sku: product.sku.clone(),
                name: product.name.clone(),
                slug: product.slug.clone(),
                category_id,
                description: product.description.clone(),
                price: product.price,
                stock_quantity: product.stock,
                images: product.images.clone(),
                is_active: true,
            })
            .await?;
        info!("  Product: {} ({})", saved.name, saved.sku);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog = SeedCatalog::parse(DEMO_CATALOG).unwrap();
        let slugs: Vec<_> = catalog.categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(
            slugs,
            [
                "tools",
                "electrical",
                "plumbing",
                "building-materials",
                "hardware",
                "garden-outdoor"
            ]
        );
        assert!(catalog.products.iter().any(|p| p.sku == "HAM-001"));
        assert!(catalog.products.iter().any(|p| p.sku == "CEM-001"));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let yaml = r#"
categories:
  - { name: Tools, slug: tools }
products:
  - { sku: X-1, name: X, slug: x, category: nails, price: "1.00", stock: 1 }
"#;
        assert!(matches!(
            SeedCatalog::parse(yaml),
            Err(SeedError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_negative_stock_is_rejected() {
        let yaml = r#"
categories:
  - { name: Tools, slug: tools }
products:
  - { sku: X-1, name: X, slug: x, category: tools, price: "1.00", stock: -3 }
"#;
        assert!(matches!(
            SeedCatalog::parse(yaml),
            Err(SeedError::InvalidProduct { .. })
        ));
    }
}
