//! Catalog domain types: categories, products and list filters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hardware_store_core::{CategoryId, Page, ProductId, SortOrder};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub sku: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    /// Image URLs, first one is the primary image.
    pub images: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product with its category, as shown on the product page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Category,
}

/// The product fields embedded in cart, wishlist and order lines.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub images: Vec<String>,
    pub is_active: bool,
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            sku: product.sku,
            name: product.name,
            slug: product.slug,
            price: product.price,
            stock_quantity: product.stock_quantity,
            images: product.images,
            is_active: product.is_active,
        }
    }
}

/// How an inventory adjustment applies its quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    Add,
    /// Clamped so stock never drops below zero.
    Subtract,
    Set,
}

/// Column a product list may be ordered by.
///
/// Query strings deserialize straight into this enum, so anything outside the
/// whitelist is rejected before a query is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Name,
    Price,
    CreatedAt,
    StockQuantity,
}

impl ProductSort {
    /// Qualified column name for `ORDER BY`.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "p.name",
            Self::Price => "p.price",
            Self::CreatedAt => "p.created_at",
            Self::StockQuantity => "p.stock_quantity",
        }
    }
}

/// Filters shared by the public catalog, search and admin product lists.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Free text matched against name and description.
    pub query: Option<String>,
    /// Also match `query` against the SKU.
    pub match_sku: bool,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Only products with stock on hand.
    pub in_stock: bool,
    /// `Some(true)` for the storefront; admins may see inactive products.
    pub active: Option<bool>,
    pub sort: ProductSort,
    pub order: SortOrder,
    pub page: Page,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub slug: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub category_id: Option<CategoryId>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(())
}

fn check_slug(slug: &str) -> Result<(), String> {
    require("slug", slug)?;
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("slug may only contain lowercase letters, digits and '-'".to_string());
    }
    Ok(())
}

fn check_price(price: Decimal) -> Result<(), String> {
    if price.is_sign_negative() {
        return Err("price must not be negative".to_string());
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<(), String> {
    if stock < 0 {
        return Err("stock_quantity must not be negative".to_string());
    }
    Ok(())
}

impl NewCategory {
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        require("name", &self.name)?;
        check_slug(&self.slug)
    }
}

impl CategoryUpdate {
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        if let Some(slug) = &self.slug {
            check_slug(slug)?;
        }
        Ok(())
    }
}

impl NewProduct {
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        require("sku", &self.sku)?;
        require("name", &self.name)?;
        check_slug(&self.slug)?;
        check_price(self.price)?;
        check_stock(self.stock_quantity)
    }
}

impl ProductUpdate {
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(sku) = &self.sku {
            require("sku", sku)?;
        }
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        if let Some(slug) = &self.slug {
            check_slug(slug)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(stock) = self.stock_quantity {
            check_stock(stock)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct SortQuery {
        sort: ProductSort,
    }

    #[test]
    fn test_sort_whitelist() {
        let parsed: SortQuery = serde_json::from_str(r#"{"sort":"stock_quantity"}"#).unwrap();
        assert_eq!(parsed.sort, ProductSort::StockQuantity);
        assert_eq!(parsed.sort.column(), "p.stock_quantity");

        let rejected = serde_json::from_str::<SortQuery>(r#"{"sort":"price; DROP TABLE users"}"#);
        assert!(rejected.is_err());
        assert!(serde_json::from_str::<SortQuery>(r#"{"sort":"password_hash"}"#).is_err());
    }

    #[test]
    fn test_default_sort_is_name() {
        assert_eq!(ProductSort::default().column(), "p.name");
    }

    #[test]
    fn test_new_product_validation() {
        let mut product = NewProduct {
            sku: "HAM-001".to_string(),
            name: "Claw Hammer".to_string(),
            slug: "claw-hammer".to_string(),
            category_id: CategoryId::new_random(),
            description: String::new(),
            price: Decimal::new(250_000, 2),
            stock_quantity: 5,
            images: vec![],
            is_active: true,
        };
        assert!(product.validate().is_ok());

        product.price = Decimal::new(-1, 0);
        assert_eq!(product.validate().unwrap_err(), "price must not be negative");

        product.price = Decimal::ZERO;
        product.slug = "Claw Hammer".to_string();
        assert!(product.validate().is_err());
    }

    #[test]
    fn test_product_update_validation() {
        let update = ProductUpdate {
            stock_quantity: Some(-3),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(ProductUpdate::default().validate().is_ok());
    }
}
