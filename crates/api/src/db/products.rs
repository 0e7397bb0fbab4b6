//! Product repository: catalog queries, admin CRUD and stock movements.
//!
//! List queries are assembled with [`QueryBuilder`]. Every filter value is a
//! bound parameter and the only interpolated SQL is the column returned by
//! [`ProductSort::column`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use hardware_store_core::{CategoryId, ProductId};

use super::RepositoryError;
use super::categories::CategoryRow;
use super::users::escape_like;
use crate::models::{
    NewProduct, Product, ProductDetail, ProductFilter, ProductSort, ProductUpdate, StockOperation,
};

const PRODUCT_COLUMNS: &str = "p.id, p.category_id, p.sku, p.name, p.slug, p.description, \
     p.price, p.stock_quantity, p.images, p.is_active, p.created_at, p.updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: ProductId,
    category_id: CategoryId,
    sku: String,
    name: String,
    slug: String,
    description: String,
    price: Decimal,
    stock_quantity: i32,
    images: Json<Vec<String>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            sku: row.sku,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            stock_quantity: row.stock_quantity,
            images: row.images.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductDetailRow {
    #[sqlx(flatten)]
    product: ProductRow,
    category_name: String,
    category_slug: String,
    category_created_at: DateTime<Utc>,
    category_updated_at: DateTime<Utc>,
}

impl From<ProductDetailRow> for ProductDetail {
    fn from(row: ProductDetailRow) -> Self {
        let category = CategoryRow {
            id: row.product.category_id,
            name: row.category_name,
            slug: row.category_slug,
            created_at: row.category_created_at,
            updated_at: row.category_updated_at,
        };
        Self {
            product: row.product.into(),
            category: category.into(),
        }
    }
}

/// Translate a unique violation on `products` into a message naming the column.
fn product_conflict(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        let message = match db_err.constraint() {
            Some(c) if c.contains("sku") => "a product with this SKU already exists",
            Some(c) if c.contains("slug") => "a product with this slug already exists",
            _ => "product already exists",
        };
        return RepositoryError::Conflict(message.to_owned());
    }
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict("category does not exist".to_owned());
    }
    RepositoryError::Database(err)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Filtered, sorted, paginated product list with the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM products p JOIN categories c ON c.id = p.category_id WHERE TRUE",
        );
        push_product_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             JOIN categories c ON c.id = p.category_id WHERE TRUE"
        ));
        push_product_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(filter.sort.column())
            .push(" ")
            .push(filter.order.as_sql());
        if filter.sort != ProductSort::Name {
            query.push(", p.name ASC");
        }
        query
            .push(" LIMIT ")
            .push_bind(filter.page.limit)
            .push(" OFFSET ")
            .push_bind(filter.page.offset());

        let rows: Vec<ProductRow> = query.build_query_as().fetch_all(self.pool).await?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// An active product with its category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductDetailRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS},
                   c.name AS category_name,
                   c.slug AS category_slug,
                   c.created_at AS category_created_at,
                   c.updated_at AS category_updated_at
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.slug = $1 AND p.is_active
            "
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// A product only if it is active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.get(id).await?.filter(|p| p.is_active))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a duplicate SKU or slug, or an
    /// unknown category.
    pub async fn create(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products AS p
                (category_id, sku, name, slug, description, price, stock_quantity, images, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(input.category_id)
        .bind(input.sku.trim())
        .bind(input.name.trim())
        .bind(input.slug.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(Json(&input.images))
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(product_conflict)?;

        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` for a duplicate SKU or slug.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products AS p
            SET sku = COALESCE($2, p.sku),
                name = COALESCE($3, p.name),
                slug = COALESCE($4, p.slug),
                category_id = COALESCE($5, p.category_id),
                description = COALESCE($6, p.description),
                price = COALESCE($7, p.price),
                stock_quantity = COALESCE($8, p.stock_quantity),
                images = COALESCE($9, p.images),
                is_active = COALESCE($10, p.is_active),
                updated_at = NOW()
            WHERE p.id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(input.sku.as_deref().map(str::trim))
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.slug.as_deref().map(str::trim))
        .bind(input.category_id)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(input.images.as_ref().map(Json))
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(product_conflict)?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Whether any order line references the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_order_items(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM order_items WHERE product_id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Adjust stock on hand. Subtraction is clamped at zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn adjust_stock(
        &self,
        id: ProductId,
        operation: StockOperation,
        quantity: i32,
    ) -> Result<Product, RepositoryError> {
        let expression = match operation {
            StockOperation::Add => "p.stock_quantity + $2",
            StockOperation::Subtract => "GREATEST(p.stock_quantity - $2, 0)",
            StockOperation::Set => "$2",
        };

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products AS p
            SET stock_quantity = {expression}, updated_at = NOW()
            WHERE p.id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Active products with stock below `threshold`, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            WHERE p.is_active AND p.stock_quantity < $1
            ORDER BY p.stock_quantity ASC, p.name ASC
            "
        ))
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert or refresh a product by SKU. Used by the seeder; stock is only
    /// set on first insert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_by_sku(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products AS p
                (category_id, sku, name, slug, description, price, stock_quantity, images, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (sku) DO UPDATE
            SET category_id = EXCLUDED.category_id,
                name = EXCLUDED.name,
                slug = EXCLUDED.slug,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                images = EXCLUDED.images,
                updated_at = NOW()
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(input.category_id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(Json(&input.images))
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(product_conflict)?;

        Ok(row.into())
    }
}

/// Take `quantity` units out of stock inside a checkout transaction.
///
/// Returns `false` when the product does not have enough stock, in which case
/// nothing was changed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn decrement_stock(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE products
        SET stock_quantity = stock_quantity - $1, updated_at = NOW()
        WHERE id = $2 AND stock_quantity >= $1
        ",
    )
    .bind(quantity)
    .bind(id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Put `quantity` units back into stock inside a cancellation transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn restore_stock(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE products SET stock_quantity = stock_quantity + $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(quantity)
    .bind(id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn push_product_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(active) = filter.active {
        query.push(" AND p.is_active = ").push_bind(active);
    }
    if let Some(category) = filter.category.as_deref().filter(|s| !s.is_empty()) {
        query.push(" AND c.slug = ").push_bind(category.to_owned());
    }
    if let Some(text) = filter
        .query
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{}%", escape_like(text));
        query
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern.clone());
        if filter.match_sku {
            query.push(" OR p.sku ILIKE ").push_bind(pattern);
        }
        query.push(")");
    }
    if let Some(min) = filter.min_price {
        query.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query.push(" AND p.price <= ").push_bind(max);
    }
    if filter.in_stock {
        query.push(" AND p.stock_quantity > 0");
    }
}

#[cfg(test)]
mod tests {
    use hardware_store_core::SortOrder;

    use super::*;

    #[test]
    fn test_list_sql_binds_user_input() {
        let filter = ProductFilter {
            category: Some("tools".to_string()),
            query: Some("drill'; --".to_string()),
            match_sku: true,
            min_price: Some(Decimal::new(100, 0)),
            in_stock: true,
            active: Some(true),
            sort: ProductSort::Price,
            order: SortOrder::Desc,
            ..Default::default()
        };

        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM products p WHERE TRUE");
        push_product_filters(&mut query, &filter);
        let sql = query.sql();

        assert!(!sql.contains("drill"));
        assert!(!sql.contains("tools"));
        assert!(sql.contains("p.sku ILIKE $"));
        assert!(sql.contains("p.stock_quantity > 0"));
        assert!(sql.contains("p.is_active = $1"));
    }

    #[test]
    fn test_search_without_sku() {
        let filter = ProductFilter {
            query: Some("hammer".to_string()),
            ..Default::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM products p WHERE TRUE");
        push_product_filters(&mut query, &filter);
        assert!(!query.sql().contains("sku"));
    }
}
