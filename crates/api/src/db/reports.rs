//! Aggregate queries behind the admin reports.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use sqlx::PgPool;

use hardware_store_core::{ProductId, UserRole};

use super::RepositoryError;
use super::products::ProductRepository;
use crate::models::{InventoryReport, SalesReport, TopProduct, UserReport};

/// Products below this stock level count as low in the inventory report.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

const TOP_PRODUCTS_LIMIT: i64 = 10;

#[derive(Debug, sqlx::FromRow)]
struct TopProductRow {
    product_id: ProductId,
    name: String,
    sku: String,
    quantity_sold: i64,
    revenue: Decimal,
}

impl From<TopProductRow> for TopProduct {
    fn from(row: TopProductRow) -> Self {
        Self {
            product_id: row.product_id,
            name: row.name,
            sku: row.sku,
            quantity_sold: row.quantity_sold,
            revenue: row.revenue,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryTotalsRow {
    total_products: i64,
    low_stock_count: i64,
    total_inventory_value: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct UserCountsRow {
    total_users: i64,
    admin_users: i64,
    active_users: i64,
}

/// Repository for reporting queries.
pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Sales between two dates, both inclusive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn sales(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<SalesReport, RepositoryError> {
        let end_exclusive = end_date + Duration::days(1);

        let (total_sales, total_orders): (Decimal, i64) = sqlx::query_as(
            r"
            SELECT COALESCE(SUM(total) FILTER (WHERE status = 'delivered'), 0),
                   COUNT(*)
            FROM orders
            WHERE placed_at >= $1 AND placed_at < $2
            ",
        )
        .bind(start_date)
        .bind(end_exclusive)
        .fetch_one(self.pool)
        .await?;

        let top = sqlx::query_as::<_, TopProductRow>(
            r"
            SELECT p.id AS product_id, p.name, p.sku,
                   SUM(oi.quantity)::BIGINT AS quantity_sold,
                   SUM(oi.quantity * oi.unit_price) AS revenue
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN products p ON p.id = oi.product_id
            WHERE o.placed_at >= $1 AND o.placed_at < $2
              AND o.status <> 'cancelled'
            GROUP BY p.id, p.name, p.sku
            ORDER BY quantity_sold DESC, revenue DESC
            LIMIT $3
            ",
        )
        .bind(start_date)
        .bind(end_exclusive)
        .bind(TOP_PRODUCTS_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(SalesReport {
            start_date,
            end_date,
            total_sales,
            total_orders,
            top_products: top.into_iter().map(Into::into).collect(),
        })
    }

    /// Stock totals over active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn inventory(&self) -> Result<InventoryReport, RepositoryError> {
        let totals = sqlx::query_as::<_, InventoryTotalsRow>(
            r"
            SELECT COUNT(*) AS total_products,
                   COUNT(*) FILTER (WHERE stock_quantity < $1) AS low_stock_count,
                   COALESCE(SUM(price * stock_quantity), 0) AS total_inventory_value
            FROM products
            WHERE is_active
            ",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(self.pool)
        .await?;

        let low_stock = ProductRepository::new(self.pool)
            .low_stock(LOW_STOCK_THRESHOLD)
            .await?;

        Ok(InventoryReport {
            total_products: totals.total_products,
            low_stock_count: totals.low_stock_count,
            total_inventory_value: totals.total_inventory_value,
            low_stock_products: low_stock.into_iter().map(Into::into).collect(),
        })
    }

    /// Account counts. A user is active with an order in the last 30 days.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn users(&self) -> Result<UserReport, RepositoryError> {
        let counts = sqlx::query_as::<_, UserCountsRow>(
            r"
            SELECT COUNT(*) AS total_users,
                   COUNT(*) FILTER (WHERE role = $1) AS admin_users,
                   COUNT(*) FILTER (WHERE EXISTS (
                       SELECT 1 FROM orders o
                       WHERE o.user_id = users.id
                         AND o.placed_at >= NOW() - INTERVAL '30 days'
                   )) AS active_users
            FROM users
            ",
        )
        .bind(UserRole::Admin)
        .fetch_one(self.pool)
        .await?;

        Ok(UserReport::new(
            counts.total_users,
            counts.admin_users,
            counts.active_users,
        ))
    }
}
