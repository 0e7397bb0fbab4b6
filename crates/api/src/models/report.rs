//! Admin report payloads.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use hardware_store_core::ProductId;

use super::ProductSummary;

#[derive(Debug, Clone, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Sum of delivered order totals.
    pub total_sales: Decimal,
    /// Every order placed in range, whatever its status.
    pub total_orders: i64,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub total_products: i64,
    pub low_stock_count: i64,
    pub total_inventory_value: Decimal,
    pub low_stock_products: Vec<ProductSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserReport {
    pub total_users: i64,
    pub admin_users: i64,
    pub customer_users: i64,
    /// Users with an order in the last 30 days.
    pub active_users: i64,
    pub inactive_users: i64,
    pub active_percentage: f64,
    pub inactive_percentage: f64,
}

impl UserReport {
    #[must_use]
    pub fn new(total_users: i64, admin_users: i64, active_users: i64) -> Self {
        let inactive_users = (total_users - active_users).max(0);
        let (active_percentage, inactive_percentage) = if total_users > 0 {
            #[allow(clippy::cast_precision_loss)] // user counts stay far below 2^52
            let total = total_users as f64;
            #[allow(clippy::cast_precision_loss)]
            let active = active_users as f64;
            (active / total * 100.0, 100.0 - active / total * 100.0)
        } else {
            (0.0, 0.0)
        };

        Self {
            total_users,
            admin_users,
            customer_users: total_users - admin_users,
            active_users,
            inactive_users,
            active_percentage,
            inactive_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_report_percentages() {
        let report = UserReport::new(8, 2, 2);
        assert_eq!(report.customer_users, 6);
        assert_eq!(report.inactive_users, 6);
        assert!((report.active_percentage - 25.0).abs() < f64::EPSILON);
        assert!((report.inactive_percentage - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_user_report_with_no_users() {
        let report = UserReport::new(0, 0, 0);
        assert!(report.active_percentage.abs() < f64::EPSILON);
        assert!(report.inactive_percentage.abs() < f64::EPSILON);
    }
}
