//! Order domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hardware_store_core::{OrderId, OrderItemId, OrderStatus, Page, ProductId, UserId};

/// Delivery address, snapshotted onto the order as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub label: String,
    pub line: String,
    pub city: String,
    pub country: String,
}

impl ShippingAddress {
    /// # Errors
    ///
    /// Returns a message naming the first blank field.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("label", &self.label),
            ("line", &self.line),
            ("city", &self.city),
            ("country", &self.country),
        ] {
            if value.trim().is_empty() {
                return Err(format!("address.{field} is required"));
            }
        }
        Ok(())
    }
}

/// Optional installation or repair work attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequestSnapshot {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Decimal,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub service_request: Option<ServiceRequestSnapshot>,
    pub shipping_method: Option<String>,
    pub placed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Admin order listing filter. Dates are inclusive calendar days.
#[derive(Debug, Clone, Default)]
pub struct AdminOrderFilter {
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Page,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_requires_every_field() {
        let mut address = ShippingAddress {
            label: "Home".to_string(),
            line: "12 Marina Road".to_string(),
            city: "Lagos".to_string(),
            country: "NG".to_string(),
        };
        assert!(address.validate().is_ok());

        address.city = "   ".to_string();
        assert_eq!(address.validate().unwrap_err(), "address.city is required");
    }

    #[test]
    fn test_service_snapshot_uses_type_key() {
        let snapshot: ServiceRequestSnapshot =
            serde_json::from_str(r#"{"type":"installation","details":{"rooms":3}}"#).unwrap();
        assert_eq!(snapshot.kind, "installation");
        assert_eq!(snapshot.details["rooms"], 3);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["type"], "installation");
    }
}
