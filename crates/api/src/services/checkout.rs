//! Order placement.
//!
//! The whole checkout is one transaction: lock the cart's products, check
//! stock, write the order and its lines, decrement stock and empty the cart.
//! Either all of it commits or none of it does, so a cart is only ever emptied
//! by an order that exists.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use hardware_store_core::{UserId, order_total};

use crate::db::carts::{clear_items, find_cart_id, lock_lines_for_checkout};
use crate::db::orders::{NewOrder, insert_item, insert_order};
use crate::db::products::decrement_stock;
use crate::db::reports::LOW_STOCK_THRESHOLD;
use crate::db::RepositoryError;
use crate::models::{Order, ServiceRequestSnapshot, ShippingAddress};
use crate::services::notifications::LowStockLine;

/// Provider used when the request names none.
pub const DEFAULT_PAYMENT_METHOD: &str = "paystack";

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No cart, or a cart with no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// Request body failed validation.
    #[error("{0}")]
    InvalidRequest(String),

    /// A line cannot be fulfilled.
    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: String },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Checkout request body.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub address: ShippingAddress,
    pub service_request: Option<ServiceRequestSnapshot>,
    pub payment_method: Option<String>,
    pub shipping_method: Option<String>,
}

impl PlaceOrder {
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidRequest` naming the first bad field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        self.address.validate().map_err(CheckoutError::InvalidRequest)?;

        if let Some(service) = &self.service_request
            && service.kind.trim().is_empty()
        {
            return Err(CheckoutError::InvalidRequest(
                "service_request.type is required".to_string(),
            ));
        }

        if let Some(method) = self.shipping_method.as_deref()
            && !SHIPPING_OPTIONS.iter().any(|option| option.id == method)
        {
            return Err(CheckoutError::InvalidRequest(format!(
                "unknown shipping_method: {method}"
            )));
        }

        Ok(())
    }

    /// The payment provider, defaulting to Paystack.
    #[must_use]
    pub fn payment_method(&self) -> &str {
        self.payment_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_PAYMENT_METHOD)
    }
}

/// A delivery choice shown at checkout.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ShippingOption {
    pub id: &'static str,
    pub name: &'static str,
    /// Naira, whole units.
    pub price: i64,
    pub estimated_days: &'static str,
}

pub const SHIPPING_OPTIONS: [ShippingOption; 3] = [
    ShippingOption {
        id: "standard",
        name: "Standard Delivery",
        price: 500,
        estimated_days: "3-5 business days",
    },
    ShippingOption {
        id: "express",
        name: "Express Delivery",
        price: 1000,
        estimated_days: "1-2 business days",
    },
    ShippingOption {
        id: "pickup",
        name: "Store Pickup",
        price: 0,
        estimated_days: "Same day",
    },
];

/// A committed order plus the stock levels it pushed under the alert threshold.
#[derive(Debug)]
pub struct PlacedOrder {
    pub order: Order,
    pub low_stock: Vec<LowStockLine>,
}

pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into a `pending` order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to buy,
    /// `CheckoutError::InsufficientStock` naming the first line that cannot be
    /// fulfilled, and `CheckoutError::InvalidRequest` for a bad body. Nothing is
    /// written in any error case.
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: &PlaceOrder,
    ) -> Result<PlacedOrder, CheckoutError> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let cart_id = find_cart_id(&mut tx, user_id)
            .await?
            .ok_or(CheckoutError::EmptyCart)?;

        let lines = lock_lines_for_checkout(&mut tx, cart_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        if let Some(line) = lines
            .iter()
            .find(|line| !line.is_active || line.stock_quantity < line.quantity)
        {
            return Err(CheckoutError::InsufficientStock {
                product: line.product_name.clone(),
            });
        }

        let total: Decimal = order_total(lines.iter().map(|l| (l.unit_price, l.quantity)));

        let order = insert_order(
            &mut tx,
            &NewOrder {
                user_id,
                total,
                shipping_address: &request.address,
                service_request: request.service_request.as_ref(),
                shipping_method: request.shipping_method.as_deref(),
            },
        )
        .await?;

        let mut low_stock = Vec::new();
        for line in &lines {
            insert_item(&mut tx, order.id, line.product_id, line.quantity, line.unit_price).await?;

            if !decrement_stock(&mut tx, line.product_id, line.quantity).await? {
                return Err(CheckoutError::InsufficientStock {
                    product: line.product_name.clone(),
                });
            }

            let remaining = line.stock_quantity - line.quantity;
            if remaining < LOW_STOCK_THRESHOLD {
                low_stock.push(LowStockLine {
                    name: line.product_name.clone(),
                    remaining,
                });
            }
        }

        clear_items(&mut tx, cart_id).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.total,
            lines = lines.len(),
            "Order placed"
        );

        Ok(PlacedOrder { order, low_stock })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(json: &str) -> PlaceOrder {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let req = request(
            r#"{"address":{"label":"Home","line":"1 Allen Ave","city":"Ikeja","country":"NG"},
                "shipping_method":"express"}"#,
        );
        assert!(req.validate().is_ok());
        assert_eq!(req.payment_method(), "paystack");
    }

    #[test]
    fn test_blank_address_field_rejected() {
        let req = request(
            r#"{"address":{"label":"Home","line":" ","city":"Ikeja","country":"NG"}}"#,
        );
        match req.validate() {
            Err(CheckoutError::InvalidRequest(msg)) => assert_eq!(msg, "address.line is required"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_address_is_a_parse_error() {
        assert!(serde_json::from_str::<PlaceOrder>(r#"{"payment_method":"paystack"}"#).is_err());
    }

    #[test]
    fn test_unknown_shipping_method_rejected() {
        let req = request(
            r#"{"address":{"label":"Home","line":"1 Allen Ave","city":"Ikeja","country":"NG"},
                "shipping_method":"teleport"}"#,
        );
        assert!(matches!(req.validate(), Err(CheckoutError::InvalidRequest(_))));
    }

    #[test]
    fn test_service_request_needs_type() {
        let req = request(
            r#"{"address":{"label":"Home","line":"1 Allen Ave","city":"Ikeja","country":"NG"},
                "service_request":{"type":"","details":{"rooms":3}}}"#,
        );
        assert!(matches!(req.validate(), Err(CheckoutError::InvalidRequest(_))));
    }

    #[test]
    fn test_explicit_payment_method() {
        let req = request(
            r#"{"address":{"label":"Home","line":"1 Allen Ave","city":"Ikeja","country":"NG"},
                "payment_method":"bank_transfer"}"#,
        );
        assert_eq!(req.payment_method(), "bank_transfer");
    }

    #[test]
    fn test_shipping_options() {
        let ids: Vec<_> = SHIPPING_OPTIONS.iter().map(|o| (o.id, o.price)).collect();
        assert_eq!(ids, [("standard", 500), ("express", 1000), ("pickup", 0)]);
    }
}
