//! Cart and wishlist domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use hardware_store_core::{CartId, CartItemId, ProductId, UserId, WishlistItemId, line_total};

use super::ProductSummary;

/// A raw cart item row.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Price captured when the product was first added.
    pub unit_price: Decimal,
}

/// A cart item with its product, as shown to the customer.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub product: ProductSummary,
}

impl CartLine {
    #[must_use]
    pub fn new(
        id: CartItemId,
        quantity: i32,
        unit_price: Decimal,
        product: ProductSummary,
    ) -> Self {
        Self {
            id,
            quantity,
            unit_price,
            line_total: line_total(unit_price, quantity),
            product,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartLine>,
    pub item_count: i64,
    pub subtotal: Decimal,
}

impl Cart {
    #[must_use]
    pub fn new(id: CartId, user_id: UserId, items: Vec<CartLine>) -> Self {
        let subtotal = items.iter().map(|line| line.line_total).sum();
        let item_count = items.iter().map(|line| i64::from(line.quantity)).sum();
        Self {
            id,
            user_id,
            items,
            item_count,
            subtotal,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub product: ProductSummary,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(price: Decimal) -> ProductSummary {
        ProductSummary {
            id: ProductId::new_random(),
            sku: "SKU".to_string(),
            name: "Thing".to_string(),
            slug: "thing".to_string(),
            price,
            stock_quantity: 10,
            images: vec![],
            is_active: true,
        }
    }

    #[test]
    fn test_cart_subtotal_uses_snapshot_price() {
        let snapshot = Decimal::new(1999, 2);
        // Current catalog price has moved on; the cart keeps the snapshot.
        let line = CartLine::new(
            CartItemId::new_random(),
            3,
            snapshot,
            summary(Decimal::new(2999, 2)),
        );
        let other = CartLine::new(
            CartItemId::new_random(),
            1,
            Decimal::new(50, 2),
            summary(Decimal::new(50, 2)),
        );
        let cart = Cart::new(CartId::new_random(), UserId::new_random(), vec![line, other]);

        assert_eq!(cart.subtotal, Decimal::new(6047, 2));
        assert_eq!(cart.item_count, 4);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::new(CartId::new_random(), UserId::new_random(), vec![]);
        assert_eq!(cart.subtotal, Decimal::ZERO);
        assert_eq!(cart.item_count, 0);
    }
}
