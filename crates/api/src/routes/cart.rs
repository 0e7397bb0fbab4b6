//! Shopping cart.
//!
//! Prices are captured when a product is first added; later additions of the
//! same product only raise the quantity.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use hardware_store_core::{CartItemId, ProductId};

use super::extract::{Json, Path};
use super::require_owned;
use crate::db::{CartRepository, OwnedResource, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Cart, CartItem, Product};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show).delete(clear))
        .route("/items", post(add_item))
        .route("/items/{id}", put(update_item).delete(remove_item))
}

#[derive(Debug, Deserialize)]
pub struct AddItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItem {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub message: &'static str,
    pub item: CartItem,
}

fn check_quantity(quantity: i32) -> Result<()> {
    if quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// The line may hold at most what is on the shelf.
fn check_stock(product: &Product, wanted: i32) -> Result<()> {
    if wanted > product.stock_quantity {
        return Err(AppError::Validation("Insufficient stock".to_string()));
    }
    Ok(())
}

async fn active_product(state: &AppState, id: ProductId) -> Result<Product> {
    ProductRepository::new(state.pool())
        .get_active(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

#[instrument(skip(state))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool()).get_cart(user.id).await?;
    Ok(Json(cart))
}

#[instrument(skip(state))]
pub async fn add_item(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<AddItem>,
) -> Result<(StatusCode, Json<ItemResponse>)> {
    check_quantity(body.quantity)?;
    let product = active_product(&state, body.product_id).await?;

    let carts = CartRepository::new(state.pool());
    let cart_id = carts.get_or_create(user.id).await?;
    let in_cart = carts
        .find_item(cart_id, product.id)
        .await?
        .map_or(0, |item| item.quantity);

    let wanted = in_cart
        .checked_add(body.quantity)
        .ok_or_else(|| AppError::Validation("Insufficient stock".to_string()))?;
    check_stock(&product, wanted)?;

    let item = carts
        .add_item(cart_id, product.id, body.quantity, product.price)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            message: "Item added to cart",
            item,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn update_item(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<CartItemId>,
    Json(body): Json<UpdateItem>,
) -> Result<Json<ItemResponse>> {
    check_quantity(body.quantity)?;
    require_owned(&state, OwnedResource::CartItem, id, user.id).await?;

    let carts = CartRepository::new(state.pool());
    let item = carts
        .get_item(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;

    let product = active_product(&state, item.product_id).await?;
    check_stock(&product, body.quantity)?;

    let item = carts.set_quantity(id, body.quantity).await?;
    Ok(Json(ItemResponse {
        message: "Cart item updated",
        item,
    }))
}

#[instrument(skip(state))]
pub async fn remove_item(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<CartItemId>,
) -> Result<Json<Value>> {
    require_owned(&state, OwnedResource::CartItem, id, user.id).await?;
    CartRepository::new(state.pool()).remove_item(id).await?;
    Ok(Json(json!({ "message": "Item removed from cart" })))
}

#[instrument(skip(state))]
pub async fn clear(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(Json(json!({ "message": "Cart cleared" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use hardware_store_core::CategoryId;

    use super::*;

    fn product(stock: i32) -> Product {
        Product {
            id: ProductId::new_random(),
            category_id: CategoryId::new_random(),
            sku: "HM-001".to_string(),
            name: "Claw Hammer".to_string(),
            slug: "claw-hammer".to_string(),
            description: String::new(),
            price: Decimal::new(450_000, 2),
            stock_quantity: stock,
            images: Vec::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(check_quantity(1).is_ok());
        assert!(check_quantity(0).is_err());
        assert!(check_quantity(-4).is_err());
    }

    #[test]
    fn test_stock_limit_is_inclusive() {
        let hammer = product(3);
        assert!(check_stock(&hammer, 3).is_ok());
        let err = check_stock(&hammer, 4).unwrap_err();
        assert_eq!(err.public_message(), "Insufficient stock");
    }
}
