//! Cart repository.
//!
//! Each user has exactly one cart row (`UNIQUE(user_id)`), created on first
//! access. Adding a product that is already in the cart increments the line and
//! keeps the price captured when it was first added.

use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use hardware_store_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem, CartLine, ProductSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            cart_id: row.cart_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
    quantity: i32,
    unit_price: Decimal,
    product_id: ProductId,
    sku: String,
    name: String,
    slug: String,
    price: Decimal,
    stock_quantity: i32,
    images: Json<Vec<String>>,
    is_active: bool,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        let product = ProductSummary {
            id: row.product_id,
            sku: row.sku,
            name: row.name,
            slug: row.slug,
            price: row.price,
            stock_quantity: row.stock_quantity,
            images: row.images.0,
            is_active: row.is_active,
        };
        Self::new(row.id, row.quantity, row.unit_price, product)
    }
}

/// A cart line locked for checkout, together with the product's live stock.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedCartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub stock_quantity: i32,
    pub is_active: bool,
}

const ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity, unit_price";

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart id, creating the cart if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        let id = sqlx::query_scalar::<_, CartId>(
            r"
            INSERT INTO carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = carts.updated_at
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// The full cart with product details and subtotal.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let cart_id = self.get_or_create(user_id).await?;
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.id, ci.quantity, ci.unit_price,
                   p.id AS product_id, p.sku, p.name, p.slug, p.price,
                   p.stock_quantity, p.images, p.is_active
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.created_at ASC
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Cart::new(
            cart_id,
            user_id,
            rows.into_iter().map(Into::into).collect(),
        ))
    }

    /// The line for `product_id` in this cart, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 AND product_id = $2"
        ))
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_item(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            r"
            INSERT INTO cart_items (cart_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cart_id, product_id) DO UPDATE
            SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW()
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn set_quantity(
        &self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            r"
            UPDATE cart_items SET quantity = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn remove_item(&self, id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE user_id = $1)",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Checkout helpers (run inside the caller's transaction)
// =============================================================================

/// The user's cart id, if a cart exists, with the cart row locked.
///
/// Concurrent checkouts of the same cart queue here; the later one then sees
/// the emptied cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_cart_id(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<Option<CartId>, RepositoryError> {
    let id =
        sqlx::query_scalar::<_, CartId>("SELECT id FROM carts WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;

    Ok(id)
}

/// Load the cart lines and lock them together with their product rows.
///
/// Rows are locked in product-id order so that two checkouts sharing products
/// always acquire locks in the same sequence.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_lines_for_checkout(
    tx: &mut Transaction<'_, Postgres>,
    cart_id: CartId,
) -> Result<Vec<LockedCartLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, LockedCartLine>(
        r"
        SELECT p.id AS product_id, p.name AS product_name,
               ci.quantity, ci.unit_price, p.stock_quantity, p.is_active
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY p.id
        FOR UPDATE OF ci, p
        ",
    )
    .bind(cart_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(lines)
}

/// Empty the cart as part of a committed checkout.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn clear_items(
    tx: &mut Transaction<'_, Postgres>,
    cart_id: CartId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
