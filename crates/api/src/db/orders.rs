//! Order repository.
//!
//! Order placement itself is driven by `CheckoutService`, which calls the
//! transaction helpers at the bottom of this module. Cancellation runs its own
//! transaction here because customers and admins share it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use hardware_store_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use super::products::restore_stock;
use crate::models::{
    AdminOrderFilter, Order, OrderItem, OrderWithItems, ServiceRequestSnapshot, ShippingAddress,
};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.total, o.status, o.shipping_address, \
     o.service_request, o.shipping_method, o.placed_at, o.created_at, o.updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total: Decimal,
    status: OrderStatus,
    shipping_address: Json<ShippingAddress>,
    service_request: Option<Json<ServiceRequestSnapshot>>,
    shipping_method: Option<String>,
    placed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            total: row.total,
            status: row.status,
            shipping_address: row.shipping_address.0,
            service_request: row.service_request.map(|j| j.0),
            shipping_method: row.shipping_method,
            placed_at: row.placed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    product_name: String,
    product_sku: String,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_sku: row.product_sku,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

/// Result of a cancellation attempt.
#[derive(Debug)]
pub enum CancelOutcome {
    /// The order is now cancelled and its stock restored.
    Cancelled(Order),
    /// No such order, or it belongs to someone else.
    NotFound,
    /// The order has progressed too far to cancel.
    NotCancellable(OrderStatus),
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// An order together with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_items(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };
        let mut items = self.items_for(&[id]).await?;

        Ok(Some(OrderWithItems {
            items: items.remove(&id).unwrap_or_default(),
            order,
        }))
    }

    /// All of a user's orders with items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.user_id = $1 ORDER BY o.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let orders: Vec<Order> = rows.into_iter().map(Into::into).collect();
        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| OrderWithItems {
                items: items.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect())
    }

    /// Admin order list, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_admin(
        &self,
        filter: &AdminOrderFilter,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o WHERE TRUE");
        push_order_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE TRUE"
        ));
        push_order_filters(&mut query, filter);
        query
            .push(" ORDER BY o.created_at DESC LIMIT ")
            .push_bind(filter.page.limit)
            .push(" OFFSET ")
            .push_bind(filter.page.offset());

        let rows: Vec<OrderRow> = query.build_query_as().fetch_all(self.pool).await?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Move an order from `from` to `to`. Returns `None` if the order was no
    /// longer in `from` (someone else moved it first).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders AS o SET status = $3, updated_at = NOW()
            WHERE o.id = $1 AND o.status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Cancel an order and return its items to stock, atomically.
    ///
    /// When `owner` is set the order must belong to that user; otherwise it is
    /// reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back.
    pub async fn cancel(
        &self,
        id: OrderId,
        owner: Option<UserId>,
    ) -> Result<CancelOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, (UserId, OrderStatus)>(
            "SELECT user_id, status FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((user_id, status)) = locked else {
            return Ok(CancelOutcome::NotFound);
        };
        if owner.is_some_and(|owner| owner != user_id) {
            return Ok(CancelOutcome::NotFound);
        }
        if !status.can_transition_to(OrderStatus::Cancelled) {
            return Ok(CancelOutcome::NotCancellable(status));
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders AS o SET status = 'cancelled', updated_at = NOW()
            WHERE o.id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let items = sqlx::query_as::<_, (ProductId, i32)>(
            "SELECT product_id, quantity FROM order_items WHERE order_id = $1 ORDER BY product_id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, quantity) in items {
            restore_stock(&mut tx, product_id, quantity).await?;
        }

        tx.commit().await?;

        Ok(CancelOutcome::Cancelled(row.into()))
    }

    async fn items_for(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id,
                   p.name AS product_name, p.sku AS product_sku,
                   oi.quantity, oi.unit_price
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.created_at ASC
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }
        Ok(grouped)
    }
}

fn push_order_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &AdminOrderFilter) {
    if let Some(status) = filter.status {
        query.push(" AND o.status = ").push_bind(status);
    }
    if let Some(start) = filter.start_date {
        query.push(" AND o.created_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        // Inclusive end date: everything before the following midnight.
        query
            .push(" AND o.created_at < (")
            .push_bind(end)
            .push("::date + 1)");
    }
}

// =============================================================================
// Checkout helpers (run inside the caller's transaction)
// =============================================================================

/// Fields of a new order row.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub total: Decimal,
    pub shipping_address: &'a ShippingAddress,
    pub service_request: Option<&'a ServiceRequestSnapshot>,
    pub shipping_method: Option<&'a str>,
}

/// Insert a `pending` order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    order: &NewOrder<'_>,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        INSERT INTO orders AS o (user_id, total, status, shipping_address, service_request, shipping_method)
        VALUES ($1, $2, 'pending', $3, $4, $5)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(order.user_id)
    .bind(order.total)
    .bind(Json(order.shipping_address))
    .bind(order.service_request.map(Json))
    .bind(order.shipping_method)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.into())
}

/// Insert one order line with its price snapshot.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn insert_item(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO order_items (order_id, product_id, quantity, unit_price)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
