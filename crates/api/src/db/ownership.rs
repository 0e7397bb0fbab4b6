//! Row ownership checks.
//!
//! Every customer-facing route that takes a resource id goes through
//! [`ensure_owned`]. A resource owned by someone else is reported exactly like
//! a missing one, so ids of other users' rows never leak.

use sqlx::PgPool;
use uuid::Uuid;

use hardware_store_core::UserId;

use super::RepositoryError;

/// Resources that belong to a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedResource {
    Order,
    CartItem,
    WishlistItem,
    ServiceRequest,
    Notification,
    Payment,
}

impl OwnedResource {
    /// Query returning one row when `$1` exists and belongs to `$2`.
    const fn ownership_query(self) -> &'static str {
        match self {
            Self::Order => "SELECT 1 FROM orders WHERE id = $1 AND user_id = $2",
            Self::CartItem => {
                "SELECT 1 FROM cart_items ci JOIN carts c ON c.id = ci.cart_id \
                 WHERE ci.id = $1 AND c.user_id = $2"
            }
            Self::WishlistItem => "SELECT 1 FROM wishlists WHERE id = $1 AND user_id = $2",
            Self::ServiceRequest => {
                "SELECT 1 FROM service_requests WHERE id = $1 AND user_id = $2"
            }
            Self::Notification => "SELECT 1 FROM notifications WHERE id = $1 AND user_id = $2",
            Self::Payment => "SELECT 1 FROM payments WHERE id = $1 AND user_id = $2",
        }
    }

    /// Human-readable name used in 404 messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Order => "Order",
            Self::CartItem => "Cart item",
            Self::WishlistItem => "Wishlist item",
            Self::ServiceRequest => "Service request",
            Self::Notification => "Notification",
            Self::Payment => "Payment",
        }
    }
}

/// Succeed only when `id` exists and belongs to `user`.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` when the row is missing or owned by
/// another user, `RepositoryError::Database` if the query fails.
pub async fn ensure_owned(
    pool: &PgPool,
    resource: OwnedResource,
    id: impl Into<Uuid>,
    user: UserId,
) -> Result<(), RepositoryError> {
    let found = sqlx::query_scalar::<_, i32>(resource.ownership_query())
        .bind(id.into())
        .bind(user)
        .fetch_optional(pool)
        .await?;

    found.map(|_| ()).ok_or(RepositoryError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_query_binds_id_and_owner() {
        for resource in [
            OwnedResource::Order,
            OwnedResource::CartItem,
            OwnedResource::WishlistItem,
            OwnedResource::ServiceRequest,
            OwnedResource::Notification,
            OwnedResource::Payment,
        ] {
            let sql = resource.ownership_query();
            assert!(sql.contains("$1"), "{resource:?}");
            assert!(sql.contains("user_id = $2"), "{resource:?}");
        }
    }
}
