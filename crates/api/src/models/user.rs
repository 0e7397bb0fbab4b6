//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use hardware_store_core::{AddressId, Email, Page, PhoneNumber, UserId, UserRole};

/// A registered account. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<PhoneNumber>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// A user together with the stored PHC hash, for credential checks only.
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: String,
}

/// Input for creating an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<PhoneNumber>,
    pub role: UserRole,
}

/// A saved address on the user's profile.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: String,
    pub line: String,
    pub city: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Admin user listing filter.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    /// Case-insensitive match on email or full name.
    pub search: Option<String>,
    pub page: Page,
}
