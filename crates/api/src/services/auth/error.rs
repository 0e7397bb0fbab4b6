//! Authentication error types.

use thiserror::Error;

use hardware_store_core::{EmailError, PhoneError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account exists but has been deactivated.
    #[error("Account is deactivated")]
    Inactive,

    /// Bearer token missing, malformed or signed with another key.
    #[error("Invalid token")]
    InvalidToken,

    /// Bearer token past its `exp`.
    #[error("Token has expired")]
    ExpiredToken,

    /// User already exists.
    #[error("A user with this email already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// Invalid email format.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid phone number.
    #[error("Invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// Reset token unknown, already used or expired.
    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    /// Other request validation failure.
    #[error("{0}")]
    Validation(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error: {0}")]
    PasswordHash(String),

    /// JWT signing failed.
    #[error("token encoding error: {0}")]
    TokenEncoding(String),
}
