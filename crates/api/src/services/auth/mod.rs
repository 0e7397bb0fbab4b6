//! Authentication service.
//!
//! Password accounts with Argon2id hashes, HS256 bearer tokens and
//! email-based password reset.

mod error;
pub mod jwt;
pub mod password;
pub mod reset;

pub use error::AuthError;
pub use jwt::{Claims, JwtKeys};
pub use reset::ResetToken;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use hardware_store_core::{Email, PhoneNumber, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{NewUser, User};

use password::{hash_password, reject_unknown_account, validate_password, verify_password};

/// Registration request body.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// A signed-in user and their bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    keys: &'a JwtKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, keys: &'a JwtKeys) -> Self {
        Self {
            users: UserRepository::new(pool),
            keys,
        }
    }

    /// Register a new customer and sign them in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::InvalidPhone`,
    /// `AuthError::WeakPassword` or `AuthError::Validation` for bad input.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, input: &Registration) -> Result<Session, AuthError> {
        let email = Email::parse(&input.email)?;
        validate_password(&input.password)?;
        let full_name = input.full_name.trim();
        if full_name.is_empty() {
            return Err(AuthError::Validation("Full name is required".to_string()));
        }
        let phone = parse_optional_phone(input.phone.as_deref())?;

        let user = self
            .users
            .create(&NewUser {
                email,
                password_hash: hash_password(&input.password)?,
                full_name: full_name.to_string(),
                phone,
                role: UserRole::Customer,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        let token = self.keys.issue(&user)?;
        Ok(Session { token, user })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// and `AuthError::Inactive` for a deactivated account.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some(record) = self.users.get_with_password(&email).await? else {
            return Err(reject_unknown_account(password));
        };

        verify_password(password, &record.password_hash)?;

        if !record.user.is_active {
            return Err(AuthError::Inactive);
        }

        let token = self.keys.issue(&record.user)?;
        Ok(Session {
            token,
            user: record.user,
        })
    }

    /// Reload the user named by already-verified claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the user no longer exists and
    /// `AuthError::Inactive` if the account was deactivated.
    pub async fn current_user(&self, claims: &Claims) -> Result<User, AuthError> {
        let user = self
            .users
            .get_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthError::Inactive);
        }
        Ok(user)
    }

    /// Create a reset token for the account with this email.
    ///
    /// Returns `None` for unknown or malformed emails so callers can answer
    /// identically either way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database fails.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, ResetToken)>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };
        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }

        let token = ResetToken::generate();
        self.users
            .set_reset_token(user.id, &token.hash, token.expires_at)
            .await?;

        Ok(Some((user, token)))
    }

    /// Set a new password using a reset token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` for a short password and
    /// `AuthError::InvalidResetToken` if the token is unknown or expired.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;
        if token.trim().is_empty() {
            return Err(AuthError::InvalidResetToken);
        }

        let password_hash = hash_password(new_password)?;
        let user_id = self
            .users
            .consume_reset_token(&reset::hash_token(token.trim()), &password_hash)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        tracing::info!(user_id = %user_id, "Password reset completed");
        Ok(())
    }
}

/// Parse an optional phone field; blank counts as absent.
///
/// # Errors
///
/// Returns `AuthError::InvalidPhone` if a non-blank value is not a phone number.
pub fn parse_optional_phone(phone: Option<&str>) -> Result<Option<PhoneNumber>, AuthError> {
    match phone.map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => Ok(Some(PhoneNumber::parse(raw)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_phone_is_absent() {
        assert!(matches!(parse_optional_phone(None), Ok(None)));
        assert!(matches!(parse_optional_phone(Some("  ")), Ok(None)));
    }

    #[test]
    fn test_invalid_phone_rejected() {
        assert!(matches!(
            parse_optional_phone(Some("call me")),
            Err(AuthError::InvalidPhone(_))
        ));
    }
}
