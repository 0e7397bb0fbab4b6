//! HS256 access tokens.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use hardware_store_core::{UserId, UserRole};

use super::AuthError;
use crate::config::JwtConfig;
use crate::models::User;

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub email: String,
    pub role: UserRole,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from `JWT_SECRET`.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
    validation: Validation,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("keys", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl JwtKeys {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            expiry: config.expiry,
            validation,
        }
    }

    /// Issue a token for `user`, valid from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    /// Issue a token as if it were `issued_at` (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue_at(&self, user: &User, issued_at: i64) -> Result<String, AuthError> {
        let lifetime = i64::try_from(self.expiry.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user.id,
            email: user.email.as_str().to_string(),
            role: user.role,
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at.saturating_add(lifetime),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))
    }

    /// Check signature, `exp` and `nbf`, and return the claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ExpiredToken` past `exp`, `AuthError::InvalidToken`
    /// for anything else wrong with the token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hardware_store_core::Email;
    use secrecy::SecretString;

    use super::*;

    const EXPIRY: Duration = Duration::from_secs(3600);

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: SecretString::from(secret.to_string()),
            expiry: EXPIRY,
        })
    }

    fn user(role: UserRole) -> User {
        User {
            id: UserId::new_random(),
            email: Email::parse("ada@example.com").unwrap(),
            full_name: "Ada".to_string(),
            phone: None,
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_round_trip_keeps_role() {
        let keys = keys("k3y-for-tests-0123456789-abcdefghij");
        let admin = user(UserRole::Admin);
        let token = keys.issue(&admin).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_accepted_until_exp_rejected_after() {
        let keys = keys("k3y-for-tests-0123456789-abcdefghij");
        let customer = user(UserRole::Customer);
        let now = Utc::now().timestamp();

        // exp a few seconds ahead
        let fresh = keys.issue_at(&customer, now - 3600 + 5).unwrap();
        assert!(keys.verify(&fresh).is_ok());

        // exp one second ago
        let stale = keys.issue_at(&customer, now - 3600 - 1).unwrap();
        assert!(matches!(keys.verify(&stale), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn test_not_before_is_enforced() {
        let keys = keys("k3y-for-tests-0123456789-abcdefghij");
        let future = keys
            .issue_at(&user(UserRole::Customer), Utc::now().timestamp() + 120)
            .unwrap();
        assert!(matches!(keys.verify(&future), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = keys("k3y-for-tests-0123456789-abcdefghij")
            .issue(&user(UserRole::Customer))
            .unwrap();
        let other = keys("another-k3y-9876543210-zyxwvutsrqpo");
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_garbage_rejected() {
        let keys = keys("k3y-for-tests-0123456789-abcdefghij");
        assert!(matches!(keys.verify("not.a.jwt"), Err(AuthError::InvalidToken)));
    }
}
