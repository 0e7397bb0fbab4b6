//! Password reset tokens.
//!
//! The raw token only ever leaves the server in the reset email. The database
//! stores its SHA-256 digest, so a leaked `users` table cannot be used to reset
//! passwords.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

/// How long a reset link stays valid.
pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);

/// A freshly generated reset token.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub token: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    /// Generate 32 random bytes, URL-safe encoded.
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; 32] = rand::random();
        let token = URL_SAFE_NO_PAD.encode(bytes);
        let hash = hash_token(&token);

        Self {
            token,
            hash,
            expires_at: Utc::now() + RESET_TOKEN_TTL,
        }
    }
}

/// Hex SHA-256 of a reset token.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// The frontend link embedded in the reset email.
#[must_use]
pub fn reset_link(frontend_url: &str, token: &str) -> String {
    format!("{frontend_url}/reset-password?token={token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = ResetToken::generate();
        let b = ResetToken::generate();
        assert_ne!(a.token, b.token);
        assert_eq!(a.token.len(), 43);
        assert!(
            a.token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let token = ResetToken::generate();
        assert_eq!(token.hash, hash_token(&token.token));
        assert_eq!(token.hash.len(), 64);
        assert_ne!(token.hash, token.token);
    }

    #[test]
    fn test_expiry_is_one_hour_out() {
        let token = ResetToken::generate();
        let remaining = token.expires_at - Utc::now();
        assert!(remaining <= RESET_TOKEN_TTL);
        assert!(remaining > RESET_TOKEN_TTL - Duration::minutes(1));
    }

    #[test]
    fn test_reset_link() {
        assert_eq!(
            reset_link("https://shop.example", "abc"),
            "https://shop.example/reset-password?token=abc"
        );
    }
}
