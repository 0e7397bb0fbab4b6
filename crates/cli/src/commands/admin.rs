//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin account (prints a generated password)
//! hs-cli admin create -e admin@example.com -n "Admin Name"
//!
//! # Create one with a chosen password
//! hs-cli admin create -e admin@example.com -n "Admin Name" -p 'long passphrase'
//!
//! # Promote an existing customer
//! hs-cli admin promote -e jane@example.com
//! ```

use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

use hardware_store_api::db::{RepositoryError, UserRepository};
use hardware_store_api::models::NewUser;
use hardware_store_api::services::auth::{AuthError, password};
use hardware_store_core::{Email, UserId, UserRole};

use super::{ConnectError, connect};

/// Length of generated passwords.
const GENERATED_PASSWORD_LENGTH: usize = 20;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Name is blank.
    #[error("Name must not be empty")]
    EmptyName,

    /// Password rejected or could not be hashed.
    #[error("{0}")]
    Password(#[from] AuthError),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    /// No account to promote.
    #[error("No user with email: {0}")]
    UserNotFound(String),
}

fn parse_email(email: &str) -> Result<Email, AdminError> {
    Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Create a new admin account.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `name` - Admin's display name
/// * `chosen_password` - Password to set; generated and printed when `None`
///
/// # Returns
///
/// The ID of the created user.
pub async fn create_user(
    email: &str,
    name: &str,
    chosen_password: Option<String>,
) -> Result<UserId, AdminError> {
    let email = parse_email(email)?;
    if name.trim().is_empty() {
        return Err(AdminError::EmptyName);
    }

    let generated = chosen_password.is_none();
    let plain = chosen_password.unwrap_or_else(generate_password);
    password::validate_password(&plain)?;
    let password_hash = password::hash_password(&plain)?;

    let pool = connect().await?;
    tracing::info!("Creating admin user: {}", email);

    let user = UserRepository::new(&pool)
        .create(&NewUser {
            email: email.clone(),
            password_hash,
            full_name: name.trim().to_owned(),
            phone: None,
            role: UserRole::Admin,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    if generated {
        // Shown once, on stdout only, so it never reaches log aggregation.
        #[allow(clippy::print_stdout)]
        {
            println!("Generated password: {plain}");
        }
        tracing::warn!("Store the generated password now; it cannot be recovered.");
    }

    Ok(user.id)
}

/// Give an existing account the admin role.
pub async fn promote(email: &str) -> Result<UserId, AdminError> {
    let email = parse_email(email)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AdminError::UserNotFound(email.to_string()))?;

    if user.role == UserRole::Admin {
        tracing::info!("{} is already an admin", user.email);
        return Ok(user.id);
    }

    let user = users.set_role(user.id, UserRole::Admin).await?;
    tracing::info!("Promoted {} ({}) to admin", user.email, user.id);
    Ok(user.id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_passes_validation() {
        let generated = generate_password();
        assert_eq!(generated.len(), GENERATED_PASSWORD_LENGTH);
        assert!(generated.chars().all(|c| c.is_ascii_alphanumeric()));
        password::validate_password(&generated).unwrap();
    }

    #[test]
    fn test_generated_passwords_differ() {
        assert_ne!(generate_password(), generate_password());
    }

    #[test]
    fn test_invalid_email_rejected() {
        assert!(matches!(
            parse_email("not-an-email"),
            Err(AdminError::InvalidEmail(_))
        ));
    }
}
