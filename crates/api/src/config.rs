//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8080)
//! - `ENV` - Deployment environment (default: development)
//! - `BASE_URL` - Public URL of this API, used for payment callbacks
//! - `FRONTEND_URL` - Public URL of the shop frontend, used in emailed links
//! - `JWT_EXPIRY` - Token lifetime such as `30m`, `24h`, `7d` (default: 24h)
//! - `RATE_LIMIT_REQUESTS` / `RATE_LIMIT_WINDOW` - General API budget (default: 100 per 1m)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins
//! - `CACHE_TTL` / `CACHE_MAX_ENTRIES` - Catalog cache tuning (default: 5m / 10000)
//! - `PAYSTACK_SECRET_KEY` - Enables payments
//! - `SENDGRID_API_KEY`, `SENDGRID_FROM_EMAIL`, `SENDGRID_FROM_NAME` - Enables email
//! - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_PHONE_NUMBER` - Enables SMS
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` - Enables uploads
//! - `CLOUDINARY_FOLDER`, `CLOUDINARY_ALLOWED_FORMATS`, `CLOUDINARY_MAX_FILE_SIZE` - Upload policy
//! - `LOW_STOCK_ALERT_EMAIL` - Recipient for low-stock alerts after checkout
//! - `SENTRY_DSN`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE` - Error tracking

use std::collections::HashMap;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deployment environment name (`development`, `production`, ...)
    pub environment: String,
    /// Public base URL of this API
    pub base_url: String,
    /// Public URL of the customer-facing frontend
    pub frontend_url: String,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    /// Origins allowed to call the API from a browser
    pub cors_allowed_origins: Vec<String>,
    pub cache: CacheConfig,
    pub paystack: PaystackConfig,
    pub sendgrid: SendGridConfig,
    pub twilio: TwilioConfig,
    pub cloudinary: CloudinaryConfig,
    /// Where low-stock alerts are emailed, if anywhere
    pub low_stock_alert_email: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Error event sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Performance trace sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Token signing configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub expiry: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// General request budget per client IP.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub requests: u32,
    pub window: Duration,
}

/// Catalog cache tuning.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_entries: u64,
}

/// Paystack credentials. Payments are disabled without a secret key.
#[derive(Clone, Default)]
pub struct PaystackConfig {
    pub secret_key: Option<SecretString>,
}

impl PaystackConfig {
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }
}

impl std::fmt::Debug for PaystackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaystackConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// `SendGrid` email settings.
#[derive(Clone)]
pub struct SendGridConfig {
    pub api_key: Option<SecretString>,
    pub from_email: String,
    pub from_name: String,
}

impl SendGridConfig {
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for SendGridConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from_email: "noreply@hardwarestore.com".to_string(),
            from_name: "Hardware Store".to_string(),
        }
    }
}

impl std::fmt::Debug for SendGridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// Twilio SMS settings. All three values are needed to send.
#[derive(Clone, Default)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<SecretString>,
    pub phone_number: Option<String>,
}

impl TwilioConfig {
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some() && self.phone_number.is_some()
    }
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("phone_number", &self.phone_number)
            .finish()
    }
}

/// Cloudinary credentials and upload policy.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<SecretString>,
    /// Folder new uploads are placed in
    pub folder: String,
    /// Lower-case file extensions accepted for upload
    pub allowed_formats: Vec<String>,
    /// Largest accepted upload, in bytes
    pub max_file_size: u64,
}

impl CloudinaryConfig {
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.cloud_name.is_some() && self.api_key.is_some() && self.api_secret.is_some()
    }
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: None,
            api_key: None,
            api_secret: None,
            folder: "hardware-store".to_string(),
            allowed_formats: ["jpg", "jpeg", "png", "gif", "webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("folder", &self.folder)
            .field("allowed_formats", &self.allowed_formats)
            .field("max_file_size", &self.max_file_size)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("HOST", "0.0.0.0")?;
        let port = parse_env_or_default::<u16>("PORT", "8080")?;
        let environment = get_env_or_default("ENV", "development");
        let base_url = trim_url(get_env_or_default("BASE_URL", "http://localhost:8080"));
        let frontend_url = trim_url(get_env_or_default("FRONTEND_URL", "http://localhost:3000"));

        let jwt_secret = get_validated_secret("JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "JWT_SECRET")?;
        let jwt = JwtConfig {
            secret: jwt_secret,
            expiry: duration_env_or_default("JWT_EXPIRY", "24h")?,
        };

        let rate_limit = RateLimitConfig {
            requests: parse_env_or_default::<u32>("RATE_LIMIT_REQUESTS", "100")?,
            window: duration_env_or_default("RATE_LIMIT_WINDOW", "1m")?,
        };
        if rate_limit.requests == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "RATE_LIMIT_REQUESTS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let cors_allowed_origins = split_list(&get_env_or_default(
            "CORS_ALLOWED_ORIGINS",
            "http://localhost:3000",
        ));

        let cache = CacheConfig {
            ttl: duration_env_or_default("CACHE_TTL", "5m")?,
            max_entries: parse_env_or_default::<u64>("CACHE_MAX_ENTRIES", "10000")?,
        };

        let sentry_sample_rate = parse_env_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?;
        let sentry_traces_sample_rate =
            parse_env_or_default::<f32>("SENTRY_TRACES_SAMPLE_RATE", "0.1")?;

        Ok(Self {
            database_url,
            host,
            port,
            environment,
            base_url,
            frontend_url,
            jwt,
            rate_limit,
            cors_allowed_origins,
            cache,
            paystack: PaystackConfig::from_env(),
            sendgrid: SendGridConfig::from_env(),
            twilio: TwilioConfig::from_env(),
            cloudinary: CloudinaryConfig::from_env()?,
            low_stock_alert_email: get_optional_env("LOW_STOCK_ALERT_EMAIL"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl PaystackConfig {
    fn from_env() -> Self {
        Self {
            secret_key: get_optional_secret("PAYSTACK_SECRET_KEY"),
        }
    }
}

impl SendGridConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: get_optional_secret("SENDGRID_API_KEY"),
            from_email: get_optional_env("SENDGRID_FROM_EMAIL").unwrap_or(defaults.from_email),
            from_name: get_optional_env("SENDGRID_FROM_NAME").unwrap_or(defaults.from_name),
        }
    }
}

impl TwilioConfig {
    fn from_env() -> Self {
        Self {
            account_sid: get_optional_env("TWILIO_ACCOUNT_SID"),
            auth_token: get_optional_secret("TWILIO_AUTH_TOKEN"),
            phone_number: get_optional_env("TWILIO_PHONE_NUMBER"),
        }
    }
}

impl CloudinaryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let allowed_formats = get_optional_env("CLOUDINARY_ALLOWED_FORMATS").map_or(
            defaults.allowed_formats,
            |raw| {
                split_list(&raw)
                    .into_iter()
                    .map(|f| f.trim_start_matches('.').to_ascii_lowercase())
                    .collect()
            },
        );
        let max_file_size = match get_optional_env("CLOUDINARY_MAX_FILE_SIZE") {
            Some(raw) => parse_size(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("CLOUDINARY_MAX_FILE_SIZE".to_string(), e)
            })?,
            None => defaults.max_file_size,
        };

        Ok(Self {
            cloud_name: get_optional_env("CLOUDINARY_CLOUD_NAME"),
            api_key: get_optional_env("CLOUDINARY_API_KEY"),
            api_secret: get_optional_secret("CLOUDINARY_API_SECRET"),
            folder: get_optional_env("CLOUDINARY_FOLDER").unwrap_or(defaults.folder),
            allowed_formats,
            max_file_size,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_optional_secret(key: &str) -> Option<SecretString> {
    get_optional_env(key).map(SecretString::from)
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn duration_env_or_default(key: &str, default: &str) -> Result<Duration, ConfigError> {
    parse_duration(&get_env_or_default(key, default))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Parse a duration such as `45s`, `30m`, `24h` or `7d`.
///
/// A bare number is taken as seconds.
///
/// # Errors
///
/// Returns a description of the problem if the value is not a positive
/// integer followed by an optional `s`, `m`, `h` or `d` suffix.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("'{raw}' is not a duration like 30m, 24h or 7d"))?;
    if value == 0 {
        return Err(format!("'{raw}' must be greater than zero"));
    }

    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => return Err(format!("unknown duration unit '{other}'")),
    };

    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("'{raw}' is too large"))
}

/// Parse a byte size such as `512KB`, `10MB` or `1GB` (binary multiples).
///
/// # Errors
///
/// Returns a description of the problem for unknown units or malformed numbers.
pub fn parse_size(raw: &str) -> Result<u64, String> {
    let upper = raw.trim().to_ascii_uppercase();
    let split = upper
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(upper.len());
    let (digits, unit) = upper.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("'{raw}' is not a size like 10MB"))?;
    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "KB" | "K" => 1024,
        "MB" | "M" => 1024 * 1024,
        "GB" | "G" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown size unit '{other}'")),
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("'{raw}' is too large"))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> ApiConfig {
        ApiConfig {
            database_url: SecretString::from("postgres://localhost/hardware_store"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            environment: "development".to_string(),
            base_url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            jwt: JwtConfig {
                secret: SecretString::from("q7Vn2Lr9Xc4Tb8Mz1Kw6Hd3Jf5Pg0Sy".to_string()),
                expiry: Duration::from_secs(3600),
            },
            rate_limit: RateLimitConfig {
                requests: 100,
                window: Duration::from_secs(60),
            },
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            cache: CacheConfig {
                ttl: Duration::from_secs(300),
                max_entries: 100,
            },
            paystack: PaystackConfig {
                secret_key: Some(SecretString::from("sk_test_abc123")),
            },
            sendgrid: SendGridConfig::default(),
            twilio: TwilioConfig {
                account_sid: Some("AC123".to_string()),
                auth_token: Some(SecretString::from("twilio_token_value")),
                phone_number: Some("+15550001111".to_string()),
            },
            cloudinary: CloudinaryConfig::default(),
            low_stock_alert_email: None,
            sentry_dsn: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-jwt-key-here", "JWT_SECRET").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "JWT_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "JWT_SECRET");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "JWT_SECRET").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "JWT_SECRET").is_ok());
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0m").is_err());
        assert!(parse_duration("ten minutes").is_err());
        assert!(parse_duration("5w").is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("10MB").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_size("512kb").unwrap(), 512 * 1024);
        assert_eq!(parse_size("2048").unwrap(), 2048);
        assert!(parse_size("10 parsecs").is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" https://a.example , ,https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_provider_flags() {
        let config = test_config();
        assert!(config.paystack.is_configured());
        assert!(!config.sendgrid.is_configured());
        assert!(config.twilio.is_configured());
        assert!(!config.cloudinary.is_configured());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config());

        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("AC123"));
        assert!(!debug_output.contains("q7Vn2Lr9Xc4Tb8Mz1Kw6Hd3Jf5Pg0Sy"));
        assert!(!debug_output.contains("sk_test_abc123"));
        assert!(!debug_output.contains("twilio_token_value"));
    }
}
