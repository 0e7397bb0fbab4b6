//! Paystack payment adapter.
//!
//! Two halves:
//!
//! - [`PaystackClient`] starts a transaction and hands back the hosted
//!   checkout URL.
//! - [`PaymentService::handle_webhook`] authenticates Paystack's callback with
//!   an HMAC-SHA512 of the raw body and applies the charge result exactly once.

use std::time::Duration;

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use sqlx::PgPool;
use thiserror::Error;

use hardware_store_core::{CurrencyCode, Price};

use crate::db::{ChargeOutcome, PaymentRepository, RepositoryError};
use crate::models::Payment;

const PAYSTACK_API: &str = "https://api.paystack.co";

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

type HmacSha512 = Hmac<Sha512>;

/// Errors that can occur when talking to Paystack or handling its webhook.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// `PAYSTACK_SECRET_KEY` is not set.
    #[error("Payment provider is not configured")]
    NotConfigured,

    /// Webhook arrived without `X-Paystack-Signature`.
    #[error("Missing webhook signature")]
    MissingSignature,

    /// Webhook body is not a Paystack event.
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// Webhook signature does not match the body.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

// ===== Paystack API =====

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    callback_url: &'a str,
    currency: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

/// Hosted checkout details returned by `/transaction/initialize`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaystackCheckout {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Paystack REST client.
#[derive(Clone)]
pub struct PaystackClient {
    client: reqwest::Client,
    secret_key: Option<SecretString>,
    callback_url: String,
}

impl PaystackClient {
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(secret_key: Option<SecretString>, base_url: &str) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            secret_key,
            callback_url: format!("{base_url}/api/payments/webhook"),
        })
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    fn secret(&self) -> Result<&SecretString, PaymentError> {
        self.secret_key.as_ref().ok_or(PaymentError::NotConfigured)
    }

    /// Start a naira transaction for `amount`, charged to `email`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotConfigured` without a secret key, or the
    /// HTTP/API/parse error from Paystack.
    pub async fn initialize(
        &self,
        email: &str,
        amount: Decimal,
        reference: &str,
    ) -> Result<PaystackCheckout, PaymentError> {
        let secret = self.secret()?;
        let kobo = Price::ngn(amount)
            .to_minor_units()
            .ok_or_else(|| PaymentError::Parse(format!("amount out of range: {amount}")))?;

        let body = InitializeRequest {
            email,
            amount: kobo,
            reference,
            callback_url: &self.callback_url,
            currency: CurrencyCode::NGN.code(),
        };

        let response = self
            .client
            .post(format!("{PAYSTACK_API}/transaction/initialize"))
            .bearer_auth(secret.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: ApiResponse<PaystackCheckout> = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        if !api_response.status {
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: api_response.message,
            });
        }

        api_response
            .data
            .ok_or_else(|| PaymentError::Parse("response has no data".to_string()))
    }

    /// Verify a webhook signature with this client's secret key.
    ///
    /// # Errors
    ///
    /// See [`verify_signature`].
    pub fn verify_webhook(&self, body: &[u8], signature: Option<&str>) -> Result<(), PaymentError> {
        let secret = self.secret()?;
        let signature = signature.ok_or(PaymentError::MissingSignature)?;
        verify_signature(secret.expose_secret().as_bytes(), body, signature)
    }
}

// ===== Webhook =====

/// Check a hex HMAC-SHA512 signature, optionally prefixed `sha512=`, in
/// constant time.
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignature` if the signature is not hex or does
/// not match.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> Result<(), PaymentError> {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha512=").unwrap_or(signature);
    let expected = hex::decode(signature).map_err(|_| PaymentError::InvalidSignature)?;

    let mut mac = HmacSha512::new_from_slice(secret).map_err(|_| PaymentError::InvalidSignature)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| PaymentError::InvalidSignature)
}

/// The subset of a Paystack event this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub reference: String,
}

/// What a webhook event asks us to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeEvent {
    Succeeded { reference: String },
    Failed { reference: String },
    Other(String),
}

impl WebhookEvent {
    /// Parse a webhook body. Only call after the signature has been verified.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidPayload` for malformed JSON.
    pub fn parse(body: &[u8]) -> Result<Self, PaymentError> {
        serde_json::from_slice(body).map_err(|e| PaymentError::InvalidPayload(e.to_string()))
    }

    #[must_use]
    pub fn classify(self) -> ChargeEvent {
        match self.event.as_str() {
            "charge.success" => ChargeEvent::Succeeded {
                reference: self.data.reference,
            },
            "charge.failed" => ChargeEvent::Failed {
                reference: self.data.reference,
            },
            _ => ChargeEvent::Other(self.event),
        }
    }
}

/// Result of processing one webhook delivery.
#[derive(Debug)]
pub enum WebhookOutcome {
    /// The payment changed state. `succeeded` tells which way.
    Applied { payment: Payment, succeeded: bool },
    /// The event had already been applied.
    Duplicate,
    /// Unknown event type or reference.
    Ignored,
}

impl WebhookOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Duplicate => "duplicate",
            Self::Ignored => "ignored",
        }
    }
}

/// Payment workflows that touch both Paystack and the database.
pub struct PaymentService<'a> {
    pool: &'a PgPool,
    paystack: &'a PaystackClient,
}

impl<'a> PaymentService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, paystack: &'a PaystackClient) -> Self {
        Self { pool, paystack }
    }

    /// Authenticate and apply a webhook delivery.
    ///
    /// Nothing is parsed and the database is not touched until the signature
    /// checks out.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::MissingSignature` or
    /// `PaymentError::InvalidSignature` for unauthenticated calls,
    /// `PaymentError::InvalidPayload` for malformed bodies.
    pub async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, PaymentError> {
        self.paystack.verify_webhook(body, signature)?;

        let (reference, succeeded) = match WebhookEvent::parse(body)?.classify() {
            ChargeEvent::Succeeded { reference } => (reference, true),
            ChargeEvent::Failed { reference } => (reference, false),
            ChargeEvent::Other(event) => {
                tracing::debug!(event = %event, "Ignoring Paystack event");
                return Ok(WebhookOutcome::Ignored);
            }
        };

        if reference.is_empty() {
            return Err(PaymentError::InvalidPayload(
                "event has no reference".to_string(),
            ));
        }

        let outcome = match PaymentRepository::new(self.pool)
            .apply_charge(&reference, succeeded)
            .await?
        {
            ChargeOutcome::Applied {
                payment,
                order_confirmed,
            } => {
                tracing::info!(
                    payment_id = %payment.id,
                    order_id = %payment.order_id,
                    succeeded,
                    order_confirmed,
                    "Payment webhook applied"
                );
                WebhookOutcome::Applied { payment, succeeded }
            }
            ChargeOutcome::Duplicate => {
                tracing::info!(reference = %reference, "Duplicate payment webhook");
                WebhookOutcome::Duplicate
            }
            ChargeOutcome::UnknownReference => {
                tracing::warn!(reference = %reference, "Webhook for unknown payment reference");
                WebhookOutcome::Ignored
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"sk_test_0123456789abcdef";
    const BODY: &[u8] = br#"{"event":"charge.success","data":{"reference":"8f7c5c3e-ref"}}"#;

    fn sign(secret: &[u8], body: &[u8]) -> String {
        let mut mac = HmacSha512::new_from_slice(secret).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature() {
        let signature = sign(SECRET, BODY);
        assert!(verify_signature(SECRET, BODY, &signature).is_ok());
    }

    #[test]
    fn test_valid_signature_with_prefix() {
        let signature = format!("sha512={}", sign(SECRET, BODY));
        assert!(verify_signature(SECRET, BODY, &signature).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let signature = sign(SECRET, BODY);
        let tampered = br#"{"event":"charge.success","data":{"reference":"someone-else"}}"#;
        assert!(matches!(
            verify_signature(SECRET, tampered, &signature),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signature = sign(b"sk_test_other", BODY);
        assert!(matches!(
            verify_signature(SECRET, BODY, &signature),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_non_hex_signature_rejected() {
        assert!(matches!(
            verify_signature(SECRET, BODY, "definitely-not-hex"),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_bad_signature_rejected_before_parsing() {
        let secret = SecretString::from(String::from("sk_test_0123456789abcdef"));
        let client = PaystackClient::new(Some(secret), "http://x").unwrap();
        // Garbage body with a bad signature fails on the signature, not the JSON.
        assert!(matches!(
            client.verify_webhook(b"not json", Some("00ff")),
            Err(PaymentError::InvalidSignature)
        ));
        assert!(matches!(
            client.verify_webhook(b"not json", None),
            Err(PaymentError::MissingSignature)
        ));
    }

    #[test]
    fn test_unconfigured_client() {
        let client = PaystackClient::new(None, "http://x").unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.verify_webhook(BODY, Some("00")),
            Err(PaymentError::NotConfigured)
        ));
    }

    #[test]
    fn test_classify_events() {
        let success = WebhookEvent::parse(BODY).unwrap().classify();
        assert_eq!(
            success,
            ChargeEvent::Succeeded {
                reference: "8f7c5c3e-ref".to_string()
            }
        );

        let failed = WebhookEvent::parse(br#"{"event":"charge.failed","data":{"reference":"r1"}}"#)
            .unwrap()
            .classify();
        assert_eq!(
            failed,
            ChargeEvent::Failed {
                reference: "r1".to_string()
            }
        );

        let other = WebhookEvent::parse(br#"{"event":"transfer.success","data":{}}"#)
            .unwrap()
            .classify();
        assert_eq!(other, ChargeEvent::Other("transfer.success".to_string()));
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(
            WebhookEvent::parse(b"{\"event\":"),
            Err(PaymentError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_callback_url() {
        let client = PaystackClient::new(None, "https://shop.example").unwrap();
        assert_eq!(client.callback_url, "https://shop.example/api/payments/webhook");
    }

    #[test]
    fn test_initialize_request_uses_kobo() {
        let body = InitializeRequest {
            email: "ada@example.com",
            amount: Price::ngn(Decimal::new(1_250_050, 2)).to_minor_units().unwrap(),
            reference: "ref",
            callback_url: "https://shop.example/api/payments/webhook",
            currency: CurrencyCode::NGN.code(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["amount"], 1_250_050);
        assert_eq!(json["currency"], "NGN");
    }
}
