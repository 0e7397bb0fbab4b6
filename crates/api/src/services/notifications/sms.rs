//! Twilio SMS delivery.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use super::NotificationError;
use crate::config::TwilioConfig;

const TWILIO_API: &str = "https://api.twilio.com/2010-04-01";

#[derive(Clone)]
struct TwilioCredentials {
    account_sid: String,
    auth_token: SecretString,
    from: String,
}

/// Twilio Messages API client.
#[derive(Clone)]
pub struct SmsClient {
    client: reqwest::Client,
    credentials: Option<TwilioCredentials>,
}

impl SmsClient {
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &TwilioConfig) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let credentials = match (&config.account_sid, &config.auth_token, &config.phone_number) {
            (Some(account_sid), Some(auth_token), Some(from)) => Some(TwilioCredentials {
                account_sid: account_sid.clone(),
                auth_token: auth_token.clone(),
                from: from.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            client,
            credentials,
        })
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Send an SMS.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::NotConfigured` without credentials, or the
    /// HTTP/API error from Twilio.
    pub async fn send(&self, to: &str, body: &str) -> Result<(), NotificationError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(NotificationError::NotConfigured("Twilio"))?;

        let url = format!(
            "{TWILIO_API}/Accounts/{}/Messages.json",
            credentials.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &credentials.account_sid,
                Some(credentials.auth_token.expose_secret()),
            )
            .form(&[
                ("To", to),
                ("From", credentials.from.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotificationError::Api {
                provider: "Twilio",
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(to = %to, "SMS sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_credentials_are_unconfigured() {
        let client = SmsClient::new(&TwilioConfig {
            account_sid: Some("AC123".to_string()),
            auth_token: None,
            phone_number: Some("+15005550006".to_string()),
        })
        .unwrap();
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_fast() {
        let client = SmsClient::new(&TwilioConfig {
            account_sid: None,
            auth_token: None,
            phone_number: None,
        })
        .unwrap();
        let err = client.send("+2348035550100", "hello").await.unwrap_err();
        assert!(matches!(err, NotificationError::NotConfigured("Twilio")));
    }
}
