//! SendGrid email delivery.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::NotificationError;
use crate::config::SendGridConfig;

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Serialize)]
struct MailRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 2],
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

/// SendGrid v3 client.
#[derive(Clone)]
pub struct EmailClient {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    from_email: String,
    from_name: String,
}

impl EmailClient {
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &SendGridConfig) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a text + HTML email.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::NotConfigured` without an API key, or the
    /// HTTP/API error from SendGrid.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), NotificationError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(NotificationError::NotConfigured("SendGrid"))?;

        // SendGrid requires text/plain before text/html.
        let body = MailRequest {
            personalizations: [Personalization {
                to: [Address {
                    email: to,
                    name: None,
                }],
            }],
            from: Address {
                email: &self.from_email,
                name: Some(&self.from_name),
            },
            subject,
            content: [
                Content {
                    kind: "text/plain",
                    value: text,
                },
                Content {
                    kind: "text/html",
                    value: html,
                },
            ],
        };

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotificationError::Api {
                provider: "SendGrid",
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_client_fails_fast() {
        let client = EmailClient::new(&SendGridConfig::default()).unwrap();
        assert!(!client.is_configured());
        let err = client
            .send("ada@example.com", "Hi", "text", "<p>html</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::NotConfigured("SendGrid")));
    }

    #[test]
    fn test_request_shape() {
        let body = MailRequest {
            personalizations: [Personalization {
                to: [Address {
                    email: "ada@example.com",
                    name: None,
                }],
            }],
            from: Address {
                email: "noreply@hardwarestore.com",
                name: Some("Hardware Store"),
            },
            subject: "Hi",
            content: [
                Content {
                    kind: "text/plain",
                    value: "t",
                },
                Content {
                    kind: "text/html",
                    value: "h",
                },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["personalizations"][0]["to"][0]["email"], "ada@example.com");
        assert!(json["personalizations"][0]["to"][0].get("name").is_none());
        assert_eq!(json["from"]["name"], "Hardware Store");
        assert_eq!(json["content"][0]["type"], "text/plain");
        assert_eq!(json["content"][1]["type"], "text/html");
    }
}
