//! Service request (installation, repair, delivery work) types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hardware_store_core::{Page, ServiceRequestId, ServiceStatus, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct ServiceRequest {
    pub id: ServiceRequestId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: String,
    pub details: serde_json::Map<String, serde_json::Value>,
    pub location: String,
    pub requested_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub status: ServiceStatus,
    pub quote_amount: Option<Decimal>,
    pub assigned_to: Option<UserId>,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewServiceRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
    pub location: String,
    pub requested_date: Option<NaiveDate>,
    pub instructions: Option<String>,
}

impl NewServiceRequest {
    /// # Errors
    ///
    /// Returns a message when `type` or `location` is blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.kind.trim().is_empty() {
            return Err("type is required".to_string());
        }
        if self.location.trim().is_empty() {
            return Err("location is required".to_string());
        }
        Ok(())
    }
}

/// A staff quote for a requested job.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceQuote {
    pub amount: Decimal,
    pub assigned_to: Option<UserId>,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ServiceQuote {
    /// # Errors
    ///
    /// Returns a message when the amount is not positive.
    pub fn validate(&self) -> Result<(), String> {
        if self.amount <= Decimal::ZERO {
            return Err("amount must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceRequestFilter {
    pub status: Option<ServiceStatus>,
    pub kind: Option<String>,
    pub page: Page,
}
