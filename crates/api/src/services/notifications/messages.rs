//! Rendered notification messages.
//!
//! Every message kind has an HTML and a plain-text askama template under
//! `templates/email/`, plus a one-line SMS body.

use askama::Template;
use rust_decimal::Decimal;

use hardware_store_core::{OrderId, OrderStatus, ServiceRequestId};

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeHtml<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeText<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    name: &'a str,
    order_id: OrderId,
    total: Decimal,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    name: &'a str,
    order_id: OrderId,
    total: Decimal,
}

#[derive(Template)]
#[template(path = "email/order_status.html")]
struct OrderStatusHtml<'a> {
    name: &'a str,
    order_id: OrderId,
    status: OrderStatus,
}

#[derive(Template)]
#[template(path = "email/order_status.txt")]
struct OrderStatusText<'a> {
    name: &'a str,
    order_id: OrderId,
    status: OrderStatus,
}

#[derive(Template)]
#[template(path = "email/payment_confirmation.html")]
struct PaymentConfirmationHtml<'a> {
    name: &'a str,
    order_id: OrderId,
    amount: Decimal,
    reference: &'a str,
}

#[derive(Template)]
#[template(path = "email/payment_confirmation.txt")]
struct PaymentConfirmationText<'a> {
    name: &'a str,
    order_id: OrderId,
    amount: Decimal,
    reference: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/service_received.html")]
struct ServiceReceivedHtml<'a> {
    name: &'a str,
    kind: &'a str,
    request_id: ServiceRequestId,
}

#[derive(Template)]
#[template(path = "email/service_received.txt")]
struct ServiceReceivedText<'a> {
    name: &'a str,
    kind: &'a str,
    request_id: ServiceRequestId,
}

#[derive(Template)]
#[template(path = "email/service_quote.html")]
struct ServiceQuoteHtml<'a> {
    name: &'a str,
    kind: &'a str,
    request_id: ServiceRequestId,
    amount: Decimal,
    scheduled_date: Option<String>,
}

#[derive(Template)]
#[template(path = "email/service_quote.txt")]
struct ServiceQuoteText<'a> {
    name: &'a str,
    kind: &'a str,
    request_id: ServiceRequestId,
    amount: Decimal,
    scheduled_date: Option<String>,
}

#[derive(Template)]
#[template(path = "email/low_stock.html")]
struct LowStockHtml<'a> {
    items: &'a [LowStockLine],
}

#[derive(Template)]
#[template(path = "email/low_stock.txt")]
struct LowStockText<'a> {
    items: &'a [LowStockLine],
}

/// A product that dropped below the alert threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockLine {
    pub name: String,
    pub remaining: i32,
}

/// A message ready to hand to any channel.
#[derive(Debug, Clone)]
pub struct Message {
    pub subject: String,
    pub text: String,
    pub html: String,
    pub sms: String,
}

impl Message {
    /// # Errors
    ///
    /// Returns `askama::Error` if a template fails to render.
    pub fn welcome(name: &str) -> Result<Self, askama::Error> {
        Ok(Self {
            subject: "Welcome to Hardware Store".to_string(),
            text: WelcomeText { name }.render()?,
            html: WelcomeHtml { name }.render()?,
            sms: format!("Hi {name}, welcome to Hardware Store!"),
        })
    }

    /// # Errors
    ///
    /// Returns `askama::Error` if a template fails to render.
    pub fn order_confirmation(
        name: &str,
        order_id: OrderId,
        total: Decimal,
    ) -> Result<Self, askama::Error> {
        Ok(Self {
            subject: format!("Order confirmation - {order_id}"),
            text: OrderConfirmationText {
                name,
                order_id,
                total,
            }
            .render()?,
            html: OrderConfirmationHtml {
                name,
                order_id,
                total,
            }
            .render()?,
            sms: format!("Hardware Store: order {order_id} received. Total NGN {total}."),
        })
    }

    /// # Errors
    ///
    /// Returns `askama::Error` if a template fails to render.
    pub fn order_status(
        name: &str,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Self, askama::Error> {
        Ok(Self {
            subject: format!("Your order is {status}"),
            text: OrderStatusText {
                name,
                order_id,
                status,
            }
            .render()?,
            html: OrderStatusHtml {
                name,
                order_id,
                status,
            }
            .render()?,
            sms: format!("Hardware Store: order {order_id} is now {status}."),
        })
    }

    /// # Errors
    ///
    /// Returns `askama::Error` if a template fails to render.
    pub fn payment_confirmation(
        name: &str,
        order_id: OrderId,
        amount: Decimal,
        reference: &str,
    ) -> Result<Self, askama::Error> {
        Ok(Self {
            subject: "Payment received".to_string(),
            text: PaymentConfirmationText {
                name,
                order_id,
                amount,
                reference,
            }
            .render()?,
            html: PaymentConfirmationHtml {
                name,
                order_id,
                amount,
                reference,
            }
            .render()?,
            sms: format!("Hardware Store: payment of NGN {amount} received for order {order_id}."),
        })
    }

    /// # Errors
    ///
    /// Returns `askama::Error` if a template fails to render.
    pub fn password_reset(name: &str, link: &str) -> Result<Self, askama::Error> {
        Ok(Self {
            subject: "Reset your password".to_string(),
            text: PasswordResetText { name, link }.render()?,
            html: PasswordResetHtml { name, link }.render()?,
            sms: format!("Hardware Store password reset: {link}"),
        })
    }

    /// # Errors
    ///
    /// Returns `askama::Error` if a template fails to render.
    pub fn service_received(
        name: &str,
        kind: &str,
        request_id: ServiceRequestId,
    ) -> Result<Self, askama::Error> {
        Ok(Self {
            subject: "Service request received".to_string(),
            text: ServiceReceivedText {
                name,
                kind,
                request_id,
            }
            .render()?,
            html: ServiceReceivedHtml {
                name,
                kind,
                request_id,
            }
            .render()?,
            sms: format!("Hardware Store: we received your {kind} request. A quote will follow."),
        })
    }

    /// # Errors
    ///
    /// Returns `askama::Error` if a template fails to render.
    pub fn service_quote(
        name: &str,
        kind: &str,
        request_id: ServiceRequestId,
        amount: Decimal,
        scheduled_date: Option<chrono::NaiveDate>,
    ) -> Result<Self, askama::Error> {
        let scheduled_date = scheduled_date.map(|d| d.format("%A %-d %B %Y").to_string());
        Ok(Self {
            subject: "Your service quote".to_string(),
            text: ServiceQuoteText {
                name,
                kind,
                request_id,
                amount,
                scheduled_date: scheduled_date.clone(),
            }
            .render()?,
            html: ServiceQuoteHtml {
                name,
                kind,
                request_id,
                amount,
                scheduled_date,
            }
            .render()?,
            sms: format!("Hardware Store: your {kind} request was quoted at NGN {amount}."),
        })
    }

    /// # Errors
    ///
    /// Returns `askama::Error` if a template fails to render.
    pub fn low_stock(items: &[LowStockLine]) -> Result<Self, askama::Error> {
        Ok(Self {
            subject: format!("Low stock alert: {} product(s)", items.len()),
            text: LowStockText { items }.render()?,
            html: LowStockHtml { items }.render()?,
            sms: format!("Hardware Store: {} product(s) low on stock.", items.len()),
        })
    }
}
