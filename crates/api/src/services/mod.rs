//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login, JWTs and password reset
//! - `cache` - In-process catalog cache
//! - `checkout` - Transactional order placement
//! - `notifications` - Email (`SendGrid`) and SMS (Twilio) dispatch
//! - `payments` - Paystack transactions and webhook handling
//! - `uploads` - Cloudinary image storage

pub mod auth;
pub mod cache;
pub mod checkout;
pub mod notifications;
pub mod payments;
pub mod uploads;
