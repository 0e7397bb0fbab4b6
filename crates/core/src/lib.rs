//! Hardware Store Core - Shared types library.
//!
//! Used by:
//! - `hardware-store-api` - the REST API server
//! - `hardware-store-cli` - migrations, seeding and admin bootstrap
//!
//! The crate holds types only: no I/O, no database access, no HTTP clients.
//! Enable the `postgres` feature to get `sqlx` encode/decode impls.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, phone numbers, money, paging and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
