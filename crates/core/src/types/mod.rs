//! Domain types shared by the API server and the CLI.

pub mod email;
pub mod id;
pub mod pagination;
pub mod phone;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use pagination::{Page, PageRequest, Paginated, SortOrder};
pub use phone::{PhoneError, PhoneNumber};
pub use price::{CurrencyCode, Price, line_total, order_total};
pub use status::*;
