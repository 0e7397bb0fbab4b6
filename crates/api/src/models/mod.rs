//! Domain models for the API.
//!
//! These are validated domain objects, separate from the row types each
//! repository decodes. They serialize to the JSON the handlers return.

pub mod cart;
pub mod catalog;
pub mod notification;
pub mod order;
pub mod payment;
pub mod report;
pub mod service_request;
pub mod user;

pub use cart::{Cart, CartItem, CartLine, WishlistItem};
pub use catalog::{
    Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductDetail, ProductFilter,
    ProductSort, ProductSummary, ProductUpdate, StockOperation,
};
pub use notification::Notification;
pub use order::{
    AdminOrderFilter, Order, OrderItem, OrderWithItems, ServiceRequestSnapshot, ShippingAddress,
};
pub use payment::Payment;
pub use report::{InventoryReport, SalesReport, TopProduct, UserReport};
pub use service_request::{NewServiceRequest, ServiceQuote, ServiceRequest, ServiceRequestFilter};
pub use user::{Address, NewUser, User, UserFilter, UserWithPassword};
