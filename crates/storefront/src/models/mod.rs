//! Client-side copies of server-owned records.
//!
//! Every model deserializes leniently: ids accept strings or numbers, money
//! accepts numbers or numeric strings, and missing optional fields default
//! instead of failing the record.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;

pub use address::{Address, AddressInput};
pub use cart::{CartItem, CartItemUpdate, CartSummary, CartTotals};
pub use catalog::{BikeModel, Category, Manufacturer, Pagination, Product};
pub use order::{Order, OrderItem, OrderTracking, TrackingEvent};
pub use session::{AuthPayload, Session, User};
