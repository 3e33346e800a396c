//! Motoparts storefront data layer.
//!
//! A REST gateway to the storefront API plus one state store per domain
//! (auth, cart, user, products, orders), wired together by [`AppState`].
//! Front ends hold an `AppState`, call store triggers, and read snapshots.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod images;
pub mod models;
pub mod state;
pub mod store;

pub use state::{AccountLoad, AppState, CheckoutReceipt};
