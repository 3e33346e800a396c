//! Motoparts Core - Shared types library.
//!
//! This crate provides common types used across all Motoparts components:
//! - `storefront` - REST gateway, domain stores and application state
//! - `cli` - Terminal front end driving the storefront stores
//!
//! # Architecture
//!
//! The core crate contains only types and decoding helpers - no I/O and no
//! HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, statuses and lenient
//!   numeric decoding of server payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
