//! Core types for Motoparts.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod lenient;
pub mod price;
pub mod status;

pub use id::*;
pub use lenient::{parse_amount, parse_count};
pub use price::{CurrencyCode, Price};
pub use status::*;
