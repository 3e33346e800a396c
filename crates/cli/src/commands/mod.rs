//! Subcommand implementations.
//!
//! Each command calls store triggers on the shared [`AppState`] and prints
//! the result to stdout. Failures come back as [`CliError`].
//!
//! [`AppState`]: motoparts_storefront::AppState

#![allow(clippy::print_stdout)]

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;

use std::path::PathBuf;

use motoparts_core::{CurrencyCode, Price};
use motoparts_storefront::api::ApiError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CliError {
    /// The API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A local file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The server returned nothing for the requested record.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A multi-step change was only partly applied.
    #[error("{0}")]
    Incomplete(String),
}

/// Format an amount in the store currency.
fn money(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::default()).display()
}

/// Print a `key: value` line, skipping absent values.
fn field(label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        println!("  {label}: {value}");
    }
}
