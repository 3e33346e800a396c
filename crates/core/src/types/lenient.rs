//! Lenient decoding of numeric fields.
//!
//! Money and count fields arrive from the API as JSON numbers, numeric
//! strings (`"199.50"`), `null`, or not at all. These helpers coerce all of
//! those into a number, falling back to zero instead of failing the whole
//! record.
//!
//! ```rust
//! use motoparts_core::types::lenient;
//! use rust_decimal::Decimal;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Line {
//!     #[serde(default, deserialize_with = "lenient::amount")]
//!     price: Decimal,
//! }
//!
//! let line: Line = serde_json::from_str(r#"{"price": "12.50"}"#).unwrap();
//! assert_eq!(line.price, Decimal::new(1250, 2));
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a money-like JSON value into a decimal.
///
/// Accepts numbers and numeric strings (surrounding whitespace allowed).
/// Returns `None` for anything else, including empty strings.
#[must_use]
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Decimal::from(i));
            }
            parse_decimal_str(&n.to_string())
        }
        Value::String(s) => parse_decimal_str(s.trim()),
        _ => None,
    }
}

/// Parse a count-like JSON value (quantity, stock, points) into a `u32`.
///
/// Negative and fractional values are rejected.
#[must_use]
pub fn parse_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn parse_decimal_str(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Serde helper: money field, defaulting to zero.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
pub fn amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_amount).unwrap_or_default())
}

/// Serde helper: optional money field.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
pub fn optional_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_amount))
}

/// Serde helper: count field, defaulting to zero.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_count).unwrap_or_default())
}

/// Serde helper: optional count field.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_count))
}

/// Serde helper: boolean flag that may be sent as `true`, `1`, `"true"` or `"1"`.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1"),
        _ => false,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_amount_string() {
        assert_eq!(parse_amount(&json!("199.50")), Some(Decimal::new(1995, 1)));
        assert_eq!(parse_amount(&json!(" 50.00 ")), Some(Decimal::from(50)));
    }

    #[test]
    fn test_parse_amount_number() {
        assert_eq!(parse_amount(&json!(42)), Some(Decimal::from(42)));
        assert_eq!(parse_amount(&json!(19.99)), Some(Decimal::new(1999, 2)));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(&json!("")), None);
        assert_eq!(parse_amount(&json!("free")), None);
        assert_eq!(parse_amount(&json!(null)), None);
        assert_eq!(parse_amount(&json!({"amount": 1})), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(&json!(3)), Some(3));
        assert_eq!(parse_count(&json!("7")), Some(7));
        assert_eq!(parse_count(&json!(-1)), None);
        assert_eq!(parse_count(&json!(1.5)), None);
    }

    #[derive(Debug, Deserialize)]
    struct Fixture {
        #[serde(default, deserialize_with = "amount")]
        price: Decimal,
        #[serde(default, deserialize_with = "optional_amount")]
        shipping: Option<Decimal>,
        #[serde(default, deserialize_with = "count")]
        quantity: u32,
        #[serde(default, deserialize_with = "flag")]
        is_default: bool,
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let fixture: Fixture = serde_json::from_value(json!({})).unwrap();
        assert_eq!(fixture.price, Decimal::ZERO);
        assert_eq!(fixture.shipping, None);
        assert_eq!(fixture.quantity, 0);
        assert!(!fixture.is_default);
    }

    #[test]
    fn test_mixed_encodings() {
        let fixture: Fixture = serde_json::from_value(json!({
            "price": "12.5",
            "shipping": 4,
            "quantity": "2",
            "is_default": 1
        }))
        .unwrap();
        assert_eq!(fixture.price, Decimal::new(125, 1));
        assert_eq!(fixture.shipping, Some(Decimal::from(4)));
        assert_eq!(fixture.quantity, 2);
        assert!(fixture.is_default);
    }
}
