//! Response shape classification and lenient decoding.
//!
//! The API does not commit to one response shape per endpoint. A list may
//! arrive bare (`[...]`), wrapped (`{"items": [...]}`, `{"cart_items": [...]}`),
//! or inside a `{"data": ...}` envelope; a single record may arrive bare or
//! wrapped (`{"order": {...}}`). Stores classify each body exactly once with
//! [`ResponseShape::classify`] and then decode into their canonical types.
//! Anything outside the known variants decodes to an empty/absent value and
//! is logged; it is never an error.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Envelope keys unwrapped before classification.
const ENVELOPE_KEY: &str = "data";

/// Maximum number of nested `data` envelopes unwrapped.
const MAX_ENVELOPE_DEPTH: usize = 2;

/// Wrapper keys an endpoint is known to use.
#[derive(Debug, Clone, Copy)]
pub struct ShapeKeys {
    /// Keys holding a list of records.
    pub lists: &'static [&'static str],
    /// Keys holding a single record.
    pub items: &'static [&'static str],
}

impl ShapeKeys {
    /// Keys for an endpoint returning lists.
    #[must_use]
    pub const fn lists(lists: &'static [&'static str]) -> Self {
        Self { lists, items: &[] }
    }

    /// Keys for an endpoint returning a single record.
    #[must_use]
    pub const fn items(items: &'static [&'static str]) -> Self {
        Self { lists: &[], items }
    }

    /// Keys for an endpoint that may return either.
    #[must_use]
    pub const fn both(lists: &'static [&'static str], items: &'static [&'static str]) -> Self {
        Self { lists, items }
    }
}

/// The recognised shapes of a response body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseShape<'a> {
    /// `[...]`
    BareList(&'a [Value]),
    /// `{"<key>": [...]}`
    WrappedList {
        key: &'static str,
        items: &'a [Value],
    },
    /// `{"<key>": {...}}`
    WrappedItem { key: &'static str, item: &'a Value },
    /// `{"id": ..., ...}`
    BareItem(&'a Value),
    /// None of the above.
    Unrecognized,
}

impl<'a> ResponseShape<'a> {
    /// Classify a response body against an endpoint's known keys.
    #[must_use]
    pub fn classify(body: &'a Value, keys: ShapeKeys) -> Self {
        let body = unwrap_envelope(body);

        match body {
            Value::Array(items) => Self::BareList(items),
            Value::Object(obj) => {
                for &key in keys.lists {
                    if let Some(Value::Array(items)) = obj.get(key) {
                        return Self::WrappedList { key, items };
                    }
                }
                for &key in keys.items {
                    if let Some(item @ Value::Object(_)) = obj.get(key) {
                        return Self::WrappedItem { key, item };
                    }
                }
                if obj.contains_key("id") {
                    Self::BareItem(body)
                } else {
                    Self::Unrecognized
                }
            }
            _ => Self::Unrecognized,
        }
    }

    /// The list payload, if this shape carries one.
    #[must_use]
    pub const fn as_list(&self) -> Option<&'a [Value]> {
        match *self {
            Self::BareList(items) | Self::WrappedList { items, .. } => Some(items),
            _ => None,
        }
    }

    /// The single-record payload, if this shape carries one.
    #[must_use]
    pub const fn as_item(&self) -> Option<&'a Value> {
        match *self {
            Self::WrappedItem { item, .. } | Self::BareItem(item) => Some(item),
            _ => None,
        }
    }
}

/// Strip `{"data": ...}` envelopes.
///
/// Only unwraps when `data` is the record or list itself, so a record that
/// merely has a `data` field alongside an `id` is left alone.
#[must_use]
pub fn unwrap_envelope(body: &Value) -> &Value {
    let mut current = body;
    for _ in 0..MAX_ENVELOPE_DEPTH {
        match current {
            Value::Object(obj) if !obj.contains_key("id") => match obj.get(ENVELOPE_KEY) {
                Some(inner @ (Value::Array(_) | Value::Object(_))) => current = inner,
                _ => break,
            },
            _ => break,
        }
    }
    current
}

/// Decode a list response. Always returns a vector, possibly empty.
///
/// Elements that do not deserialize are skipped and logged.
#[must_use]
pub fn decode_list<T: DeserializeOwned>(body: &Value, keys: ShapeKeys, context: &str) -> Vec<T> {
    let shape = ResponseShape::classify(body, keys);
    let Some(items) = shape.as_list() else {
        if !body.is_null() {
            warn!(context = %context, "Unrecognized list response shape, using empty list");
        }
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| decode_value(item, context))
        .collect()
}

/// Decode a single-record response.
///
/// Returns `None` (and logs) when the body is not a recognised record shape
/// or the record does not deserialize.
#[must_use]
pub fn decode_item<T: DeserializeOwned>(body: &Value, keys: ShapeKeys, context: &str) -> Option<T> {
    let shape = ResponseShape::classify(body, keys);
    let Some(item) = shape.as_item() else {
        warn!(context = %context, "Unrecognized record response shape");
        return None;
    };
    decode_value(item, context)
}

/// Decode a record that has no `id` of its own (summaries, tracking,
/// auth payloads).
///
/// A wrapped record under one of `keys.items` wins; otherwise the unwrapped
/// body itself is decoded if it is an object.
#[must_use]
pub fn decode_object<T: DeserializeOwned>(body: &Value, keys: ShapeKeys, context: &str) -> Option<T> {
    let shape = ResponseShape::classify(body, keys);
    let target = match shape.as_item() {
        Some(item) => item,
        None => {
            let inner = unwrap_envelope(body);
            if !inner.is_object() {
                warn!(context = %context, "Expected an object response");
                return None;
            }
            inner
        }
    };
    decode_value(target, context)
}

/// Deserialize one value, logging instead of failing.
#[must_use]
pub fn decode_value<T: DeserializeOwned>(value: &Value, context: &str) -> Option<T> {
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(context = %context, error = %e, "Skipping record that failed to decode");
            None
        }
    }
}
