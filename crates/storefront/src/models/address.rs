//! Shipping addresses.

use serde::{Deserialize, Serialize};

use motoparts_core::AddressId;
use motoparts_core::types::lenient;

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    /// Customer-chosen label ("Home", "Workshop").
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    /// At most one address per user should carry this flag.
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_default: bool,
}

/// Fields sent when creating or updating an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressInput {
    pub label: String,
    pub street: String,
    pub city: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub is_default: bool,
}

impl From<&Address> for AddressInput {
    fn from(address: &Address) -> Self {
        Self {
            label: address.label.clone(),
            street: address.street.clone(),
            city: address.city.clone(),
            country: address.country.clone(),
            postal_code: address.postal_code.clone(),
            is_default: address.is_default,
        }
    }
}
