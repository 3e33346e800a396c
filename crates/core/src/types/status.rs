//! Status enums for various entities.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Order lifecycle status.
///
/// The server owns every transition except cancellation, which the customer
/// may request while the order is pre-terminal. Unknown status strings are
/// kept verbatim in [`OrderStatus::Other`] rather than failing the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Placed,
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    /// Parse a status string; never fails.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "placed" => Self::Placed,
            "pending" => Self::Pending,
            "confirmed" => Self::Confirmed,
            "processing" => Self::Processing,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Placed => "placed",
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }

    /// Whether the order has not yet left the warehouse.
    ///
    /// Only pre-terminal orders are offered the cancel action.
    #[must_use]
    pub const fn is_pre_terminal(&self) -> bool {
        matches!(
            self,
            Self::Placed | Self::Pending | Self::Confirmed | Self::Processing
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

/// Kind of product a cart line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    /// A motorcycle part from the catalog.
    #[default]
    Part,
    /// Shop merchandise (apparel, accessories).
    #[serde(alias = "merchandise")]
    Merch,
}

impl ProductType {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Part => "part",
            Self::Merch => "merch",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error parsing a [`ProductType`].
#[derive(Debug, Error)]
#[error("invalid product type: {0} (expected part or merch)")]
pub struct ProductTypeError(String);

impl std::str::FromStr for ProductType {
    type Err = ProductTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "part" => Ok(Self::Part),
            "merch" | "merchandise" => Ok(Self::Merch),
            _ => Err(ProductTypeError(s.to_string())),
        }
    }
}
