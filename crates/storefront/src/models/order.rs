//! Orders and shipment tracking.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use motoparts_core::types::lenient::{self, parse_amount};
use motoparts_core::{AddressId, OrderId, OrderStatus, ProductId, ProductType};

/// A placed order.
///
/// Deserializes through [`RawOrder`] so the numeric `total` can be derived
/// from whichever of `total_amount` / `total` the endpoint sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOrder")]
pub struct Order {
    pub id: OrderId,
    /// Human-facing order number, when different from the id.
    pub order_number: Option<String>,
    pub status: OrderStatus,
    /// Order total; zero when the server sent none.
    pub total: Decimal,
    pub items: Vec<OrderItem>,
    pub shipping_address_id: Option<AddressId>,
    pub payment_status: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Whether the customer may request cancellation.
    ///
    /// The server remains the authority and may still reject the request.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        self.status.is_pre_terminal()
    }
}

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_type: ProductType,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub price: Decimal,
}

/// Wire shape of an order before normalisation.
#[derive(Deserialize)]
struct RawOrder {
    id: OrderId,
    #[serde(default)]
    order_number: Option<Value>,
    #[serde(default)]
    status: OrderStatus,
    #[serde(default)]
    total_amount: Option<Value>,
    #[serde(default)]
    total: Option<Value>,
    #[serde(default)]
    items: Option<Vec<OrderItem>>,
    #[serde(default)]
    shipping_address_id: Option<AddressId>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    tracking_number: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<RawOrder> for Order {
    fn from(raw: RawOrder) -> Self {
        let total = raw
            .total_amount
            .as_ref()
            .and_then(parse_amount)
            .or_else(|| raw.total.as_ref().and_then(parse_amount))
            .unwrap_or_default();

        let order_number = raw.order_number.and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Self {
            id: raw.id,
            order_number,
            status: raw.status,
            total,
            items: raw.items.unwrap_or_default(),
            shipping_address_id: raw.shipping_address_id,
            payment_status: raw.payment_status,
            tracking_number: raw.tracking_number,
            created_at: raw.created_at.as_deref().and_then(parse_timestamp),
        }
    }
}

/// Parse RFC 3339, falling back to a naive `YYYY-MM-DD HH:MM:SS` read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Shipment progress for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTracking {
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<String>,
    #[serde(default)]
    pub events: Vec<TrackingEvent>,
}

/// One checkpoint in a shipment's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_total_amount_string_is_coerced() {
        let order: Order =
            serde_json::from_value(json!({"id": "o1", "total_amount": "199.50"})).unwrap();
        assert_eq!(order.total, Decimal::new(1995, 1));
    }

    #[test]
    fn test_missing_totals_default_to_zero() {
        let order: Order = serde_json::from_value(json!({"id": "o2"})).unwrap();
        assert_eq!(order.total, Decimal::ZERO);
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_total_used_when_total_amount_absent() {
        let order: Order = serde_json::from_value(json!({"id": 3, "total": 42.25})).unwrap();
        assert_eq!(order.total, Decimal::new(4225, 2));
    }

    #[test]
    fn test_unparseable_total_amount_falls_back() {
        let order: Order =
            serde_json::from_value(json!({"id": 4, "total_amount": "n/a", "total": "10"}))
                .unwrap();
        assert_eq!(order.total, Decimal::from(10));
    }

    #[test]
    fn test_placed_order_can_cancel() {
        let order: Order =
            serde_json::from_value(json!({"id": "o1", "status": "placed"})).unwrap();
        assert!(order.can_cancel());

        let shipped: Order =
            serde_json::from_value(json!({"id": "o1", "status": "shipped"})).unwrap();
        assert!(!shipped.can_cancel());
    }

    #[test]
    fn test_created_at_formats() {
        assert!(parse_timestamp("2025-03-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2025-03-01 10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_order_number_numeric() {
        let order: Order =
            serde_json::from_value(json!({"id": 1, "order_number": 100_045})).unwrap();
        assert_eq!(order.order_number.as_deref(), Some("100045"));
    }
}
