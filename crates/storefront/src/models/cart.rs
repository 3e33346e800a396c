//! Cart line items and checkout totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use motoparts_core::types::lenient;
use motoparts_core::{CartItemId, ProductId, ProductType};

/// One line in the customer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart line id (not the product id).
    pub id: CartItemId,
    /// Whether the line refers to a part or merch.
    #[serde(default)]
    pub product_type: ProductType,
    /// The product this line refers to.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Number of units, at least 1.
    #[serde(default = "default_quantity", deserialize_with = "lenient::count")]
    pub quantity: u32,
    /// Product name at the time it was added.
    #[serde(default)]
    pub name: String,
    /// Unit price.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub price: Decimal,
    /// Product image path or URL.
    #[serde(default)]
    pub image: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Overwrite the fields the update carries; absent fields are kept.
    pub fn merge(&mut self, update: CartItemUpdate) {
        if let Some(product_type) = update.product_type {
            self.product_type = product_type;
        }
        if update.product_id.is_some() {
            self.product_id = update.product_id;
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if update.image.is_some() {
            self.image = update.image;
        }
    }
}

/// A cart line as reported by a write response, which may carry only some
/// fields (`{"id": "c1", "quantity": 3}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CartItemUpdate {
    pub id: CartItemId,
    #[serde(default)]
    pub product_type: Option<ProductType>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_amount")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItemUpdate {
    /// A new line, when the update carries enough to show one (name and
    /// price).
    #[must_use]
    pub fn into_item(self) -> Option<CartItem> {
        let (Some(name), Some(price)) = (self.name, self.price) else {
            return None;
        };
        Some(CartItem {
            id: self.id,
            product_type: self.product_type.unwrap_or_default(),
            product_id: self.product_id,
            quantity: self.quantity.unwrap_or_else(default_quantity),
            name,
            price,
            image: self.image,
        })
    }
}

impl From<CartItem> for CartItemUpdate {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            product_type: Some(item.product_type),
            product_id: item.product_id,
            quantity: Some(item.quantity),
            name: Some(item.name),
            price: Some(item.price),
            image: item.image,
        }
    }
}

/// Authoritative checkout totals computed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartSummary {
    /// Sum of line totals.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub subtotal: Decimal,
    /// Membership discount applied to the subtotal.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub discount: Decimal,
    /// Shipping charge, when already known.
    #[serde(default, deserialize_with = "lenient::optional_amount")]
    pub shipping_cost: Option<Decimal>,
    /// Amount to be charged.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub total: Decimal,
    /// Loyalty points the order will earn.
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub points_earned: Option<u32>,
}

/// Totals to show next to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartTotals {
    /// Fetched from the server; safe to show at checkout.
    Confirmed(CartSummary),
    /// Local price x quantity sum; display only until the summary arrives.
    Estimated {
        /// Estimated subtotal.
        subtotal: Decimal,
    },
}

impl CartTotals {
    /// The amount to display as the cart total.
    #[must_use]
    pub const fn headline(&self) -> Decimal {
        match self {
            Self::Confirmed(summary) => summary.total,
            Self::Estimated { subtotal } => *subtotal,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cart_item_coerces_price_and_quantity() {
        let item: CartItem = serde_json::from_value(json!({
            "id": 12,
            "product_type": "merch",
            "product_id": "m-4",
            "quantity": "3",
            "name": "Riding gloves",
            "price": "24.50"
        }))
        .unwrap();
        assert_eq!(item.product_type, ProductType::Merch);
        assert_eq!(item.quantity, 3);
        assert_eq!(item.line_total(), Decimal::new(7350, 2));
    }

    #[test]
    fn test_cart_item_missing_quantity_defaults_to_one() {
        let item: CartItem = serde_json::from_value(json!({"id": "c1", "price": 10})).unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.product_type, ProductType::Part);
    }

    #[test]
    fn test_partial_update_keeps_absent_fields() {
        let mut item: CartItem = serde_json::from_value(json!({
            "id": "c1", "name": "Chain", "price": "40.00", "quantity": 1
        }))
        .unwrap();
        let update: CartItemUpdate =
            serde_json::from_value(json!({"id": "c1", "quantity": 3})).unwrap();
        assert!(update.clone().into_item().is_none());

        item.merge(update);
        assert_eq!(item.name, "Chain");
        assert_eq!(item.price, Decimal::from(40));
        assert_eq!(item.quantity, 3);
        assert_eq!(item.line_total(), Decimal::from(120));
    }

    #[test]
    fn test_summary_defaults() {
        let summary: CartSummary = serde_json::from_value(json!({"total": "80.00"})).unwrap();
        assert_eq!(summary.total, Decimal::from(80));
        assert_eq!(summary.subtotal, Decimal::ZERO);
        assert_eq!(summary.shipping_cost, None);
    }
}
