//! Cart store.
//!
//! Line items mirror the server cart. Totals shown before checkout are a
//! local estimate; the authoritative [`CartSummary`] (membership discount,
//! shipping, points) is fetched from `/cart/summary` and dropped again on any
//! item mutation.

use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use motoparts_core::{CartItemId, ProductId, ProductType};

use crate::api::decode::{
    ResponseShape, ShapeKeys, decode_list, decode_object, decode_value, unwrap_envelope,
};
use crate::api::{ApiClient, ApiError, Endpoint};
use crate::models::{CartItem, CartItemUpdate, CartSummary, CartTotals};

use super::{Reducer, RequestStatus, Store};

const CART_KEYS: ShapeKeys =
    ShapeKeys::both(&["cart_items", "items", "cart"], &["cart_item", "item"]);

/// Key of a cart object wrapping the lines (`{"cart": {"items": [...]}}`).
const CART_OBJECT_KEY: &str = "cart";
const SUMMARY_KEYS: ShapeKeys = ShapeKeys::items(&["summary"]);

/// Cart slice.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    pub items: Vec<CartItem>,
    /// Server-computed totals; `None` until fetched or after a mutation.
    pub summary: Option<CartSummary>,
    pub request: RequestStatus,
}

impl CartState {
    /// Sum of price x quantity over all lines.
    ///
    /// Display only: it ignores discounts and shipping and must never be
    /// used as the amount charged.
    #[must_use]
    pub fn estimated_subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// The fetched summary when present, otherwise a flagged estimate.
    #[must_use]
    pub fn display_totals(&self) -> CartTotals {
        self.summary.clone().map_or_else(
            || CartTotals::Estimated {
                subtotal: self.estimated_subtotal(),
            },
            CartTotals::Confirmed,
        )
    }

    /// Total number of units across lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Actions understood by [`CartState`].
#[derive(Debug)]
pub enum CartAction {
    Pending,
    Rejected(String),
    /// Full cart from the server.
    Loaded(Vec<CartItem>),
    /// A mutation returned the whole cart.
    Replaced(Vec<CartItem>),
    /// A mutation returned one line, possibly partial.
    ///
    /// Merged into the line with the same id. An unknown id is added only
    /// when the update carries a name and a price.
    ItemUpserted(CartItemUpdate),
    /// A line was deleted.
    ItemRemoved(CartItemId),
    Cleared,
    SummaryLoaded(Option<CartSummary>),
    /// The request succeeded but returned nothing applicable.
    Settled,
    /// Local reset without a server call.
    Reset,
}

impl Reducer for CartState {
    type Action = CartAction;

    fn pending() -> Self::Action {
        CartAction::Pending
    }

    fn rejected(message: String) -> Self::Action {
        CartAction::Rejected(message)
    }

    fn reduce(&mut self, action: Self::Action) {
        match action {
            CartAction::Pending => self.request.start(),
            CartAction::Rejected(message) => self.request.fail(message),
            CartAction::Loaded(items) => {
                self.items = items;
                self.request.succeed();
            }
            CartAction::Replaced(items) => {
                self.items = items;
                self.summary = None;
                self.request.succeed();
            }
            CartAction::ItemUpserted(update) => {
                if let Some(existing) = self.items.iter_mut().find(|line| line.id == update.id) {
                    existing.merge(update);
                } else if let Some(item) = update.into_item() {
                    self.items.push(item);
                }
                self.summary = None;
                self.request.succeed();
            }
            CartAction::ItemRemoved(id) => {
                self.items.retain(|item| item.id != id);
                self.summary = None;
                self.request.succeed();
            }
            CartAction::Cleared => {
                self.items.clear();
                self.summary = None;
                self.request.succeed();
            }
            CartAction::SummaryLoaded(summary) => {
                self.summary = summary;
                self.request.succeed();
            }
            CartAction::Settled => self.request.succeed(),
            CartAction::Reset => *self = Self::default(),
        }
    }
}

/// What a cart write returned.
#[derive(Debug, Clone)]
enum CartWrite {
    Cart(Vec<CartItem>),
    Item(CartItemUpdate),
    Unrecognized,
}

impl CartWrite {
    fn from_body(body: &Value, context: &str) -> Self {
        match ResponseShape::classify(cart_body(body), CART_KEYS) {
            ResponseShape::BareList(items) | ResponseShape::WrappedList { items, .. } => {
                Self::Cart(items.iter().filter_map(|v| decode_value(v, context)).collect())
            }
            ResponseShape::WrappedItem { item, .. } | ResponseShape::BareItem(item) => {
                decode_value(item, context).map_or(Self::Unrecognized, Self::Item)
            }
            ResponseShape::Unrecognized => {
                debug!(context = %context, "Cart write returned no usable body");
                Self::Unrecognized
            }
        }
    }

    fn into_action(self) -> CartAction {
        match self {
            Self::Cart(items) => CartAction::Replaced(items),
            Self::Item(item) => CartAction::ItemUpserted(item),
            Self::Unrecognized => CartAction::Settled,
        }
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// Cart triggers.
#[derive(Clone)]
pub struct CartStore {
    api: ApiClient,
    store: Store<CartState>,
}

impl CartStore {
    /// Create an empty cart store.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: Store::new(CartState::default()),
        }
    }

    /// The underlying state container.
    #[must_use]
    pub const fn store(&self) -> &Store<CartState> {
        &self.store
    }

    /// Clone of the current state.
    pub async fn snapshot(&self) -> CartState {
        self.store.snapshot().await
    }

    /// Local estimate of the subtotal.
    pub async fn estimated_subtotal(&self) -> Decimal {
        self.store.read(CartState::estimated_subtotal).await
    }

    /// Totals to display next to the cart.
    pub async fn display_totals(&self) -> CartTotals {
        self.store.read(CartState::display_totals).await
    }

    /// Load the server cart.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; local items are left unchanged.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<Vec<CartItem>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api.get("/cart").await?;
            Ok(decode_list::<CartItem>(cart_body(&body), CART_KEYS, "cart.fetch"))
        };
        self.store
            .run("cart.fetch", request, |items| CartAction::Loaded(items.clone()))
            .await
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns the gateway error (for example "Out of stock"); local items
    /// are left unchanged.
    #[instrument(skip_all, fields(product_id = %product_id, quantity = quantity))]
    pub async fn add_to_cart(
        &self,
        product_type: ProductType,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let api = &self.api;
        let request = async {
            let body = api
                .post(
                    "/cart/items",
                    json!({
                        "product_type": product_type.as_str(),
                        "product_id": product_id.as_str(),
                        "quantity": quantity.max(1),
                    }),
                )
                .await?;
            Ok(CartWrite::from_body(&body, "cart.add"))
        };
        self.store
            .run("cart.add", request, |write| write.clone().into_action())
            .await
            .map(|_| ())
    }

    /// Change a line's quantity. A quantity of zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn update_cart_item(&self, id: &CartItemId, quantity: u32) -> Result<(), ApiError> {
        if quantity == 0 {
            return self.remove_from_cart(id).await;
        }

        let api = &self.api;
        let endpoint = item_path(id);
        let request = async {
            let body = api.put(&endpoint, json!({ "quantity": quantity })).await?;
            Ok(CartWrite::from_body(&body, "cart.update"))
        };
        self.store
            .run("cart.update", request, |write| write.clone().into_action())
            .await
            .map(|_| ())
    }

    /// Remove a line. Removing a line that is not present is a no-op locally.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn remove_from_cart(&self, id: &CartItemId) -> Result<(), ApiError> {
        let api = &self.api;
        let endpoint = item_path(id);
        let request = async { api.delete(&endpoint).await.map(|_| ()) };
        self.store
            .run("cart.remove", request, |_| CartAction::ItemRemoved(id.clone()))
            .await
    }

    /// Empty the cart on the server and locally.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        let api = &self.api;
        let request = async { api.delete("/cart").await.map(|_| ()) };
        self.store
            .run("cart.clear", request, |_| CartAction::Cleared)
            .await
    }

    /// Fetch the authoritative checkout totals.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn fetch_checkout_summary(&self) -> Result<Option<CartSummary>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api.get("/cart/summary").await?;
            Ok(decode_object::<CartSummary>(&body, SUMMARY_KEYS, "cart.summary"))
        };
        self.store
            .run("cart.summary", request, |summary| {
                CartAction::SummaryLoaded(summary.clone())
            })
            .await
    }

    /// Drop all local cart state without contacting the server.
    pub async fn reset_local(&self) {
        self.store.dispatch(CartAction::Reset).await;
    }
}

/// Step into a `cart` object that wraps the line list; any other body is
/// returned as is.
fn cart_body(body: &Value) -> &Value {
    let inner = unwrap_envelope(body);
    match inner.get(CART_OBJECT_KEY) {
        Some(cart @ Value::Object(obj))
            if CART_KEYS
                .lists
                .iter()
                .any(|key| obj.get(*key).is_some_and(Value::is_array)) =>
        {
            cart
        }
        _ => inner,
    }
}

fn item_path(id: &CartItemId) -> Endpoint {
    Endpoint::new("/cart/items").push(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_type: ProductType::Part,
            product_id: Some(ProductId::new(format!("p-{id}"))),
            quantity,
            name: format!("Part {id}"),
            price: Decimal::from(price),
            image: None,
        }
    }

    #[test]
    fn test_estimated_subtotal() {
        let state = CartState {
            items: vec![item("a", 10, 2), item("b", 5, 1)],
            ..CartState::default()
        };
        assert_eq!(state.estimated_subtotal(), Decimal::from(25));
        assert_eq!(state.unit_count(), 3);
        assert_eq!(
            state.display_totals(),
            CartTotals::Estimated {
                subtotal: Decimal::from(25)
            }
        );
    }

    #[test]
    fn test_display_totals_prefers_summary() {
        let summary = CartSummary {
            subtotal: Decimal::from(25),
            discount: Decimal::from(5),
            shipping_cost: None,
            total: Decimal::from(20),
            points_earned: Some(20),
        };
        let state = CartState {
            items: vec![item("a", 10, 2), item("b", 5, 1)],
            summary: Some(summary.clone()),
            ..CartState::default()
        };
        assert_eq!(state.display_totals(), CartTotals::Confirmed(summary));
    }

    #[test]
    fn test_upsert_replaces_by_id_and_drops_summary() {
        let mut state = CartState {
            items: vec![item("a", 10, 1)],
            summary: Some(CartSummary::default()),
            ..CartState::default()
        };
        state.reduce(CartAction::ItemUpserted(item("a", 10, 4).into()));
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].quantity, 4);
        assert!(state.summary.is_none());

        state.reduce(CartAction::ItemUpserted(item("b", 3, 1).into()));
        assert_eq!(state.items.len(), 2);
    }

    #[test]
    fn test_partial_upsert_merges_into_existing_line() {
        let mut state = CartState {
            items: vec![item("a", 40, 1)],
            ..CartState::default()
        };
        let update: CartItemUpdate =
            serde_json::from_value(json!({"id": "a", "quantity": 3})).unwrap();
        state.reduce(CartAction::ItemUpserted(update));

        assert_eq!(state.items[0].name, "Part a");
        assert_eq!(state.items[0].price, Decimal::from(40));
        assert_eq!(state.items[0].quantity, 3);
        assert_eq!(state.estimated_subtotal(), Decimal::from(120));
    }

    #[test]
    fn test_partial_upsert_of_unknown_line_is_skipped() {
        let mut state = CartState::default();
        let update: CartItemUpdate =
            serde_json::from_value(json!({"id": "z", "quantity": 2})).unwrap();
        state.reduce(CartAction::ItemUpserted(update));
        assert!(state.items.is_empty());
        assert!(!state.request.is_loading);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut state = CartState {
            items: vec![item("a", 10, 1), item("b", 3, 1)],
            ..CartState::default()
        };
        state.reduce(CartAction::ItemRemoved(CartItemId::new("a")));
        state.reduce(CartAction::ItemRemoved(CartItemId::new("a")));
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].id, CartItemId::new("b"));
    }

    #[test]
    fn test_rejected_keeps_items() {
        let mut state = CartState {
            items: vec![item("a", 10, 1)],
            ..CartState::default()
        };
        state.reduce(CartAction::Pending);
        state.reduce(CartAction::Rejected("Out of stock".to_string()));
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.request.error.as_deref(), Some("Out of stock"));
        assert!(!state.request.is_loading);
    }

    #[test]
    fn test_cart_write_shapes() {
        let whole = CartWrite::from_body(&json!({"cart_items": [{"id": 1}, {"id": 2}]}), "t");
        assert!(matches!(whole, CartWrite::Cart(ref items) if items.len() == 2));

        let one = CartWrite::from_body(&json!({"item": {"id": 1, "quantity": 2}}), "t");
        assert!(matches!(one, CartWrite::Item(ref item) if item.quantity == Some(2)));

        let bare = CartWrite::from_body(&json!({"id": "c9"}), "t");
        assert!(matches!(bare, CartWrite::Item(_)));

        let keyed = CartWrite::from_body(&json!({"cart": [{"id": 1}]}), "t");
        assert!(matches!(keyed, CartWrite::Cart(ref items) if items.len() == 1));

        let nested = CartWrite::from_body(
            &json!({"cart": {"id": "k1", "items": [{"id": 1}, {"id": 2}]}}),
            "t",
        );
        assert!(matches!(nested, CartWrite::Cart(ref items) if items.len() == 2));

        let neither = CartWrite::from_body(&json!({"success": true}), "t");
        assert!(matches!(neither, CartWrite::Unrecognized));
    }
}
