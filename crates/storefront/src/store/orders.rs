//! Orders store: history, checkout, cancellation and tracking.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument};

use motoparts_core::{AddressId, OrderId, OrderStatus};

use crate::api::decode::{
    ResponseShape, ShapeKeys, decode_item, decode_list, decode_object, decode_value,
};
use crate::api::{ApiClient, ApiError, Endpoint};
use crate::models::{Order, OrderTracking};

use super::{Reducer, RequestStatus, Store};

const ORDER_KEYS: ShapeKeys = ShapeKeys::both(&["orders", "items"], &["order"]);
const TRACKING_KEYS: ShapeKeys = ShapeKeys::items(&["tracking"]);

/// A cancel response replaces the local order only when it carries a status
/// and one of these.
const FULL_ORDER_FIELDS: [&str; 3] = ["items", "total_amount", "total"];

/// Orders slice.
#[derive(Debug, Clone, Default)]
pub struct OrdersState {
    /// Newest first, as returned by the server.
    pub orders: Vec<Order>,
    pub current_order: Option<Order>,
    pub tracking: Option<OrderTracking>,
    pub request: RequestStatus,
}

impl OrdersState {
    fn upsert(&mut self, order: &Order) {
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order.clone(),
            None => self.orders.insert(0, order.clone()),
        }
    }

    fn set_status(&mut self, id: &OrderId, status: &OrderStatus) {
        let current = self.current_order.iter_mut().filter(|o| &o.id == id);
        for order in self.orders.iter_mut().filter(|o| &o.id == id).chain(current) {
            order.status = status.clone();
        }
    }
}

/// Actions understood by [`OrdersState`].
#[derive(Debug)]
pub enum OrdersAction {
    Pending,
    Rejected(String),
    OrdersLoaded(Vec<Order>),
    OrderLoaded(Option<Order>),
    OrderCreated(Option<Order>),
    /// Cancellation accepted.
    ///
    /// `order` is the server's full copy when it sent one; otherwise only
    /// `status` is applied and the rest of the local order is kept.
    OrderCancelled {
        id: OrderId,
        status: OrderStatus,
        order: Option<Order>,
    },
    TrackingLoaded(Option<OrderTracking>),
    Reset,
}

impl Reducer for OrdersState {
    type Action = OrdersAction;

    fn pending() -> Self::Action {
        OrdersAction::Pending
    }

    fn rejected(message: String) -> Self::Action {
        OrdersAction::Rejected(message)
    }

    fn reduce(&mut self, action: Self::Action) {
        match action {
            OrdersAction::Pending => self.request.start(),
            OrdersAction::Rejected(message) => self.request.fail(message),
            OrdersAction::OrdersLoaded(orders) => {
                self.orders = orders;
                self.request.succeed();
            }
            OrdersAction::OrderLoaded(order) | OrdersAction::OrderCreated(order) => {
                if let Some(order) = &order {
                    self.upsert(order);
                }
                self.current_order = order;
                self.request.succeed();
            }
            OrdersAction::OrderCancelled { id, status, order } => {
                match order {
                    Some(order) => {
                        self.upsert(&order);
                        if self.current_order.as_ref().is_some_and(|o| o.id == id) {
                            self.current_order = Some(order);
                        }
                    }
                    None => self.set_status(&id, &status),
                }
                self.request.succeed();
            }
            OrdersAction::TrackingLoaded(tracking) => {
                self.tracking = tracking;
                self.request.succeed();
            }
            OrdersAction::Reset => *self = Self::default(),
        }
    }
}

/// Checkout details sent with `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutInput {
    pub shipping_address_id: AddressId,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// =============================================================================
// OrdersStore
// =============================================================================

/// Order triggers.
#[derive(Clone)]
pub struct OrdersStore {
    api: ApiClient,
    store: Store<OrdersState>,
}

impl OrdersStore {
    /// Create an empty orders store.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: Store::new(OrdersState::default()),
        }
    }

    /// The underlying state container.
    #[must_use]
    pub const fn store(&self) -> &Store<OrdersState> {
        &self.store
    }

    /// Clone of the current state.
    pub async fn snapshot(&self) -> OrdersState {
        self.store.snapshot().await
    }

    /// Drop all local order state without contacting the server.
    pub async fn reset_local(&self) {
        self.store.dispatch(OrdersAction::Reset).await;
    }

    /// Order history.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn fetch_orders(&self) -> Result<Vec<Order>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api.get("/orders").await?;
            Ok(decode_list::<Order>(&body, ORDER_KEYS, "orders.fetch"))
        };
        self.store
            .run("orders.fetch", request, |orders| {
                OrdersAction::OrdersLoaded(orders.clone())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, ApiError> {
        let api = &self.api;
        let endpoint = Endpoint::new("/orders").push(id);
        let request = async {
            let body = api.get(&endpoint).await?;
            Ok(decode_item::<Order>(&body, ORDER_KEYS, "orders.fetch_one"))
        };
        self.store
            .run("orders.fetch_one", request, |order| {
                OrdersAction::OrderLoaded(order.clone())
            })
            .await
    }

    /// Place an order from the server-side cart.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all, fields(shipping_address_id = %input.shipping_address_id))]
    pub async fn create_order(&self, input: &CheckoutInput) -> Result<Option<Order>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api
                .post("/orders", serde_json::to_value(input).unwrap_or_default())
                .await?;
            Ok(decode_item::<Order>(&body, ORDER_KEYS, "orders.create"))
        };
        let order = self
            .store
            .run("orders.create", request, |order| {
                OrdersAction::OrderCreated(order.clone())
            })
            .await?;

        if let Some(order) = &order {
            info!(order_id = %order.id, total = %order.total, "Order placed");
        }
        Ok(order)
    }

    /// Ask the server to cancel an order.
    ///
    /// Not gated on [`Order::can_cancel`]; the server decides.
    ///
    /// # Errors
    ///
    /// Returns the gateway error (for example an order that already shipped).
    #[instrument(skip_all, fields(id = %id))]
    pub async fn cancel_order(&self, id: &OrderId) -> Result<Option<Order>, ApiError> {
        let api = &self.api;
        let endpoint = Endpoint::new("/orders").push(id).push("cancel");
        let request = async {
            let body = api.post(&endpoint, json!({})).await?;
            Ok(cancellation(&body))
        };
        self.store
            .run("orders.cancel", request, |(status, order)| {
                OrdersAction::OrderCancelled {
                    id: id.clone(),
                    status: status.clone(),
                    order: order.clone(),
                }
            })
            .await
            .map(|(_, order)| order)
    }

    /// Shipment tracking for an order.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn fetch_tracking(&self, id: &OrderId) -> Result<Option<OrderTracking>, ApiError> {
        let api = &self.api;
        let endpoint = Endpoint::new("/orders").push(id).push("tracking");
        let request = async {
            let body = api.get(&endpoint).await?;
            Ok(decode_object::<OrderTracking>(&body, TRACKING_KEYS, "orders.tracking"))
        };
        self.store
            .run("orders.tracking", request, |tracking| {
                OrdersAction::TrackingLoaded(tracking.clone())
            })
            .await
    }
}

/// Read a cancel response: the reported status (`cancelled` when none was
/// sent) and the full order when the body is one.
fn cancellation(body: &Value) -> (OrderStatus, Option<Order>) {
    let record = ResponseShape::classify(body, ORDER_KEYS).as_item();
    let reported = record
        .and_then(|r| r.get("status"))
        .filter(|s| !s.is_null())
        .and_then(|s| OrderStatus::deserialize(s).ok());

    let order = record
        .filter(|r| reported.is_some() && FULL_ORDER_FIELDS.iter().any(|k| r.get(k).is_some()))
        .and_then(|r| decode_value::<Order>(r, "orders.cancel"));

    (reported.unwrap_or(OrderStatus::Cancelled), order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order(id: &str, status: &str) -> Order {
        serde_json::from_value(json!({"id": id, "status": status, "total": "10"})).unwrap()
    }

    #[test]
    fn test_cancel_without_body_marks_cancelled() {
        let mut state = OrdersState {
            orders: vec![order("o1", "placed"), order("o2", "shipped")],
            current_order: Some(order("o1", "placed")),
            ..OrdersState::default()
        };
        state.reduce(OrdersAction::OrderCancelled {
            id: OrderId::new("o1"),
            status: OrderStatus::Cancelled,
            order: None,
        });
        assert_eq!(state.orders[0].status, OrderStatus::Cancelled);
        assert_eq!(state.orders[1].status, OrderStatus::Shipped);
        assert_eq!(
            state.current_order.map(|o| o.status),
            Some(OrderStatus::Cancelled)
        );
    }

    #[test]
    fn test_cancel_with_body_uses_server_copy() {
        let mut state = OrdersState {
            orders: vec![order("o1", "placed")],
            ..OrdersState::default()
        };
        state.reduce(OrdersAction::OrderCancelled {
            id: OrderId::new("o1"),
            status: OrderStatus::Cancelled,
            order: Some(order("o1", "cancelled")),
        });
        assert_eq!(state.orders.len(), 1);
        assert!(!state.orders[0].can_cancel());
    }

    #[test]
    fn test_cancellation_reads_partial_bodies() {
        let (status, order) = cancellation(&json!({"id": "o1", "message": "Order cancelled"}));
        assert_eq!(status, OrderStatus::Cancelled);
        assert!(order.is_none());

        let (status, order) = cancellation(&json!({"order": {"id": "o1", "status": "cancel_requested"}}));
        assert_eq!(status, OrderStatus::Other("cancel_requested".to_string()));
        assert!(order.is_none());

        let (status, order) = cancellation(&json!({
            "id": "o1", "status": "cancelled", "total_amount": "50.00", "items": []
        }));
        assert_eq!(status, OrderStatus::Cancelled);
        assert_eq!(order.map(|o| o.total), Some(rust_decimal::Decimal::from(50)));

        let (status, order) = cancellation(&json!({"success": true}));
        assert_eq!(status, OrderStatus::Cancelled);
        assert!(order.is_none());
    }

    #[test]
    fn test_created_order_goes_first() {
        let mut state = OrdersState {
            orders: vec![order("o1", "delivered")],
            ..OrdersState::default()
        };
        state.reduce(OrdersAction::OrderCreated(Some(order("o2", "placed"))));
        assert_eq!(state.orders[0].id, OrderId::new("o2"));
        assert_eq!(state.current_order.map(|o| o.id), Some(OrderId::new("o2")));
    }

    #[test]
    fn test_checkout_input_serializes_without_empty_notes() {
        let input = CheckoutInput {
            shipping_address_id: AddressId::new("a1"),
            payment_method: "card".to_string(),
            notes: None,
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({"shipping_address_id": "a1", "payment_method": "card"})
        );
    }
}
