//! Order commands.

use motoparts_core::{AddressId, OrderId};
use motoparts_storefront::AppState;
use motoparts_storefront::models::Order;
use motoparts_storefront::store::CheckoutInput;

use super::{CliError, field, money};

fn print_order_line(order: &Order) {
    let number = order.order_number.as_deref().unwrap_or(order.id.as_str());
    let placed = order
        .created_at
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    println!(
        "{number:>10}  {placed:<10}  {:<10} {:>10}",
        order.status,
        money(order.total)
    );
}

fn print_order(order: &Order) {
    print_order_line(order);
    for item in &order.items {
        println!(
            "    {:>3} x {:<40} {:>10}",
            item.quantity,
            item.name,
            money(item.price)
        );
    }
    field("payment", order.payment_status.as_deref());
    field("tracking", order.tracking_number.as_deref());
    if order.can_cancel() {
        println!("  can be cancelled");
    }
}

/// List past orders.
pub async fn list(state: &AppState) -> Result<(), CliError> {
    let orders = state.orders().fetch_orders().await?;
    if orders.is_empty() {
        println!("No orders yet");
    }
    for order in &orders {
        print_order_line(order);
    }
    Ok(())
}

/// Show one order.
pub async fn show(state: &AppState, id: String) -> Result<(), CliError> {
    let order = state
        .orders()
        .fetch_order(&OrderId::new(id))
        .await?
        .ok_or(CliError::NotFound("Order"))?;
    print_order(&order);
    Ok(())
}

/// Show shipment tracking.
pub async fn track(state: &AppState, id: String) -> Result<(), CliError> {
    let tracking = state
        .orders()
        .fetch_tracking(&OrderId::new(id))
        .await?
        .ok_or(CliError::NotFound("Tracking"))?;

    println!("Status: {}", tracking.status);
    field("carrier", tracking.carrier.as_deref());
    field("tracking number", tracking.tracking_number.as_deref());
    field("estimated delivery", tracking.estimated_delivery.as_deref());
    for event in &tracking.events {
        let at = event.timestamp.as_deref().unwrap_or_default();
        let location = event.location.as_deref().unwrap_or_default();
        println!("  {at:<20} {:<12} {location}", event.status);
    }
    Ok(())
}

/// Request cancellation.
pub async fn cancel(state: &AppState, id: String) -> Result<(), CliError> {
    let id = OrderId::new(id);
    state.orders().cancel_order(&id).await?;
    println!("Order {id} cancelled");
    Ok(())
}

/// Place an order for the current cart.
pub async fn checkout(
    state: &AppState,
    address_id: String,
    payment_method: String,
    notes: Option<String>,
) -> Result<(), CliError> {
    let input = CheckoutInput {
        shipping_address_id: AddressId::new(address_id),
        payment_method,
        notes,
    };
    let receipt = state.checkout(&input).await?;

    if let Some(summary) = &receipt.summary {
        println!("Charged {}", money(summary.total));
    }
    match &receipt.order {
        Some(order) => print_order(order),
        None => println!("Order placed"),
    }
    Ok(())
}
