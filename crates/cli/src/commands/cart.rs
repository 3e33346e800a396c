//! Cart commands.

use motoparts_core::{CartItemId, ProductId, ProductType};
use motoparts_storefront::AppState;
use motoparts_storefront::models::{CartSummary, CartTotals};

use super::{CliError, money};

fn print_summary(summary: &CartSummary) {
    println!("  subtotal: {}", money(summary.subtotal));
    if !summary.discount.is_zero() {
        println!("  discount: -{}", money(summary.discount));
    }
    match summary.shipping_cost {
        Some(shipping) => println!("  shipping: {}", money(shipping)),
        None => println!("  shipping: calculated at checkout"),
    }
    println!("  total:    {}", money(summary.total));
    if let Some(points) = summary.points_earned {
        println!("  earns {points} points");
    }
}

async fn print_cart(state: &AppState) {
    let cart = state.cart().snapshot().await;
    if cart.items.is_empty() {
        println!("Cart is empty");
        return;
    }

    for item in &cart.items {
        println!(
            "{:>6}  {:<40} {:>3} x {:>10} = {:>10}",
            item.id,
            item.name,
            item.quantity,
            money(item.price),
            money(item.line_total())
        );
    }

    match cart.display_totals() {
        CartTotals::Confirmed(summary) => print_summary(&summary),
        CartTotals::Estimated { subtotal } => {
            println!("  estimated subtotal: {}", money(subtotal));
            println!("  (run `mp-cli cart summary` for discounts and shipping)");
        }
    }
}

/// Show cart lines and totals.
pub async fn show(state: &AppState) -> Result<(), CliError> {
    state.cart().fetch_cart().await?;
    print_cart(state).await;
    Ok(())
}

/// Add a product.
pub async fn add(
    state: &AppState,
    product_type: ProductType,
    product_id: String,
    quantity: u32,
) -> Result<(), CliError> {
    state
        .cart()
        .add_to_cart(product_type, &ProductId::new(product_id), quantity)
        .await?;
    print_cart(state).await;
    Ok(())
}

/// Change a line's quantity.
pub async fn update(state: &AppState, id: String, quantity: u32) -> Result<(), CliError> {
    state
        .cart()
        .update_cart_item(&CartItemId::new(id), quantity)
        .await?;
    print_cart(state).await;
    Ok(())
}

/// Remove a line.
pub async fn remove(state: &AppState, id: String) -> Result<(), CliError> {
    state.cart().remove_from_cart(&CartItemId::new(id)).await?;
    print_cart(state).await;
    Ok(())
}

/// Empty the cart.
pub async fn clear(state: &AppState) -> Result<(), CliError> {
    state.cart().clear_cart().await?;
    println!("Cart cleared");
    Ok(())
}

/// Fetch authoritative totals.
pub async fn summary(state: &AppState) -> Result<(), CliError> {
    let summary = state
        .cart()
        .fetch_checkout_summary()
        .await?
        .ok_or(CliError::NotFound("Cart summary"))?;
    print_summary(&summary);
    Ok(())
}
