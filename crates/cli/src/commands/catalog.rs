//! Catalog browsing commands.

use motoparts_core::{ManufacturerId, ModelId, ProductId};
use motoparts_storefront::AppState;
use motoparts_storefront::models::Product;
use motoparts_storefront::store::PartFilter;

use super::{CliError, field, money};

fn print_product_line(product: &Product) {
    let stock = match product.stock {
        Some(0) => " (out of stock)".to_string(),
        Some(n) => format!(" ({n} in stock)"),
        None => String::new(),
    };
    println!(
        "{:>6}  {:<40} {:>10}{stock}",
        product.id,
        product.name,
        money(product.price)
    );
}

fn print_product(state: &AppState, product: &Product) {
    println!("{} [{}]", product.name, product.product_type);
    field("id", Some(product.id.as_str()));
    field("sku", product.sku.as_deref());
    println!("  price: {}", money(product.price));
    if let Some(stock) = product.stock {
        println!("  stock: {stock}");
    }
    println!("  image: {}", state.image_url(product.image.as_deref()));
    field("description", product.description.as_deref());
}

/// List categories.
pub async fn categories(state: &AppState) -> Result<(), CliError> {
    for category in state.products().fetch_categories().await? {
        println!("{:>6}  {}", category.id, category.name);
    }
    Ok(())
}

/// List manufacturers.
pub async fn manufacturers(state: &AppState) -> Result<(), CliError> {
    for manufacturer in state.products().fetch_manufacturers().await? {
        let country = manufacturer.country.unwrap_or_default();
        println!("{:>6}  {:<30} {country}", manufacturer.id, manufacturer.name);
    }
    Ok(())
}

/// List bike models.
pub async fn models(state: &AppState, manufacturer: Option<String>) -> Result<(), CliError> {
    let manufacturer = manufacturer.map(ManufacturerId::new);
    for model in state.products().fetch_models(manufacturer.as_ref()).await? {
        println!("{:>6}  {:<30} {}", model.id, model.name, model.years());
    }
    Ok(())
}

/// Show one bike model.
pub async fn model(state: &AppState, id: String) -> Result<(), CliError> {
    let model = state
        .products()
        .fetch_model(&ModelId::new(id))
        .await?
        .ok_or(CliError::NotFound("Model"))?;
    println!("{} {}", model.name, model.years());
    field("id", Some(model.id.as_str()));
    println!("  image: {}", state.image_url(model.image.as_deref()));
    Ok(())
}

/// Search parts.
pub async fn parts(state: &AppState, filter: &PartFilter) -> Result<(), CliError> {
    let parts = state.products().search_parts(filter).await?;
    for part in &parts {
        print_product_line(part);
    }

    if let Some(page) = state.products().snapshot().await.pagination {
        println!(
            "page {} of {} ({} results)",
            page.page, page.total_pages, page.total
        );
    } else {
        println!("{} results", parts.len());
    }
    Ok(())
}

/// Show one part.
pub async fn part(state: &AppState, id: String) -> Result<(), CliError> {
    let part = state
        .products()
        .fetch_part(&ProductId::new(id))
        .await?
        .ok_or(CliError::NotFound("Part"))?;
    print_product(state, &part);
    Ok(())
}

/// List merchandise, or show one item.
pub async fn merch(state: &AppState, id: Option<String>) -> Result<(), CliError> {
    if let Some(id) = id {
        let item = state
            .products()
            .fetch_merch_item(&ProductId::new(id))
            .await?
            .ok_or(CliError::NotFound("Merch item"))?;
        print_product(state, &item);
        return Ok(());
    }

    for item in state.products().fetch_merch().await? {
        print_product_line(&item);
    }
    Ok(())
}
