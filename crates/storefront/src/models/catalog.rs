//! Read-only catalog records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use motoparts_core::types::lenient;
use motoparts_core::{CategoryId, ManufacturerId, ModelId, ProductId, ProductType};

/// A part category ("Brakes", "Exhausts").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A motorcycle or parts manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: ManufacturerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// A bike model parts can be filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BikeModel {
    pub id: ModelId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub manufacturer_id: Option<ManufacturerId>,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub year_from: Option<u32>,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub year_to: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
}

impl BikeModel {
    /// Production years for display (`2018-2023`, `2018-`, or empty).
    #[must_use]
    pub fn years(&self) -> String {
        match (self.year_from, self.year_to) {
            (Some(from), Some(to)) if from == to => from.to_string(),
            (Some(from), Some(to)) => format!("{from}-{to}"),
            (Some(from), None) => format!("{from}-"),
            (None, Some(to)) => format!("-{to}"),
            (None, None) => String::new(),
        }
    }
}

/// A part or merch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub price: Decimal,
    #[serde(default)]
    pub sku: Option<String>,
    /// Units in stock; `None` when the server does not track stock.
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub stock: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub manufacturer_id: Option<ManufacturerId>,
    #[serde(default)]
    pub product_type: ProductType,
}

impl Product {
    /// Whether the product can be added to the cart.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|stock| stock > 0)
    }
}

/// Page position of a filtered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, deserialize_with = "lenient::count")]
    pub page: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub limit: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total: u32,
    #[serde(default, alias = "totalPages", deserialize_with = "lenient::count")]
    pub total_pages: u32,
}

impl Pagination {
    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_stock() {
        let product: Product =
            serde_json::from_value(json!({"id": 1, "price": "89.90", "stock": 0})).unwrap();
        assert!(!product.in_stock());
        assert_eq!(product.price, Decimal::new(8990, 2));

        let untracked: Product = serde_json::from_value(json!({"id": 2})).unwrap();
        assert!(untracked.in_stock());
    }

    #[test]
    fn test_model_years() {
        let model: BikeModel = serde_json::from_value(
            json!({"id": "m1", "name": "MT-07", "year_from": 2018, "year_to": "2023"}),
        )
        .unwrap();
        assert_eq!(model.years(), "2018-2023");
    }

    #[test]
    fn test_pagination_camel_case() {
        let page: Pagination =
            serde_json::from_value(json!({"page": 2, "totalPages": 5, "total": 97})).unwrap();
        assert_eq!(page.total_pages, 5);
        assert!(page.has_next());
    }
}
