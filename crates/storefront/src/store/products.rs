//! Catalog store: categories, manufacturers, bike models, parts and merch.

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::instrument;

use motoparts_core::{CategoryId, ManufacturerId, ModelId, ProductId, ProductType};

use crate::api::decode::{ShapeKeys, decode_item, decode_list, decode_value, unwrap_envelope};
use crate::api::{ApiClient, ApiError, Endpoint};
use crate::models::{BikeModel, Category, Manufacturer, Pagination, Product};

use super::{Reducer, RequestStatus, Store};

const CATEGORY_KEYS: ShapeKeys = ShapeKeys::lists(&["categories", "items"]);
const MANUFACTURER_KEYS: ShapeKeys = ShapeKeys::lists(&["manufacturers", "items"]);
const MODEL_KEYS: ShapeKeys = ShapeKeys::both(&["models", "items"], &["model"]);
const PART_KEYS: ShapeKeys = ShapeKeys::both(&["parts", "products", "items"], &["part", "product"]);
const MERCH_KEYS: ShapeKeys = ShapeKeys::both(&["merch", "products", "items"], &["merch", "product"]);

/// Catalog slice. Every list is always present, possibly empty.
#[derive(Debug, Clone, Default)]
pub struct ProductsState {
    pub categories: Vec<Category>,
    pub manufacturers: Vec<Manufacturer>,
    pub models: Vec<BikeModel>,
    /// Results of the last part search or merch listing.
    pub products: Vec<Product>,
    pub current_product: Option<Product>,
    pub current_model: Option<BikeModel>,
    pub pagination: Option<Pagination>,
    pub request: RequestStatus,
}

/// Actions understood by [`ProductsState`].
#[derive(Debug)]
pub enum ProductsAction {
    Pending,
    Rejected(String),
    CategoriesLoaded(Vec<Category>),
    ManufacturersLoaded(Vec<Manufacturer>),
    ModelsLoaded(Vec<BikeModel>),
    ModelLoaded(Option<BikeModel>),
    ProductsLoaded {
        products: Vec<Product>,
        pagination: Option<Pagination>,
    },
    ProductLoaded(Option<Product>),
}

impl Reducer for ProductsState {
    type Action = ProductsAction;

    fn pending() -> Self::Action {
        ProductsAction::Pending
    }

    fn rejected(message: String) -> Self::Action {
        ProductsAction::Rejected(message)
    }

    fn reduce(&mut self, action: Self::Action) {
        match action {
            ProductsAction::Pending => self.request.start(),
            ProductsAction::Rejected(message) => self.request.fail(message),
            ProductsAction::CategoriesLoaded(categories) => {
                self.categories = categories;
                self.request.succeed();
            }
            ProductsAction::ManufacturersLoaded(manufacturers) => {
                self.manufacturers = manufacturers;
                self.request.succeed();
            }
            ProductsAction::ModelsLoaded(models) => {
                self.models = models;
                self.request.succeed();
            }
            ProductsAction::ModelLoaded(model) => {
                self.current_model = model;
                self.request.succeed();
            }
            ProductsAction::ProductsLoaded {
                products,
                pagination,
            } => {
                self.products = products;
                self.pagination = pagination;
                self.request.succeed();
            }
            ProductsAction::ProductLoaded(product) => {
                self.current_product = product;
                self.request.succeed();
            }
        }
    }
}

/// Part search filters. Unset fields are omitted from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartFilter {
    pub category_id: Option<CategoryId>,
    pub manufacturer_id: Option<ManufacturerId>,
    pub model_id: Option<ModelId>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Server sort key (`price_asc`, `price_desc`, `newest`).
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PartFilter {
    /// Query parameters for `GET /parts`.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(id) = &self.category_id {
            query.push(("category_id", id.to_string()));
        }
        if let Some(id) = &self.manufacturer_id {
            query.push(("manufacturer_id", id.to_string()));
        }
        if let Some(id) = &self.model_id {
            query.push(("model_id", id.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        if let Some(min) = self.min_price {
            query.push(("min_price", min.normalize().to_string()));
        }
        if let Some(max) = self.max_price {
            query.push(("max_price", max.normalize().to_string()));
        }
        if let Some(sort) = &self.sort {
            query.push(("sort", sort.clone()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

/// Pagination from a listing body: a nested `pagination` object, or
/// `page`/`total` fields next to the list.
fn decode_pagination(body: &Value) -> Option<Pagination> {
    let inner = unwrap_envelope(body);
    if let Some(nested) = inner.get("pagination") {
        return decode_value(nested, "products.pagination");
    }
    let obj = inner.as_object()?;
    if ["page", "total", "total_pages", "totalPages"]
        .iter()
        .any(|key| obj.contains_key(*key))
    {
        decode_value(inner, "products.pagination")
    } else {
        None
    }
}

// =============================================================================
// ProductsStore
// =============================================================================

/// Catalog triggers.
#[derive(Clone)]
pub struct ProductsStore {
    api: ApiClient,
    store: Store<ProductsState>,
}

impl ProductsStore {
    /// Create an empty catalog store.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: Store::new(ProductsState::default()),
        }
    }

    /// The underlying state container.
    #[must_use]
    pub const fn store(&self) -> &Store<ProductsState> {
        &self.store
    }

    /// Clone of the current state.
    pub async fn snapshot(&self) -> ProductsState {
        self.store.snapshot().await
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api.get("/categories").await?;
            Ok(decode_list::<Category>(&body, CATEGORY_KEYS, "products.categories"))
        };
        self.store
            .run("products.categories", request, |list| {
                ProductsAction::CategoriesLoaded(list.clone())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn fetch_manufacturers(&self) -> Result<Vec<Manufacturer>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api.get("/manufacturers").await?;
            Ok(decode_list::<Manufacturer>(
                &body,
                MANUFACTURER_KEYS,
                "products.manufacturers",
            ))
        };
        self.store
            .run("products.manufacturers", request, |list| {
                ProductsAction::ManufacturersLoaded(list.clone())
            })
            .await
    }

    /// Bike models, optionally narrowed to one manufacturer.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all)]
    pub async fn fetch_models(
        &self,
        manufacturer_id: Option<&ManufacturerId>,
    ) -> Result<Vec<BikeModel>, ApiError> {
        let api = &self.api;
        let query: Vec<(&str, String)> = manufacturer_id
            .map(|id| ("manufacturer_id", id.to_string()))
            .into_iter()
            .collect();
        let request = async {
            let body = api.get_with_query("/models", &query).await?;
            Ok(decode_list::<BikeModel>(&body, MODEL_KEYS, "products.models"))
        };
        self.store
            .run("products.models", request, |list| {
                ProductsAction::ModelsLoaded(list.clone())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn fetch_model(&self, id: &ModelId) -> Result<Option<BikeModel>, ApiError> {
        let api = &self.api;
        let endpoint = Endpoint::new("/models").push(id);
        let request = async {
            let body = api.get(&endpoint).await?;
            Ok(decode_item::<BikeModel>(&body, MODEL_KEYS, "products.model"))
        };
        self.store
            .run("products.model", request, |model| {
                ProductsAction::ModelLoaded(model.clone())
            })
            .await
    }

    /// Search parts with filters and pagination.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn search_parts(&self, filter: &PartFilter) -> Result<Vec<Product>, ApiError> {
        let api = &self.api;
        let query = filter.to_query();
        let request = async {
            let body = api.get_with_query("/parts", &query).await?;
            Ok((
                decode_list::<Product>(&body, PART_KEYS, "products.parts"),
                decode_pagination(&body),
            ))
        };
        self.store
            .run("products.parts", request, |(products, pagination)| {
                ProductsAction::ProductsLoaded {
                    products: products.clone(),
                    pagination: *pagination,
                }
            })
            .await
            .map(|(products, _)| products)
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn fetch_part(&self, id: &ProductId) -> Result<Option<Product>, ApiError> {
        self.fetch_product(
            Endpoint::new("/parts").push(id),
            PART_KEYS,
            ProductType::Part,
            "products.part",
        )
        .await
    }

    /// Merchandise listing.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn fetch_merch(&self) -> Result<Vec<Product>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api.get("/merch").await?;
            let mut products = decode_list::<Product>(&body, MERCH_KEYS, "products.merch");
            for product in &mut products {
                product.product_type = ProductType::Merch;
            }
            Ok((products, decode_pagination(&body)))
        };
        self.store
            .run("products.merch", request, |(products, pagination)| {
                ProductsAction::ProductsLoaded {
                    products: products.clone(),
                    pagination: *pagination,
                }
            })
            .await
            .map(|(products, _)| products)
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn fetch_merch_item(&self, id: &ProductId) -> Result<Option<Product>, ApiError> {
        self.fetch_product(
            Endpoint::new("/merch").push(id),
            MERCH_KEYS,
            ProductType::Merch,
            "products.merch_item",
        )
        .await
    }

    async fn fetch_product(
        &self,
        endpoint: Endpoint,
        keys: ShapeKeys,
        product_type: ProductType,
        operation: &'static str,
    ) -> Result<Option<Product>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api.get(&endpoint).await?;
            Ok(decode_item::<Product>(&body, keys, operation).map(|mut product| {
                product.product_type = product_type;
                product
            }))
        };
        self.store
            .run(operation, request, |product| {
                ProductsAction::ProductLoaded(product.clone())
            })
            .await
    }
}
