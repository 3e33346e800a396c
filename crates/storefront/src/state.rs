//! Application state shared by every front end.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError, FileTokenStorage, TokenStorage};
use crate::config::{ApiConfig, StorefrontConfig};
use crate::images::resolve_image_url;
use crate::models::{Address, CartSummary, Order, User};
use crate::store::{AuthStore, CartStore, CheckoutInput, OrdersStore, ProductsStore, UserStore};

/// The gateway plus the five domain stores.
///
/// This struct is cheaply cloneable via `Arc`; every clone shares the same
/// stores and connection pool.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    api: ApiClient,
    auth: AuthStore,
    cart: CartStore,
    user: UserStore,
    products: ProductsStore,
    orders: OrdersStore,
}

/// Result of [`AppState::load_account`]; each part loads independently.
#[derive(Debug)]
pub struct AccountLoad {
    pub profile: Result<Option<User>, ApiError>,
    pub addresses: Result<Vec<Address>, ApiError>,
    pub orders: Result<Vec<Order>, ApiError>,
}

impl AccountLoad {
    /// Errors from the parts that failed.
    #[must_use]
    pub fn errors(&self) -> Vec<&ApiError> {
        [
            self.profile.as_ref().err(),
            self.addresses.as_ref().err(),
            self.orders.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    /// Totals the order was placed against.
    pub summary: Option<CartSummary>,
    /// The created order, when the server returned it.
    pub order: Option<Order>,
}

impl AppState {
    /// Create the state with an explicit token storage.
    #[must_use]
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenStorage>) -> Self {
        let api = ApiClient::new(config, tokens);

        Self {
            inner: Arc::new(AppStateInner {
                auth: AuthStore::new(api.clone()),
                cart: CartStore::new(api.clone()),
                user: UserStore::new(api.clone()),
                products: ProductsStore::new(api.clone()),
                orders: OrdersStore::new(api.clone()),
                api,
            }),
        }
    }

    /// Create the state with the token persisted in `config.token_file`.
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        let tokens = Arc::new(FileTokenStorage::new(&config.token_file));
        Self::new(&config.api, tokens)
    }

    /// Get a reference to the API gateway.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the authentication store.
    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the profile and address store.
    #[must_use]
    pub fn user(&self) -> &UserStore {
        &self.inner.user
    }

    /// Get a reference to the catalog store.
    #[must_use]
    pub fn products(&self) -> &ProductsStore {
        &self.inner.products
    }

    /// Get a reference to the orders store.
    #[must_use]
    pub fn orders(&self) -> &OrdersStore {
        &self.inner.orders
    }

    /// Resolve an image reference against the API origin.
    #[must_use]
    pub fn image_url(&self, raw: Option<&str>) -> String {
        resolve_image_url(self.inner.api.base_url(), raw)
    }

    /// Load profile, addresses and order history concurrently.
    #[instrument(skip(self))]
    pub async fn load_account(&self) -> AccountLoad {
        let (profile, addresses, orders) = tokio::join!(
            self.inner.user.fetch_profile(),
            self.inner.user.fetch_addresses(),
            self.inner.orders.fetch_orders(),
        );

        let load = AccountLoad {
            profile,
            addresses,
            orders,
        };
        let failed = load.errors().len();
        if failed > 0 {
            warn!(failed, "Account loaded with failures");
        }
        load
    }

    /// Fetch the authoritative totals, place the order and refresh the cart.
    ///
    /// # Errors
    ///
    /// Returns the error of the summary or order request. The cart is only
    /// touched after the order has been accepted.
    #[instrument(skip_all)]
    pub async fn checkout(&self, input: &CheckoutInput) -> Result<CheckoutReceipt, ApiError> {
        let summary = self.inner.cart.fetch_checkout_summary().await?;
        let order = self.inner.orders.create_order(input).await?;

        // The server empties the cart once the order exists.
        self.inner.cart.reset_local().await;
        if let Err(e) = self.inner.cart.fetch_cart().await {
            warn!(error = %e, "Cart refresh after checkout failed");
        }

        info!("Checkout complete");
        Ok(CheckoutReceipt { summary, order })
    }

    /// Log out and drop every customer-specific slice.
    pub async fn logout(&self) {
        self.inner.auth.logout().await;
        tokio::join!(
            self.inner.user.reset_local(),
            self.inner.cart.reset_local(),
            self.inner.orders.reset_local(),
        );
    }
}
