//! Domain stores.
//!
//! # Architecture
//!
//! Each domain (auth, cart, user, products, orders) owns one state slice and
//! one action enum. The slice's `reduce` is a pure function over its own
//! fields; the only shared part is the [`RequestStatus`] pair every slice
//! embeds. Request triggers live on the domain store types and follow one
//! cycle, implemented once in [`Store::run`]:
//!
//! ```text
//! idle --dispatch--> pending (is_loading = true, error = None)
//!                      |--> fulfilled (is_loading = false, kind-specific fields updated)
//!                      `--> rejected  (is_loading = false, error = message, data untouched)
//! ```
//!
//! Triggers may overlap. A second request simply restarts the observable
//! loading state; nothing is de-duplicated or cancelled.

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod user;

pub use auth::{AuthAction, AuthState, AuthStore, RegisterInput, RegisterOutcome};
pub use cart::{CartAction, CartState, CartStore};
pub use orders::{CheckoutInput, OrdersAction, OrdersState, OrdersStore};
pub use products::{PartFilter, ProductsAction, ProductsState, ProductsStore};
pub use user::{DefaultAddressOutcome, ProfileInput, UserAction, UserState, UserStore};

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::api::ApiError;

/// Loading and error flags carried by every slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestStatus {
    /// True strictly between dispatch and resolution of a request.
    pub is_loading: bool,
    /// Message of the most recent failure, cleared on the next dispatch.
    pub error: Option<String>,
}

impl RequestStatus {
    /// A request was dispatched.
    pub fn start(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    /// The request resolved successfully.
    pub const fn succeed(&mut self) {
        self.is_loading = false;
    }

    /// The request failed.
    pub fn fail(&mut self, message: String) {
        self.is_loading = false;
        self.error = Some(message);
    }
}

/// A state slice with a pure reducer.
pub trait Reducer: Clone + Send + Sync + 'static {
    /// Actions this slice understands.
    type Action: Send;

    /// The action dispatched when any request starts.
    fn pending() -> Self::Action;

    /// The action dispatched when any request fails.
    fn rejected(message: String) -> Self::Action;

    /// Apply an action.
    fn reduce(&mut self, action: Self::Action);
}

/// Shared, lockable container for one slice.
pub struct Store<S> {
    state: Arc<RwLock<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: Reducer> Store<S> {
    /// Wrap an initial state.
    #[must_use]
    pub fn new(initial: S) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
        }
    }

    /// Apply one action.
    pub async fn dispatch(&self, action: S::Action) {
        self.state.write().await.reduce(action);
    }

    /// Clone of the current state.
    pub async fn snapshot(&self) -> S {
        self.state.read().await.clone()
    }

    /// Read part of the state without cloning the whole slice.
    pub async fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&*self.state.read().await)
    }

    /// Run one request through the pending/fulfilled/rejected cycle.
    ///
    /// `fulfilled` maps the successful value to the action that closes the
    /// cycle; it must clear `is_loading`.
    ///
    /// # Errors
    ///
    /// Returns the request's `ApiError` after recording it in the slice.
    pub async fn run<T, Fut>(
        &self,
        operation: &'static str,
        request: Fut,
        fulfilled: impl FnOnce(&T) -> S::Action,
    ) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        debug!(operation, "Dispatching request");
        self.dispatch(S::pending()).await;

        match request.await {
            Ok(value) => {
                self.dispatch(fulfilled(&value)).await;
                Ok(value)
            }
            Err(err) => {
                warn!(operation, error = %err, "Request rejected");
                self.dispatch(S::rejected(err.to_string())).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Counter {
        value: u32,
        request: RequestStatus,
    }

    enum CounterAction {
        Pending,
        Rejected(String),
        Set(u32),
    }

    impl Reducer for Counter {
        type Action = CounterAction;

        fn pending() -> Self::Action {
            CounterAction::Pending
        }

        fn rejected(message: String) -> Self::Action {
            CounterAction::Rejected(message)
        }

        fn reduce(&mut self, action: Self::Action) {
            match action {
                CounterAction::Pending => self.request.start(),
                CounterAction::Rejected(message) => self.request.fail(message),
                CounterAction::Set(value) => {
                    self.value = value;
                    self.request.succeed();
                }
            }
        }
    }

    #[tokio::test]
    async fn test_run_success_clears_loading() {
        let store = Store::new(Counter::default());
        let result = store
            .run("set", async { Ok::<_, ApiError>(5) }, |v| CounterAction::Set(*v))
            .await;

        assert_eq!(result, Ok(5));
        let state = store.snapshot().await;
        assert_eq!(state.value, 5);
        assert!(!state.request.is_loading);
        assert!(state.request.error.is_none());
    }

    #[tokio::test]
    async fn test_run_failure_keeps_data() {
        let store = Store::new(Counter {
            value: 3,
            request: RequestStatus {
                is_loading: false,
                error: Some("stale".to_string()),
            },
        });

        let result = store
            .run(
                "set",
                async { Err::<u32, _>(ApiError::Network) },
                |v| CounterAction::Set(*v),
            )
            .await;

        assert_eq!(result, Err(ApiError::Network));
        let state = store.snapshot().await;
        assert_eq!(state.value, 3);
        assert!(!state.request.is_loading);
        assert_eq!(state.request.error.as_deref(), Some("Network error occurred"));
    }

    #[tokio::test]
    async fn test_loading_visible_while_in_flight() {
        let store = Store::new(Counter {
            value: 0,
            request: RequestStatus {
                is_loading: false,
                error: Some("previous".to_string()),
            },
        });
        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();

        let runner = store.clone();
        let handle = tokio::spawn(async move {
            runner
                .run(
                    "set",
                    async move { rx.await.map_err(|_| ApiError::Network) },
                    |v| CounterAction::Set(*v),
                )
                .await
        });

        // Wait for the pending action to land.
        while !store.read(|s| s.request.is_loading).await {
            tokio::task::yield_now().await;
        }
        assert!(store.read(|s| s.request.error.is_none()).await);

        tx.send(9).unwrap_or_default();
        let result = handle.await.unwrap_or(Err(ApiError::Network));
        assert_eq!(result, Ok(9));
        assert!(!store.read(|s| s.request.is_loading).await);
    }
}
