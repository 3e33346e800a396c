//! REST gateway for the Motoparts storefront API.
//!
//! # Architecture
//!
//! - One `reqwest::Client` shared by every store through [`ApiClient`]
//! - The server is the source of truth - NO local caching, direct API calls
//! - The bearer token is read from [`TokenStorage`] on every request, so a
//!   login performed by the auth store is picked up immediately
//!
//! # Contract
//!
//! [`ApiClient::request`] never panics and never leaks a transport error
//! type: every outcome is either the decoded JSON body or an [`ApiError`]
//! whose display text is safe to show to a customer.
//!
//! # Example
//!
//! ```rust,ignore
//! use motoparts_storefront::api::{ApiClient, MemoryTokenStorage};
//!
//! let client = ApiClient::new(&config.api, Arc::new(MemoryTokenStorage::new()));
//! let categories = client.get("/categories").await?;
//! ```

pub mod decode;
pub mod endpoint;
pub mod token;

pub use endpoint::Endpoint;
pub use token::{FileTokenStorage, MemoryTokenStorage, StorageError, TokenStorage};

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ApiConfig;

/// Message used for every transport or body-parsing failure.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error occurred";

/// Message used when the server fails without saying why.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Errors surfaced by the gateway.
///
/// The display text is the human-readable message stores put in their
/// `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a usable response (connection failure,
    /// truncated body, invalid JSON).
    #[error("Network error occurred")]
    Network,

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided `error`/`message` text, or a generic fallback.
        message: String,
    },

    /// A 2xx response lacked a field the operation cannot proceed without.
    #[error("Unexpected response from server")]
    IncompleteResponse {
        /// Operation that received the response.
        context: &'static str,
        /// The missing field.
        field: &'static str,
    },
}

impl ApiError {
    /// HTTP status for server errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Network | Self::IncompleteResponse { .. } => None,
            Self::Server { status, .. } => Some(*status),
        }
    }
}

/// Request payload.
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON body; sent with `Content-Type: application/json`.
    Json(Value),
    /// Multipart form; the transport sets its own boundary content type.
    Multipart(reqwest::multipart::Form),
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; all clones share one connection pool and token storage.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStorage>,
}

impl ApiClient {
    /// Create a new API client.
    #[must_use]
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenStorage>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                warn!(
                    error = %e,
                    user_agent = %config.user_agent,
                    "Failed to build HTTP client, falling back to defaults without the configured user agent"
                );
                reqwest::Client::new()
            });

        Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                tokens,
            }),
        }
    }

    /// Base URL endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Durable token storage shared with the auth store.
    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStorage> {
        &self.inner.tokens
    }

    /// Whether a bearer token is currently persisted.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner.tokens.load().is_some()
    }

    /// Send a request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` on transport or parse failure, and
    /// `ApiError::Server` for non-2xx responses.
    pub async fn request(
        &self,
        method: Method,
        endpoint: impl Into<Endpoint>,
        body: RequestBody,
    ) -> Result<Value, ApiError> {
        self.send(method, endpoint.into(), &[], body).await
    }

    /// `GET` an endpoint.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get(&self, endpoint: impl Into<Endpoint>) -> Result<Value, ApiError> {
        self.send(Method::GET, endpoint.into(), &[], RequestBody::Empty)
            .await
    }

    /// `GET` an endpoint with query parameters.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get_with_query(
        &self,
        endpoint: impl Into<Endpoint>,
        query: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        self.send(Method::GET, endpoint.into(), query, RequestBody::Empty)
            .await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post(&self, endpoint: impl Into<Endpoint>, body: Value) -> Result<Value, ApiError> {
        self.send(Method::POST, endpoint.into(), &[], RequestBody::Json(body))
            .await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put(&self, endpoint: impl Into<Endpoint>, body: Value) -> Result<Value, ApiError> {
        self.send(Method::PUT, endpoint.into(), &[], RequestBody::Json(body))
            .await
    }

    /// `DELETE` an endpoint.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, endpoint: impl Into<Endpoint>) -> Result<Value, ApiError> {
        self.send(Method::DELETE, endpoint.into(), &[], RequestBody::Empty)
            .await
    }

    /// `POST` a multipart form.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn upload(
        &self,
        endpoint: impl Into<Endpoint>,
        form: reqwest::multipart::Form,
    ) -> Result<Value, ApiError> {
        self.send(Method::POST, endpoint.into(), &[], RequestBody::Multipart(form))
            .await
    }

    #[instrument(skip_all, fields(method = %method, endpoint = %endpoint))]
    async fn send(
        &self,
        method: Method,
        endpoint: Endpoint,
        query: &[(&str, String)],
        body: RequestBody,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint_url(&endpoint, query)?;
        let mut builder = self.inner.client.request(method, url);

        if let Some(token) = self.inner.tokens.load() {
            builder = builder.bearer_auth(token.expose_secret());
        }

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder
                .header(CONTENT_TYPE, "application/json")
                .json(&value),
            // No explicit content type: reqwest writes multipart/form-data
            // with the generated boundary.
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Request failed before a response was received");
            ApiError::Network
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            warn!(error = %e, status = %status, "Failed to read response body");
            ApiError::Network
        })?;

        if !status.is_success() {
            let message = error_message(&text);
            warn!(status = %status, message = %message, "API returned non-success status");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            debug!(status = %status, "Empty response body");
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(
                error = %e,
                body = %text.chars().take(200).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Network
        })
    }

    fn endpoint_url(&self, endpoint: &Endpoint, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let Some(mut url) = endpoint.resolve(&self.inner.base_url) else {
            warn!(endpoint = %endpoint, base_url = %self.inner.base_url, "Base URL cannot carry a path");
            return Err(ApiError::Network);
        };

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        Ok(url)
    }
}

/// Extract the human-readable message from an error body.
///
/// Prefers `error`, then `message` (either may be nested one level as
/// `{ "error": { "message": ... } }`), then a generic fallback.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return GENERIC_ERROR_MESSAGE.to_string();
    };

    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(key))
        .find_map(|field| match field {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Object(obj) => obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}
