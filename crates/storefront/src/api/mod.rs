//! HTTP client for the QKart backend.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - The backend is source of truth - cart responses always carry the full cart
//! - The unfiltered catalog is cached in memory via `moka` (TTL from config)
//!
//! # Example
//!
//! ```rust,ignore
//! use qkart_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config);
//!
//! let products = client.products().await?;
//! let cart = client.upsert_cart_item(&token, &products[0].id, 1).await?;
//! ```

pub mod types;

use std::sync::Arc;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use qkart_core::{CartEntry, Product, ProductId};

use crate::config::StorefrontConfig;
use types::{CartUpsert, Credentials, ErrorBody, LoginResponse, RegisterResponse};

const PRODUCTS_CACHE_KEY: &str = "products";

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the request (4xx).
    #[error("Client error {status}: {}", .message.as_deref().unwrap_or("(no message)"))]
    Client {
        status: u16,
        /// The `message` field of the error body, if the body was JSON.
        message: Option<String>,
    },

    /// Backend failed to handle the request (any other non-success status).
    #[error("Server error {status}")]
    Server { status: u16 },

    /// Success response did not decode.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the backend answered with a 4xx status.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Client { .. })
    }

    /// HTTP status of the response, if one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } | Self::Server { status } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Parse(_) | Self::Url(_) => None,
        }
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the QKart backend API.
///
/// Cheap to clone; clones share the connection pool and catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    endpoint: Url,
    cache: Option<Cache<&'static str, Vec<Product>>>,
}

impl ApiClient {
    /// Create a new API client.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        let cache = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                endpoint: config.api_endpoint.clone(),
                cache,
            }),
        }
    }

    /// Base endpoint all paths are joined onto.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.endpoint.join(path)?)
    }

    /// Send a request and classify the response.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %truncate(&body, 500),
                    "Failed to parse backend response"
                );
                ApiError::Parse(e)
            });
        }

        if status.is_client_error() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            debug!(status = %status, message = ?message, "Backend rejected request");
            return Err(ApiError::Client {
                status: status.as_u16(),
                message,
            });
        }

        tracing::error!(
            status = %status,
            body = %truncate(&body, 500),
            "Backend returned non-success status"
        );
        Err(ApiError::Server {
            status: status.as_u16(),
        })
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Log in with a username and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` with the backend's message for bad
    /// credentials, or another variant if the backend is unreachable.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let request = self.inner.client.post(self.url("auth/login")?).json(&Credentials {
            username,
            password: password.expose_secret(),
        });
        self.execute(request).await
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` with the backend's message if the username
    /// is taken or rejected.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn register(&self, username: &str, password: &SecretString) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .post(self.url("auth/register")?)
            .json(&Credentials {
                username,
                password: password.expose_secret(),
            });
        let response: RegisterResponse = self.execute(request).await?;
        debug!(success = response.success, "Registration accepted");
        Ok(())
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the full product catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(cache) = &self.inner.cache
            && let Some(products) = cache.get(PRODUCTS_CACHE_KEY).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let request = self.inner.client.get(self.url("products")?);
        let products: Vec<Product> = self.execute(request).await?;
        debug!(count = products.len(), "Fetched products");

        if let Some(cache) = &self.inner.cache {
            cache.insert(PRODUCTS_CACHE_KEY, products.clone()).await;
        }

        Ok(products)
    }

    /// Search products by name or category.
    ///
    /// Search results are never cached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` when the backend reports no matches (4xx),
    /// or another variant if the request fails.
    #[instrument(skip(self), fields(value = %value))]
    pub async fn search(&self, value: &str) -> Result<Vec<Product>, ApiError> {
        let mut url = self.url("products/search")?;
        url.query_pairs_mut().append_pair("value", value);

        let products: Vec<Product> = self.execute(self.inner.client.get(url)).await?;
        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get the cart of the user owning `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the API request fails.
    #[instrument(skip(self, token))]
    pub async fn cart(&self, token: &SecretString) -> Result<Vec<CartEntry>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url("cart")?)
            .bearer_auth(token.expose_secret());
        self.execute(request).await
    }

    /// Set the quantity of a product in the cart and return the full,
    /// updated cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` with status 404 if the product does not
    /// exist, or another variant if the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id, qty = quantity))]
    pub async fn upsert_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Vec<CartEntry>, ApiError> {
        let request = self
            .inner
            .client
            .post(self.url("cart")?)
            .bearer_auth(token.expose_secret())
            .json(&CartUpsert {
                product_id,
                qty: quantity,
            });
        self.execute(request).await
    }
}

/// Truncate a response body for logging.
fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
