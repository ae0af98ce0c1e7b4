//! Integration tests for the QKart storefront client.
//!
//! Each test starts a `wiremock` server standing in for the QKart backend
//! and drives the client against it. No real backend is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p qkart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_auth` - Login, registration and session persistence
//! - `storefront_cart` - Cart fetch and mutation policy
//! - `storefront_search` - Catalog, search and debouncing

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::MockServer;

use qkart_storefront::{ApiClient, SessionPersistence, SessionStore, StorefrontConfig};

/// Path prefix the client is pointed at on the mock server.
pub const API_PREFIX: &str = "/api/v1";

/// A mock backend plus a client configured to talk to it.
pub struct TestContext {
    pub server: MockServer,
    pub config: StorefrontConfig,
    pub client: ApiClient,
    /// Holds the session file; removed on drop.
    pub dir: tempfile::TempDir,
}

impl TestContext {
    /// Start a mock backend with default client settings.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start a mock backend, letting the caller adjust the configuration
    /// before the client is built.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created or the mock
    /// server URI is not a valid endpoint.
    pub async fn start_with(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("create temp dir");

        let mut config = StorefrontConfig::for_endpoint(&format!("{}{API_PREFIX}", server.uri()))
            .expect("mock server URI is a valid endpoint");
        config.session_file = dir.path().join("session.json");
        configure(&mut config);

        let client = ApiClient::new(&config);
        Self {
            server,
            config,
            client,
            dir,
        }
    }

    /// Full request path for an API path such as `"cart"`.
    #[must_use]
    pub fn path(api_path: &str) -> String {
        format!("{API_PREFIX}/{api_path}")
    }

    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.config.session_file.clone()
    }

    /// A file-backed, logged-out session store in this context's temp dir.
    ///
    /// # Panics
    ///
    /// Panics if the session file exists but cannot be read.
    #[must_use]
    pub fn session_store(&self) -> SessionStore {
        SessionStore::load(SessionPersistence::File(self.session_file())).expect("load session")
    }

    /// An in-memory session store already logged in with `token`.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory login fails, which it cannot.
    #[must_use]
    pub fn logged_in(token: &str) -> SessionStore {
        let mut store = SessionStore::in_memory();
        store
            .login(SecretString::from(token.to_string()), "criodo", 5000)
            .expect("in-memory login");
        store
    }
}

/// Backend JSON for one product.
#[must_use]
pub fn product_json(id: &str, name: &str, category: &str, cost: u64) -> Value {
    json!({
        "_id": id,
        "name": name,
        "category": category,
        "cost": cost,
        "rating": 4,
        "image": format!("https://crio-directus-assets.s3.ap-south-1.amazonaws.com/{id}.png"),
    })
}

/// A small catalog used across tests.
#[must_use]
pub fn catalog_json() -> Value {
    json!([
        product_json("BW0jAAeDJmlZCF8i", "Tan Leatherette Weekender Duffle", "Fashion", 150),
        product_json("KCRwjF7lN97HnEaY", "iPhone XR", "Phones", 800),
        product_json("upLK9JbQ4rMhTwt4", "YONEX Smash Badminton Racquet", "Sports", 100),
    ])
}

/// Backend JSON for a cart entry.
#[must_use]
pub fn cart_entry_json(product_id: &str, qty: u32) -> Value {
    json!({ "productId": product_id, "qty": qty })
}

/// Backend error body.
#[must_use]
pub fn error_json(message: &str) -> Value {
    json!({ "success": false, "message": message })
}

/// Upper bound for waiting on debounced work in real time.
pub const WAIT: Duration = Duration::from_secs(5);
