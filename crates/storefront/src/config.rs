//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `QKART_API_ENDPOINT` - Base URL of the backend API (e.g. `http://10.0.0.5:8082/api/v1`)
//!
//! ## Optional
//! - `QKART_SEARCH_DEBOUNCE_MS` - Search debounce delay in milliseconds (default: 500)
//! - `QKART_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime, 0 disables (default: 300)
//! - `QKART_SESSION_FILE` - Where the login session is persisted (default: .qkart/session.json)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_SEARCH_DEBOUNCE_MS: &str = "500";
const DEFAULT_CATALOG_CACHE_TTL_SECS: &str = "300";
const DEFAULT_SESSION_FILE: &str = ".qkart/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API base endpoint
    pub api_endpoint: Url,
    /// Delay between the last keystroke and the search request
    pub search_debounce: Duration,
    /// Lifetime of cached catalog responses (`Duration::ZERO` disables caching)
    pub catalog_cache_ttl: Duration,
    /// Path of the persisted session file
    pub session_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_endpoint = parse_endpoint(&get_required_env("QKART_API_ENDPOINT")?)?;
        let search_debounce = Duration::from_millis(parse_u64(
            "QKART_SEARCH_DEBOUNCE_MS",
            &get_env_or_default("QKART_SEARCH_DEBOUNCE_MS", DEFAULT_SEARCH_DEBOUNCE_MS),
        )?);
        let catalog_cache_ttl = Duration::from_secs(parse_u64(
            "QKART_CATALOG_CACHE_TTL_SECS",
            &get_env_or_default(
                "QKART_CATALOG_CACHE_TTL_SECS",
                DEFAULT_CATALOG_CACHE_TTL_SECS,
            ),
        )?);
        let session_file =
            PathBuf::from(get_env_or_default("QKART_SESSION_FILE", DEFAULT_SESSION_FILE));
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_endpoint,
            search_debounce,
            catalog_cache_ttl,
            session_file,
            sentry_dsn,
        })
    }

    /// Configuration pointing at `endpoint` with every optional setting at
    /// its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `endpoint` is not a valid
    /// base URL.
    pub fn for_endpoint(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_endpoint: parse_endpoint(endpoint)?,
            search_debounce: Duration::from_millis(500),
            catalog_cache_ttl: Duration::from_secs(300),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            sentry_dsn: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the API base endpoint.
///
/// A trailing slash is added when missing so that relative paths such as
/// `products/search` join underneath the endpoint instead of replacing its
/// last segment.
fn parse_endpoint(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("QKART_API_ENDPOINT".to_string(), reason);

    let mut url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("must be an absolute http(s) URL".to_string()));
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
