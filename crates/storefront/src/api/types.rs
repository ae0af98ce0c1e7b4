//! Request and response bodies for the QKart backend.
//!
//! Catalog and cart records come from `qkart_core`; this module holds the
//! envelopes around them.

use serde::{Deserialize, Serialize};

use qkart_core::ProductId;

/// Body for `POST /auth/login` and `POST /auth/register`.
#[derive(Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful `POST /auth/login` response.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    pub token: String,
    pub username: String,
    pub balance: u64,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("success", &self.success)
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .field("balance", &self.balance)
            .finish()
    }
}

/// Successful `POST /auth/register` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub success: bool,
}

/// Body for `POST /cart`.
#[derive(Debug, Serialize)]
pub struct CartUpsert<'a> {
    #[serde(rename = "productId")]
    pub product_id: &'a ProductId,
    pub qty: u32,
}

/// Error body returned with 4xx/5xx responses: `{success: false, message}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
}
