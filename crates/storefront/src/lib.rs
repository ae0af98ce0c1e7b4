//! QKart storefront client library.
//!
//! Talks to the QKart backend and holds the client-side state a front end
//! needs: the login session, a cached copy of the cart, and the catalog
//! view driven by debounced search.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod config;
pub mod error;
pub mod notification;
pub mod search;
pub mod session;

pub use api::{ApiClient, ApiError};
pub use auth::AuthService;
pub use cart::{CartBackend, CartState, MutateOptions};
pub use config::{ConfigError, StorefrontConfig};
pub use error::{Result, StorefrontError};
pub use notification::{Notification, Severity};
pub use search::{CatalogSource, CatalogView, SearchDispatcher};
pub use session::{Session, SessionError, SessionPersistence, SessionStore};
