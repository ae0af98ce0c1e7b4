//! CLI command implementations.

pub mod auth;
pub mod cart;
pub mod catalog;

use std::io;

use thiserror::Error;

use qkart_storefront::{
    ApiClient, CartState, Notification, SessionPersistence, SessionStore, StorefrontConfig,
    StorefrontError,
};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    /// Reading from the terminal failed.
    #[error("Could not read input: {0}")]
    Input(#[from] io::Error),
}

impl CliError {
    /// The notification to print for this error.
    pub fn notification(&self) -> Notification {
        match self {
            Self::Storefront(e) => e.notification(),
            Self::Input(_) => Notification::error(self.to_string()),
        }
    }
}

/// Everything a command needs: configuration, backend client, the
/// persisted session and the cached cart.
pub struct Context {
    pub config: StorefrontConfig,
    pub client: ApiClient,
    pub session: SessionStore,
    pub cart: CartState,
}

impl Context {
    /// Build the context, restoring the session from disk.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Session` if the session file exists but
    /// cannot be read.
    pub fn new(config: StorefrontConfig) -> Result<Self, StorefrontError> {
        let session = SessionStore::load(SessionPersistence::File(config.session_file.clone()))?;
        let client = ApiClient::new(&config);
        let cart = CartState::new(client.clone());

        Ok(Self {
            config,
            client,
            session,
            cart,
        })
    }
}

/// Print a notification on stdout.
pub fn notify(notification: &Notification) {
    println!("{notification}");
}
