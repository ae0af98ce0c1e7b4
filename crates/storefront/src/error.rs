//! Unified error handling with Sentry integration.
//!
//! Every user action returns `Result<T, StorefrontError>`. Errors are
//! recovered at the call site and shown once via
//! [`StorefrontError::notification`]; none of them are retried.

use thiserror::Error;

use qkart_core::ValidationError;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::notification::Notification;
use crate::session::SessionError;

/// Generic message for auth calls when the backend is unreachable or
/// answers with something other than a 4xx JSON body.
pub const BACKEND_UNREACHABLE: &str =
    "Something went wrong. Check that the backend is running, reachable and returns valid JSON";

/// Shown when the full catalog cannot be loaded.
pub const CATALOG_UNAVAILABLE: &str =
    "Something went wrong. Check the backend console for more details";

/// Shown when the cart cannot be loaded for a reason other than a 400.
pub const CART_UNAVAILABLE: &str = "Could not fetch cart details. Check that the backend is running, reachable and returns valid JSON.";

/// Default text for a cart upsert against an unknown product.
pub const PRODUCT_NOT_FOUND: &str = "Product doesn't exist";

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Form input failed validation; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Cart action attempted without a session.
    #[error("Login to add an item to the Cart")]
    Unauthenticated,

    /// Item is already in the cart and the caller asked to prevent duplicates.
    #[error("Item already in cart. Use the cart sidebar to update quantity or remove item.")]
    DuplicateItem,

    /// Cart upsert referenced a product the backend does not know.
    #[error("{0}")]
    ProductNotFound(String),

    /// Backend rejected the request; message is the backend's own.
    #[error("{0}")]
    RemoteClient(String),

    /// Backend unreachable, returned invalid JSON, or failed with a non-4xx.
    #[error("{0}")]
    RemoteUnknown(String),

    /// Session could not be persisted or restored.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StorefrontError {
    /// Classify an API error.
    ///
    /// A 4xx with a JSON `message` becomes [`Self::RemoteClient`] carrying
    /// that message verbatim. Everything else becomes
    /// [`Self::RemoteUnknown`] with `unknown_message`.
    #[must_use]
    pub fn from_api(err: ApiError, unknown_message: &str) -> Self {
        match err {
            ApiError::Client {
                message: Some(message),
                ..
            } => Self::RemoteClient(message),
            other => {
                tracing::error!(error = %other, "Backend request failed");
                Self::RemoteUnknown(unknown_message.to_string())
            }
        }
    }

    /// Error for a failed full-catalog load.
    ///
    /// Always [`Self::RemoteUnknown`] with [`CATALOG_UNAVAILABLE`], whatever
    /// the backend said; its answer is only logged.
    #[must_use]
    pub fn catalog_unavailable(err: &ApiError) -> Self {
        tracing::error!(error = %err, "Catalog request failed");
        Self::RemoteUnknown(CATALOG_UNAVAILABLE.to_string())
    }

    /// The notification to show for this error.
    #[must_use]
    pub fn notification(&self) -> Notification {
        match self {
            Self::Validation(_) | Self::Unauthenticated | Self::DuplicateItem => {
                Notification::warning(self.to_string())
            }
            Self::ProductNotFound(_)
            | Self::RemoteClient(_)
            | Self::RemoteUnknown(_)
            | Self::Session(_)
            | Self::Config(_) => Notification::error(self.to_string()),
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context from a username.
///
/// Called after a successful login to associate errors with the user.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Called on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Updated cart item", Some(&[("product_id", "P1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Severity;

    #[test]
    fn test_warnings() {
        let notification = StorefrontError::Unauthenticated.notification();
        assert_eq!(notification.severity, Severity::Warning);
        assert_eq!(notification.message, "Login to add an item to the Cart");

        let notification = StorefrontError::DuplicateItem.notification();
        assert_eq!(notification.severity, Severity::Warning);
        assert_eq!(
            notification.message,
            "Item already in cart. Use the cart sidebar to update quantity or remove item."
        );

        let notification =
            StorefrontError::from(ValidationError::PasswordMismatch).notification();
        assert_eq!(notification, Notification::warning("Passwords do not match"));
    }

    #[test]
    fn test_from_api_uses_backend_message() {
        let err = StorefrontError::from_api(
            ApiError::Client {
                status: 400,
                message: Some("Password is incorrect".to_string()),
            },
            BACKEND_UNREACHABLE,
        );
        assert!(matches!(&err, StorefrontError::RemoteClient(m) if m == "Password is incorrect"));
        assert_eq!(err.notification(), Notification::error("Password is incorrect"));
    }

    #[test]
    fn test_from_api_without_message_is_unknown() {
        let err = StorefrontError::from_api(
            ApiError::Client {
                status: 400,
                message: None,
            },
            BACKEND_UNREACHABLE,
        );
        assert!(matches!(&err, StorefrontError::RemoteUnknown(m) if m == BACKEND_UNREACHABLE));
    }

    #[test]
    fn test_catalog_unavailable_ignores_backend_message() {
        let err = StorefrontError::catalog_unavailable(&ApiError::Client {
            status: 400,
            message: Some("Bad request".to_string()),
        });
        assert!(matches!(&err, StorefrontError::RemoteUnknown(m) if m == CATALOG_UNAVAILABLE));
    }

    #[test]
    fn test_from_api_server_error_is_unknown() {
        let err = StorefrontError::from_api(ApiError::Server { status: 500 }, CATALOG_UNAVAILABLE);
        assert_eq!(err.notification(), Notification::error(CATALOG_UNAVAILABLE));
    }
}
