//! Authentication service.
//!
//! Validates login and registration forms locally, then talks to the
//! backend. A form that fails validation never produces a request.

use secrecy::SecretString;
use tracing::{info, instrument};

use qkart_core::{LoginForm, RegistrationForm};

use crate::api::ApiClient;
use crate::error::{BACKEND_UNREACHABLE, Result, StorefrontError, add_breadcrumb};
use crate::session::{Session, SessionStore};

/// Shown after a successful login.
pub const LOGIN_SUCCESS: &str = "Logged in successfully";

/// Shown after a successful registration.
pub const REGISTER_SUCCESS: &str = "Registered successfully";

/// Authentication service.
///
/// Handles registration and login against the backend.
pub struct AuthService<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Log in and store the resulting session.
    ///
    /// The session records the username as submitted, along with the token
    /// and balance from the response.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Validation` if a field is empty,
    /// `StorefrontError::RemoteClient` with the backend's message if the
    /// credentials are rejected, `StorefrontError::RemoteUnknown` if the
    /// backend cannot be reached, or `StorefrontError::Session` if the
    /// session cannot be persisted.
    #[instrument(skip(self, form, store), fields(username = %form.username))]
    pub async fn login<'s>(
        &self,
        form: &LoginForm,
        store: &'s mut SessionStore,
    ) -> Result<&'s Session> {
        form.validate()?;

        let password = SecretString::from(form.password.clone());
        let response = self
            .client
            .login(&form.username, &password)
            .await
            .map_err(|e| StorefrontError::from_api(e, BACKEND_UNREACHABLE))?;

        add_breadcrumb("auth", "Logged in", None);
        let session = store.login(
            SecretString::from(response.token),
            form.username.clone(),
            response.balance,
        )?;
        Ok(session)
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Validation` for the first failing form
    /// rule, `StorefrontError::RemoteClient` with the backend's message if
    /// the username is rejected, or `StorefrontError::RemoteUnknown` if the
    /// backend cannot be reached.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<()> {
        form.validate()?;

        let password = SecretString::from(form.password.clone());
        self.client
            .register(&form.username, &password)
            .await
            .map_err(|e| StorefrontError::from_api(e, BACKEND_UNREACHABLE))?;

        info!("Registered");
        add_breadcrumb("auth", "Registered", None);
        Ok(())
    }

    /// Register, then log in with the same credentials.
    ///
    /// # Errors
    ///
    /// Returns the registration error if registration fails, otherwise any
    /// error from [`Self::login`].
    pub async fn register_and_login<'s>(
        &self,
        form: &RegistrationForm,
        store: &'s mut SessionStore,
    ) -> Result<&'s Session> {
        self.register(form).await?;
        self.login(&form.login_form(), store).await
    }
}
