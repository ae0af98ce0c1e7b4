//! Login and registration form input.
//!
//! Validation runs before any request is made, so a rejected form never
//! reaches the backend.

use core::fmt;

/// Errors that can occur when validating a login or registration form.
///
/// The `Display` text is shown to the user as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The username field is empty.
    #[error("Username is a required field")]
    UsernameRequired,
    /// The password field is empty.
    #[error("Password is a required field")]
    PasswordRequired,
    /// The username is shorter than the registration minimum.
    #[error("Username must be at least {min} characters")]
    UsernameTooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The password is shorter than the registration minimum.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Credentials entered on the login form.
///
/// `Debug` redacts the password.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    /// Create a login form.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check that both fields are filled in.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: username empty, then password empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.is_empty() {
            return Err(ValidationError::UsernameRequired);
        }
        if self.password.is_empty() {
            return Err(ValidationError::PasswordRequired);
        }
        Ok(())
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Input from the registration form.
///
/// `Debug` redacts both password fields.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Minimum length for both username and password.
    pub const MIN_LENGTH: usize = 6;

    /// Create a registration form.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule, checked in this order:
    /// - Username is empty
    /// - Password is empty
    /// - Username is shorter than [`Self::MIN_LENGTH`]
    /// - Password is shorter than [`Self::MIN_LENGTH`]
    /// - Password and confirmation differ
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.is_empty() {
            return Err(ValidationError::UsernameRequired);
        }
        if self.password.is_empty() {
            return Err(ValidationError::PasswordRequired);
        }
        if self.username.chars().count() < Self::MIN_LENGTH {
            return Err(ValidationError::UsernameTooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if self.password.chars().count() < Self::MIN_LENGTH {
            return Err(ValidationError::PasswordTooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }

    /// The credentials to log in with once registration succeeds.
    #[must_use]
    pub fn login_form(&self) -> LoginForm {
        LoginForm::new(self.username.clone(), self.password.clone())
    }
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_requires_username() {
        let form = LoginForm::new("", "validpass");
        assert_eq!(form.validate(), Err(ValidationError::UsernameRequired));
    }

    #[test]
    fn test_login_requires_password() {
        let form = LoginForm::new("criodo", "");
        assert_eq!(form.validate(), Err(ValidationError::PasswordRequired));
    }

    #[test]
    fn test_login_accepts_short_values() {
        // Length rules only apply at registration
        assert!(LoginForm::new("a", "b").validate().is_ok());
    }

    #[test]
    fn test_register_rule_order() {
        assert_eq!(
            RegistrationForm::new("", "", "x").validate(),
            Err(ValidationError::UsernameRequired)
        );
        assert_eq!(
            RegistrationForm::new("abc", "", "").validate(),
            Err(ValidationError::PasswordRequired)
        );
        assert_eq!(
            RegistrationForm::new("abc", "12", "34").validate(),
            Err(ValidationError::UsernameTooShort { min: 6 })
        );
        assert_eq!(
            RegistrationForm::new("criodo", "12", "34").validate(),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );
        assert_eq!(
            RegistrationForm::new("criodo", "validpass", "otherpass").validate(),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_register_valid() {
        let form = RegistrationForm::new("criodo", "validpass", "validpass");
        assert!(form.validate().is_ok());
        assert_eq!(form.login_form(), LoginForm::new("criodo", "validpass"));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::PasswordMismatch.to_string(),
            "Passwords do not match"
        );
        assert_eq!(
            ValidationError::UsernameTooShort { min: 6 }.to_string(),
            "Username must be at least 6 characters"
        );
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let form = RegistrationForm::new("criodo", "hunter22", "hunter22");
        let debug_output = format!("{form:?}");
        assert!(debug_output.contains("criodo"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter22"));
    }
}
