//! Account commands.
//!
//! # Usage
//!
//! ```bash
//! qkart register criodo --password validpass --login
//! qkart login criodo --password validpass
//! qkart whoami
//! qkart logout
//! ```

use std::io::{self, BufRead, Write};

use qkart_core::{LoginForm, RegistrationForm};
use qkart_storefront::Notification;
use qkart_storefront::auth::{AuthService, LOGIN_SUCCESS, REGISTER_SUCCESS};

use super::{CliError, Context, notify};

/// Log in and persist the session.
pub async fn login(
    ctx: &mut Context,
    username: String,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = password_or_prompt(password, "Password: ")?;
    let form = LoginForm::new(username, password);

    let session = AuthService::new(&ctx.client)
        .login(&form, &mut ctx.session)
        .await?;
    notify(&Notification::success(LOGIN_SUCCESS));
    println!("Wallet balance: {}", session.balance());
    Ok(())
}

/// Register a new account, optionally logging in afterwards.
pub async fn register(
    ctx: &mut Context,
    username: String,
    password: Option<String>,
    confirm: Option<String>,
    login: bool,
) -> Result<(), CliError> {
    let password = password_or_prompt(password, "Password: ")?;
    let confirm = confirm.unwrap_or_else(|| password.clone());
    let form = RegistrationForm::new(username, password, confirm);
    let auth = AuthService::new(&ctx.client);

    if login {
        auth.register_and_login(&form, &mut ctx.session).await?;
        notify(&Notification::success(REGISTER_SUCCESS));
        notify(&Notification::success(LOGIN_SUCCESS));
    } else {
        auth.register(&form).await?;
        notify(&Notification::success(REGISTER_SUCCESS));
    }
    Ok(())
}

/// Clear the persisted session.
pub fn logout(ctx: &mut Context) -> Result<(), CliError> {
    let was_logged_in = ctx.session.is_authenticated();
    ctx.session
        .logout()
        .map_err(qkart_storefront::StorefrontError::from)?;
    if was_logged_in {
        notify(&Notification::success("Logged out"));
    }
    Ok(())
}

/// Print the current user.
pub fn whoami(ctx: &Context) {
    match ctx.session.session() {
        Some(session) => println!(
            "{} (wallet balance: {})",
            session.username(),
            session.balance()
        ),
        None => println!("Not logged in"),
    }
}

fn password_or_prompt(password: Option<String>, prompt: &str) -> io::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
