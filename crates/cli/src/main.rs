//! QKart CLI - terminal front end for the QKart storefront.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and log in
//! qkart register criodo --password validpass --login
//!
//! # Browse the catalog
//! qkart products
//! qkart search "iphone"
//!
//! # Type a query one line at a time; only the last line of a burst is sent
//! qkart browse
//!
//! # Manage the cart
//! qkart cart add KCRwjF7lN97HnEaY
//! qkart cart inc KCRwjF7lN97HnEaY
//! qkart cart show --checkout
//! ```
//!
//! # Environment Variables
//!
//! See `qkart_storefront::config` for the full list. `QKART_API_ENDPOINT`
//! is required; `RUST_LOG` controls log verbosity (default: warn).

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qkart_storefront::{StorefrontConfig, StorefrontError};

mod commands;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "qkart")]
#[command(author, version, about = "QKart storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        username: String,

        /// Password (read from stdin if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create a new account
    Register {
        username: String,

        /// Password (read from stdin if omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Password confirmation (defaults to the password)
        #[arg(long)]
        confirm: Option<String>,

        /// Log in right after registering
        #[arg(long)]
        login: bool,
    },
    /// Forget the current session
    Logout,
    /// Show the logged-in user and wallet balance
    Whoami,
    /// List the full catalog
    Products,
    /// Search the catalog by name or category
    Search { text: String },
    /// Interactive search: each stdin line is one keystroke
    Browse,
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents
    Show {
        /// Include the checkout summary
        #[arg(long)]
        checkout: bool,
    },
    /// Add one unit of a product not yet in the cart
    Add { product_id: String },
    /// Set the quantity of a product (0 removes it)
    Set { product_id: String, quantity: u32 },
    /// Increase the quantity of a product by one
    Inc { product_id: String },
    /// Decrease the quantity of a product by one
    Dec { product_id: String },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", StorefrontError::from(e).notification());
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        eprintln!("{}", e.notification());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    let mut ctx = Context::new(config)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&mut ctx, username, password).await?;
        }
        Commands::Register {
            username,
            password,
            confirm,
            login,
        } => commands::auth::register(&mut ctx, username, password, confirm, login).await?,
        Commands::Logout => commands::auth::logout(&mut ctx)?,
        Commands::Whoami => commands::auth::whoami(&ctx),
        Commands::Products => commands::catalog::products(&ctx).await?,
        Commands::Search { text } => commands::catalog::search(&ctx, &text).await?,
        Commands::Browse => commands::catalog::browse(&ctx).await?,
        Commands::Cart { action } => match action {
            CartAction::Show { checkout } => commands::cart::show(&mut ctx, checkout).await?,
            CartAction::Add { product_id } => commands::cart::add(&mut ctx, product_id.into()).await?,
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&mut ctx, product_id.into(), quantity).await?,
            CartAction::Inc { product_id } => {
                commands::cart::increment(&mut ctx, product_id.into()).await?;
            }
            CartAction::Dec { product_id } => {
                commands::cart::decrement(&mut ctx, product_id.into()).await?;
            }
        },
    }
    Ok(())
}
