//! Boutique CLI - shop from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse and fill the anonymous cart
//! boutique products
//! boutique cart add p-42 --quantity 2
//!
//! # Log in; the anonymous cart moves into the account cart
//! boutique login -e me@example.com
//!
//! # Check out and pay
//! boutique orders checkout
//! boutique orders pay <ORDER_ID> --card "4242 4242 4242 4242" --exp-month 12 --exp-year 2030 --cvc 123
//! ```
//!
//! The token and the anonymous cart persist under `BOUTIQUE_DATA_DIR`
//! between invocations. See `boutique_storefront::config` for every
//! environment variable.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use boutique_storefront::config::ConfigError;
use boutique_storefront::{Storefront, StorefrontConfig};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod commands;
mod output;

use commands::{
    AccountAction, AdminAction, CartAction, OrderAction, SupportAction, account, admin, cart,
    catalog, orders, support,
};

#[derive(Parser)]
#[command(name = "boutique")]
#[command(author, version, about = "Boutique storefront CLI")]
struct Cli {
    /// Backend base URL (overrides `BOUTIQUE_API_BASE`)
    #[arg(long, global = true)]
    api_base: Option<Url>,

    /// Directory for the token and anonymous cart (overrides `BOUTIQUE_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in; the anonymous cart is merged into the account cart
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long, env = "BOUTIQUE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Log out and forget the stored token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Create or edit an account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// List products
    Products {
        /// Only show products that can be ordered now
        #[arg(long)]
        in_stock: bool,
    },
    /// Show one product
    Product {
        /// Product id
        id: String,
    },
    /// Show or edit the cart (local while anonymous, account cart once logged in)
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Check out, pay, cancel and track orders
    Orders {
        #[command(subcommand)]
        action: Option<OrderAction>,
    },
    /// Customer support threads
    Support {
        #[command(subcommand)]
        action: Option<SupportAction>,
    },
    /// Back office: products, order fulfilment, support desk (administrators)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

/// Errors that end a CLI invocation.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storefront(#[from] boutique_storefront::Error),

    #[error("could not read password: {0}")]
    Prompt(#[from] std::io::Error),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    sentry_filter_for(*metadata.level())
}

const fn sentry_filter_for(level: tracing::Level) -> sentry_tracing::EventFilter {
    match level {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Logs go to stderr so stdout stays for
/// command output.
fn init_tracing(json: bool) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "boutique_storefront=info,boutique_cli=info".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<StorefrontConfig, ConfigError> {
    let mut config = StorefrontConfig::from_env()?;
    if let Some(api_base) = &cli.api_base {
        config.api_base = api_base.clone();
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir.clone_from(data_dir);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("boutique: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.log_json);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &StorefrontConfig) -> Result<(), CliError> {
    let mut shop = Storefront::open(config)?;
    shop.restore().await;

    match command {
        Commands::Login { email, password } => {
            account::login(&mut shop, &email, password).await?;
        }
        Commands::Logout => account::logout(&mut shop).await,
        Commands::Whoami => account::whoami(&shop),
        Commands::Account { action } => account::run(&mut shop, action).await?,
        Commands::Products { in_stock } => catalog::list(&shop, in_stock).await?,
        Commands::Product { id } => catalog::show(&shop, &id).await?,
        Commands::Cart { action } => cart::run(&shop, action.unwrap_or_default()).await?,
        Commands::Orders { action } => orders::run(&shop, action.unwrap_or_default()).await?,
        Commands::Support { action } => {
            support::run(&shop, action.unwrap_or_default()).await?;
        }
        Commands::Admin { action } => admin::run(&shop, action).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentry_tracing::EventFilter;
    use tracing::Level;

    #[test]
    fn test_warnings_and_errors_reach_sentry_as_events() {
        assert!(matches!(sentry_filter_for(Level::ERROR), EventFilter::Event));
        assert!(matches!(sentry_filter_for(Level::WARN), EventFilter::Event));
        assert!(matches!(sentry_filter_for(Level::INFO), EventFilter::Breadcrumb));
        assert!(matches!(sentry_filter_for(Level::DEBUG), EventFilter::Breadcrumb));
        assert!(matches!(sentry_filter_for(Level::TRACE), EventFilter::Ignore));
    }
}
