//! Bee Solar Hive CLI - browse the catalog, manage the cart, and check out.
//!
//! # Usage
//!
//! ```bash
//! # List plans, or products in one category
//! hive catalog plans
//! hive catalog products --category solar-panels
//!
//! # Search both catalogs
//! hive search inverter
//!
//! # Cart keys are `plan/<slug>`, `product/<id>`, or a bare legacy id
//! hive cart add plan/home-basic
//! hive cart set product/42 3
//! hive cart show
//!
//! # Start payment, then confirm it
//! hive checkout --name "Ada Obi" --email ada@example.ng --phone 0801 \
//!     --country Nigeria --state Lagos --city Ikeja --address "12 Marina Rd"
//! hive verify 3f1c8a52-9a7e-4c1b-8d0e-2f4b6a9c1d7e
//! ```
//!
//! # Commands
//!
//! - `catalog` - List products, plans, a single plan, or categories
//! - `search` - Search plans and products
//! - `cart` - Show and change the persisted cart
//! - `wishlist` - Show and change the persisted wishlist
//! - `checkout` - Send the order and print the payment URL
//! - `verify` - Check whether an order reference has been paid

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use solar_hive_core::CartKey;
use solar_hive_storefront::Storefront;
use solar_hive_storefront::config::HiveConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "hive")]
#[command(version, about = "Bee Solar Hive storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        target: CatalogTarget,
    },
    /// Search plans and products
    Search {
        /// Text to look for
        query: String,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Send the order and print the payment URL
    Checkout(commands::checkout::CustomerArgs),
    /// Check whether an order reference has been paid
    Verify {
        /// Order reference printed by `checkout`
        reference: String,
    },
}

#[derive(Subcommand)]
enum CatalogTarget {
    /// List products
    Products {
        /// Only products in this category slug
        #[arg(short, long)]
        category: Option<String>,
        /// Only products matching this text
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// List subscription plans
    Plans {
        /// Only plans matching this text
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Show one plan and similar plans
    Plan {
        /// Plan slug
        slug: String,
    },
    /// List categories with starting prices
    Categories,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show resolved cart lines and totals
    Show,
    /// Add one unit
    Add {
        #[arg(value_parser = parse_cart_key)]
        key: CartKey,
    },
    /// Remove one unit
    Remove {
        #[arg(value_parser = parse_cart_key)]
        key: CartKey,
    },
    /// Set the quantity; zero removes the entry
    Set {
        #[arg(value_parser = parse_cart_key)]
        key: CartKey,
        quantity: u32,
    },
    /// Remove an entry whatever its quantity
    Delete {
        #[arg(value_parser = parse_cart_key)]
        key: CartKey,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show saved products and plans
    Show,
    /// Save or unsave `plan/<slug>` or `product/<id>`
    Toggle {
        #[arg(value_parser = parse_cart_key)]
        key: CartKey,
    },
    /// Empty the wishlist
    Clear,
}

/// Parse `plan/<slug>`, `product/<id>`, or a bare legacy id.
fn parse_cart_key(raw: &str) -> Result<CartKey, String> {
    let raw = raw.trim();
    let key = match raw.split_once('/') {
        Some(("plan", slug)) => CartKey::plan(slug),
        Some(("product", id)) => CartKey::product(id),
        _ => CartKey::unknown(raw),
    };
    if key.id.as_str().is_empty() {
        return Err(format!("empty id in {raw:?}"));
    }
    Ok(key)
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &HiveConfig) -> Option<sentry::ClientInitGuard> {
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

    Some(guard)
}

/// Warnings and errors become Sentry events, info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match HiveConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "solar_hive_storefront=info,solar_hive_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let mut storefront = Storefront::open(config);

    if let Err(e) = run(cli, &mut storefront).await {
        match &e {
            CommandError::App(app) => app.report(),
            CommandError::Io(_) => tracing::error!("Command failed: {e}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, storefront: &mut Storefront) -> Result<(), CommandError> {
    match cli.command {
        Commands::Catalog { target } => match target {
            CatalogTarget::Products { category, filter } => {
                commands::catalog::products(storefront, category.as_deref(), filter.as_deref())
                    .await?;
            }
            CatalogTarget::Plans { filter } => {
                commands::catalog::plans(storefront, filter.as_deref()).await?;
            }
            CatalogTarget::Plan { slug } => commands::catalog::plan(storefront, &slug).await?,
            CatalogTarget::Categories => commands::catalog::categories(storefront).await?,
        },
        Commands::Search { query } => commands::catalog::search(storefront, &query).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(storefront).await?,
            CartAction::Add { key } => commands::cart::add(storefront, key)?,
            CartAction::Remove { key } => commands::cart::remove(storefront, &key)?,
            CartAction::Set { key, quantity } => {
                commands::cart::set(storefront, &key, quantity)?;
            }
            CartAction::Delete { key } => commands::cart::delete(storefront, &key)?,
            CartAction::Clear => commands::cart::clear(storefront)?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(storefront).await?,
            WishlistAction::Toggle { key } => commands::wishlist::toggle(storefront, key)?,
            WishlistAction::Clear => commands::wishlist::clear(storefront)?,
        },
        Commands::Checkout(customer) => commands::checkout::start(storefront, customer).await?,
        Commands::Verify { reference } => commands::checkout::verify(storefront, &reference).await?,
    }
    Ok(())
}
