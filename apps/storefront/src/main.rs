//! # Bulkbuy Storefront CLI
//!
//! Drives the checkout handlers against the configured database.
//!
//! ## Usage
//! ```bash
//! storefront catalog
//! storefront quote cart.json          # { "items": [{ "productId": "...", "quantity": 25 }] }
//! storefront checkout checkout.json   # { "userId": "...", "items": [...], "shippingAddress": {...} }
//! storefront order show <ORDER_ID>
//! storefront order status <ORDER_ID> paid
//! storefront tiers tiers.json --quantity 60   # offline, no database
//! ```
//!
//! Output is pretty-printed JSON on stdout. Handler errors are printed as
//! `{ "code", "message" }` and exit with status 1.

use std::path::{Path, PathBuf};

use anyhow::Context;
use bulkbuy_core::{compute_tier_price, format_tiers, OrderStatus, PricingTier};
use bulkbuy_db::{Database, DbConfig};
use bulkbuy_storefront::checkout::{self, CartRequest, CheckoutRequest};
use bulkbuy_storefront::config::{PaymentProvider, StorefrontConfig, DEFAULT_CONFIG_FILE};
use bulkbuy_storefront::{ApiError, SimulatedGateway};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "storefront", version, about = "Bulkbuy tiered-pricing storefront")]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List active products with their tier tables
    Catalog,

    /// Price a cart without placing an order
    Quote {
        /// JSON cart request
        cart: PathBuf,
    },

    /// Price a cart, open a payment intent and store a pending order
    Checkout {
        /// JSON checkout request
        request: PathBuf,
    },

    /// Inspect or update orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },

    /// Format a tier table and optionally price a quantity against it
    Tiers {
        /// JSON array of tiers
        tiers: PathBuf,

        #[arg(long)]
        quantity: Option<i64>,
    },
}

#[derive(Debug, Subcommand)]
enum OrderAction {
    /// Show an order with its items
    Show { id: String },

    /// Set an order's status
    Status { id: String, status: OrderStatus },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = StorefrontConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_tracing(&config);

    debug!(?config, "Configuration loaded");

    // Tier tables can be checked without a database.
    if let Command::Tiers { tiers, quantity } = &cli.command {
        return run_tiers(tiers, *quantity);
    }

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.max_connections),
    )
    .await
    .with_context(|| format!("opening {}", config.database_path))?;
    info!(path = %config.database_path, "Database ready");

    let gateway = match config.payment_provider {
        PaymentProvider::Simulated => SimulatedGateway::new(),
    };

    let outcome = match cli.command {
        Command::Catalog => print(checkout::list_catalog(&db).await),
        Command::Quote { cart } => {
            let request: CartRequest = read_json(&cart)?;
            print(checkout::price_cart(&db, &request).await)
        }
        Command::Checkout { request } => {
            let request: CheckoutRequest = read_json(&request)?;
            print(checkout::create_order(&db, &gateway, &request, &config.currency).await)
        }
        Command::Order { action } => match action {
            OrderAction::Show { id } => print(checkout::get_order(&db, &id).await),
            OrderAction::Status { id, status } => {
                print(checkout::update_order_status(&db, &id, status).await)
            }
        },
        Command::Tiers { .. } => Ok(true),
    };

    db.close().await;

    if !outcome? {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(config: &StorefrontConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn run_tiers(path: &Path, quantity: Option<i64>) -> anyhow::Result<()> {
    let tiers: Vec<PricingTier> = read_json(path)?;

    println!("{}", serde_json::to_string_pretty(&format_tiers(&tiers))?);

    if let Some(quantity) = quantity {
        match compute_tier_price(quantity, &tiers) {
            Ok(price) => println!("{}", serde_json::to_string_pretty(&price)?),
            Err(e) => {
                let err = ApiError::from(e);
                println!("{}", serde_json::to_string_pretty(&err)?);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Prints the handler result as JSON. Returns whether it succeeded.
fn print<T: Serialize>(result: Result<T, ApiError>) -> anyhow::Result<bool> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(true)
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&err)?);
            Ok(false)
        }
    }
}
