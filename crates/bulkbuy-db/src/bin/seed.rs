//! # Seed Data Generator
//!
//! Populates the database with the sample bulk catalog for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p bulkbuy-db --bin seed
//!
//! # Specify database path
//! cargo run -p bulkbuy-db --bin seed -- --db ./data/bulkbuy.db
//! ```
//!
//! ## Generated Products
//! Every product gets the same four-tier volume table, scaled from its
//! base price:
//!
//! | Quantity   | Unit price     | Discount |
//! |------------|----------------|----------|
//! | 1 - 10     | base           | -        |
//! | 11 - 50    | base × 0.85    | 15%      |
//! | 51 - 100   | base × 0.70    | 30%      |
//! | 101+       | base × 0.60    | 40%      |

use std::env;

use bulkbuy_core::{NewProduct, PricingTier, TierBound};
use bulkbuy_db::{Database, DbConfig};
use rust_decimal::Decimal;

/// (name, description, base price in cents, stock)
const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("Premium Widget", "High-quality widget for professional use", 1000, 1000),
    ("Standard Gadget", "Reliable everyday gadget", 2500, 500),
    ("Deluxe Tool Set", "Complete tool set with carrying case", 5000, 250),
    ("Eco Shipping Box", "Recycled corrugated box, 40x30x20cm", 150, 10_000),
    ("Industrial Fastener Pack", "Assorted stainless fasteners, 100 count", 799, 2000),
];

/// (min, max, price factor in percent, discount percent)
const TIER_TABLE: &[(i64, Option<i64>, i64, i64)] = &[
    (1, Some(10), 100, 0),
    (11, Some(50), 85, 15),
    (51, Some(100), 70, 30),
    (101, None, 60, 40),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bulkbuy.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bulkbuy Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bulkbuy.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bulkbuy Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating products...");

    for &(name, description, base_cents, stock) in PRODUCTS {
        let product = sample_product(name, description, base_cents, stock)?;
        let created = db.products().create(&product).await?;
        println!(
            "  {} ({} tiers, id {})",
            created.product.name,
            created.tiers.len(),
            created.product.id
        );
    }

    println!();
    println!("✓ Seed complete! {} products", db.products().count().await?);

    db.close().await;
    Ok(())
}

fn sample_product(
    name: &str,
    description: &str,
    base_cents: i64,
    stock: i64,
) -> Result<NewProduct, Box<dyn std::error::Error>> {
    let base_price = Decimal::new(base_cents, 2);

    let tiers = TIER_TABLE
        .iter()
        .map(|&(min, max, factor, discount)| {
            let unit_price = (base_price * Decimal::new(factor, 2)).normalize();
            PricingTier::new(
                0,
                min,
                TierBound::from(max),
                unit_price,
                Decimal::from(discount),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NewProduct {
        name: name.to_string(),
        description: Some(description.to_string()),
        base_price,
        image_url: None,
        stock_quantity: stock,
        tiers,
    })
}
