//! # Seed Data Generator
//!
//! Fills a database with a demo nursery catalog and a couple of customers.
//!
//! ## Usage
//! ```bash
//! # Seed ./shelf_dev.db
//! cargo run -p shelf-db --bin seed
//!
//! # Specify database path
//! cargo run -p shelf-db --bin seed -- --db ./data/shelf.db
//!
//! # Add numbered filler products on top of the demo catalog
//! cargo run -p shelf-db --bin seed -- --extra 500
//! ```
//!
//! Seeding is skipped when the catalog already has products.

use chrono::NaiveDate;
use shelf_core::validation::{validate_customer_draft, validate_product_draft};
use shelf_core::{CustomerDraft, ProductDraft};
use shelf_db::{Database, DbConfig};
use std::env;

/// (name, category, sku, quantity, price in minor units, expiry, description)
type DemoProduct = (
    &'static str,
    &'static str,
    &'static str,
    i64,
    i64,
    Option<(i32, u32, u32)>,
    &'static str,
);

const DEMO_PRODUCTS: &[DemoProduct] = &[
    ("Monstera Deliciosa", "Indoor Plants", "IN-PL-001", 25, 2500, None, "Bright, indirect light. Water when the top soil is dry."),
    ("Fiddle Leaf Fig", "Indoor Plants", "IN-PL-002", 15, 3500, None, "Prefers a stable spot with filtered light."),
    ("Snake Plant", "Indoor Plants", "IN-PL-003", 5, 1200, None, "Tolerates low light and infrequent watering."),
    ("Rose Bush", "Outdoor Plants", "OUT-PL-001", 50, 800, None, "Six hours of direct sun daily."),
    ("Terracotta Pot (Medium)", "Pots", "POT-MD-001", 80, 450, None, "Porous clay for good aeration."),
    ("All-Purpose Fertilizer", "Fertilizers", "FERT-AP-001", 8, 300, Some((2026, 12, 31)), "Balanced NPK, monthly during the growing season."),
    ("Gardening Gloves", "Tools", "TOOL-GL-001", 45, 250, None, "Durable gloves for everyday work."),
    ("Orchid Mix", "Soil & Mixes", "SOIL-OR-001", 30, 150, None, "Fast-draining bark mix."),
    ("Organic Seeds (Tomato)", "Seeds", "SEED-TM-001", 100, 50, Some((2026, 11, 1)), "Heirloom tomato seeds."),
];

const DEMO_CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Anjali Sharma", "anjali@example.com", "1234567890"),
    ("Rohan Verma", "rohan@example.com", "2345678901"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./shelf_dev.db");
    let mut extra: usize = 0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--extra" | "-e" => {
                if i + 1 < args.len() {
                    extra = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shelf Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./shelf_dev.db)");
                println!("  -e, --extra <N>    Additional filler products (default: 0)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Shelf Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut created = 0;
    for draft in demo_products().chain((0..extra).map(filler_product)) {
        validate_product_draft(&draft)?;
        match db.products().create(&draft).await {
            Ok(_) => created += 1,
            Err(e) => eprintln!("Failed to insert {}: {}", draft.sku, e),
        }
    }
    println!("✓ Created {} products", created);

    for (name, email, phone) in DEMO_CUSTOMERS {
        let draft = CustomerDraft {
            name: name.to_string(),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
            address: None,
        };
        validate_customer_draft(&draft)?;
        db.customers().create(&draft).await?;
    }
    println!("✓ Created {} customers", DEMO_CUSTOMERS.len());

    let value = db.products().inventory_value_cents().await?;
    println!();
    println!("Inventory value: {}", shelf_core::Money::from_cents(value));
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

fn demo_products() -> impl Iterator<Item = ProductDraft> {
    DEMO_PRODUCTS.iter().map(
        |(name, category, sku, quantity, price_cents, expiry, description)| ProductDraft {
            name: name.to_string(),
            category: category.to_string(),
            sku: sku.to_string(),
            quantity: *quantity,
            price_cents: *price_cents,
            description: description.to_string(),
            expiry_date: expiry.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        },
    )
}

/// Deterministic filler: stock 0-100, price 0.99-19.99.
fn filler_product(index: usize) -> ProductDraft {
    let seed = index as i64;
    ProductDraft {
        name: format!("Seedling Tray #{:04}", index),
        category: "Seedlings".to_string(),
        sku: format!("SEEDLING-{:05}", index),
        quantity: seed % 101,
        price_cents: 99 + (seed * 37) % 1901,
        description: String::new(),
        expiry_date: None,
    }
}
