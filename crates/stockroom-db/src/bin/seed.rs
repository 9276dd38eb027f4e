//! # Seed Data Generator
//!
//! Populates the database with sample products and trading history for
//! development.
//!
//! ## Usage
//! ```bash
//! # Onboard the sample catalog and post 50 documents (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Generate more history
//! cargo run -p stockroom-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! ## What Gets Seeded
//! - A fixed catalog of products, each with a base/derived unit pair
//!   (cartons of cans, boxes of bars, sacks of kilos, ...)
//! - One opening purchase that stocks every product
//! - A deterministic mix of sales and restock purchases
//! - One stock-count adjustment, so every ledger row type appears
//!
//! Sales that outrun the available stock are skipped with a warning;
//! that exercises the rejection path on purpose.

use chrono::{Days, NaiveDate};
use std::env;
use stockroom_core::{
    AdjustmentRequest, AdjustmentTarget, DocumentLine, PurchaseDraft, SaleDraft, StockAccount,
    UnitConversion,
};
use stockroom_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// One catalog entry for seeding.
struct SeedProduct {
    id: &'static str,
    base_unit: &'static str,
    derive_unit: &'static str,
    factor: i64,
    opening_base: i64,
    reorder_level: i64,
}

/// Sample catalog across unit shapes.
const PRODUCTS: &[SeedProduct] = &[
    SeedProduct { id: "COLA-330", base_unit: "CARTON", derive_unit: "CAN", factor: 24, opening_base: 40, reorder_level: 10 },
    SeedProduct { id: "WATER-500", base_unit: "CARTON", derive_unit: "BOTTLE", factor: 12, opening_base: 60, reorder_level: 15 },
    SeedProduct { id: "CHOC-BAR", base_unit: "BOX", derive_unit: "BAR", factor: 36, opening_base: 25, reorder_level: 8 },
    SeedProduct { id: "CHIPS-REG", base_unit: "CARTON", derive_unit: "BAG", factor: 20, opening_base: 30, reorder_level: 10 },
    SeedProduct { id: "RICE-5KG", base_unit: "SACK", derive_unit: "KG", factor: 5, opening_base: 50, reorder_level: 12 },
    SeedProduct { id: "SUGAR-1KG", base_unit: "SACK", derive_unit: "KG", factor: 25, opening_base: 20, reorder_level: 6 },
    SeedProduct { id: "MILK-UHT", base_unit: "TRAY", derive_unit: "LITRE", factor: 12, opening_base: 35, reorder_level: 10 },
    SeedProduct { id: "EGGS-TRAY", base_unit: "TRAY", derive_unit: "EGG", factor: 30, opening_base: 45, reorder_level: 12 },
    SeedProduct { id: "SOAP-BATH", base_unit: "CARTON", derive_unit: "PIECE", factor: 48, opening_base: 15, reorder_level: 5 },
    SeedProduct { id: "TEA-LOOSE", base_unit: "CASE", derive_unit: "PACKET", factor: 40, opening_base: 18, reorder_level: 6 },
    SeedProduct { id: "FLOUR-2KG", base_unit: "SACK", derive_unit: "KG", factor: 10, opening_base: 22, reorder_level: 8 },
    SeedProduct { id: "OIL-COOK", base_unit: "CARTON", derive_unit: "BOTTLE", factor: 6, opening_base: 28, reorder_level: 9 },
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 50;
    let mut db_path = env::var("STOCKROOM_DB").unwrap_or_else(|_| String::from("./stockroom_dev.db"));

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(50);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of trading documents to post (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: $STOCKROOM_DB or ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockroom Seed Data Generator");
    println!("================================");
    println!("Database:  {}", db_path);
    println!("Documents: {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing stock accounts
    let existing = db.stock_accounts().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} stock accounts", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Onboard the catalog
    println!();
    println!("Onboarding {} products...", PRODUCTS.len());

    for product in PRODUCTS {
        db.conversions()
            .create(&UnitConversion::new(
                product.id,
                product.base_unit,
                product.derive_unit,
                product.factor,
            ))
            .await?;
        db.stock_accounts()
            .create(&StockAccount::new(product.id, 0, 0, product.reorder_level))
            .await?;
    }

    println!("✓ Onboarded {} products", PRODUCTS.len());

    // Opening stock arrives as one purchase document
    let start_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default();
    let executor = db.executor();

    let opening = PurchaseDraft {
        purchase_date: start_date,
        supplier_name: "Opening Stock".to_string(),
        lines: PRODUCTS
            .iter()
            .enumerate()
            .map(|(idx, p)| DocumentLine {
                product_id: p.id.to_string(),
                qty: p.opening_base,
                uom: p.base_unit.to_string(),
                unit_price_cents: 199 + ((idx * 17) % 800) as i64,
            })
            .collect(),
    };
    let receipt = executor.post_purchase(&opening).await?;
    println!(
        "✓ Opening purchase {} ({} lines)",
        receipt.purchase.id,
        receipt.lines.len()
    );

    // Deterministic trading history
    println!();
    println!("Posting trading documents...");

    let mut posted = 0;
    let mut skipped = 0;
    let start = std::time::Instant::now();

    for seq in 0..count {
        let product = &PRODUCTS[seq % PRODUCTS.len()];
        let date = start_date
            .checked_add_days(Days::new((seq % 90) as u64))
            .unwrap_or(start_date);
        let price_cents = 49 + ((seq * 23) % 450) as i64;

        let outcome = if seq % 4 == 3 {
            // Restock purchase in base units
            let qty = 3 + ((seq * 7) % 12) as i64;
            executor
                .post_purchase(&PurchaseDraft {
                    purchase_date: date,
                    supplier_name: format!("Wholesaler {}", 1 + seq % 3),
                    lines: vec![DocumentLine {
                        product_id: product.id.to_string(),
                        qty,
                        uom: product.base_unit.to_string(),
                        unit_price_cents: price_cents * product.factor,
                    }],
                })
                .await
                .map(|_| ())
        } else {
            // Sale in derived units, occasionally spanning a borrow
            let qty = 1 + ((seq * 13) % (product.factor as usize + 5)) as i64;
            executor
                .post_sale(&SaleDraft {
                    sale_date: date,
                    customer_name: format!("Till {}", 1 + seq % 4),
                    lines: vec![DocumentLine {
                        product_id: product.id.to_string(),
                        qty,
                        uom: product.derive_unit.to_string(),
                        unit_price_cents: price_cents,
                    }],
                })
                .await
                .map(|_| ())
        };

        match outcome {
            Ok(()) => {
                posted += 1;
                if posted % 25 == 0 {
                    println!("  Posted {} documents...", posted);
                }
            }
            Err(e) => {
                skipped += 1;
                eprintln!("⚠ Skipped document for {}: {}", product.id, e);
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Posted {} documents in {:?} ({} skipped)",
        posted, elapsed, skipped
    );

    // One adjustment so the ledger shows a count correction
    let adjusted = executor
        .adjust_stock(&AdjustmentRequest {
            product_id: PRODUCTS[0].id.to_string(),
            target: AdjustmentTarget::Derived(3),
            remark: "Cycle count".to_string(),
        })
        .await?;
    println!(
        "✓ Adjustment posted: {} now at {} {} / {} {}",
        adjusted.product_id,
        adjusted.base_qty,
        PRODUCTS[0].base_unit,
        adjusted.derived_qty,
        PRODUCTS[0].derive_unit
    );

    // Summary
    println!();
    println!("Ledger rows: {}", db.ledger().count().await?);

    let low = db.stock_accounts().below_reorder_level().await?;
    if low.is_empty() {
        println!("Reorder report: all products above reorder level");
    } else {
        println!("Reorder report: {} product(s) need restocking", low.len());
        for row in &low {
            println!(
                "  {}: {} {} left (reorder at {})",
                row.product_id, row.base_qty, row.base_unit, row.reorder_level
            );
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
