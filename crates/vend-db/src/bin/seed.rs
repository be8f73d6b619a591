//! # Seed Data Generator
//!
//! Populates the database with catalog products for local development.
//!
//! ## Usage
//! ```bash
//! # Generate 100 products (default, one per name and size)
//! cargo run -p vend-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p vend-db --bin seed -- --count 25
//!
//! # Specify database path
//! cargo run -p vend-db --bin seed -- --db ./data/vend.db
//! ```
//!
//! Prices run from $1.99 to $9.99 plus a size markup; opening stock cycles
//! through 0..=100 so some products start sold out.

use std::env;
use std::time::Instant;

use tracing_subscriber::EnvFilter;
use vend_core::NewProduct;
use vend_db::{Database, DbConfig};

/// Product names for realistic test data
const PRODUCTS: &[&str] = &[
    "Espresso Beans",
    "Green Tea",
    "Oat Milk",
    "Sourdough Loaf",
    "Croissant",
    "Blueberry Muffin",
    "Orange Juice",
    "Sparkling Water",
    "Dark Chocolate",
    "Granola Bar",
    "Notebook",
    "Ballpoint Pen",
    "Desk Lamp",
    "USB Cable",
    "Phone Charger",
    "Coffee Mug",
    "Water Bottle",
    "Tote Bag",
    "Umbrella",
    "Sunglasses",
];

/// Size variants with their price markup in cents
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 100),
    ("Large", 200),
    ("XL", 350),
    ("Travel", 50),
];

const USAGE: &str = "\
Vend Seed Data Generator

Usage: seed [OPTIONS]

Options:
  -c, --count <N>    Number of products to generate (default: 100)
  -d, --db <PATH>    Database file path (default: ./vend_dev.db)
  -h, --help         Show this help message
";

#[derive(Debug, PartialEq)]
struct SeedOptions {
    count: usize,
    db_path: String,
    help: bool,
}

/// Reads the command line. A flag missing its value or a `--count` that is
/// not a whole number is an error rather than a silent default.
fn parse_args(args: &[String]) -> Result<SeedOptions, String> {
    let mut options = SeedOptions {
        count: PRODUCTS.len() * SIZES.len(),
        db_path: String::from("./vend_dev.db"),
        help: false,
    };

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--count" | "-c" => {
                let value = rest.next().ok_or_else(|| format!("{} needs a value", arg))?;
                options.count = value
                    .parse()
                    .map_err(|_| format!("invalid product count '{}'", value))?;
            }
            "--db" | "-d" => {
                let value = rest.next().ok_or_else(|| format!("{} needs a value", arg))?;
                options.db_path = value.clone();
            }
            "--help" | "-h" => options.help = true,
            other => return Err(format!("unknown option '{}'", other)),
        }
    }

    Ok(options)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,vend=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {}", message);
            eprintln!();
            eprint!("{}", USAGE);
            std::process::exit(2);
        }
    };
    if options.help {
        print!("{}", USAGE);
        return Ok(());
    }
    let SeedOptions { count, db_path, .. } = options;

    println!("Vend Seed Data Generator");
    println!("========================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count_active().await?;
    if existing > 0 {
        println!("Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = Instant::now();
    let mut generated = 0;

    'outer: for (product_idx, name) in PRODUCTS.iter().enumerate() {
        for (size_idx, (size, markup)) in SIZES.iter().enumerate() {
            if generated >= count {
                break 'outer;
            }

            let product = generate_product(name, size, *markup, product_idx * SIZES.len() + size_idx);

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }

            generated += 1;
        }
    }

    let elapsed = start.elapsed();
    println!("Generated {} products in {:?}", generated, elapsed);

    println!();
    println!("Seed complete!");

    db.close().await;
    Ok(())
}

/// Generates a single product with deterministic pseudo-random data.
fn generate_product(name: &str, size: &str, markup: i64, seed: usize) -> NewProduct {
    let base_price = 199 + ((seed * 17) % 800) as i64;
    let quantity = (seed % 101) as i64;

    NewProduct::new(format!("{} {}", name, size), base_price + markup, quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("seed").chain(list.iter().copied()).map(String::from).collect()
    }

    #[test]
    fn test_defaults() {
        let options = parse_args(&args(&[])).unwrap();
        assert_eq!(options.count, 100);
        assert_eq!(options.db_path, "./vend_dev.db");
        assert!(!options.help);
    }

    #[test]
    fn test_count_and_db() {
        let options = parse_args(&args(&["-c", "25", "--db", "/tmp/x.db"])).unwrap();
        assert_eq!(options.count, 25);
        assert_eq!(options.db_path, "/tmp/x.db");
    }

    #[test]
    fn test_malformed_count_is_an_error() {
        let err = parse_args(&args(&["--count", "ten"])).unwrap_err();
        assert!(err.contains("ten"));
        assert!(parse_args(&args(&["--count", "-3"])).is_err());
    }

    #[test]
    fn test_missing_value_is_an_error() {
        assert!(parse_args(&args(&["--count"])).is_err());
        assert!(parse_args(&args(&["--db"])).is_err());
    }

    #[test]
    fn test_help_and_unknown_flags() {
        assert!(parse_args(&args(&["-h"])).unwrap().help);
        assert!(parse_args(&args(&["--cuont", "5"])).is_err());
    }
}
