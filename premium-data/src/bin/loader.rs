use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use premium_data::{PriceTableLoader, ProductLinkLoader};
use premium_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load price tables (and optionally product links) into the database.
///
/// Price files are CSV with `table,age_range,value` columns, or a JSON array
/// of `{"tabela", "faixa_etaria", "valor"}` objects (chosen by the `.json`
/// extension). Link files are CSV with `product,carrier,table` columns.
#[derive(Parser, Debug)]
#[command(name = "premium-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the price table file (CSV or JSON)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a CSV of product to price table links, loaded after prices
    #[arg(short, long)]
    links: Option<PathBuf>,

    /// SQLite database URL (e.g., sqlite:premiums.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:premiums.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    if let Some(path) = &args.file {
        println!("Loading price tables from: {}", path.display());

        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;

        let records = if is_json(path) {
            PriceTableLoader::parse_json(file)
                .with_context(|| format!("Failed to parse JSON: {}", path.display()))?
        } else {
            PriceTableLoader::parse_csv(file)
                .with_context(|| format!("Failed to parse CSV: {}", path.display()))?
        };

        println!("Parsed {} brackets", records.len());

        let summary = PriceTableLoader::load(&repo, &records)
            .await
            .context("Failed to load price tables into database")?;

        println!(
            "Loaded {} brackets into {} tables ({} new).",
            summary.brackets, summary.tables, summary.tables_created
        );
    }

    if let Some(path) = &args.links {
        println!("Loading product links from: {}", path.display());

        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = ProductLinkLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;

        let linked = ProductLinkLoader::load(&repo, &records)
            .await
            .context("Failed to load product links into database")?;

        println!("Linked {} products to price tables.", linked);
    }

    if args.file.is_none() && args.links.is_none() && !args.migrate && args.seeds.is_none() {
        println!("Nothing to do; pass --file, --links, --migrate or --seeds.");
    }

    Ok(())
}
