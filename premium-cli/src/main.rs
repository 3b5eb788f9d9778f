use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use premium_cli::config::{AppConfig, Overrides};
use premium_cli::{app, logging};
use premium_core::pricing::ProductPricer;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Monthly health-plan premiums by age bracket.
///
/// Connects to the configured database (an in-memory SQLite with demo data
/// by default) and prints quotes.
#[derive(Debug, Parser)]
#[command(name = "premium", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `premiums.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level or EnvFilter directive. RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Attempts per data-store read, including the first.
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Price every product for an age bucket such as `29-33` or `59+`.
    Quote {
        #[arg(long)]
        bucket: String,
    },
    /// Price one product for an explicit age.
    Price {
        #[arg(long)]
        product: i64,
        #[arg(long)]
        age: u32,
    },
    /// List products and the table each one is priced from.
    Products,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            backend: self.backend.clone(),
            connection_string: self.db.clone(),
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
            max_attempts: self.max_attempts,
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::resolve(cli.config.as_deref(), &cli.overrides())?;
    logging::init(&config.logging)?;

    debug!(backend = %config.database.backend, "connecting");
    let registry = app::build_registry();
    let repo = registry
        .create(&config.database)
        .await
        .with_context(|| format!("cannot open '{}' backend", config.database.backend))?;
    let pricer = ProductPricer::new(&*repo).with_retry(config.retry.clone());

    match cli.command {
        Command::Quote { bucket } => {
            let quote = pricer.quote(&bucket).await?;
            print!("{}", app::render_quote(&quote));
        }
        Command::Price { product, age } => {
            let (product, resolution) = app::price_product(&*repo, &pricer, product, age).await?;
            print!("{}", app::render_price(&product, age, &resolution));
        }
        Command::Products => {
            let listings = app::list_products(&*repo, &config.retry).await?;
            print!("{}", app::render_products(&listings));
        }
    }

    Ok(())
}
