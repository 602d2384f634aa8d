mod nearby;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nearbuy_core::{DEFAULT_MAX_DISTANCE_KM, DEFAULT_PAGE, DEFAULT_PER_PAGE};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nearbuy-cli")]
#[command(about = "NearBuy command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Load a YAML catalog and upsert it into the database
    Seed {
        #[arg(
            long,
            env = "NEARBUY_CATALOG_PATH",
            default_value = "./config/catalog.yaml"
        )]
        file: PathBuf,
    },
    /// List shops near a point, nearest first
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Search radius in kilometres
        #[arg(long, default_value_t = DEFAULT_MAX_DISTANCE_KM)]
        radius: f64,
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: i64,
        #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
        per_page: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let log_level = std::env::var("NEARBUY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("nearbuy-cli: run with --help to list commands");
        return Ok(());
    };

    match command {
        Commands::Migrate => {
            let pool = nearbuy_db::connect_pool_from_env().await?;
            let applied = nearbuy_db::run_migrations(&pool).await?;
            tracing::info!(applied, "migrations complete");
            println!("applied {applied} migration(s)");
        }
        Commands::Seed { file } => {
            let catalog = nearbuy_core::load_catalog(&file)?;
            let pool = nearbuy_db::connect_pool_from_env().await?;
            let summary = nearbuy_db::seed_catalog(&pool, &catalog).await?;
            tracing::info!(path = %file.display(), ?summary, "catalog seeded");
            println!(
                "seeded {} categories, {} products ({} images), {} shops, {} stock lines",
                summary.categories,
                summary.products,
                summary.images,
                summary.shops,
                summary.stock_lines
            );
        }
        Commands::Nearby {
            lat,
            lng,
            radius,
            page,
            per_page,
        } => {
            let query = nearby::NearbyQuery::new(lat, lng, radius, page, per_page)?;
            let pool = nearbuy_db::connect_pool_from_env().await?;
            nearby::run_nearby(&pool, &query).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
