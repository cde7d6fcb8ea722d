mod config;
mod grib;
mod ingest;
mod source;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use forecast_store::ForecastStore;
use tracing::info;

use crate::ingest::Ingester;
use crate::source::HttpGribSource;

#[derive(Parser, Debug)]
#[command(name = "rain-ingester")]
#[command(about = "Fetches NWP precipitation forecasts and stores monthly rain projections")]
struct Args {
    /// Directory holding stations.yaml and models/
    #[arg(long, env = "RAIN_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// SQLite database path
    #[arg(long, env = "RAIN_DB_PATH", default_value = "data/forecasts.db")]
    db_path: PathBuf,

    /// Only ingest this model id
    #[arg(long)]
    model: Option<String>,

    /// Log level filter
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&args.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let stations = config::load_stations(&args.config_dir)?;
    let mut profiles = config::load_model_profiles(&args.config_dir)?;
    if let Some(only) = &args.model {
        profiles.retain(|p| &p.id == only);
        anyhow::ensure!(!profiles.is_empty(), "unknown model id: {only}");
    }
    info!(
        stations = stations.len(),
        models = profiles.len(),
        "Loaded configuration"
    );

    let store = Arc::new(
        ForecastStore::open(&args.db_path)
            .await
            .with_context(|| format!("opening store at {}", args.db_path.display()))?,
    );
    let source = Arc::new(HttpGribSource::new().context("building HTTP source")?);

    let ingester = Ingester::new(stations, profiles, source, store);
    ingester.run_all().await?;

    info!("Ingestion cycle complete");
    Ok(())
}
