//! Fleetfuel - fleet fuel savings calculator API
//!
//! Serves the calculator endpoints and last month's VLSFO price, estimated by
//! a language model at most once per month and cached on disk.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetfuel::cache::PriceCacheStore;
use fleetfuel::cli::{Cli, Command, StartupConfig};
use fleetfuel::data::{OpenAiClient, PriceQueryResult, PriceSource};
use fleetfuel::estimator::PriceEstimator;
use fleetfuel::server::{self, AppState};

/// Sets up logging from `RUST_LOG`, defaulting to info for this crate
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetfuel=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Builds the estimator from startup configuration
fn build_estimator(config: StartupConfig) -> Result<PriceEstimator, Box<dyn std::error::Error>> {
    let source = OpenAiClient::new(config.openai)?;
    if !source.has_credential() {
        warn!("OPENAI_API_KEY is not set; fuel price lookups will report a missing credential");
    }

    let cache = PriceCacheStore::new(config.cache_file);
    info!(path = %cache.path().display(), "using fuel price cache");

    Ok(PriceEstimator::new(cache, Arc::new(source)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing();

    let config = StartupConfig::from_cli(&cli)?;
    let estimator = build_estimator(config)?;

    match cli.command {
        Command::Price => {
            let result: PriceQueryResult = estimator.current_price().await.into();
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Serve { bind } => {
            let app = server::router(Arc::new(AppState { estimator }));
            let listener = tokio::net::TcpListener::bind(bind).await?;
            info!("fleetfuel listening on http://{}", listener.local_addr()?);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    Ok(())
}
