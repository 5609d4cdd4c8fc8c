//! Command-line interface parsing for fleetfuel
//!
//! This module handles parsing of CLI arguments using clap. Every setting can
//! also be supplied through the environment (or a `.env` file), which is how
//! the service is normally deployed.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::cache::PriceCacheStore;
use crate::data::openai::{OpenAiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The request timeout must be positive
    #[error("Invalid timeout: must be at least 1 second")]
    InvalidTimeout,

    /// No cache file was given and no default location could be determined
    #[error("Could not determine a cache file location; pass --cache-file or set FUEL_PRICE_CACHE_FILE")]
    NoCacheLocation,
}

/// Fleet fuel savings calculator API
#[derive(Parser, Debug)]
#[command(name = "fleetfuel")]
#[command(about = "Fleet fuel savings calculator with cached monthly VLSFO prices")]
#[command(version)]
pub struct Cli {
    /// API key for the price estimation service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Chat model used for price estimates
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub api_base_url: String,

    /// Timeout for a single estimation request, in seconds
    #[arg(long, env = "FUEL_PRICE_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Retries after a timeout, rate limit or server error
    #[arg(long, env = "FUEL_PRICE_MAX_RETRIES", default_value_t = 1, global = true)]
    pub max_retries: u32,

    /// JSON file holding cached monthly prices
    #[arg(long, env = "FUEL_PRICE_CACHE_FILE", value_name = "PATH", global = true)]
    pub cache_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// What to run
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
        bind: SocketAddr,
    },
    /// Print last month's VLSFO price as JSON and exit
    Price,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Settings for the OpenAI price source
    pub openai: OpenAiConfig,
    /// Location of the price cache file
    pub cache_file: PathBuf,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// A missing API key is not an error here; price lookups report it per
    /// request instead.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with the resolved settings
    /// * `Err(CliError)` if a setting is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.timeout_secs == 0 {
            return Err(CliError::InvalidTimeout);
        }

        let cache_file = match &cli.cache_file {
            Some(path) => path.clone(),
            None => PriceCacheStore::default_path().ok_or(CliError::NoCacheLocation)?,
        };

        Ok(StartupConfig {
            openai: OpenAiConfig {
                api_key: cli.api_key.clone().filter(|key| !key.trim().is_empty()),
                model: cli.model.clone(),
                base_url: cli.api_base_url.clone(),
                timeout: Duration::from_secs(cli.timeout_secs),
                max_retries: cli.max_retries,
            },
            cache_file,
        })
    }
}
