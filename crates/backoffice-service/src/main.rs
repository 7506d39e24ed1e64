//! Main entry point for the back-office service.
//!
//! Loads configuration, builds the back office with the configured storage
//! backend and serves the HTTP API until interrupted. Without an enabled
//! `[api]` section the service only keeps tracking orders loaded by other
//! means until Ctrl-C.

use backoffice_config::Config;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod factory_registry;
mod server;

/// Command-line arguments for the back-office service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/backoffice.toml", env = "BACKOFFICE_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the back-office service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the back office with the configured storage
/// 5. Serves the API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started back office");

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Configuration path is not valid UTF-8: {:?}", args.config))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let back_office = Arc::new(factory_registry::build_back_office(config.clone())?);
	back_office.initialize().await?;

	match config.enabled_api() {
		Some(api_config) => {
			let api_task = server::start_server(api_config.clone(), Arc::clone(&back_office));
			tokio::select! {
				result = api_task => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Received shutdown signal");
				}
			}
		},
		None => {
			tracing::info!("API disabled, waiting for shutdown signal");
			tokio::signal::ctrl_c().await?;
		},
	}

	back_office.shutdown().await?;
	tracing::info!("Stopped back office");
	Ok(())
}
