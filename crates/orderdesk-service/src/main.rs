//! Main entry point for the order workflow service.
//!
//! This binary wires the configured collaborator implementations into the
//! order workflow and serves the HTTP API.

use clap::Parser;
use orderdesk_config::Config;
use orderdesk_core::OrderWorkflow;
use orderdesk_payment::PaymentService;
use orderdesk_records::RecordStoreService;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

/// Command-line arguments for the order workflow service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the order workflow service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads and validates configuration
/// 4. Builds the workflow with the configured implementations
/// 5. Serves the HTTP API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.init();

	tracing::info!("Started order workflow service");

	// Load configuration
	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	// Build the workflow with the configured implementations
	let workflow = Arc::new(build_workflow(&config)?);

	let api_config = match &config.api {
		Some(api) if api.enabled => api.clone(),
		_ => {
			return Err("API server is disabled; nothing to run".into());
		},
	};

	server::start_server(api_config, workflow).await?;

	tracing::info!("Stopped order workflow service");
	Ok(())
}

/// Builds the order workflow from configuration.
///
/// Looks up each collaborator's primary implementation in the registered
/// factories and constructs it from its own configuration table. Factories
/// validate their configuration, so a bad credential set fails here, before
/// any request is served.
fn build_workflow(config: &Config) -> Result<OrderWorkflow, Box<dyn std::error::Error>> {
	let record_factories: HashMap<_, _> = orderdesk_records::get_all_implementations()
		.into_iter()
		.collect();
	let record_factory = record_factories
		.get(config.records.primary.as_str())
		.ok_or_else(|| {
			format!(
				"Unknown records implementation '{}'",
				config.records.primary
			)
		})?;
	let record_backend = record_factory(config.primary_records_config())?;
	tracing::info!(implementation = %config.records.primary, "Initialized Record Store");

	let payment_factories: HashMap<_, _> = orderdesk_payment::get_all_implementations()
		.into_iter()
		.collect();
	let payment_factory = payment_factories
		.get(config.payment.primary.as_str())
		.ok_or_else(|| {
			format!(
				"Unknown payment implementation '{}'",
				config.payment.primary
			)
		})?;
	let payment_backend = payment_factory(config.primary_payment_config())?;
	tracing::info!(implementation = %config.payment.primary, "Initialized Payment Gateway");

	Ok(OrderWorkflow::new(
		Arc::new(RecordStoreService::new(record_backend)),
		Arc::new(PaymentService::new(payment_backend)),
		config.records.tables.clone(),
	))
}
