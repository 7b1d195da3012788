//! Configuration for the order workflow service.
//!
//! Configuration is loaded from a TOML file with environment-variable
//! interpolation, then validated so that a misconfigured service fails at
//! startup with a configuration error rather than failing per-request.

use regex::Regex;
use serde::{Deserialize, Serialize};
use orderdesk_types::TableNames;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error during file I/O.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error during configuration validation.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration for the order workflow service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this service instance.
	pub service: ServiceConfig,
	/// Record Store collaborator configuration.
	pub records: RecordsConfig,
	/// Payment Gateway collaborator configuration.
	pub payment: PaymentConfig,
	/// HTTP API server configuration.
	pub api: Option<ApiConfig>,
}

/// Identity of this service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this instance, used in logs.
	pub id: String,
}

/// Record Store collaborator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordsConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Tables this workflow reads and writes.
	pub tables: TableNames,
	/// Map of implementation names to their raw configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Payment Gateway collaborator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of implementation names to their raw configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// HTTP API server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

/// Resolves environment variables in a configuration string.
///
/// Replaces `${VAR_NAME}` with the variable's value and supports defaults
/// with `${VAR_NAME:-default_value}`. A referenced variable without a
/// default that is not set is a validation error.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Bound the input so a pathological file cannot stall the regex
	const MAX_INPUT_SIZE: usize = 256 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes",
			input.len()
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply in reverse order to keep byte offsets valid
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a TOML file.
	///
	/// Environment variables are resolved and the configuration is validated
	/// after parsing.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let raw = tokio::fs::read_to_string(path).await?;
		raw.parse()
	}

	/// Validates the configuration.
	///
	/// Checks that the service id is set, that each collaborator names a
	/// primary implementation that exists in its implementations map, and
	/// that both table names are present.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service id cannot be empty".into()));
		}

		if self.records.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one records implementation must be configured".into(),
			));
		}
		if !self
			.records
			.implementations
			.contains_key(&self.records.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary records implementation '{}' not found in implementations",
				self.records.primary
			)));
		}
		if self.records.tables.catalog.is_empty() || self.records.tables.sales.is_empty() {
			return Err(ConfigError::Validation(
				"Record Store table names cannot be empty".into(),
			));
		}

		if self.payment.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one payment implementation must be configured".into(),
			));
		}
		if !self
			.payment
			.implementations
			.contains_key(&self.payment.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary payment implementation '{}' not found in implementations",
				self.payment.primary
			)));
		}

		Ok(())
	}

	/// Returns the raw configuration table for the primary records
	/// implementation.
	pub fn primary_records_config(&self) -> &toml::Value {
		&self.records.implementations[&self.records.primary]
	}

	/// Returns the raw configuration table for the primary payment
	/// implementation.
	pub fn primary_payment_config(&self) -> &toml::Value {
		&self.payment.implementations[&self.payment.primary]
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE_CONFIG: &str = r#"
[service]
id = "orderdesk-test"

[records]
primary = "memory"
[records.tables]
catalog = "Products"
sales = "Sales"
[records.implementations.memory]

[payment]
primary = "mock"
[payment.implementations.mock]

[api]
enabled = true
"#;

	#[test]
	fn env_var_resolution() {
		std::env::set_var("ORDERDESK_TEST_HOST", "localhost");
		std::env::set_var("ORDERDESK_TEST_PORT", "5432");

		let input = "host = \"${ORDERDESK_TEST_HOST}:${ORDERDESK_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("ORDERDESK_TEST_HOST");
		std::env::remove_var("ORDERDESK_TEST_PORT");
	}

	#[test]
	fn env_var_with_default() {
		let input = "value = \"${ORDERDESK_MISSING_VAR:-fallback}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"fallback\"");
	}

	#[test]
	fn missing_env_var_is_an_error() {
		let input = "value = \"${ORDERDESK_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("ORDERDESK_MISSING_VAR"));
	}

	#[test]
	fn base_config_parses_with_defaults() {
		let config: Config = BASE_CONFIG.parse().unwrap();
		assert_eq!(config.service.id, "orderdesk-test");
		assert_eq!(config.records.tables.sales, "Sales");

		let api = config.api.unwrap();
		assert!(api.enabled);
		assert_eq!(api.host, "127.0.0.1");
		assert_eq!(api.port, 3000);
	}

	#[test]
	fn unknown_primary_rejected() {
		let broken = BASE_CONFIG.replace("primary = \"memory\"", "primary = \"rest\"");
		let result = broken.parse::<Config>();
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("Primary records implementation 'rest' not found"));
	}

	#[test]
	fn empty_service_id_rejected() {
		let broken = BASE_CONFIG.replace("id = \"orderdesk-test\"", "id = \"\"");
		assert!(broken.parse::<Config>().is_err());
	}

	#[test]
	fn empty_table_name_rejected() {
		let broken = BASE_CONFIG.replace("sales = \"Sales\"", "sales = \"\"");
		assert!(broken.parse::<Config>().is_err());
	}
}
