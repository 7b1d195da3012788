//! Mock Payment Gateway for testing and development.
//!
//! Issues synthetic payment intents without contacting anything, records
//! the last amount it saw so tests can assert no conversion happened, and
//! can be configured to fail every intent.

use crate::{PaymentError, PaymentGatewayInterface, PaymentIntent};
use async_trait::async_trait;
use orderdesk_types::{ConfigSchema, Schema, SecretString, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Name of this implementation in configuration files.
pub const NAME: &str = "mock";

/// Configuration for the mock gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockPaymentGatewayConfig {
	/// When true every intent creation fails with a gateway error.
	#[serde(default)]
	pub fail_intents: bool,
	/// Webhook secret accepted by this mock.
	#[serde(default = "default_webhook_secret")]
	pub webhook_secret: Option<String>,
}

fn default_webhook_secret() -> Option<String> {
	Some("whsec_mock".to_string())
}

impl Default for MockPaymentGatewayConfig {
	fn default() -> Self {
		Self {
			fail_intents: false,
			webhook_secret: default_webhook_secret(),
		}
	}
}

/// Mock Payment Gateway implementation.
pub struct MockPaymentGateway {
	config: MockPaymentGatewayConfig,
	/// Last amount passed in, for test assertions.
	last_amount: Mutex<Option<i64>>,
}

impl MockPaymentGateway {
	/// Creates a new mock gateway with the given configuration.
	pub fn new(config: MockPaymentGatewayConfig) -> Self {
		Self {
			config,
			last_amount: Mutex::new(None),
		}
	}

	/// Returns the amount from the most recent intent creation.
	pub fn last_amount(&self) -> Option<i64> {
		*self.last_amount.lock().unwrap()
	}
}

#[async_trait]
impl PaymentGatewayInterface for MockPaymentGateway {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockPaymentGatewaySchema)
	}

	async fn create_payment_intent(
		&self,
		amount_minor: i64,
		currency: &str,
		_metadata: &HashMap<String, String>,
	) -> Result<PaymentIntent, PaymentError> {
		if self.config.fail_intents {
			return Err(PaymentError::Gateway(
				"mock gateway is configured to fail".to_string(),
			));
		}

		*self.last_amount.lock().unwrap() = Some(amount_minor);

		let id = format!("pi_{}", Uuid::new_v4().simple());
		tracing::debug!(intent_id = %id, amount = amount_minor, currency, "Created mock intent");
		Ok(PaymentIntent {
			client_secret: format!("{}_secret_{}", id, Uuid::new_v4().simple()),
			id,
		})
	}

	fn webhook_secret(&self) -> Option<SecretString> {
		self.config
			.webhook_secret
			.as_deref()
			.map(SecretString::from)
	}
}

/// Configuration schema for the mock gateway.
pub struct MockPaymentGatewaySchema;

impl ConfigSchema for MockPaymentGatewaySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// All fields optional
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create a mock gateway from configuration.
pub fn create_payment_gateway(
	config: &toml::Value,
) -> Result<Box<dyn PaymentGatewayInterface>, PaymentError> {
	let parsed: MockPaymentGatewayConfig = config
		.clone()
		.try_into()
		.map_err(|e| PaymentError::Configuration(format!("Invalid mock config: {}", e)))?;
	Ok(Box::new(MockPaymentGateway::new(parsed)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn intents_carry_distinct_ids() {
		let gateway = MockPaymentGateway::new(MockPaymentGatewayConfig::default());
		let a = gateway
			.create_payment_intent(100, "usd", &HashMap::new())
			.await
			.unwrap();
		let b = gateway
			.create_payment_intent(100, "usd", &HashMap::new())
			.await
			.unwrap();
		assert_ne!(a.id, b.id);
		assert!(a.client_secret.starts_with(&a.id));
	}

	#[tokio::test]
	async fn configured_failure_surfaces_as_gateway_error() {
		let gateway = MockPaymentGateway::new(MockPaymentGatewayConfig {
			fail_intents: true,
			..Default::default()
		});
		let err = gateway
			.create_payment_intent(100, "usd", &HashMap::new())
			.await
			.unwrap_err();
		assert!(matches!(err, PaymentError::Gateway(_)));
	}
}
