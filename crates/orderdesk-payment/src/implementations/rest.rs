//! REST Payment Gateway backend.
//!
//! Talks to the gateway's HTTP API: intents created via a form-encoded POST
//! authorized by a bearer key. Amounts travel as-is in minor units.

use crate::{PaymentError, PaymentGatewayInterface, PaymentIntent};
use async_trait::async_trait;
use orderdesk_types::{ConfigSchema, Field, FieldType, Schema, SecretString, ValidationError};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Name of this implementation in configuration files.
pub const NAME: &str = "rest";

/// Request timeout applied to every gateway call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the REST gateway backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RestPaymentGatewayConfig {
	/// Secret API key presented as a bearer token.
	pub api_key: SecretString,
	/// Root URL of the gateway API.
	pub base_url: String,
	/// Secret used to verify webhook signatures.
	#[serde(default)]
	pub webhook_secret: Option<SecretString>,
}

/// REST Payment Gateway implementation.
pub struct RestPaymentGateway {
	client: reqwest::Client,
	config: RestPaymentGatewayConfig,
}

#[derive(Debug, Deserialize)]
struct IntentBody {
	id: String,
	client_secret: String,
}

impl RestPaymentGateway {
	/// Creates a new REST gateway backend from validated configuration.
	pub fn new(config: RestPaymentGatewayConfig) -> Result<Self, PaymentError> {
		let client = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| PaymentError::Configuration(e.to_string()))?;
		Ok(Self { client, config })
	}
}

#[async_trait]
impl PaymentGatewayInterface for RestPaymentGateway {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(RestPaymentGatewaySchema)
	}

	async fn create_payment_intent(
		&self,
		amount_minor: i64,
		currency: &str,
		metadata: &HashMap<String, String>,
	) -> Result<PaymentIntent, PaymentError> {
		let url = format!("{}/payment_intents", self.config.base_url.trim_end_matches('/'));

		let mut form: Vec<(String, String)> = vec![
			("amount".to_string(), amount_minor.to_string()),
			("currency".to_string(), currency.to_string()),
		];
		for (key, value) in metadata {
			form.push((format!("metadata[{}]", key), value.clone()));
		}

		let response = self
			.client
			.post(url)
			.bearer_auth(self.config.api_key.expose_secret())
			.form(&form)
			.send()
			.await
			.map_err(|e| PaymentError::Gateway(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			tracing::warn!(status = %status, body = %body, "Payment intent creation failed");
			return Err(PaymentError::Gateway(format!(
				"intent creation returned {}",
				status
			)));
		}

		let body: IntentBody = response
			.json()
			.await
			.map_err(|e| PaymentError::Gateway(format!("Unparseable intent response: {}", e)))?;

		Ok(PaymentIntent {
			id: body.id,
			client_secret: body.client_secret,
		})
	}

	fn webhook_secret(&self) -> Option<SecretString> {
		self.config.webhook_secret.clone()
	}
}

/// Configuration schema for the REST gateway backend.
pub struct RestPaymentGatewaySchema;

impl ConfigSchema for RestPaymentGatewaySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let non_empty = |v: &toml::Value| {
			if v.as_str().is_some_and(str::is_empty) {
				Err("must not be empty".to_string())
			} else {
				Ok(())
			}
		};
		Schema::new(
			vec![
				Field::new("api_key", FieldType::Str).with_validator(non_empty),
				Field::new("base_url", FieldType::Str).with_validator(non_empty),
			],
			vec![Field::new("webhook_secret", FieldType::Str)],
		)
		.validate(config)
	}
}

/// Factory function to create a REST gateway backend from configuration.
pub fn create_payment_gateway(
	config: &toml::Value,
) -> Result<Box<dyn PaymentGatewayInterface>, PaymentError> {
	RestPaymentGatewaySchema
		.validate(config)
		.map_err(|e| PaymentError::Configuration(e.to_string()))?;
	let parsed: RestPaymentGatewayConfig = config
		.clone()
		.try_into()
		.map_err(|e| PaymentError::Configuration(format!("Invalid rest config: {}", e)))?;
	Ok(Box::new(RestPaymentGateway::new(parsed)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(s: &str) -> toml::Value {
		s.parse().unwrap()
	}

	#[test]
	fn schema_requires_key_and_url() {
		let schema = RestPaymentGatewaySchema;
		assert!(schema
			.validate(&parse(
				"api_key = \"sk_test\"\nbase_url = \"https://payments.example.com/v1\""
			))
			.is_ok());
		assert!(schema.validate(&parse("api_key = \"sk_test\"")).is_err());
	}

	#[test]
	fn factory_rejects_empty_key() {
		let result = create_payment_gateway(&parse(
			"api_key = \"\"\nbase_url = \"https://payments.example.com/v1\"",
		));
		assert!(matches!(result, Err(PaymentError::Configuration(_))));
	}
}
