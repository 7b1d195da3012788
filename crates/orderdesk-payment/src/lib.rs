//! Payment Gateway collaborator for the order workflow manager.
//!
//! The gateway owns money movement. This crate provides the abstraction
//! over it (payment-intent creation and webhook signature verification), a
//! REST backend for production and a mock for tests. Amounts are always in
//! the minor currency unit on the way in; nothing here converts them.

use async_trait::async_trait;
use orderdesk_types::{ConfigSchema, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub mod signature;

/// Re-export implementations
pub mod implementations {
	pub mod mock;
	pub mod rest;
}

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
	/// The requested amount is missing or not positive.
	#[error("Invalid amount: {0} (must be a positive integer in minor units)")]
	InvalidAmount(i64),
	/// The currency code is missing.
	#[error("Invalid currency: must not be empty")]
	InvalidCurrency,
	/// A webhook payload failed signature verification.
	#[error("Invalid webhook signature: {0}")]
	InvalidSignature(String),
	/// The gateway call failed or returned a non-success status.
	#[error("Gateway error: {0}")]
	Gateway(String),
	/// The implementation configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// A payment intent created at the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
	/// Gateway-assigned identifier.
	pub id: String,
	/// Client-usable secret for confirming the intent.
	pub client_secret: String,
}

/// A webhook event whose signature has been verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
	/// Gateway-assigned event identifier.
	pub id: String,
	/// Event type label (e.g. "payment_intent.succeeded").
	#[serde(rename = "type")]
	pub event_type: String,
	/// Event payload.
	#[serde(default)]
	pub data: serde_json::Value,
}

/// Trait defining the interface to a Payment Gateway backend.
#[async_trait]
pub trait PaymentGatewayInterface: Send + Sync {
	/// Returns the configuration schema for this backend.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Creates a payment intent for the given amount in minor units.
	///
	/// The amount has already been validated as positive by the service
	/// wrapper; backends pass it through untouched.
	async fn create_payment_intent(
		&self,
		amount_minor: i64,
		currency: &str,
		metadata: &HashMap<String, String>,
	) -> Result<PaymentIntent, PaymentError>;

	/// Returns the secret used to verify webhook signatures, if configured.
	fn webhook_secret(&self) -> Option<SecretString>;
}

/// Type alias for Payment Gateway factory functions.
pub type PaymentGatewayFactory =
	fn(&toml::Value) -> Result<Box<dyn PaymentGatewayInterface>, PaymentError>;

/// Get all registered Payment Gateway implementations.
pub fn get_all_implementations() -> Vec<(&'static str, PaymentGatewayFactory)> {
	use implementations::{mock, rest};

	vec![
		(rest::NAME, rest::create_payment_gateway as PaymentGatewayFactory),
		(
			mock::NAME,
			mock::create_payment_gateway as PaymentGatewayFactory,
		),
	]
}

/// High-level payment service.
///
/// Wraps a gateway backend, rejecting invalid input before any gateway call
/// and verifying webhook signatures against the configured secret.
pub struct PaymentService {
	/// The underlying gateway implementation.
	backend: Box<dyn PaymentGatewayInterface>,
}

impl PaymentService {
	/// Creates a new service with the specified backend.
	pub fn new(backend: Box<dyn PaymentGatewayInterface>) -> Self {
		Self { backend }
	}

	/// Creates a payment intent.
	///
	/// The amount must be a positive integer already expressed in the minor
	/// currency unit; non-positive amounts are rejected here, before the
	/// gateway is contacted.
	pub async fn create_intent(
		&self,
		amount_minor: i64,
		currency: &str,
		metadata: &HashMap<String, String>,
	) -> Result<PaymentIntent, PaymentError> {
		if amount_minor <= 0 {
			return Err(PaymentError::InvalidAmount(amount_minor));
		}
		if currency.trim().is_empty() {
			return Err(PaymentError::InvalidCurrency);
		}
		self.backend
			.create_payment_intent(amount_minor, currency, metadata)
			.await
	}

	/// Verifies a webhook payload against its signature header and parses
	/// the event.
	pub fn verify_webhook(
		&self,
		payload: &[u8],
		signature_header: &str,
	) -> Result<WebhookEvent, PaymentError> {
		let secret = self.backend.webhook_secret().ok_or_else(|| {
			PaymentError::Configuration("Webhook secret is not configured".to_string())
		})?;

		signature::verify(payload, signature_header, &secret)?;

		serde_json::from_slice(payload)
			.map_err(|e| PaymentError::Gateway(format!("Unparseable webhook payload: {}", e)))
	}
}

#[cfg(test)]
mod tests {
	use super::implementations::mock::{MockPaymentGateway, MockPaymentGatewayConfig};
	use super::*;

	fn service() -> PaymentService {
		PaymentService::new(Box::new(MockPaymentGateway::new(
			MockPaymentGatewayConfig::default(),
		)))
	}

	#[tokio::test]
	async fn zero_amount_rejected_before_the_gateway() {
		let err = service()
			.create_intent(0, "usd", &HashMap::new())
			.await
			.unwrap_err();
		assert!(matches!(err, PaymentError::InvalidAmount(0)));
	}

	#[tokio::test]
	async fn negative_amount_rejected() {
		let err = service()
			.create_intent(-5, "usd", &HashMap::new())
			.await
			.unwrap_err();
		assert!(matches!(err, PaymentError::InvalidAmount(-5)));
	}

	#[tokio::test]
	async fn empty_currency_rejected() {
		let err = service()
			.create_intent(100, " ", &HashMap::new())
			.await
			.unwrap_err();
		assert!(matches!(err, PaymentError::InvalidCurrency));
	}

	#[tokio::test]
	async fn valid_amount_yields_intent() {
		let intent = service()
			.create_intent(100, "usd", &HashMap::new())
			.await
			.unwrap();
		assert!(!intent.id.is_empty());
		assert!(!intent.client_secret.is_empty());
	}

	#[tokio::test]
	async fn amount_is_passed_through_unmultiplied() {
		// 3800 minor units must reach the gateway as 3800, not 380000.
		let gateway = MockPaymentGateway::new(MockPaymentGatewayConfig::default());
		let intent = gateway
			.create_payment_intent(3800, "usd", &HashMap::new())
			.await
			.unwrap();
		assert_eq!(gateway.last_amount(), Some(3800));
		assert!(!intent.id.is_empty());
	}
}
