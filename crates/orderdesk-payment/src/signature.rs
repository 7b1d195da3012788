//! Webhook signature verification.
//!
//! The gateway signs each webhook delivery with a header of the form
//! `t=<unix seconds>,v1=<hex HMAC-SHA256 of "<t>.<payload>">`. Verification
//! checks the timestamp against a tolerance window before checking the MAC,
//! so replayed deliveries age out.

use crate::PaymentError;
use hmac::{Hmac, Mac};
use orderdesk_types::SecretString;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age (or clock skew) of a signed delivery, in seconds.
pub const TOLERANCE_SECS: i64 = 300;

/// Verifies a signature header against the payload and secret.
pub fn verify(
	payload: &[u8],
	signature_header: &str,
	secret: &SecretString,
) -> Result<(), PaymentError> {
	verify_at(
		payload,
		signature_header,
		secret,
		chrono::Utc::now().timestamp(),
	)
}

/// Verification against an explicit clock, used by tests.
pub fn verify_at(
	payload: &[u8],
	signature_header: &str,
	secret: &SecretString,
	now: i64,
) -> Result<(), PaymentError> {
	let (timestamp, expected) = parse_header(signature_header)?;

	if (now - timestamp).abs() > TOLERANCE_SECS {
		return Err(PaymentError::InvalidSignature(
			"timestamp outside the tolerance window".to_string(),
		));
	}

	let expected_bytes = hex::decode(expected)
		.map_err(|_| PaymentError::InvalidSignature("signature is not hex".to_string()))?;

	let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
		.map_err(|e| PaymentError::Configuration(format!("Invalid webhook secret: {}", e)))?;
	mac.update(timestamp.to_string().as_bytes());
	mac.update(b".");
	mac.update(payload);
	mac.verify_slice(&expected_bytes)
		.map_err(|_| PaymentError::InvalidSignature("signature mismatch".to_string()))
}

/// Produces a signature header for a payload.
///
/// Used by tests and local tooling to fabricate valid deliveries.
pub fn sign(payload: &[u8], secret: &SecretString, timestamp: i64) -> String {
	let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
		.expect("HMAC accepts keys of any length");
	mac.update(timestamp.to_string().as_bytes());
	mac.update(b".");
	mac.update(payload);
	let digest = hex::encode(mac.finalize().into_bytes());
	format!("t={},v1={}", timestamp, digest)
}

fn parse_header(header: &str) -> Result<(i64, &str), PaymentError> {
	let mut timestamp = None;
	let mut signature = None;

	for part in header.split(',') {
		match part.split_once('=') {
			Some(("t", value)) => {
				timestamp = value.parse::<i64>().ok();
			},
			Some(("v1", value)) => {
				signature = Some(value);
			},
			_ => {},
		}
	}

	match (timestamp, signature) {
		(Some(t), Some(v1)) => Ok((t, v1)),
		_ => Err(PaymentError::InvalidSignature(
			"header is missing t= or v1=".to_string(),
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const SECRET: &str = "whsec_test_secret";
	const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;

	#[test]
	fn valid_signature_accepted() {
		let secret = SecretString::from(SECRET);
		let header = sign(PAYLOAD, &secret, 1_700_000_000);
		assert!(verify_at(PAYLOAD, &header, &secret, 1_700_000_010).is_ok());
	}

	#[test]
	fn tampered_payload_rejected() {
		let secret = SecretString::from(SECRET);
		let header = sign(PAYLOAD, &secret, 1_700_000_000);
		let tampered = br#"{"id":"evt_1","type":"payment_intent.refunded"}"#;
		let err = verify_at(tampered, &header, &secret, 1_700_000_010).unwrap_err();
		assert!(matches!(err, PaymentError::InvalidSignature(_)));
	}

	#[test]
	fn wrong_secret_rejected() {
		let header = sign(PAYLOAD, &SecretString::from(SECRET), 1_700_000_000);
		let other = SecretString::from("whsec_other");
		let err = verify_at(PAYLOAD, &header, &other, 1_700_000_010).unwrap_err();
		assert!(matches!(err, PaymentError::InvalidSignature(_)));
	}

	#[test]
	fn stale_timestamp_rejected() {
		let secret = SecretString::from(SECRET);
		let header = sign(PAYLOAD, &secret, 1_700_000_000);
		let err = verify_at(
			PAYLOAD,
			&header,
			&secret,
			1_700_000_000 + TOLERANCE_SECS + 1,
		)
		.unwrap_err();
		assert!(matches!(err, PaymentError::InvalidSignature(_)));
	}

	#[test]
	fn malformed_header_rejected() {
		let secret = SecretString::from(SECRET);
		for header in ["", "t=123", "v1=abcd", "t=abc,v1=abcd"] {
			let err = verify_at(PAYLOAD, header, &secret, 1_700_000_000).unwrap_err();
			assert!(matches!(err, PaymentError::InvalidSignature(_)));
		}
	}
}
