//! Payment endpoints: intent creation and webhook intake.

use axum::{
	body::Bytes,
	extract::State,
	http::HeaderMap,
	response::Json,
};
use orderdesk_types::{
	ApiError, CreatePaymentIntentRequest, CreatePaymentIntentResponse, WebhookAck,
};

use crate::apis::map_workflow_error;
use crate::server::AppState;

/// Header carrying the gateway's webhook signature.
pub const SIGNATURE_HEADER: &str = "payment-signature";

/// Handles POST /api/payments/intents requests.
///
/// The amount is already in minor units; no conversion happens on this
/// path. Non-positive amounts are rejected before the gateway is called.
pub async fn create_payment_intent(
	State(state): State<AppState>,
	Json(request): Json<CreatePaymentIntentRequest>,
) -> Result<Json<CreatePaymentIntentResponse>, ApiError> {
	match state.workflow.create_payment_intent(request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Payment intent creation failed: {}", e);
			Err(map_workflow_error(e))
		},
	}
}

/// Handles POST /api/webhooks/payment requests.
///
/// The raw body is verified against the signature header before the event
/// is parsed; unverifiable deliveries are rejected with 400.
pub async fn payment_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
	let signature = headers
		.get(SIGNATURE_HEADER)
		.and_then(|value| value.to_str().ok())
		.ok_or_else(|| ApiError::BadRequest {
			error_type: "INVALID_SIGNATURE".to_string(),
			message: format!("Missing {} header", SIGNATURE_HEADER),
		})?;

	match state.workflow.verify_payment_webhook(&body, signature) {
		Ok(_event) => Ok(Json(WebhookAck { received: true })),
		Err(e) => {
			tracing::warn!("Webhook rejected: {}", e);
			Err(map_workflow_error(e))
		},
	}
}
