//! API types for the order workflow HTTP surface.
//!
//! This module defines the request and response bodies for the order and
//! payment endpoints, plus the structured error type the handlers map
//! workflow failures into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::order::{LineItem, OrderStatus};

/// Customer identity as submitted by the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInput {
	#[serde(rename = "firstName")]
	pub first_name: String,
	#[serde(rename = "lastName")]
	pub last_name: String,
	pub email: String,
	pub phone: Option<String>,
}

/// Structured shipping address as submitted by the storefront.
///
/// Composed into a single display line at order creation; the structured
/// form is not retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressInput {
	pub street: String,
	pub unit: Option<String>,
	pub city: String,
	pub region: String,
	#[serde(rename = "postalCode")]
	pub postal_code: String,
	pub country: Option<String>,
}

/// A line item as submitted by the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
	pub name: String,
	pub quantity: u32,
	#[serde(rename = "unitPrice")]
	pub unit_price: f64,
	pub size: Option<String>,
}

/// Order totals as computed by the storefront.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AmountsInput {
	pub subtotal: f64,
	pub shipping: f64,
	pub tax: f64,
	#[serde(rename = "serviceFee")]
	pub service_fee: f64,
	pub total: f64,
}

/// Payment reference for an already-confirmed charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
	pub method: String,
	pub reference: String,
}

/// Request body for creating an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
	pub customer: CustomerInput,
	#[serde(rename = "shippingAddress")]
	pub shipping_address: AddressInput,
	pub items: Vec<LineItemInput>,
	pub amounts: AmountsInput,
	pub payment: PaymentInput,
	#[serde(rename = "orderNotes")]
	pub order_notes: Option<String>,
	#[serde(rename = "deliveryNotes")]
	pub delivery_notes: Option<String>,
}

/// Response for a successful order creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
	#[serde(rename = "orderId")]
	pub order_id: String,
	#[serde(rename = "recordId")]
	pub record_id: String,
}

/// Request body for a single status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
	/// Target status; must be one of the fixed status labels.
	pub status: String,
	#[serde(rename = "trackingNumber")]
	pub tracking_number: Option<String>,
	#[serde(rename = "assignedTo")]
	pub assigned_to: Option<String>,
	#[serde(rename = "statusNotes")]
	pub status_notes: Option<String>,
}

/// Confirmation of a single status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
	#[serde(rename = "recordId")]
	pub record_id: String,
	pub status: OrderStatus,
	#[serde(rename = "statusUpdatedAt")]
	pub status_updated_at: DateTime<Utc>,
	#[serde(rename = "trackingNumber")]
	pub tracking_number: Option<String>,
	#[serde(rename = "assignedTo")]
	pub assigned_to: Option<String>,
	#[serde(rename = "statusNotes")]
	pub status_notes: Option<String>,
}

/// Request body for a bulk status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateStatusRequest {
	#[serde(rename = "recordIds")]
	pub record_ids: Vec<String>,
	/// Target status; the bulk operation accepts a narrower set than the
	/// single update (no `Paid`, no `Awaiting Information`).
	pub status: String,
	#[serde(rename = "statusNotes")]
	pub status_notes: Option<String>,
}

/// Confirmation of a bulk status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateStatusResponse {
	pub updated: usize,
	pub status: OrderStatus,
}

/// Minimal projection returned by the single-order status lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusResponse {
	#[serde(rename = "recordId")]
	pub record_id: String,
	#[serde(rename = "orderId")]
	pub order_id: String,
	pub status: OrderStatus,
	#[serde(rename = "customerName")]
	pub customer_name: String,
	pub total: f64,
	#[serde(rename = "createdAt")]
	pub created_at: DateTime<Utc>,
	#[serde(rename = "statusUpdatedAt")]
	pub status_updated_at: DateTime<Utc>,
}

/// Full projection returned by the workstation listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkstationOrder {
	#[serde(rename = "recordId")]
	pub record_id: String,
	#[serde(rename = "orderId")]
	pub order_id: String,
	pub status: OrderStatus,
	#[serde(rename = "customerName")]
	pub customer_name: String,
	pub email: String,
	pub phone: Option<String>,
	#[serde(rename = "shippingAddress")]
	pub shipping_address: String,
	pub items: Vec<LineItem>,
	pub total: f64,
	#[serde(rename = "assignedTo")]
	pub assigned_to: Option<String>,
	#[serde(rename = "trackingNumber")]
	pub tracking_number: Option<String>,
	#[serde(rename = "statusNotes")]
	pub status_notes: Option<String>,
	#[serde(rename = "deliveryNotes")]
	pub delivery_notes: Option<String>,
	#[serde(rename = "orderNotes")]
	pub order_notes: Option<String>,
	#[serde(rename = "createdAt")]
	pub created_at: DateTime<Utc>,
	#[serde(rename = "statusUpdatedAt")]
	pub status_updated_at: DateTime<Utc>,
}

/// Response for the workstation listing, newest creation first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOrdersResponse {
	pub orders: Vec<WorkstationOrder>,
}

/// Request body for creating a payment intent.
///
/// The amount is already in the minor currency unit; no conversion is
/// applied anywhere downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentIntentRequest {
	pub amount: i64,
	pub currency: String,
	#[serde(default)]
	pub metadata: HashMap<String, String>,
}

/// Response for a created payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentIntentResponse {
	pub id: String,
	#[serde(rename = "clientSecret")]
	pub client_secret: String,
}

/// Acknowledgement body for the webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
	pub received: bool,
}

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Stable error code.
	pub error: String,
	/// Human-readable description, sanitized for untrusted callers.
	pub message: String,
	/// Additional error context.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error with HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
	/// Caller input failed a precondition (400).
	BadRequest { error_type: String, message: String },
	/// The requested record does not exist (404).
	NotFound { error_type: String, message: String },
	/// A collaborator call failed (502).
	UpstreamFailure { error_type: String, message: String },
	/// Unexpected internal failure (500).
	Internal { error_type: String, message: String },
}

impl ApiError {
	/// Returns the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			ApiError::BadRequest { .. } => 400,
			ApiError::NotFound { .. } => 404,
			ApiError::UpstreamFailure { .. } => 502,
			ApiError::Internal { .. } => 500,
		}
	}

	/// Converts to the JSON error body.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			ApiError::BadRequest { error_type, message }
			| ApiError::NotFound { error_type, message }
			| ApiError::UpstreamFailure { error_type, message }
			| ApiError::Internal { error_type, message } => (error_type, message),
		};
		ErrorResponse {
			error: error_type.clone(),
			message: message.clone(),
			details: None,
		}
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ApiError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			ApiError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			ApiError::UpstreamFailure { message, .. } => {
				write!(f, "Upstream Failure: {}", message)
			},
			ApiError::Internal { message, .. } => write!(f, "Internal Error: {}", message),
		}
	}
}

impl std::error::Error for ApiError {}

impl axum::response::IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		let status = axum::http::StatusCode::from_u16(self.status_code())
			.unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
		(status, axum::Json(self.to_error_response())).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_codes() {
		let bad = ApiError::BadRequest {
			error_type: "VALIDATION_ERROR".to_string(),
			message: "missing email".to_string(),
		};
		assert_eq!(bad.status_code(), 400);

		let missing = ApiError::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message: "no such record".to_string(),
		};
		assert_eq!(missing.status_code(), 404);

		let upstream = ApiError::UpstreamFailure {
			error_type: "UPSTREAM_ERROR".to_string(),
			message: "record store unavailable".to_string(),
		};
		assert_eq!(upstream.status_code(), 502);
	}

	#[test]
	fn error_body_carries_code_and_message() {
		let err = ApiError::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message: "no such record".to_string(),
		};
		let body = err.to_error_response();
		assert_eq!(body.error, "ORDER_NOT_FOUND");
		assert_eq!(body.message, "no such record");
		assert!(body.details.is_none());
	}

	#[test]
	fn camel_case_wire_names() {
		let response = CreateOrderResponse {
			order_id: "ORD-1".to_string(),
			record_id: "rec1".to_string(),
		};
		let json = serde_json::to_string(&response).unwrap();
		assert!(json.contains("\"orderId\""));
		assert!(json.contains("\"recordId\""));
	}
}
