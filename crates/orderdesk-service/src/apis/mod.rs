//! API endpoint implementations.

pub mod orders;
pub mod payments;

use orderdesk_core::WorkflowError;
use orderdesk_types::ApiError;

/// Maps a workflow error onto the API error surface.
///
/// Full diagnostic detail has already been logged where the failure
/// happened; what leaves here is the stable error code and a message safe
/// for untrusted callers.
pub fn map_workflow_error(error: WorkflowError) -> ApiError {
	match error {
		WorkflowError::Validation(message) => ApiError::BadRequest {
			error_type: "VALIDATION_ERROR".to_string(),
			message,
		},
		WorkflowError::InvalidStatus(message) => ApiError::BadRequest {
			error_type: "INVALID_STATUS".to_string(),
			message,
		},
		WorkflowError::InvalidAmount(amount) => ApiError::BadRequest {
			error_type: "INVALID_AMOUNT".to_string(),
			message: format!(
				"Amount must be a positive integer in minor units, got {}",
				amount
			),
		},
		WorkflowError::NotFound(message) => ApiError::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message,
		},
		WorkflowError::Upstream(message) => ApiError::UpstreamFailure {
			error_type: "UPSTREAM_ERROR".to_string(),
			message,
		},
		WorkflowError::Unreconciled {
			payment_reference, ..
		} => ApiError::UpstreamFailure {
			error_type: "PAYMENT_UNRECONCILED".to_string(),
			message: format!(
				"The charge succeeded but the order could not be recorded; \
				 contact support with payment reference {}",
				payment_reference
			),
		},
		WorkflowError::InvalidSignature(message) => ApiError::BadRequest {
			error_type: "INVALID_SIGNATURE".to_string(),
			message,
		},
		WorkflowError::Configuration(message) => {
			tracing::error!(detail = %message, "Configuration error surfaced on a request path");
			ApiError::Internal {
				error_type: "INTERNAL_ERROR".to_string(),
				message: "Service is misconfigured".to_string(),
			}
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn validation_maps_to_400() {
		let err = map_workflow_error(WorkflowError::Validation("missing email".to_string()));
		assert_eq!(err.status_code(), 400);
		assert_eq!(err.to_error_response().error, "VALIDATION_ERROR");
	}

	#[test]
	fn invalid_status_maps_to_400_with_its_own_code() {
		let err = map_workflow_error(WorkflowError::InvalidStatus(
			"unknown order status: Completed".to_string(),
		));
		assert_eq!(err.status_code(), 400);
		assert_eq!(err.to_error_response().error, "INVALID_STATUS");
	}

	#[test]
	fn not_found_maps_to_404_not_500() {
		let err = map_workflow_error(WorkflowError::NotFound("no such record".to_string()));
		assert_eq!(err.status_code(), 404);
		assert_eq!(err.to_error_response().error, "ORDER_NOT_FOUND");
	}

	#[test]
	fn upstream_maps_to_502() {
		let err = map_workflow_error(WorkflowError::Upstream("store returned 500".to_string()));
		assert_eq!(err.status_code(), 502);
	}

	#[test]
	fn unreconciled_keeps_the_payment_reference() {
		let err = map_workflow_error(WorkflowError::Unreconciled {
			payment_reference: "pi_123".to_string(),
			message: "store down".to_string(),
		});
		assert_eq!(err.status_code(), 502);
		let body = err.to_error_response();
		assert_eq!(body.error, "PAYMENT_UNRECONCILED");
		assert!(body.message.contains("pi_123"));
		// The upstream detail stays in the logs
		assert!(!body.message.contains("store down"));
	}

	#[test]
	fn configuration_detail_is_not_leaked() {
		let err = map_workflow_error(WorkflowError::Configuration(
			"api_key for records is empty".to_string(),
		));
		assert_eq!(err.status_code(), 500);
		assert!(!err.to_error_response().message.contains("api_key"));
	}
}
