//! Order endpoints: creation, status mutation, and the read projections.

use axum::{
	extract::{Path, State},
	response::Json,
};
use orderdesk_types::{
	ApiError, BulkUpdateStatusRequest, BulkUpdateStatusResponse, CreateOrderRequest,
	CreateOrderResponse, ListOrdersResponse, OrderStatusResponse, UpdateStatusRequest,
	UpdateStatusResponse,
};

use crate::apis::map_workflow_error;
use crate::server::AppState;

/// Handles POST /api/orders requests.
///
/// Creates an order for an already-confirmed charge and returns the
/// generated order id together with the store's record id.
pub async fn create_order(
	State(state): State<AppState>,
	Json(request): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
	match state.workflow.create_order(request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order creation failed: {}", e);
			Err(map_workflow_error(e))
		},
	}
}

/// Handles GET /api/orders requests.
///
/// Returns the workstation listing: every order, newest creation first,
/// with the full projection including notes and assignment fields.
pub async fn list_orders(
	State(state): State<AppState>,
) -> Result<Json<ListOrdersResponse>, ApiError> {
	match state.workflow.list_orders().await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order listing failed: {}", e);
			Err(map_workflow_error(e))
		},
	}
}

/// Handles GET /api/orders/{id} requests.
pub async fn get_order_status(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<OrderStatusResponse>, ApiError> {
	match state.workflow.get_status(&id).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order lookup failed: {}", e);
			Err(map_workflow_error(e))
		},
	}
}

/// Handles POST /api/orders/{id}/status requests.
pub async fn update_status(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, ApiError> {
	match state.workflow.update_status(&id, request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Status update failed: {}", e);
			Err(map_workflow_error(e))
		},
	}
}

/// Handles POST /api/orders/status/bulk requests.
pub async fn bulk_update_status(
	State(state): State<AppState>,
	Json(request): Json<BulkUpdateStatusRequest>,
) -> Result<Json<BulkUpdateStatusResponse>, ApiError> {
	match state.workflow.bulk_update_status(request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Bulk status update failed: {}", e);
			Err(map_workflow_error(e))
		},
	}
}
