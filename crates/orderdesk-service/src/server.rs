//! HTTP server for the order workflow API.
//!
//! Builds the router, attaches the CORS layer, and serves the handlers
//! defined in the `apis` modules.

use crate::apis;
use axum::{
	routing::{get, post},
	Router,
};
use orderdesk_config::ApiConfig;
use orderdesk_core::OrderWorkflow;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the order workflow for processing requests.
	pub workflow: Arc<OrderWorkflow>,
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	workflow: Arc<OrderWorkflow>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState { workflow };

	// Build the router with /api base path
	let app = Router::new()
		.nest(
			"/api",
			Router::new()
				.route(
					"/orders",
					post(apis::orders::create_order).get(apis::orders::list_orders),
				)
				.route("/orders/{id}", get(apis::orders::get_order_status))
				.route("/orders/{id}/status", post(apis::orders::update_status))
				.route("/orders/status/bulk", post(apis::orders::bulk_update_status))
				.route(
					"/payments/intents",
					post(apis::payments::create_payment_intent),
				)
				.route("/webhooks/payment", post(apis::payments::payment_webhook)),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order workflow API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}
