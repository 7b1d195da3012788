//! Core order workflow for the order workflow manager.
//!
//! This crate orchestrates the two collaborators around the order
//! lifecycle: creation after a confirmed charge, status transitions with
//! validation, bulk transitions, and the read projections. The collaborator
//! services are injected at construction so tests can substitute fakes.

use chrono::{DateTime, Utc};
use orderdesk_payment::{PaymentError, PaymentService, WebhookEvent};
use orderdesk_records::{RecordStoreError, RecordStoreService};
use orderdesk_types::{
	columns, format_timestamp, AddressInput, BulkUpdateStatusRequest, BulkUpdateStatusResponse,
	CreateOrderRequest, CreateOrderResponse, CreatePaymentIntentRequest,
	CreatePaymentIntentResponse, Customer, LineItem, ListOrdersResponse, Order, OrderAmounts,
	OrderStatus, OrderStatusResponse, PaymentInfo, RecordSort, RecordUpdate, StoredRecord,
	TableNames, UpdateStatusRequest, UpdateStatusResponse, WorkstationOrder,
};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Shortens an identifier for log lines.
fn truncate_id(id: &str) -> String {
	if id.len() <= 12 {
		id.to_string()
	} else {
		format!("{}..", &id[..12])
	}
}

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
	/// Caller input violates a precondition.
	#[error("Validation error: {0}")]
	Validation(String),
	/// The target status is not in the fixed enumeration.
	#[error("Invalid status: {0}")]
	InvalidStatus(String),
	/// The payment amount is missing or not positive.
	#[error("Invalid amount: {0}")]
	InvalidAmount(i64),
	/// The requested record does not exist.
	#[error("Not found: {0}")]
	NotFound(String),
	/// A collaborator call failed.
	#[error("Upstream failure: {0}")]
	Upstream(String),
	/// The charge succeeded but the order record was not written.
	///
	/// Money has moved with no durable order record; this needs manual
	/// follow-up, so it is kept distinct from a plain upstream failure.
	#[error("Payment {payment_reference} succeeded but order persistence failed: {message}")]
	Unreconciled {
		payment_reference: String,
		message: String,
	},
	/// A webhook payload failed signature verification.
	#[error("Invalid webhook signature: {0}")]
	InvalidSignature(String),
	/// A collaborator is not configured for the requested operation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Generates a new caller-facing order identifier.
///
/// Combines a millisecond-resolution UTC timestamp with a random suffix so
/// collisions are negligible even for ids minted within the same
/// millisecond.
fn generate_order_id() -> String {
	let stamp = Utc::now().format("%Y%m%d%H%M%S%3f");
	let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
	format!("ORD-{}-{}", stamp, suffix)
}

/// Composes the structured address into the single stored display line.
fn compose_shipping_address(address: &AddressInput) -> String {
	let mut line = address.street.trim().to_string();
	if let Some(unit) = address.unit.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
		line.push_str(", ");
		line.push_str(unit);
	}
	line.push_str(", ");
	line.push_str(address.city.trim());
	line.push_str(", ");
	line.push_str(address.region.trim());
	line.push(' ');
	line.push_str(address.postal_code.trim());
	if let Some(country) = address
		.country
		.as_deref()
		.map(str::trim)
		.filter(|s| !s.is_empty())
	{
		line.push_str(", ");
		line.push_str(country);
	}
	line
}

/// Checks that an email is syntactically plausible.
///
/// Exactly one `@`, a non-empty local part, a domain with a dot past the
/// first character, and no whitespace. Deliverability is not our problem.
fn is_plausible_email(email: &str) -> bool {
	if email.chars().any(char::is_whitespace) {
		return false;
	}
	let Some((local, domain)) = email.split_once('@') else {
		return false;
	};
	!local.is_empty()
		&& !domain.contains('@')
		&& domain.len() >= 3
		&& domain[1..].contains('.')
		&& !domain.ends_with('.')
}

/// The order workflow engine.
///
/// Holds the injected collaborator services and the configured table names.
/// All handlers go through this one component; it owns the validation rules
/// and the record mapping, and never retries a failed collaborator call.
pub struct OrderWorkflow {
	/// Record Store service holding durable order records.
	records: Arc<RecordStoreService>,
	/// Payment Gateway service owning money movement.
	payment: Arc<PaymentService>,
	/// Configured table names.
	tables: TableNames,
}

impl OrderWorkflow {
	/// Creates a workflow over the given collaborator services.
	pub fn new(
		records: Arc<RecordStoreService>,
		payment: Arc<PaymentService>,
		tables: TableNames,
	) -> Self {
		Self {
			records,
			payment,
			tables,
		}
	}

	/// Creates an order after a confirmed charge.
	///
	/// Validates the input, generates the order id, snapshots the items and
	/// persists the record with initial status `Paid`. A store failure here
	/// is the reconciliation hazard: the charge already succeeded.
	pub async fn create_order(
		&self,
		request: CreateOrderRequest,
	) -> Result<CreateOrderResponse, WorkflowError> {
		validate_create(&request)?;

		let order_id = generate_order_id();
		let now = Utc::now();

		let amounts = OrderAmounts {
			subtotal: request.amounts.subtotal,
			shipping: request.amounts.shipping,
			tax: request.amounts.tax,
			service_fee: request.amounts.service_fee,
			total: request.amounts.total,
		};
		if !amounts.is_consistent() {
			tracing::warn!(
				order_id = %order_id,
				total = amounts.total,
				component_sum = amounts.component_sum(),
				"Order total does not match its components; storing the caller's total"
			);
		}

		let order = Order {
			order_id: order_id.clone(),
			// The store assigns the real id on create
			record_id: String::new(),
			customer: Customer {
				first_name: request.customer.first_name.trim().to_string(),
				last_name: request.customer.last_name.trim().to_string(),
				email: request.customer.email.trim().to_string(),
				phone: request.customer.phone.clone(),
			},
			shipping_address: compose_shipping_address(&request.shipping_address),
			items: request
				.items
				.iter()
				.map(|item| LineItem {
					name: item.name.clone(),
					quantity: item.quantity,
					unit_price: item.unit_price,
					size: item.size.clone(),
				})
				.collect(),
			amounts,
			payment: PaymentInfo {
				method: request.payment.method.clone(),
				reference: request.payment.reference.clone(),
			},
			status: OrderStatus::Paid,
			status_updated_at: now,
			assigned_to: None,
			tracking_number: None,
			status_notes: None,
			delivery_notes: request.delivery_notes.clone(),
			order_notes: request.order_notes.clone(),
			created_at: now,
		};

		let created = self
			.records
			.create(&self.tables.sales, &order.to_fields())
			.await
			.map_err(|e| {
				tracing::error!(
					order_id = %order_id,
					payment_reference = %request.payment.reference,
					error = %e,
					"Charge confirmed but order record was not written; manual reconciliation needed"
				);
				WorkflowError::Unreconciled {
					payment_reference: request.payment.reference.clone(),
					message: e.to_string(),
				}
			})?;

		tracing::info!(
			order_id = %order_id,
			record_id = %truncate_id(&created.id),
			"Created order"
		);

		Ok(CreateOrderResponse {
			order_id,
			record_id: created.id,
		})
	}

	/// Transitions one order to a new status.
	///
	/// The target must be in the fixed enumeration; tracking number,
	/// assignee and notes are applied only when supplied and are never
	/// cleared implicitly.
	pub async fn update_status(
		&self,
		record_id: &str,
		request: UpdateStatusRequest,
	) -> Result<UpdateStatusResponse, WorkflowError> {
		let status = OrderStatus::from_str(&request.status)
			.map_err(|e| WorkflowError::InvalidStatus(e.to_string()))?;
		let now = Utc::now();

		let update = RecordUpdate {
			id: record_id.to_string(),
			fields: status_fields(status, now, &request),
		};

		self.records
			.update(&self.tables.sales, std::slice::from_ref(&update))
			.await
			.map_err(|e| match e {
				RecordStoreError::NotFound => {
					WorkflowError::NotFound(format!("Order record '{}' not found", record_id))
				},
				other => WorkflowError::Upstream(other.to_string()),
			})?;

		tracing::info!(
			record_id = %truncate_id(record_id),
			status = %status,
			"Updated order status"
		);

		Ok(UpdateStatusResponse {
			record_id: record_id.to_string(),
			status,
			status_updated_at: now,
			tracking_number: request.tracking_number,
			assigned_to: request.assigned_to,
			status_notes: request.status_notes,
		})
	}

	/// Transitions a set of orders to the same status in one batch.
	///
	/// The target must be in the narrower bulk set. The batch is submitted
	/// as a single store request; any failure is surfaced as one aggregate
	/// error, never as silent partial success.
	pub async fn bulk_update_status(
		&self,
		request: BulkUpdateStatusRequest,
	) -> Result<BulkUpdateStatusResponse, WorkflowError> {
		if request.record_ids.is_empty() {
			return Err(WorkflowError::Validation(
				"Bulk update requires at least one record id".to_string(),
			));
		}

		let status = OrderStatus::from_str(&request.status)
			.map_err(|e| WorkflowError::InvalidStatus(e.to_string()))?;
		if !status.bulk_updatable() {
			return Err(WorkflowError::Validation(format!(
				"Status '{}' cannot be applied in bulk",
				status
			)));
		}

		// One timestamp for the whole batch
		let now = Utc::now();
		let shared = UpdateStatusRequest {
			status: request.status.clone(),
			tracking_number: None,
			assigned_to: None,
			status_notes: request.status_notes.clone(),
		};
		let updates: Vec<RecordUpdate> = request
			.record_ids
			.iter()
			.map(|id| RecordUpdate {
				id: id.clone(),
				fields: status_fields(status, now, &shared),
			})
			.collect();

		let updated = self
			.records
			.update(&self.tables.sales, &updates)
			.await
			.map_err(|e| match e {
				RecordStoreError::NotFound => WorkflowError::NotFound(
					"One or more order records were not found; no records were updated"
						.to_string(),
				),
				RecordStoreError::BatchTooLarge(_) => WorkflowError::Validation(e.to_string()),
				other => WorkflowError::Upstream(other.to_string()),
			})?;

		tracing::info!(count = updated.len(), status = %status, "Bulk updated order status");

		Ok(BulkUpdateStatusResponse {
			updated: updated.len(),
			status,
		})
	}

	/// Looks up the status projection of one order.
	pub async fn get_status(&self, record_id: &str) -> Result<OrderStatusResponse, WorkflowError> {
		let record = self
			.records
			.get(&self.tables.sales, record_id)
			.await
			.map_err(|e| match e {
				RecordStoreError::NotFound => {
					WorkflowError::NotFound(format!("Order record '{}' not found", record_id))
				},
				other => WorkflowError::Upstream(other.to_string()),
			})?;

		let order = decode_order(&record)?;
		Ok(OrderStatusResponse {
			record_id: order.record_id,
			order_id: order.order_id,
			status: order.status,
			customer_name: order.customer.full_name(),
			total: order.amounts.total,
			created_at: order.created_at,
			status_updated_at: order.status_updated_at,
		})
	}

	/// Lists all orders for the workstation view, newest creation first.
	///
	/// Records that no longer map onto the order shape (edited by hand in
	/// the store) are skipped with a warning rather than failing the whole
	/// listing.
	pub async fn list_orders(&self) -> Result<ListOrdersResponse, WorkflowError> {
		let sort = RecordSort::descending(columns::CREATED_AT);
		let records = self
			.records
			.list(&self.tables.sales, Some(&sort))
			.await
			.map_err(|e| WorkflowError::Upstream(e.to_string()))?;

		let mut orders = Vec::with_capacity(records.len());
		for record in &records {
			match decode_order(record) {
				Ok(order) => orders.push(workstation_projection(order)),
				Err(e) => {
					tracing::warn!(
						record_id = %truncate_id(&record.id),
						error = %e,
						"Skipping unmappable sales record"
					);
				},
			}
		}

		Ok(ListOrdersResponse { orders })
	}

	/// Creates a payment intent at the gateway.
	///
	/// The amount is already in minor units; non-positive amounts are
	/// rejected before the gateway is contacted.
	pub async fn create_payment_intent(
		&self,
		request: CreatePaymentIntentRequest,
	) -> Result<CreatePaymentIntentResponse, WorkflowError> {
		let intent = self
			.payment
			.create_intent(request.amount, &request.currency, &request.metadata)
			.await
			.map_err(|e| match e {
				PaymentError::InvalidAmount(n) => WorkflowError::InvalidAmount(n),
				PaymentError::InvalidCurrency => {
					WorkflowError::Validation("Currency must not be empty".to_string())
				},
				PaymentError::Configuration(message) => WorkflowError::Configuration(message),
				other => WorkflowError::Upstream(other.to_string()),
			})?;

		Ok(CreatePaymentIntentResponse {
			id: intent.id,
			client_secret: intent.client_secret,
		})
	}

	/// Verifies a payment webhook delivery and parses its event.
	pub fn verify_payment_webhook(
		&self,
		payload: &[u8],
		signature_header: &str,
	) -> Result<WebhookEvent, WorkflowError> {
		let event = self
			.payment
			.verify_webhook(payload, signature_header)
			.map_err(|e| match e {
				PaymentError::InvalidSignature(message) => WorkflowError::InvalidSignature(message),
				PaymentError::Configuration(message) => WorkflowError::Configuration(message),
				other => WorkflowError::Validation(other.to_string()),
			})?;

		tracing::info!(event_id = %event.id, event_type = %event.event_type, "Verified payment webhook");
		Ok(event)
	}
}

/// Builds the partial field set for a status mutation.
fn status_fields(
	status: OrderStatus,
	now: DateTime<Utc>,
	request: &UpdateStatusRequest,
) -> Map<String, Value> {
	let mut fields = Map::new();
	fields.insert(columns::STATUS.into(), status.as_str().into());
	fields.insert(columns::STATUS_UPDATED.into(), format_timestamp(now).into());
	if let Some(tracking) = &request.tracking_number {
		fields.insert(columns::TRACKING_NUMBER.into(), tracking.clone().into());
	}
	if let Some(assignee) = &request.assigned_to {
		fields.insert(columns::ASSIGNED_TO.into(), assignee.clone().into());
	}
	if let Some(notes) = &request.status_notes {
		fields.insert(columns::STATUS_NOTES.into(), notes.clone().into());
	}
	fields
}

fn decode_order(record: &StoredRecord) -> Result<Order, WorkflowError> {
	Order::from_fields(&record.id, &record.fields)
		.map_err(|e| WorkflowError::Upstream(format!("Stored record is malformed: {}", e)))
}

fn workstation_projection(order: Order) -> WorkstationOrder {
	WorkstationOrder {
		record_id: order.record_id,
		order_id: order.order_id,
		status: order.status,
		customer_name: order.customer.full_name(),
		email: order.customer.email,
		phone: order.customer.phone,
		shipping_address: order.shipping_address,
		items: order.items,
		total: order.amounts.total,
		assigned_to: order.assigned_to,
		tracking_number: order.tracking_number,
		status_notes: order.status_notes,
		delivery_notes: order.delivery_notes,
		order_notes: order.order_notes,
		created_at: order.created_at,
		status_updated_at: order.status_updated_at,
	}
}

fn validate_create(request: &CreateOrderRequest) -> Result<(), WorkflowError> {
	if request.customer.first_name.trim().is_empty() {
		return Err(WorkflowError::Validation(
			"Customer first name is required".to_string(),
		));
	}
	if request.customer.last_name.trim().is_empty() {
		return Err(WorkflowError::Validation(
			"Customer last name is required".to_string(),
		));
	}
	if !is_plausible_email(request.customer.email.trim()) {
		return Err(WorkflowError::Validation(format!(
			"'{}' is not a valid email address",
			request.customer.email
		)));
	}
	if request.items.is_empty() {
		return Err(WorkflowError::Validation(
			"Order must contain at least one item".to_string(),
		));
	}
	for item in &request.items {
		if item.name.trim().is_empty() {
			return Err(WorkflowError::Validation(
				"Item name is required".to_string(),
			));
		}
		if item.quantity == 0 {
			return Err(WorkflowError::Validation(format!(
				"Item '{}' must have a quantity of at least 1",
				item.name
			)));
		}
	}
	if request.payment.reference.trim().is_empty() {
		return Err(WorkflowError::Validation(
			"Payment reference is required".to_string(),
		));
	}
	Ok(())
}
