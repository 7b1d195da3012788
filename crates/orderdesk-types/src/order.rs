//! Order domain types for the order workflow manager.
//!
//! This module defines the central `Order` entity, its lifecycle status
//! enumeration, and the mapping between the typed order and the Record
//! Store's spreadsheet-style field map.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Column names used in the Record Store's sales table.
///
/// The store addresses values by human-readable column name, so these
/// constants are the single place the naming is pinned down.
pub mod columns {
	pub const ORDER_ID: &str = "Order ID";
	pub const FIRST_NAME: &str = "First Name";
	pub const LAST_NAME: &str = "Last Name";
	pub const EMAIL: &str = "Email";
	pub const PHONE: &str = "Phone";
	pub const SHIPPING_ADDRESS: &str = "Shipping Address";
	pub const ITEMS: &str = "Items";
	pub const SUBTOTAL: &str = "Subtotal";
	pub const SHIPPING: &str = "Shipping";
	pub const TAX: &str = "Tax";
	pub const SERVICE_FEE: &str = "Service Fee";
	pub const TOTAL: &str = "Total";
	pub const PAYMENT_METHOD: &str = "Payment Method";
	pub const PAYMENT_REFERENCE: &str = "Payment Reference";
	pub const STATUS: &str = "Status";
	pub const STATUS_UPDATED: &str = "Status Updated";
	pub const ASSIGNED_TO: &str = "Assigned To";
	pub const TRACKING_NUMBER: &str = "Tracking Number";
	pub const STATUS_NOTES: &str = "Status Notes";
	pub const DELIVERY_NOTES: &str = "Delivery Notes";
	pub const ORDER_NOTES: &str = "Order Notes";
	pub const CREATED_AT: &str = "Created At";
}

/// Customer identity attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
	/// Customer first name.
	pub first_name: String,
	/// Customer last name.
	pub last_name: String,
	/// Contact email address.
	pub email: String,
	/// Optional contact phone number.
	pub phone: Option<String>,
}

impl Customer {
	/// Returns the customer's display name ("First Last").
	pub fn full_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}
}

/// A single line item captured at order placement.
///
/// Line items are a snapshot of what was purchased. They are serialized into
/// the stored record and never re-derived from a live catalog afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
	/// Product name as displayed to the customer.
	pub name: String,
	/// Number of units ordered.
	pub quantity: u32,
	/// Price per unit at the time of purchase.
	pub unit_price: f64,
	/// Optional size variant (e.g. "M", "One Size").
	#[serde(skip_serializing_if = "Option::is_none")]
	pub size: Option<String>,
}

/// Monetary breakdown of an order.
///
/// The total is expected to equal the arithmetic sum of the other four
/// components. A mismatch is logged at creation but the caller's total is
/// always what gets stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderAmounts {
	pub subtotal: f64,
	pub shipping: f64,
	pub tax: f64,
	pub service_fee: f64,
	pub total: f64,
}

impl OrderAmounts {
	/// Returns the sum of the four component amounts.
	pub fn component_sum(&self) -> f64 {
		self.subtotal + self.shipping + self.tax + self.service_fee
	}

	/// Checks whether the total matches the component sum within a cent.
	pub fn is_consistent(&self) -> bool {
		(self.total - self.component_sum()).abs() < 0.005
	}
}

/// Payment details recorded against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
	/// Payment method label (e.g. "card").
	pub method: String,
	/// Gateway-assigned reference for the confirmed charge.
	pub reference: String,
}

/// The central order entity.
///
/// Created once by the order-submission operation after a confirmed payment,
/// then mutated only through the status-update operations. Never deleted by
/// this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	/// Caller-facing order reference. Immutable once created.
	pub order_id: String,
	/// Record Store identifier, assigned on creation. Immutable.
	pub record_id: String,
	/// Customer identity.
	pub customer: Customer,
	/// Single-line shipping address composed at creation time. Immutable.
	pub shipping_address: String,
	/// Snapshot of the purchased line items.
	pub items: Vec<LineItem>,
	/// Monetary breakdown.
	pub amounts: OrderAmounts,
	/// Payment method and gateway reference.
	pub payment: PaymentInfo,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Timestamp of the most recent status mutation.
	pub status_updated_at: DateTime<Utc>,
	/// Staff member the order is assigned to, if any.
	pub assigned_to: Option<String>,
	/// Shipment tracking number, set once shipment begins.
	pub tracking_number: Option<String>,
	/// Free-text annotation attached to status changes.
	pub status_notes: Option<String>,
	/// Free-text delivery instructions.
	pub delivery_notes: Option<String>,
	/// Free-text order-level notes.
	pub order_notes: Option<String>,
	/// Creation timestamp. Set once, immutable.
	pub created_at: DateTime<Utc>,
}

/// Lifecycle status of an order.
///
/// The set is closed: status strings outside this enumeration are rejected.
/// Any state may move to any other state; `Delivered`, `Cancelled` and
/// `Refunded` are terminal in practice but not technically blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
	/// Initial state, entered only at creation after a confirmed charge.
	Paid,
	/// Order is being prepared.
	Processing,
	/// Order has left the warehouse.
	Shipped,
	/// Order reached the customer.
	Delivered,
	/// Order was cancelled.
	Cancelled,
	/// Payment was returned to the customer.
	Refunded,
	/// Order is paused pending an internal decision.
	#[serde(rename = "On Hold")]
	OnHold,
	/// Order is paused pending customer input.
	#[serde(rename = "Awaiting Information")]
	AwaitingInformation,
}

impl OrderStatus {
	/// Returns an iterator over all status variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Paid,
			Self::Processing,
			Self::Shipped,
			Self::Delivered,
			Self::Cancelled,
			Self::Refunded,
			Self::OnHold,
			Self::AwaitingInformation,
		]
		.into_iter()
	}

	/// Returns the human-facing label for this status.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Paid => "Paid",
			Self::Processing => "Processing",
			Self::Shipped => "Shipped",
			Self::Delivered => "Delivered",
			Self::Cancelled => "Cancelled",
			Self::Refunded => "Refunded",
			Self::OnHold => "On Hold",
			Self::AwaitingInformation => "Awaiting Information",
		}
	}

	/// Whether this status may be applied through the bulk update operation.
	///
	/// Bulk updates cannot revert orders to the initial `Paid` state or mark
	/// them `Awaiting Information`; those require a per-order decision.
	pub fn bulk_updatable(&self) -> bool {
		!matches!(self, Self::Paid | Self::AwaitingInformation)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a status string is not in the enumeration.
#[derive(Debug, Clone, Error)]
#[error("unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for OrderStatus {
	type Err = ParseStatusError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		OrderStatus::all()
			.find(|status| status.as_str() == s)
			.ok_or_else(|| ParseStatusError(s.to_string()))
	}
}

/// Errors that can occur while mapping between orders and record fields.
#[derive(Debug, Error)]
pub enum MappingError {
	/// A column the workflow depends on is absent from the record.
	#[error("missing column: {0}")]
	MissingColumn(&'static str),
	/// A column holds a value of an unexpected shape.
	#[error("invalid value in column '{column}': {message}")]
	InvalidColumn {
		column: &'static str,
		message: String,
	},
}

/// Formats a timestamp the way the Record Store columns hold it.
///
/// Millisecond precision keeps the strings fixed-width so lexicographic
/// ordering matches chronological ordering.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn read_string(fields: &Map<String, Value>, column: &'static str) -> Result<String, MappingError> {
	fields
		.get(column)
		.and_then(Value::as_str)
		.map(str::to_string)
		.ok_or(MappingError::MissingColumn(column))
}

fn read_opt_string(fields: &Map<String, Value>, column: &'static str) -> Option<String> {
	fields
		.get(column)
		.and_then(Value::as_str)
		.filter(|s| !s.is_empty())
		.map(str::to_string)
}

fn read_number(fields: &Map<String, Value>, column: &'static str) -> Result<f64, MappingError> {
	fields
		.get(column)
		.and_then(Value::as_f64)
		.ok_or(MappingError::MissingColumn(column))
}

fn read_timestamp(
	fields: &Map<String, Value>,
	column: &'static str,
) -> Result<DateTime<Utc>, MappingError> {
	let raw = read_string(fields, column)?;
	DateTime::parse_from_rfc3339(&raw)
		.map(|ts| ts.with_timezone(&Utc))
		.map_err(|e| MappingError::InvalidColumn {
			column,
			message: e.to_string(),
		})
}

impl Order {
	/// Projects this order into the Record Store's field map.
	///
	/// Line items are stored as a JSON string column so the snapshot survives
	/// independently of any catalog table.
	pub fn to_fields(&self) -> Map<String, Value> {
		let mut fields = Map::new();
		fields.insert(columns::ORDER_ID.into(), self.order_id.clone().into());
		fields.insert(
			columns::FIRST_NAME.into(),
			self.customer.first_name.clone().into(),
		);
		fields.insert(
			columns::LAST_NAME.into(),
			self.customer.last_name.clone().into(),
		);
		fields.insert(columns::EMAIL.into(), self.customer.email.clone().into());
		if let Some(phone) = &self.customer.phone {
			fields.insert(columns::PHONE.into(), phone.clone().into());
		}
		fields.insert(
			columns::SHIPPING_ADDRESS.into(),
			self.shipping_address.clone().into(),
		);
		// Serializing a Vec<LineItem> cannot fail; the types are plain data.
		let items = serde_json::to_string(&self.items).unwrap_or_default();
		fields.insert(columns::ITEMS.into(), items.into());
		fields.insert(columns::SUBTOTAL.into(), self.amounts.subtotal.into());
		fields.insert(columns::SHIPPING.into(), self.amounts.shipping.into());
		fields.insert(columns::TAX.into(), self.amounts.tax.into());
		fields.insert(columns::SERVICE_FEE.into(), self.amounts.service_fee.into());
		fields.insert(columns::TOTAL.into(), self.amounts.total.into());
		fields.insert(
			columns::PAYMENT_METHOD.into(),
			self.payment.method.clone().into(),
		);
		fields.insert(
			columns::PAYMENT_REFERENCE.into(),
			self.payment.reference.clone().into(),
		);
		fields.insert(columns::STATUS.into(), self.status.as_str().into());
		fields.insert(
			columns::STATUS_UPDATED.into(),
			format_timestamp(self.status_updated_at).into(),
		);
		if let Some(assigned_to) = &self.assigned_to {
			fields.insert(columns::ASSIGNED_TO.into(), assigned_to.clone().into());
		}
		if let Some(tracking) = &self.tracking_number {
			fields.insert(columns::TRACKING_NUMBER.into(), tracking.clone().into());
		}
		if let Some(notes) = &self.status_notes {
			fields.insert(columns::STATUS_NOTES.into(), notes.clone().into());
		}
		if let Some(notes) = &self.delivery_notes {
			fields.insert(columns::DELIVERY_NOTES.into(), notes.clone().into());
		}
		if let Some(notes) = &self.order_notes {
			fields.insert(columns::ORDER_NOTES.into(), notes.clone().into());
		}
		fields.insert(
			columns::CREATED_AT.into(),
			format_timestamp(self.created_at).into(),
		);
		fields
	}

	/// Rebuilds an order from a stored record's field map.
	///
	/// Optional columns may be absent; required columns missing or malformed
	/// produce a `MappingError`.
	pub fn from_fields(
		record_id: &str,
		fields: &Map<String, Value>,
	) -> Result<Self, MappingError> {
		let status_raw = read_string(fields, columns::STATUS)?;
		let status =
			status_raw
				.parse::<OrderStatus>()
				.map_err(|e| MappingError::InvalidColumn {
					column: columns::STATUS,
					message: e.to_string(),
				})?;

		let items_raw = read_string(fields, columns::ITEMS)?;
		let items: Vec<LineItem> =
			serde_json::from_str(&items_raw).map_err(|e| MappingError::InvalidColumn {
				column: columns::ITEMS,
				message: e.to_string(),
			})?;

		Ok(Order {
			order_id: read_string(fields, columns::ORDER_ID)?,
			record_id: record_id.to_string(),
			customer: Customer {
				first_name: read_string(fields, columns::FIRST_NAME)?,
				last_name: read_string(fields, columns::LAST_NAME)?,
				email: read_string(fields, columns::EMAIL)?,
				phone: read_opt_string(fields, columns::PHONE),
			},
			shipping_address: read_string(fields, columns::SHIPPING_ADDRESS)?,
			items,
			amounts: OrderAmounts {
				subtotal: read_number(fields, columns::SUBTOTAL)?,
				shipping: read_number(fields, columns::SHIPPING)?,
				tax: read_number(fields, columns::TAX)?,
				service_fee: read_number(fields, columns::SERVICE_FEE)?,
				total: read_number(fields, columns::TOTAL)?,
			},
			payment: PaymentInfo {
				method: read_string(fields, columns::PAYMENT_METHOD)?,
				reference: read_string(fields, columns::PAYMENT_REFERENCE)?,
			},
			status,
			status_updated_at: read_timestamp(fields, columns::STATUS_UPDATED)?,
			assigned_to: read_opt_string(fields, columns::ASSIGNED_TO),
			tracking_number: read_opt_string(fields, columns::TRACKING_NUMBER),
			status_notes: read_opt_string(fields, columns::STATUS_NOTES),
			delivery_notes: read_opt_string(fields, columns::DELIVERY_NOTES),
			order_notes: read_opt_string(fields, columns::ORDER_NOTES),
			created_at: read_timestamp(fields, columns::CREATED_AT)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_order() -> Order {
		let now = Utc::now();
		Order {
			order_id: "ORD-20260805120000123-A1B2C3".to_string(),
			record_id: "rec0000001".to_string(),
			customer: Customer {
				first_name: "Maya".to_string(),
				last_name: "Okafor".to_string(),
				email: "maya@example.com".to_string(),
				phone: None,
			},
			shipping_address: "12 Rose Lane, Springfield, IL 62704".to_string(),
			items: vec![LineItem {
				name: "Scarf".to_string(),
				quantity: 2,
				unit_price: 15.0,
				size: Some("One Size".to_string()),
			}],
			amounts: OrderAmounts {
				subtotal: 30.0,
				shipping: 5.0,
				tax: 2.0,
				service_fee: 1.0,
				total: 38.0,
			},
			payment: PaymentInfo {
				method: "card".to_string(),
				reference: "pi_12345".to_string(),
			},
			status: OrderStatus::Paid,
			status_updated_at: now,
			assigned_to: None,
			tracking_number: None,
			status_notes: None,
			delivery_notes: None,
			order_notes: None,
			created_at: now,
		}
	}

	#[test]
	fn status_labels_round_trip() {
		for status in OrderStatus::all() {
			let parsed: OrderStatus = status.as_str().parse().unwrap();
			assert_eq!(parsed, status);
		}
	}

	#[test]
	fn unknown_status_rejected() {
		assert!("Completed".parse::<OrderStatus>().is_err());
		assert!("paid".parse::<OrderStatus>().is_err());
		assert!("".parse::<OrderStatus>().is_err());
	}

	#[test]
	fn bulk_set_excludes_initial_and_awaiting() {
		assert!(!OrderStatus::Paid.bulk_updatable());
		assert!(!OrderStatus::AwaitingInformation.bulk_updatable());
		assert!(OrderStatus::Shipped.bulk_updatable());
		assert!(OrderStatus::Cancelled.bulk_updatable());
	}

	#[test]
	fn fields_round_trip_preserves_workflow_columns() {
		let order = sample_order();
		let fields = order.to_fields();
		let rebuilt = Order::from_fields(&order.record_id, &fields).unwrap();

		assert_eq!(rebuilt.order_id, order.order_id);
		assert_eq!(rebuilt.customer.email, order.customer.email);
		assert_eq!(rebuilt.status, OrderStatus::Paid);
		assert_eq!(rebuilt.amounts.total, 38.0);
		assert_eq!(rebuilt.items.len(), 1);
		assert_eq!(rebuilt.items[0].quantity, 2);
	}

	#[test]
	fn missing_required_column_is_reported() {
		let order = sample_order();
		let mut fields = order.to_fields();
		fields.remove(columns::STATUS);

		let err = Order::from_fields("rec1", &fields).unwrap_err();
		assert!(matches!(err, MappingError::MissingColumn("Status")));
	}

	#[test]
	fn amounts_consistency_check() {
		let amounts = OrderAmounts {
			subtotal: 30.0,
			shipping: 5.0,
			tax: 2.0,
			service_fee: 1.0,
			total: 38.0,
		};
		assert!(amounts.is_consistent());

		let off = OrderAmounts { total: 40.0, ..amounts };
		assert!(!off.is_consistent());
	}
}
