//! Record Store collaborator for the order workflow manager.
//!
//! The Record Store owns the durable order records. This crate provides the
//! abstraction over it, a REST backend for production and an in-memory
//! backend for tests, plus a service wrapper that enforces the batch
//! ceiling shared by all backends.

use async_trait::async_trait;
use orderdesk_types::{ConfigSchema, RecordSort, RecordUpdate, StoredRecord};
use serde_json::{Map, Value};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod rest;
}

/// Largest number of records one batch update may carry.
///
/// The store rejects bigger batches; exceeding the ceiling fails fast here
/// instead of silently splitting the batch.
pub const MAX_BATCH_UPDATE: usize = 10;

/// Errors that can occur during Record Store operations.
#[derive(Debug, Error)]
pub enum RecordStoreError {
	/// The requested record does not exist.
	#[error("Record not found")]
	NotFound,
	/// A batch update exceeded the store's batch ceiling.
	#[error("Batch of {0} updates exceeds the limit of {MAX_BATCH_UPDATE}")]
	BatchTooLarge(usize),
	/// Serialization or response decoding failed.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// The store call failed or returned a non-success status.
	#[error("Backend error: {0}")]
	Backend(String),
	/// The implementation configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface to a Record Store backend.
///
/// Records are addressed by table name and record id. Field maps are
/// partial on update: columns absent from the map are left untouched.
#[async_trait]
pub trait RecordStoreInterface: Send + Sync {
	/// Returns the configuration schema for this backend.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Creates a record and returns it with its store-assigned id.
	async fn create_record(
		&self,
		table: &str,
		fields: &Map<String, Value>,
	) -> Result<StoredRecord, RecordStoreError>;

	/// Retrieves a record by id.
	async fn get_record(&self, table: &str, record_id: &str)
		-> Result<StoredRecord, RecordStoreError>;

	/// Lists the records of a table, optionally sorted server-side.
	///
	/// Within equal sort keys the store's natural insertion order is kept.
	async fn list_records(
		&self,
		table: &str,
		sort: Option<&RecordSort>,
	) -> Result<Vec<StoredRecord>, RecordStoreError>;

	/// Applies a batch of partial updates in one request.
	///
	/// The batch is not transactional in the store; backends must surface
	/// any failure as a single aggregate error rather than reporting
	/// partial success.
	async fn update_records(
		&self,
		table: &str,
		updates: &[RecordUpdate],
	) -> Result<Vec<StoredRecord>, RecordStoreError>;
}

/// Type alias for Record Store factory functions.
pub type RecordStoreFactory =
	fn(&toml::Value) -> Result<Box<dyn RecordStoreInterface>, RecordStoreError>;

/// Get all registered Record Store implementations.
pub fn get_all_implementations() -> Vec<(&'static str, RecordStoreFactory)> {
	use implementations::{memory, rest};

	vec![
		(rest::NAME, rest::create_record_store as RecordStoreFactory),
		(
			memory::NAME,
			memory::create_record_store as RecordStoreFactory,
		),
	]
}

/// High-level Record Store service.
///
/// Wraps a backend and enforces the invariants shared by all backends: the
/// batch ceiling and the non-empty batch requirement.
pub struct RecordStoreService {
	/// The underlying backend implementation.
	backend: Box<dyn RecordStoreInterface>,
}

impl RecordStoreService {
	/// Creates a new service with the specified backend.
	pub fn new(backend: Box<dyn RecordStoreInterface>) -> Self {
		Self { backend }
	}

	/// Creates a record in the given table.
	pub async fn create(
		&self,
		table: &str,
		fields: &Map<String, Value>,
	) -> Result<StoredRecord, RecordStoreError> {
		self.backend.create_record(table, fields).await
	}

	/// Retrieves a record by id.
	pub async fn get(&self, table: &str, record_id: &str) -> Result<StoredRecord, RecordStoreError> {
		self.backend.get_record(table, record_id).await
	}

	/// Lists the records of a table.
	pub async fn list(
		&self,
		table: &str,
		sort: Option<&RecordSort>,
	) -> Result<Vec<StoredRecord>, RecordStoreError> {
		self.backend.list_records(table, sort).await
	}

	/// Applies a batch of partial updates.
	///
	/// Rejects empty batches and batches above `MAX_BATCH_UPDATE` before
	/// any store call is made.
	pub async fn update(
		&self,
		table: &str,
		updates: &[RecordUpdate],
	) -> Result<Vec<StoredRecord>, RecordStoreError> {
		if updates.is_empty() {
			return Err(RecordStoreError::Backend(
				"Batch update requires at least one record".to_string(),
			));
		}
		if updates.len() > MAX_BATCH_UPDATE {
			return Err(RecordStoreError::BatchTooLarge(updates.len()));
		}
		self.backend.update_records(table, updates).await
	}
}
