//! In-memory Record Store backend.
//!
//! Holds records in insertion order per table, which is what the real store
//! uses as natural order. Used by tests and local development; nothing
//! survives a restart.

use crate::{RecordStoreError, RecordStoreInterface};
use async_trait::async_trait;
use orderdesk_types::{
	ConfigSchema, RecordSort, RecordUpdate, Schema, SortDirection, StoredRecord, ValidationError,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Name of this implementation in configuration files.
pub const NAME: &str = "memory";

/// In-memory Record Store implementation.
pub struct MemoryRecordStore {
	/// Table name to records, in insertion order.
	tables: RwLock<HashMap<String, Vec<StoredRecord>>>,
	/// Monotonic counter backing generated record ids.
	next_id: AtomicU64,
}

impl MemoryRecordStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self {
			tables: RwLock::new(HashMap::new()),
			next_id: AtomicU64::new(1),
		}
	}

	fn generate_id(&self) -> String {
		let n = self.next_id.fetch_add(1, Ordering::Relaxed);
		format!("rec{:07}", n)
	}
}

impl Default for MemoryRecordStore {
	fn default() -> Self {
		Self::new()
	}
}

/// Extracts the sortable value of a column as a string.
///
/// Timestamp columns hold fixed-width RFC 3339 strings, so lexicographic
/// comparison matches chronological comparison.
fn sort_key(record: &StoredRecord, field: &str) -> String {
	record
		.fields
		.get(field)
		.and_then(Value::as_str)
		.unwrap_or_default()
		.to_string()
}

#[async_trait]
impl RecordStoreInterface for MemoryRecordStore {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryRecordStoreSchema)
	}

	async fn create_record(
		&self,
		table: &str,
		fields: &Map<String, Value>,
	) -> Result<StoredRecord, RecordStoreError> {
		let record = StoredRecord {
			id: self.generate_id(),
			fields: fields.clone(),
		};
		let mut tables = self.tables.write().await;
		tables
			.entry(table.to_string())
			.or_default()
			.push(record.clone());
		Ok(record)
	}

	async fn get_record(
		&self,
		table: &str,
		record_id: &str,
	) -> Result<StoredRecord, RecordStoreError> {
		let tables = self.tables.read().await;
		tables
			.get(table)
			.and_then(|records| records.iter().find(|r| r.id == record_id))
			.cloned()
			.ok_or(RecordStoreError::NotFound)
	}

	async fn list_records(
		&self,
		table: &str,
		sort: Option<&RecordSort>,
	) -> Result<Vec<StoredRecord>, RecordStoreError> {
		let tables = self.tables.read().await;
		let mut records = tables.get(table).cloned().unwrap_or_default();

		if let Some(sort) = sort {
			// Stable sort: equal keys keep insertion order
			match sort.direction {
				SortDirection::Asc => {
					records.sort_by(|a, b| sort_key(a, &sort.field).cmp(&sort_key(b, &sort.field)));
				},
				SortDirection::Desc => {
					records.sort_by(|a, b| sort_key(b, &sort.field).cmp(&sort_key(a, &sort.field)));
				},
			}
		}

		Ok(records)
	}

	async fn update_records(
		&self,
		table: &str,
		updates: &[RecordUpdate],
	) -> Result<Vec<StoredRecord>, RecordStoreError> {
		let mut tables = self.tables.write().await;
		let records = tables.get_mut(table).ok_or(RecordStoreError::NotFound)?;

		// Verify the whole batch up front so a missing id never leaves the
		// batch partially applied.
		for update in updates {
			if !records.iter().any(|r| r.id == update.id) {
				return Err(RecordStoreError::NotFound);
			}
		}

		let mut updated = Vec::with_capacity(updates.len());
		for update in updates {
			let record = records
				.iter_mut()
				.find(|r| r.id == update.id)
				.ok_or(RecordStoreError::NotFound)?;
			for (column, value) in &update.fields {
				record.fields.insert(column.clone(), value.clone());
			}
			updated.push(record.clone());
		}

		Ok(updated)
	}
}

/// Configuration schema for the in-memory backend.
pub struct MemoryRecordStoreSchema;

impl ConfigSchema for MemoryRecordStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// No required configuration
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create an in-memory backend from configuration.
pub fn create_record_store(
	_config: &toml::Value,
) -> Result<Box<dyn RecordStoreInterface>, RecordStoreError> {
	Ok(Box::new(MemoryRecordStore::new()))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.clone()))
			.collect()
	}

	#[tokio::test]
	async fn create_then_get() {
		let store = MemoryRecordStore::new();
		let created = store
			.create_record("Sales", &fields(&[("Status", Value::from("Paid"))]))
			.await
			.unwrap();

		let fetched = store.get_record("Sales", &created.id).await.unwrap();
		assert_eq!(fetched.fields["Status"], "Paid");
	}

	#[tokio::test]
	async fn get_unknown_record_is_not_found() {
		let store = MemoryRecordStore::new();
		let result = store.get_record("Sales", "rec9999999").await;
		assert!(matches!(result, Err(RecordStoreError::NotFound)));
	}

	#[tokio::test]
	async fn list_sorts_descending_with_stable_ties() {
		let store = MemoryRecordStore::new();
		for (name, created) in [
			("first", "2026-01-01T00:00:00.000Z"),
			("second", "2026-01-02T00:00:00.000Z"),
			("tie-a", "2026-01-03T00:00:00.000Z"),
			("tie-b", "2026-01-03T00:00:00.000Z"),
		] {
			store
				.create_record(
					"Sales",
					&fields(&[
						("Order ID", Value::from(name)),
						("Created At", Value::from(created)),
					]),
				)
				.await
				.unwrap();
		}

		let sort = RecordSort::descending("Created At");
		let listed = store.list_records("Sales", Some(&sort)).await.unwrap();
		let names: Vec<&str> = listed
			.iter()
			.map(|r| r.fields["Order ID"].as_str().unwrap())
			.collect();
		assert_eq!(names, vec!["tie-a", "tie-b", "second", "first"]);
	}

	#[tokio::test]
	async fn update_merges_partial_fields() {
		let store = MemoryRecordStore::new();
		let created = store
			.create_record(
				"Sales",
				&fields(&[
					("Status", Value::from("Paid")),
					("Email", Value::from("a@example.com")),
				]),
			)
			.await
			.unwrap();

		let updates = vec![RecordUpdate {
			id: created.id.clone(),
			fields: fields(&[("Status", Value::from("Shipped"))]),
		}];
		let updated = store.update_records("Sales", &updates).await.unwrap();

		assert_eq!(updated[0].fields["Status"], "Shipped");
		// Untouched columns survive a partial update
		assert_eq!(updated[0].fields["Email"], "a@example.com");
	}

	#[tokio::test]
	async fn update_with_unknown_id_mutates_nothing() {
		let store = MemoryRecordStore::new();
		let created = store
			.create_record("Sales", &fields(&[("Status", Value::from("Paid"))]))
			.await
			.unwrap();

		let updates = vec![
			RecordUpdate {
				id: created.id.clone(),
				fields: fields(&[("Status", Value::from("Shipped"))]),
			},
			RecordUpdate {
				id: "rec9999999".to_string(),
				fields: fields(&[("Status", Value::from("Shipped"))]),
			},
		];
		let result = store.update_records("Sales", &updates).await;
		assert!(matches!(result, Err(RecordStoreError::NotFound)));

		// The existing record is untouched after the aggregate failure
		let fetched = store.get_record("Sales", &created.id).await.unwrap();
		assert_eq!(fetched.fields["Status"], "Paid");
	}
}
