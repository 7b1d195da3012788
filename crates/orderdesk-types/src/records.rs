//! Record Store types shared across the workflow.
//!
//! The Record Store is a spreadsheet-style system: tables hold records, each
//! record is a map of column name to JSON value plus an opaque record id.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record as returned by the Record Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
	/// Opaque identifier assigned by the store on creation.
	pub id: String,
	/// Column name to value map.
	pub fields: Map<String, Value>,
}

/// A single entry in a batch update request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordUpdate {
	/// Identifier of the record to mutate.
	pub id: String,
	/// Partial field map; absent columns are left untouched.
	pub fields: Map<String, Value>,
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	Asc,
	Desc,
}

/// Server-side sort specification for a list query.
#[derive(Debug, Clone)]
pub struct RecordSort {
	/// Column to sort by.
	pub field: String,
	/// Direction of the sort.
	pub direction: SortDirection,
}

impl RecordSort {
	/// Sort newest-first by the given timestamp column.
	pub fn descending(field: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			direction: SortDirection::Desc,
		}
	}
}

/// Names of the tables this workflow touches, taken from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableNames {
	/// Product catalog table (read by the storefront, not by this workflow).
	pub catalog: String,
	/// Sales table holding order records.
	pub sales: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn descending_sort_constructor() {
		let sort = RecordSort::descending("Created At");
		assert_eq!(sort.field, "Created At");
		assert_eq!(sort.direction, SortDirection::Desc);
	}
}
