//! REST Record Store backend.
//!
//! Talks to the hosted store's HTTP API: tables addressed by base id and
//! table name, records as `{ id, fields }` JSON objects, batch updates via
//! PATCH, list pagination via an opaque offset token.

use crate::{RecordStoreError, RecordStoreInterface};
use async_trait::async_trait;
use orderdesk_types::{
	ConfigSchema, Field, FieldType, RecordSort, RecordUpdate, Schema, SecretString, SortDirection,
	StoredRecord, ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Name of this implementation in configuration files.
pub const NAME: &str = "rest";

/// Request timeout applied to every store call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Page size requested when listing records.
const LIST_PAGE_SIZE: usize = 100;

/// Configuration for the REST backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RestRecordStoreConfig {
	/// API key presented as a bearer token.
	pub api_key: SecretString,
	/// Root URL of the store API.
	pub base_url: String,
	/// Identifier of the base (workspace) holding the tables.
	pub base_id: String,
}

/// REST Record Store implementation.
pub struct RestRecordStore {
	client: reqwest::Client,
	config: RestRecordStoreConfig,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
	id: String,
	#[serde(default)]
	fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ListPage {
	records: Vec<ApiRecord>,
	offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordsBody {
	records: Vec<ApiRecord>,
}

#[derive(Debug, Serialize)]
struct CreateBody<'a> {
	fields: &'a Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
	records: &'a [RecordUpdate],
}

impl From<ApiRecord> for StoredRecord {
	fn from(record: ApiRecord) -> Self {
		StoredRecord {
			id: record.id,
			fields: record.fields,
		}
	}
}

impl RestRecordStore {
	/// Creates a new REST backend from validated configuration.
	pub fn new(config: RestRecordStoreConfig) -> Result<Self, RecordStoreError> {
		let client = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| RecordStoreError::Configuration(e.to_string()))?;
		Ok(Self { client, config })
	}

	/// Builds the URL for a table, optionally addressing one record.
	///
	/// Table names can contain spaces; pushing them as path segments lets
	/// the URL type percent-encode them.
	fn table_url(&self, table: &str, record_id: Option<&str>) -> Result<reqwest::Url, RecordStoreError> {
		let mut url = reqwest::Url::parse(&self.config.base_url)
			.map_err(|e| RecordStoreError::Configuration(format!("Invalid base_url: {}", e)))?;
		{
			let mut segments = url.path_segments_mut().map_err(|_| {
				RecordStoreError::Configuration("base_url cannot be a base".to_string())
			})?;
			segments.push(&self.config.base_id);
			segments.push(table);
			if let Some(id) = record_id {
				segments.push(id);
			}
		}
		Ok(url)
	}

	fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		request.bearer_auth(self.config.api_key.expose_secret())
	}

	/// Maps a non-success response to a store error.
	///
	/// The upstream error body is logged in full; only the status and the
	/// store's short message travel upward.
	async fn error_from_response(response: reqwest::Response) -> RecordStoreError {
		let status = response.status();
		if status == reqwest::StatusCode::NOT_FOUND {
			return RecordStoreError::NotFound;
		}

		let body = response.text().await.unwrap_or_default();
		tracing::warn!(status = %status, body = %body, "Record Store call failed");

		let message = serde_json::from_str::<Value>(&body)
			.ok()
			.and_then(|v| {
				v.get("error")?
					.get("message")
					.and_then(Value::as_str)
					.map(str::to_string)
			})
			.unwrap_or_else(|| "request failed".to_string());
		RecordStoreError::Backend(format!("{}: {}", status, message))
	}

	async fn decode<T: serde::de::DeserializeOwned>(
		response: reqwest::Response,
	) -> Result<T, RecordStoreError> {
		if !response.status().is_success() {
			return Err(Self::error_from_response(response).await);
		}
		response
			.json::<T>()
			.await
			.map_err(|e| RecordStoreError::Serialization(e.to_string()))
	}
}

#[async_trait]
impl RecordStoreInterface for RestRecordStore {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(RestRecordStoreSchema)
	}

	async fn create_record(
		&self,
		table: &str,
		fields: &Map<String, Value>,
	) -> Result<StoredRecord, RecordStoreError> {
		let url = self.table_url(table, None)?;
		let response = self
			.authorize(self.client.post(url))
			.json(&CreateBody { fields })
			.send()
			.await
			.map_err(|e| RecordStoreError::Backend(e.to_string()))?;

		let record: ApiRecord = Self::decode(response).await?;
		Ok(record.into())
	}

	async fn get_record(
		&self,
		table: &str,
		record_id: &str,
	) -> Result<StoredRecord, RecordStoreError> {
		let url = self.table_url(table, Some(record_id))?;
		let response = self
			.authorize(self.client.get(url))
			.send()
			.await
			.map_err(|e| RecordStoreError::Backend(e.to_string()))?;

		let record: ApiRecord = Self::decode(response).await?;
		Ok(record.into())
	}

	async fn list_records(
		&self,
		table: &str,
		sort: Option<&RecordSort>,
	) -> Result<Vec<StoredRecord>, RecordStoreError> {
		let mut records = Vec::new();
		let mut offset: Option<String> = None;

		loop {
			let url = self.table_url(table, None)?;
			let mut request = self
				.authorize(self.client.get(url))
				.query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
			if let Some(sort) = sort {
				let direction = match sort.direction {
					SortDirection::Asc => "asc",
					SortDirection::Desc => "desc",
				};
				request = request.query(&[
					("sort[0][field]", sort.field.as_str()),
					("sort[0][direction]", direction),
				]);
			}
			if let Some(token) = &offset {
				request = request.query(&[("offset", token.as_str())]);
			}

			let response = request
				.send()
				.await
				.map_err(|e| RecordStoreError::Backend(e.to_string()))?;
			let page: ListPage = Self::decode(response).await?;

			records.extend(page.records.into_iter().map(StoredRecord::from));
			match page.offset {
				Some(token) => offset = Some(token),
				None => break,
			}
		}

		Ok(records)
	}

	async fn update_records(
		&self,
		table: &str,
		updates: &[RecordUpdate],
	) -> Result<Vec<StoredRecord>, RecordStoreError> {
		let url = self.table_url(table, None)?;
		let response = self
			.authorize(self.client.patch(url))
			.json(&UpdateBody { records: updates })
			.send()
			.await
			.map_err(|e| RecordStoreError::Backend(e.to_string()))?;

		let body: RecordsBody = Self::decode(response).await?;
		Ok(body.records.into_iter().map(StoredRecord::from).collect())
	}
}

/// Configuration schema for the REST backend.
pub struct RestRecordStoreSchema;

impl ConfigSchema for RestRecordStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let non_empty = |v: &toml::Value| {
			if v.as_str().is_some_and(str::is_empty) {
				Err("must not be empty".to_string())
			} else {
				Ok(())
			}
		};
		Schema::new(
			vec![
				Field::new("api_key", FieldType::Str).with_validator(non_empty),
				Field::new("base_url", FieldType::Str).with_validator(non_empty),
				Field::new("base_id", FieldType::Str).with_validator(non_empty),
			],
			vec![],
		)
		.validate(config)
	}
}

/// Factory function to create a REST backend from configuration.
pub fn create_record_store(
	config: &toml::Value,
) -> Result<Box<dyn RecordStoreInterface>, RecordStoreError> {
	RestRecordStoreSchema
		.validate(config)
		.map_err(|e| RecordStoreError::Configuration(e.to_string()))?;
	let parsed: RestRecordStoreConfig = config
		.clone()
		.try_into()
		.map_err(|e| RecordStoreError::Configuration(format!("Invalid rest config: {}", e)))?;
	Ok(Box::new(RestRecordStore::new(parsed)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(s: &str) -> toml::Value {
		s.parse().unwrap()
	}

	#[test]
	fn schema_requires_credentials() {
		let schema = RestRecordStoreSchema;
		assert!(schema
			.validate(&parse(
				"api_key = \"key\"\nbase_url = \"https://records.example.com/v0\"\nbase_id = \"app123\""
			))
			.is_ok());
		assert!(schema
			.validate(&parse(
				"base_url = \"https://records.example.com/v0\"\nbase_id = \"app123\""
			))
			.is_err());
		assert!(schema
			.validate(&parse(
				"api_key = \"\"\nbase_url = \"https://records.example.com/v0\"\nbase_id = \"app123\""
			))
			.is_err());
	}

	#[test]
	fn table_url_encodes_spaces() {
		let store = RestRecordStore::new(RestRecordStoreConfig {
			api_key: SecretString::from("key"),
			base_url: "https://records.example.com/v0".to_string(),
			base_id: "app123".to_string(),
		})
		.unwrap();

		let url = store.table_url("Sales Orders", None).unwrap();
		assert_eq!(
			url.as_str(),
			"https://records.example.com/v0/app123/Sales%20Orders"
		);

		let url = store.table_url("Sales", Some("rec42")).unwrap();
		assert!(url.as_str().ends_with("/Sales/rec42"));
	}

	#[test]
	fn factory_rejects_missing_config() {
		let result = create_record_store(&parse("base_id = \"app123\""));
		assert!(matches!(result, Err(RecordStoreError::Configuration(_))));
	}
}
