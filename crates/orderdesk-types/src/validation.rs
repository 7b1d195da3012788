//! TOML configuration validation for collaborator implementations.
//!
//! Each collaborator implementation declares a schema for its configuration
//! table; the factory validates the raw TOML against it before building the
//! client, so misconfiguration fails at startup rather than mid-request.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field has the wrong type.
	#[error("Type mismatch for field '{field}': expected {expected}")]
	TypeMismatch { field: String, expected: String },
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	Str,
	/// An integer value with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// A boolean value.
	Boolean,
}

/// Type alias for custom field validator functions.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field within a schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl Field {
	/// Creates a field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a custom validator run after the type check.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		match &self.field_type {
			FieldType::Str => {
				if !value.is_str() {
					return Err(ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "string".to_string(),
					});
				}
			},
			FieldType::Integer { min, max } => {
				let n = value
					.as_integer()
					.ok_or_else(|| ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "integer".to_string(),
					})?;
				if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
					return Err(ValidationError::InvalidValue {
						field: self.name.clone(),
						message: format!("value {} is out of bounds", n),
					});
				}
			},
			FieldType::Boolean => {
				if !value.is_bool() {
					return Err(ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "boolean".to_string(),
					});
				}
			},
		}

		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}

		Ok(())
	}
}

/// Validation schema for one implementation's configuration table.
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a schema from required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML table against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

/// Trait implemented by each collaborator implementation's config schema.
pub trait ConfigSchema: Send + Sync {
	/// Validates the raw TOML configuration for this implementation.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(s: &str) -> toml::Value {
		s.parse().unwrap()
	}

	#[test]
	fn required_field_missing() {
		let schema = Schema::new(vec![Field::new("api_key", FieldType::Str)], vec![]);
		let err = schema.validate(&parse("base_url = \"x\"")).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "api_key"));
	}

	#[test]
	fn type_mismatch_reported() {
		let schema = Schema::new(vec![Field::new("api_key", FieldType::Str)], vec![]);
		let err = schema.validate(&parse("api_key = 7")).unwrap_err();
		assert!(matches!(err, ValidationError::TypeMismatch { .. }));
	}

	#[test]
	fn integer_bounds_enforced() {
		let schema = Schema::new(
			vec![Field::new(
				"port",
				FieldType::Integer {
					min: Some(1),
					max: Some(65535),
				},
			)],
			vec![],
		);
		assert!(schema.validate(&parse("port = 3000")).is_ok());
		assert!(schema.validate(&parse("port = 0")).is_err());
	}

	#[test]
	fn custom_validator_runs() {
		let schema = Schema::new(
			vec![
				Field::new("api_key", FieldType::Str).with_validator(|v| {
					if v.as_str().is_some_and(str::is_empty) {
						Err("must not be empty".to_string())
					} else {
						Ok(())
					}
				}),
			],
			vec![],
		);
		assert!(schema.validate(&parse("api_key = \"k\"")).is_ok());
		assert!(schema.validate(&parse("api_key = \"\"")).is_err());
	}
}
