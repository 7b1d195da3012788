//! Common types for the order workflow manager.
//!
//! This crate defines the domain and API types shared across the workflow
//! components, keeping the collaborator crates and the service wired to one
//! vocabulary.

/// API request/response types and the structured API error.
pub mod api;
/// Order entity, status enumeration, and record-field mapping.
pub mod order;
/// Record Store record and query types.
pub mod records;
/// Redacting wrapper for credentials.
pub mod secret_string;
/// TOML configuration schema validation.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use order::*;
pub use records::*;
pub use secret_string::SecretString;
pub use validation::*;
