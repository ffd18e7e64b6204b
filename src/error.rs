//! Error types for bridge operations.
//!
//! Two layers, mirroring how failures propagate: [`MappingError`] covers
//! per-record transformation problems (a missing required field, a payload
//! that is not the shape the mapping rules expect), while [`BridgeError`]
//! is the top-level type returned by the sync engine and drivers.
//!
//! Per-record errors are recoverable in batch context: the engine logs
//! them with the external id and continues with the next record.
//! Configuration errors are fatal to the whole invocation.

use crate::vendor::VendorError;

/// Main error type for bridge operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Missing or invalid configuration, fatal to the current invocation
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Per-record mapping failure
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Vendor API transport or protocol failure
    #[error("Vendor error: {0}")]
    Vendor(#[from] VendorError),

    /// Errors from the backing object store
    #[error("Store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A referenced local object does not exist
    #[error("Object not found: {entity_type} with ID {id}")]
    ObjectNotFound { entity_type: String, id: String },

    /// A sync record exists but has never been attached to a local object
    #[error("Sync record for external id {external_id} has no local object")]
    Unattached { external_id: String },
}

/// Per-record mapping and hydration errors.
///
/// These abort the record being processed, never the whole pass (except in
/// single-record drivers, where the record *is* the pass).
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// A field the mapping cannot proceed without is absent
    #[error("Required field '{field}' is missing")]
    MissingRequiredField { field: String },

    /// The upstream record carries no usable identity (no reference/id)
    #[error("Record has no external identity at '{field}'")]
    MissingExternalId { field: String },

    /// Payload is structurally not what the rules expect
    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    /// The record references a case type the bridge has never seen
    #[error("Unknown case type '{external_id}'")]
    UnknownCaseType { external_id: String },
}

impl BridgeError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an object-not-found error.
    pub fn object_not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Wrap a store error.
    pub fn store<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(error))
    }
}

impl MappingError {
    /// Create a missing-required-field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    /// Create an invalid-payload error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }
}

// Result type aliases for convenience
pub type BridgeResult<T> = Result<T, BridgeError>;
pub type MappingResult<T> = Result<T, MappingError>;
