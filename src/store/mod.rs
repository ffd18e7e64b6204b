//! Object store abstraction for local records.
//!
//! The bridge persists every local record as a JSON document under a
//! `(entity type, object id)` key. The [`ObjectStore`] trait defines pure
//! data operations with no mapping logic, so the host application can plug
//! in its own persistence layer while the engine stays storage-agnostic.
//!
//! # Commit semantics
//!
//! `put` stages a write that is immediately visible to reads on the same
//! store (read-your-writes), and `commit` makes everything staged durable
//! in one step. The sync drivers commit every batch of records and once at
//! the end of a pass, so a killed run loses at most one uncommitted batch.
//! Catalog membership updates rely on the read-your-writes overlay: a
//! membership write is visible to an immediately following read within the
//! same logical operation, without an intermediate commit.
//!
//! # Example Usage
//!
//! ```rust
//! use zgw_bridge::store::{InMemoryStore, ObjectStore, StoreKey};
//! use zgw_bridge::model::EntityType;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryStore::new();
//!
//! let key = StoreKey::new(EntityType::Case, "zaak-1");
//! store.put(key.clone(), json!({"identificatie": "Z-2024-001"})).await?;
//!
//! // Staged writes are readable before the commit
//! assert!(store.get(key).await?.is_some());
//! store.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

pub use errors::StoreError;
pub use in_memory::{InMemoryStore, InMemoryStoreStats};

use crate::model::EntityType;
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// Key identifying one local record: entity type plus object id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    entity_type: EntityType,
    object_id: String,
}

impl StoreKey {
    /// Create a new store key.
    pub fn new(entity_type: EntityType, object_id: impl Into<String>) -> Self {
        Self {
            entity_type,
            object_id: object_id.into(),
        }
    }

    /// Get the entity type.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Get the object id.
    pub fn object_id(&self) -> &str {
        &self.object_id
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.object_id)
    }
}

/// Prefix selecting all records of one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorePrefix {
    entity_type: EntityType,
}

impl StorePrefix {
    /// Create a prefix for an entity type.
    pub fn of(entity_type: EntityType) -> Self {
        Self { entity_type }
    }

    /// Get the entity type.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }
}

impl fmt::Display for StorePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity_type)
    }
}

/// Core trait for backing stores handling pure JSON persistence.
///
/// Implementations focus solely on data persistence; create and update are
/// both `put` (full replace at a key), and no validation is performed on
/// the document structure. All operations are async and must be safe to
/// call from concurrent tasks.
pub trait ObjectStore: Send + Sync {
    /// The error type returned by store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Stage a document at the given key, replacing any previous value.
    ///
    /// The write is immediately visible to subsequent reads on this store,
    /// and becomes durable at the next [`commit`](Self::commit).
    fn put(
        &self,
        key: StoreKey,
        data: Value,
    ) -> impl Future<Output = Result<Value, Self::Error>> + Send;

    /// Retrieve a document by key, staged writes included.
    fn get(
        &self,
        key: StoreKey,
    ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

    /// Delete a document by key.
    ///
    /// Returns `true` if the document existed.
    fn delete(&self, key: StoreKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// List documents of one entity type with pagination.
    ///
    /// Results are consistently ordered by object id.
    fn list(
        &self,
        prefix: StorePrefix,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<(StoreKey, Value)>, Self::Error>> + Send;

    /// Find documents of one entity type by exact attribute value.
    ///
    /// `attribute` is a dot path into the document (e.g. "identificatie",
    /// "instance.subject"); numeric segments index into arrays.
    fn find_by_attribute(
        &self,
        prefix: StorePrefix,
        attribute: &str,
        value: &str,
    ) -> impl Future<Output = Result<Vec<(StoreKey, Value)>, Self::Error>> + Send;

    /// Check whether a document exists.
    fn exists(&self, key: StoreKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Count documents of one entity type.
    fn count(
        &self,
        prefix: StorePrefix,
    ) -> impl Future<Output = Result<usize, Self::Error>> + Send;

    /// Make all staged writes durable in one step.
    fn commit(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Clear all data, staged and committed.
    fn clear(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
