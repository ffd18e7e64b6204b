//! In-memory object store implementation.
//!
//! A thread-safe implementation of [`ObjectStore`] using nested HashMaps
//! behind an async RwLock. Used by the test suites and as the reference
//! implementation of the staged-write/commit contract: `put` lands in a
//! staging overlay that reads see immediately, and `commit` folds the
//! overlay into the committed base.
//!
//! # Performance Characteristics
//!
//! * PUT/GET/DELETE: O(1) average case
//! * LIST with pagination: O(n) over the entity type
//! * FIND_BY_ATTRIBUTE: O(n) with dot-path traversal per document

use crate::model::EntityType;
use crate::store::{ObjectStore, StoreError, StoreKey, StorePrefix};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type TypeMap = HashMap<EntityType, HashMap<String, Value>>;

#[derive(Default)]
struct State {
    committed: TypeMap,
    // Staging overlay folded into `committed` on commit. A staged None is
    // a pending delete.
    staged: HashMap<EntityType, HashMap<String, Option<Value>>>,
}

/// Thread-safe in-memory object store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store statistics for debugging and test assertions.
    pub async fn stats(&self) -> InMemoryStoreStats {
        let state = self.state.read().await;
        let committed_documents = state.committed.values().map(HashMap::len).sum();
        let staged_writes = state.staged.values().map(HashMap::len).sum();
        InMemoryStoreStats {
            entity_types: state.committed.len(),
            committed_documents,
            staged_writes,
        }
    }

    /// Number of staged, not yet committed writes.
    pub async fn pending(&self) -> usize {
        let state = self.state.read().await;
        state.staged.values().map(HashMap::len).sum()
    }

    /// Extract a nested attribute value from a document using dot notation.
    fn extract_attribute_value(data: &Value, attribute_path: &str) -> Option<String> {
        let mut current = data;
        for part in attribute_path.split('.') {
            if let Ok(index) = part.parse::<usize>() {
                current = current.get(index)?;
            } else {
                current = current.get(part)?;
            }
        }
        match current {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Merged view of one entity type: committed base with staged overlay.
    fn merged_view(state: &State, entity_type: EntityType) -> HashMap<String, Value> {
        let mut view: HashMap<String, Value> = state
            .committed
            .get(&entity_type)
            .cloned()
            .unwrap_or_default();
        if let Some(staged) = state.staged.get(&entity_type) {
            for (id, entry) in staged {
                match entry {
                    Some(value) => {
                        view.insert(id.clone(), value.clone());
                    }
                    None => {
                        view.remove(id);
                    }
                }
            }
        }
        view
    }
}

impl ObjectStore for InMemoryStore {
    type Error = StoreError;

    async fn put(&self, key: StoreKey, data: Value) -> Result<Value, Self::Error> {
        let mut state = self.state.write().await;
        state
            .staged
            .entry(key.entity_type())
            .or_default()
            .insert(key.object_id().to_string(), Some(data.clone()));
        Ok(data)
    }

    async fn get(&self, key: StoreKey) -> Result<Option<Value>, Self::Error> {
        let state = self.state.read().await;
        if let Some(entry) = state
            .staged
            .get(&key.entity_type())
            .and_then(|staged| staged.get(key.object_id()))
        {
            return Ok(entry.clone());
        }
        Ok(state
            .committed
            .get(&key.entity_type())
            .and_then(|docs| docs.get(key.object_id()))
            .cloned())
    }

    async fn delete(&self, key: StoreKey) -> Result<bool, Self::Error> {
        let mut state = self.state.write().await;
        let existed = Self::merged_view(&state, key.entity_type()).contains_key(key.object_id());
        if existed {
            state
                .staged
                .entry(key.entity_type())
                .or_default()
                .insert(key.object_id().to_string(), None);
        }
        Ok(existed)
    }

    async fn list(
        &self,
        prefix: StorePrefix,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<(StoreKey, Value)>, Self::Error> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let state = self.state.read().await;
        let view = Self::merged_view(&state, prefix.entity_type());

        let mut ids: Vec<_> = view.keys().cloned().collect();
        ids.sort();

        Ok(ids
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| {
                view.get(&id)
                    .map(|data| (StoreKey::new(prefix.entity_type(), &id), data.clone()))
            })
            .collect())
    }

    async fn find_by_attribute(
        &self,
        prefix: StorePrefix,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<(StoreKey, Value)>, Self::Error> {
        let state = self.state.read().await;
        let view = Self::merged_view(&state, prefix.entity_type());

        let mut results = Vec::new();
        for (id, data) in &view {
            if let Some(attr_value) = Self::extract_attribute_value(data, attribute) {
                if attr_value == value {
                    results.push((StoreKey::new(prefix.entity_type(), id), data.clone()));
                }
            }
        }
        results.sort_by(|a, b| a.0.object_id().cmp(b.0.object_id()));
        Ok(results)
    }

    async fn exists(&self, key: StoreKey) -> Result<bool, Self::Error> {
        Ok(self.get(key).await?.is_some())
    }

    async fn count(&self, prefix: StorePrefix) -> Result<usize, Self::Error> {
        let state = self.state.read().await;
        Ok(Self::merged_view(&state, prefix.entity_type()).len())
    }

    async fn commit(&self) -> Result<(), Self::Error> {
        let mut state = self.state.write().await;
        let staged = std::mem::take(&mut state.staged);
        for (entity_type, entries) in staged {
            let docs = state.committed.entry(entity_type).or_default();
            for (id, entry) in entries {
                match entry {
                    Some(value) => {
                        docs.insert(id, value);
                    }
                    None => {
                        docs.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), Self::Error> {
        let mut state = self.state.write().await;
        state.committed.clear();
        state.staged.clear();
        Ok(())
    }
}

/// Statistics about the current state of the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryStoreStats {
    /// Number of entity types with committed data
    pub entity_types: usize,
    /// Total committed documents
    pub committed_documents: usize,
    /// Staged writes awaiting commit
    pub staged_writes: usize,
}
