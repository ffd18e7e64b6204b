//! The external-id synchronization index.
//!
//! Every other component depends on this one for idempotence. A
//! [`SyncRecord`] is the durable link between one external record and one
//! local object, keyed by the triple `(source, entity type, external id)`.
//! The record's storage id is a SHA-256 digest of that triple, so the
//! storage key *is* the idempotence key: re-putting a record for the same
//! triple is an upsert by construction and can never create a duplicate.
//!
//! `find_or_create` is serialized through an internal lock so that two
//! passes racing on the same external id produce a single winner; the
//! loser observes and reuses the winner's record.

use crate::error::{BridgeError, BridgeResult};
use crate::model::{EntityType, ExternalId, LocalId, SourceId};
use crate::store::{ObjectStore, StoreKey, StorePrefix};
use chrono::{DateTime, Utc};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

/// Durable link between one local object and one external record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Deterministic id derived from the idempotence triple
    pub id: String,
    /// Remote source system this record came from
    pub source_id: SourceId,
    /// Local schema the sync is for
    pub entity_type: EntityType,
    /// The remote record's natural key
    pub external_id: ExternalId,
    /// Local object identity, set once the first map succeeds
    pub local_object_id: Option<LocalId>,
    /// Which transform rule set produced this record
    pub mapping_ref: String,
    /// When this record was first created
    pub created_at: DateTime<Utc>,
}

impl SyncRecord {
    /// Deterministic record id for an idempotence triple.
    pub fn id_for(source: &SourceId, entity_type: EntityType, external_id: &ExternalId) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(entity_type.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(external_id.as_str().as_bytes());
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Whether this record has been attached to a local object.
    pub fn is_attached(&self) -> bool {
        self.local_object_id.is_some()
    }
}

/// The synchronization index over a backing store.
///
/// Holds a clone of the store handle; all records live under the
/// `Synchronization` prefix as plain JSON documents.
pub struct SyncIndex<S: ObjectStore> {
    store: S,
    // Serializes lookup-or-create so a create race has a single winner.
    create_lock: Mutex<()>,
}

impl<S: ObjectStore> SyncIndex<S> {
    /// Create an index over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            create_lock: Mutex::new(()),
        }
    }

    /// Look up the sync record for a triple, creating it if absent.
    ///
    /// An existing record is returned unchanged. A fresh record starts
    /// with no local object id; [`attach`](Self::attach) sets it once the
    /// local object is persisted.
    pub async fn find_or_create(
        &self,
        source: &SourceId,
        entity_type: EntityType,
        external_id: &ExternalId,
    ) -> BridgeResult<SyncRecord> {
        let _guard = self.create_lock.lock().await;

        let id = SyncRecord::id_for(source, entity_type, external_id);
        let key = StoreKey::new(EntityType::Synchronization, &id);

        if let Some(existing) = self.store.get(key.clone()).await.map_err(BridgeError::store)? {
            trace!("sync record {} exists for {}", id, external_id);
            return Ok(serde_json::from_value(existing)?);
        }

        let record = SyncRecord {
            id: id.clone(),
            source_id: source.clone(),
            entity_type,
            external_id: external_id.clone(),
            local_object_id: None,
            mapping_ref: format!("xxllnc.{}", entity_type.as_str()),
            created_at: Utc::now(),
        };
        self.store
            .put(key, serde_json::to_value(&record)?)
            .await
            .map_err(BridgeError::store)?;
        debug!(
            "created sync record {} for {} {}",
            id, entity_type, external_id
        );
        Ok(record)
    }

    /// Attach a local object to a sync record.
    ///
    /// Idempotent: attaching the same id again is a no-op; a different id
    /// replaces the previous one (last writer wins on re-sync).
    pub async fn attach(&self, record: &mut SyncRecord, local_id: LocalId) -> BridgeResult<()> {
        if record.local_object_id.as_ref() == Some(&local_id) {
            return Ok(());
        }
        record.local_object_id = Some(local_id);
        self.store
            .put(
                StoreKey::new(EntityType::Synchronization, &record.id),
                serde_json::to_value(&*record)?,
            )
            .await
            .map_err(BridgeError::store)?;
        Ok(())
    }

    /// Look up a sync record by triple without creating one.
    pub async fn find_by_external(
        &self,
        source: &SourceId,
        entity_type: EntityType,
        external_id: &ExternalId,
    ) -> BridgeResult<Option<SyncRecord>> {
        let id = SyncRecord::id_for(source, entity_type, external_id);
        let document = self
            .store
            .get(StoreKey::new(EntityType::Synchronization, id))
            .await
            .map_err(BridgeError::store)?;
        Ok(match document {
            Some(value) => Some(serde_json::from_value(value)?),
            None => None,
        })
    }

    /// Look up the sync record owning a local object, if any.
    pub async fn find_by_local(
        &self,
        entity_type: EntityType,
        local_id: &LocalId,
    ) -> BridgeResult<Option<SyncRecord>> {
        let matches = self
            .store
            .find_by_attribute(
                StorePrefix::of(EntityType::Synchronization),
                "local_object_id",
                local_id.as_str(),
            )
            .await
            .map_err(BridgeError::store)?;
        for (_, document) in matches {
            let record: SyncRecord = serde_json::from_value(document)?;
            if record.entity_type == entity_type {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn source() -> SourceId {
        SourceId::new("xxllnc-test")
    }

    fn ext(id: &str) -> ExternalId {
        ExternalId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_find_or_create_returns_same_record() {
        let index = SyncIndex::new(InMemoryStore::new());
        let first = index
            .find_or_create(&source(), EntityType::Case, &ext("ref-1"))
            .await
            .unwrap();
        let second = index
            .find_or_create(&source(), EntityType::Case, &ext("ref-1"))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert!(!first.is_attached());
    }

    #[tokio::test]
    async fn test_triple_scoping() {
        let index = SyncIndex::new(InMemoryStore::new());
        let case = index
            .find_or_create(&source(), EntityType::Case, &ext("ref-1"))
            .await
            .unwrap();
        let case_type = index
            .find_or_create(&source(), EntityType::CaseType, &ext("ref-1"))
            .await
            .unwrap();
        // Same external id, different entity type: different records
        assert_ne!(case.id, case_type.id);
    }

    #[tokio::test]
    async fn test_attach_is_idempotent() {
        let store = InMemoryStore::new();
        let index = SyncIndex::new(store);
        let mut record = index
            .find_or_create(&source(), EntityType::Case, &ext("ref-1"))
            .await
            .unwrap();

        let local = LocalId::generate();
        index.attach(&mut record, local.clone()).await.unwrap();
        index.attach(&mut record, local.clone()).await.unwrap();

        let reread = index
            .find_by_external(&source(), EntityType::Case, &ext("ref-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reread.local_object_id, Some(local));
    }

    #[tokio::test]
    async fn test_find_by_local() {
        let index = SyncIndex::new(InMemoryStore::new());
        let mut record = index
            .find_or_create(&source(), EntityType::CaseType, &ext("zt-9"))
            .await
            .unwrap();
        let local = LocalId::generate();
        index.attach(&mut record, local.clone()).await.unwrap();

        let found = index
            .find_by_local(EntityType::CaseType, &local)
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.external_id), Some(ext("zt-9")));

        let missing = index
            .find_by_local(EntityType::Case, &local)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_find_or_create_single_winner() {
        use std::sync::Arc;

        let index = Arc::new(SyncIndex::new(InMemoryStore::new()));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let index = Arc::clone(&index);
            handles.push(tokio::spawn(async move {
                index
                    .find_or_create(&source(), EntityType::Case, &ext("raced"))
                    .await
                    .unwrap()
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }
}
