//! Hydration and cross-reference resolution.
//!
//! Vendor payloads embed prior external records inline: an object carrying
//! the [`SOURCE_ID_KEY`] marker is a stand-in for "the record the source
//! system knows under this id", with its current field values as siblings
//! of the marker. The resolver walks a payload depth-first, hydrates each
//! such stand-in into a local object through the sync index, and replaces
//! the inline object with the local object id, turning a copy into a graph
//! edge.
//!
//! Entity types follow the declared field-to-subtype map: descending into
//! a field with a declared sub-type switches to it, any other field keeps
//! the enclosing type. Each resolved reference is persisted exactly once
//! during the walk; a single commit after the walk flushes them together.
//!
//! `async fn` cannot recurse directly, so the inner walk returns a boxed
//! future.

use crate::error::{BridgeError, BridgeResult};
use crate::model::{EntityType, ExternalId, LocalId, SourceId};
use crate::store::{ObjectStore, StoreKey};
use crate::sync::SyncIndex;
use log::debug;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;

/// Marker key whose presence makes an object a cross-reference.
pub const SOURCE_ID_KEY: &str = "_sourceId";

/// Depth-first payload resolver.
pub struct Resolver<'a, S: ObjectStore> {
    store: &'a S,
    index: &'a SyncIndex<S>,
    source: SourceId,
}

impl<'a, S: ObjectStore> Resolver<'a, S> {
    pub fn new(store: &'a S, index: &'a SyncIndex<S>, source: SourceId) -> Self {
        Self {
            store,
            index,
            source,
        }
    }

    /// Resolve every cross-reference in `payload` and commit the staged
    /// objects in one batch.
    pub async fn resolve(&self, payload: Value, root: EntityType) -> BridgeResult<Value> {
        let resolved = self.resolve_node(payload, root).await?;
        self.store.commit().await.map_err(BridgeError::store)?;
        Ok(resolved)
    }

    /// Resolve without the final commit, for callers batching several
    /// payloads into one transaction.
    pub async fn resolve_staged(&self, payload: Value, root: EntityType) -> BridgeResult<Value> {
        self.resolve_node(payload, root).await
    }

    fn resolve_node<'s>(
        &'s self,
        node: Value,
        entity_type: EntityType,
    ) -> Pin<Box<dyn Future<Output = BridgeResult<Value>> + Send + 's>> {
        Box::pin(async move {
            match node {
                Value::Array(items) => {
                    let mut resolved = Vec::with_capacity(items.len());
                    for item in items {
                        resolved.push(self.resolve_node(item, entity_type).await?);
                    }
                    Ok(Value::Array(resolved))
                }
                Value::Object(fields) => {
                    let mut resolved = Map::with_capacity(fields.len());
                    for (key, value) in fields {
                        let sub_type = entity_type
                            .sub_type_for_field(&key)
                            .unwrap_or(entity_type);
                        resolved.insert(key, self.resolve_node(value, sub_type).await?);
                    }
                    match marker_of(&resolved) {
                        Some(external_id) => {
                            let local_id =
                                self.hydrate(entity_type, external_id, resolved).await?;
                            Ok(Value::String(local_id.into_string()))
                        }
                        None => Ok(Value::Object(resolved)),
                    }
                }
                scalar => Ok(scalar),
            }
        })
    }

    /// Persist a marked object as a local entity and return its id.
    async fn hydrate(
        &self,
        entity_type: EntityType,
        external_id: ExternalId,
        mut fields: Map<String, Value>,
    ) -> BridgeResult<LocalId> {
        fields.remove(SOURCE_ID_KEY);

        let mut sync = self
            .index
            .find_or_create(&self.source, entity_type, &external_id)
            .await?;
        let local_id = sync
            .local_object_id
            .clone()
            .unwrap_or_else(LocalId::generate);
        fields.insert(
            "id".to_string(),
            Value::String(local_id.as_str().to_string()),
        );
        self.store
            .put(
                StoreKey::new(entity_type, local_id.as_str()),
                Value::Object(fields),
            )
            .await
            .map_err(BridgeError::store)?;
        self.index.attach(&mut sync, local_id.clone()).await?;

        debug!(
            "resolved {} reference {} -> {}",
            entity_type, external_id, local_id
        );
        Ok(local_id)
    }
}

/// The external id a marked object stands for, if any.
fn marker_of(fields: &Map<String, Value>) -> Option<ExternalId> {
    let raw = match fields.get(SOURCE_ID_KEY)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    ExternalId::new(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StorePrefix};
    use serde_json::json;

    fn source() -> SourceId {
        SourceId::new("xxllnc")
    }

    #[tokio::test]
    async fn test_plain_payload_passes_through_unchanged() {
        let store = InMemoryStore::new();
        let index = SyncIndex::new(store.clone());
        let resolver = Resolver::new(&store, &index, source());

        let payload = json!({"omschrijving": "Aanvraag", "rollen": []});
        let resolved = resolver
            .resolve(payload.clone(), EntityType::Case)
            .await
            .unwrap();
        assert_eq!(resolved, payload);
    }

    #[tokio::test]
    async fn test_marked_file_reference_becomes_an_edge() {
        let store = InMemoryStore::new();
        let index = SyncIndex::new(store.clone());
        let resolver = Resolver::new(&store, &index, source());

        let payload = json!({
            "zaak": "case-1",
            "informatieobject": {
                "_sourceId": "doc-701984",
                "bestandsnaam": "besluit.pdf",
            },
        });
        let resolved = resolver
            .resolve(payload, EntityType::ZaakInformatieObject)
            .await
            .unwrap();

        let document_id = resolved["informatieobject"].as_str().unwrap().to_string();
        let stored = store
            .get(StoreKey::new(EntityType::Document, &document_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["bestandsnaam"], "besluit.pdf");
        assert!(stored.get(SOURCE_ID_KEY).is_none());

        let record = index
            .find_by_external(
                &source(),
                EntityType::Document,
                &ExternalId::try_from("doc-701984").unwrap(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            record.local_object_id.unwrap().as_str(),
            document_id.as_str()
        );
    }

    #[tokio::test]
    async fn test_same_reference_resolves_to_same_object() {
        let store = InMemoryStore::new();
        let index = SyncIndex::new(store.clone());
        let resolver = Resolver::new(&store, &index, source());

        let payload = || {
            json!({
                "informatieobject": {"_sourceId": "doc-1", "bestandsnaam": "a.pdf"},
            })
        };
        let first = resolver
            .resolve(payload(), EntityType::ZaakInformatieObject)
            .await
            .unwrap();
        let second = resolver
            .resolve(payload(), EntityType::ZaakInformatieObject)
            .await
            .unwrap();

        assert_eq!(first["informatieobject"], second["informatieobject"]);
        assert_eq!(
            store
                .count(StorePrefix::of(EntityType::Document))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_array_elements_resolve_independently() {
        let store = InMemoryStore::new();
        let index = SyncIndex::new(store.clone());
        let resolver = Resolver::new(&store, &index, source());

        let payload = json!({
            "zaakinformatieobjecten": [
                {"_sourceId": "zio-1", "informatieobject": {"_sourceId": "doc-1"}},
                {"_sourceId": "zio-2", "informatieobject": {"_sourceId": "doc-2"}},
            ],
        });
        let resolved = resolver.resolve(payload, EntityType::Case).await.unwrap();

        let links = resolved["zaakinformatieobjecten"].as_array().unwrap();
        assert_eq!(links.len(), 2);
        assert!(links.iter().all(Value::is_string));
        assert_eq!(
            store
                .count(StorePrefix::of(EntityType::ZaakInformatieObject))
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .count(StorePrefix::of(EntityType::Document))
                .await
                .unwrap(),
            2
        );
    }
}
