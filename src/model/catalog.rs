//! Explicit handle to the singleton catalog object.
//!
//! The catalog aggregates every case type and decision type the bridge has
//! produced. Nothing global: any function that must attach a new type
//! receives a [`CatalogHandle`] explicitly and goes through the store.
//!
//! Membership writes are id-set unions, never appends, so re-linking the
//! same case type on every sync pass cannot grow the collections. The
//! store's read-your-writes overlay makes a membership write visible to an
//! immediately following read within the same logical operation.

use crate::error::{BridgeError, BridgeResult};
use crate::model::{EntityType, LocalId};
use crate::store::{ObjectStore, StoreKey};
use serde_json::{Value, json};

/// Well-known id of the singleton catalog document.
const CATALOG_ID: &str = "hoofdcatalogus";

/// Handle to the singleton catalog.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    id: LocalId,
}

impl CatalogHandle {
    /// Ensure the catalog document exists and return a handle to it.
    pub async fn ensure<S: ObjectStore>(store: &S) -> BridgeResult<Self> {
        let key = StoreKey::new(EntityType::Catalog, CATALOG_ID);
        let existing = store.get(key.clone()).await.map_err(BridgeError::store)?;
        if existing.is_none() {
            let document = json!({
                "id": CATALOG_ID,
                "domein": "XXLLNC",
                "zaaktypen": [],
                "besluittypen": [],
            });
            store.put(key, document).await.map_err(BridgeError::store)?;
        }
        Ok(Self {
            id: LocalId::from_string(CATALOG_ID),
        })
    }

    /// Local identity of the catalog document.
    pub fn id(&self) -> &LocalId {
        &self.id
    }

    /// Add a case type to the catalog's case-type set.
    pub async fn add_case_type<S: ObjectStore>(
        &self,
        store: &S,
        case_type_id: &LocalId,
    ) -> BridgeResult<()> {
        self.add_member(store, "zaaktypen", case_type_id).await
    }

    /// Add a decision type to the catalog's decision-type set.
    pub async fn add_decision_type<S: ObjectStore>(
        &self,
        store: &S,
        decision_type_id: &LocalId,
    ) -> BridgeResult<()> {
        self.add_member(store, "besluittypen", decision_type_id).await
    }

    /// Case-type ids currently in the catalog.
    pub async fn case_types<S: ObjectStore>(&self, store: &S) -> BridgeResult<Vec<LocalId>> {
        self.members(store, "zaaktypen").await
    }

    /// Decision-type ids currently in the catalog.
    pub async fn decision_types<S: ObjectStore>(&self, store: &S) -> BridgeResult<Vec<LocalId>> {
        self.members(store, "besluittypen").await
    }

    async fn load<S: ObjectStore>(&self, store: &S) -> BridgeResult<Value> {
        store
            .get(StoreKey::new(EntityType::Catalog, self.id.as_str()))
            .await
            .map_err(BridgeError::store)?
            .ok_or_else(|| BridgeError::object_not_found("Catalogus", self.id.as_str()))
    }

    async fn add_member<S: ObjectStore>(
        &self,
        store: &S,
        collection: &str,
        member: &LocalId,
    ) -> BridgeResult<()> {
        let mut document = self.load(store).await?;
        let set = document
            .get_mut(collection)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| {
                BridgeError::configuration(format!("catalog has no '{collection}' collection"))
            })?;
        let entry = Value::String(member.as_str().to_string());
        if !set.contains(&entry) {
            set.push(entry);
            store
                .put(StoreKey::new(EntityType::Catalog, self.id.as_str()), document)
                .await
                .map_err(BridgeError::store)?;
        }
        Ok(())
    }

    async fn members<S: ObjectStore>(
        &self,
        store: &S,
        collection: &str,
    ) -> BridgeResult<Vec<LocalId>> {
        let document = self.load(store).await?;
        Ok(document
            .get(collection)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(LocalId::from_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}
