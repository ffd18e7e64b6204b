//! The sync engine: batch and single-record drivers over the mapping,
//! resolution and transfer components.
//!
//! Batch drivers page the vendor listing to exhaustion, process records in
//! listing order, and commit the store every [`DEFAULT_BATCH_SIZE`]
//! records plus once at the end, so an aborted run loses at most one
//! uncommitted batch. One record's mapping failure is logged with its
//! external id and the pass continues; only configuration and transport
//! failures abort a pass.

use crate::bridge::report::SyncReport;
use crate::documents::{DocumentTransfer, TransferHandle};
use crate::error::{BridgeError, BridgeResult, MappingError};
use crate::mapping::{
    Classification, ForwardMapper, MappingConfig, ReverseMapper, classify, external_id_of,
    strip_for_create, strip_for_update,
};
use crate::model::{CatalogHandle, EntityType, ExternalId, LocalId, SourceId};
use crate::resolve::Resolver;
use crate::store::{ObjectStore, StoreKey};
use crate::sync::SyncIndex;
use crate::vendor::VendorClient;
use log::{info, warn};
use serde_json::{Value, json};

/// Listing path for cases on the vendor API.
const CASE_PATH: &str = "case";

/// Listing path for casetypes on the vendor API.
const CASETYPE_PATH: &str = "casetype";

/// Records per store commit in batch drivers.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Orchestrates full sync passes and single-record operations.
pub struct SyncEngine<S: ObjectStore + Clone, V: VendorClient> {
    store: S,
    index: SyncIndex<S>,
    vendor: V,
    config: MappingConfig,
    source: SourceId,
    batch_size: usize,
}

impl<S: ObjectStore + Clone, V: VendorClient> SyncEngine<S, V> {
    pub fn new(store: S, vendor: V, config: MappingConfig, source: SourceId) -> Self {
        let index = SyncIndex::new(store.clone());
        Self {
            store,
            index,
            vendor,
            config,
            source,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the per-commit batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn index(&self) -> &SyncIndex<S> {
        &self.index
    }

    /// Sync every casetype the vendor lists.
    ///
    /// Decision-titled casetypes route to decision-type mapping, everything
    /// else to case-type mapping.
    pub async fn sync_all_case_types(&self) -> BridgeResult<SyncReport> {
        let rows = self.vendor.fetch_all(CASETYPE_PATH).await?;
        let catalog = CatalogHandle::ensure(&self.store).await?;
        let mapper = self.forward_mapper();

        let mut report = SyncReport::new();
        report.fetched = rows.len();
        for (position, row) in rows.iter().enumerate() {
            match self.sync_case_type_row(&mapper, &catalog, row).await {
                Ok(was_known) => {
                    if was_known {
                        report.updated += 1;
                    } else {
                        report.created += 1;
                    }
                }
                Err(error) => {
                    warn!("casetype {} skipped: {}", row_label(row), error);
                    report.skipped += 1;
                }
            }
            if (position + 1) % self.batch_size == 0 {
                self.store.commit().await.map_err(BridgeError::store)?;
            }
        }
        self.store.commit().await.map_err(BridgeError::store)?;

        info!("casetype sync finished: {}", report);
        Ok(report)
    }

    /// Sync every case the vendor lists, mapping missing casetypes on
    /// demand before the cases that reference them.
    pub async fn sync_all_cases(&self) -> BridgeResult<SyncReport> {
        let rows = self.vendor.fetch_all(CASE_PATH).await?;
        let catalog = CatalogHandle::ensure(&self.store).await?;
        let mapper = self.forward_mapper();
        let resolver = self.resolver();

        let mut report = SyncReport::new();
        report.fetched = rows.len();
        for (position, row) in rows.iter().enumerate() {
            match self.sync_case_row(&mapper, &resolver, &catalog, row).await {
                Ok(was_known) => {
                    if was_known {
                        report.updated += 1;
                    } else {
                        report.created += 1;
                    }
                }
                Err(error) => {
                    warn!("case {} skipped: {}", row_label(row), error);
                    report.skipped += 1;
                }
            }
            if (position + 1) % self.batch_size == 0 {
                self.store.commit().await.map_err(BridgeError::store)?;
            }
        }
        self.store.commit().await.map_err(BridgeError::store)?;

        info!("case sync finished: {}", report);
        Ok(report)
    }

    /// Fetch and sync one casetype by its vendor id.
    pub async fn sync_one_case_type(&self, external_id: &ExternalId) -> BridgeResult<LocalId> {
        let raw = self
            .vendor
            .fetch_one(CASETYPE_PATH, external_id.as_str())
            .await?
            .ok_or_else(|| BridgeError::object_not_found("ZaakType", external_id.as_str()))?;
        let catalog = CatalogHandle::ensure(&self.store).await?;
        let mapper = self.forward_mapper();

        let local_id = match classify(&self.config, &raw) {
            Classification::DecisionType => mapper.map_decision_type(&raw, &catalog).await?,
            Classification::CaseType => mapper.map_case_type(&raw, &catalog).await?,
        };
        self.store.commit().await.map_err(BridgeError::store)?;
        Ok(local_id)
    }

    /// Fetch and sync one case by its vendor id.
    pub async fn sync_one_case(&self, external_id: &ExternalId) -> BridgeResult<LocalId> {
        let raw = self
            .vendor
            .fetch_one(CASE_PATH, external_id.as_str())
            .await?
            .ok_or_else(|| BridgeError::object_not_found("Zaak", external_id.as_str()))?;
        let catalog = CatalogHandle::ensure(&self.store).await?;
        let mapper = self.forward_mapper();
        let resolver = self.resolver();

        let case_type_id = self.ensure_case_type_for(&mapper, &catalog, &raw).await?;
        let resolved = resolver.resolve_staged(raw, EntityType::Case).await?;
        let local_id = mapper.map_case(&resolved, &case_type_id).await?;
        self.store.commit().await.map_err(BridgeError::store)?;
        Ok(local_id)
    }

    /// Push a local case to the vendor, creating or updating depending on
    /// whether its sync record already carries a vendor id.
    ///
    /// Returns the vendor-side case id. On a create, the sync record is
    /// attached only after the vendor confirmed the call.
    pub async fn push_case_to_vendor(&self, case_id: &LocalId) -> BridgeResult<String> {
        let case = self
            .load(EntityType::Case, case_id.as_str())
            .await?
            .ok_or_else(|| BridgeError::object_not_found("Zaak", case_id.as_str()))?;
        let case_type_id = case
            .get("zaaktype")
            .and_then(Value::as_str)
            .ok_or_else(|| MappingError::missing_field("zaaktype"))
            .map_err(BridgeError::Mapping)?;
        let case_type = self
            .load(EntityType::CaseType, case_type_id)
            .await?
            .ok_or_else(|| BridgeError::object_not_found("ZaakType", case_type_id))?;
        let case_type_record = self
            .index
            .find_by_local(EntityType::CaseType, &LocalId::from_string(case_type_id))
            .await?
            .ok_or_else(|| BridgeError::Unattached {
                external_id: case_type_id.to_string(),
            })?;

        let reverse = ReverseMapper::new(&self.store, &self.index, self.source.clone());
        let mut draft = reverse
            .map_zaak_to_case(&case_type_record.external_id, &case_type, &case)
            .await?;

        let documents = self.attached_documents(&case).await?;
        let transfer =
            DocumentTransfer::new(&self.store, &self.index, &self.vendor, self.source.clone());

        let existing = self.index.find_by_local(EntityType::Case, case_id).await?;
        let vendor_id = match existing {
            Some(record) => {
                let vendor_id = record.external_id.clone();
                for document_id in &documents {
                    let handle = transfer.transfer(vendor_id.as_str(), document_id).await?;
                    transfer
                        .link_into_case(&mut draft, document_id, &handle)
                        .await?;
                }
                strip_for_update(&mut draft);
                self.vendor.update_case(vendor_id.as_str(), draft).await?;
                info!("updated vendor case {} from {}", vendor_id, case_id);
                vendor_id.into_string()
            }
            None => {
                // No vendor case id yet, so content uploads must wait; the
                // reserved serials still ride along in the payload.
                for document_id in &documents {
                    let serial = transfer.reserve_number(document_id).await?;
                    let handle = TransferHandle {
                        serial,
                        reference: None,
                    };
                    transfer
                        .link_into_case(&mut draft, document_id, &handle)
                        .await?;
                }
                strip_for_create(&mut draft);
                let vendor_id = self.vendor.create_case(draft).await?;
                let external_id =
                    ExternalId::new(vendor_id.clone()).map_err(BridgeError::Mapping)?;
                let mut record = self
                    .index
                    .find_or_create(&self.source, EntityType::Case, &external_id)
                    .await?;
                self.index.attach(&mut record, case_id.clone()).await?;
                info!("created vendor case {} from {}", vendor_id, case_id);
                vendor_id
            }
        };
        self.store.commit().await.map_err(BridgeError::store)?;
        Ok(vendor_id)
    }

    /// Push a local besluit to the vendor as a case and relate it to the
    /// case it decides on.
    ///
    /// A failed relation call is reported but does not roll back the
    /// already-created vendor case.
    pub async fn push_decision_to_vendor(&self, besluit_id: &LocalId) -> BridgeResult<String> {
        let besluit = self
            .load(EntityType::Besluit, besluit_id.as_str())
            .await?
            .ok_or_else(|| BridgeError::object_not_found("Besluit", besluit_id.as_str()))?;
        let case_id = besluit
            .get("zaak")
            .and_then(Value::as_str)
            .ok_or_else(|| MappingError::missing_field("zaak"))
            .map_err(BridgeError::Mapping)?;
        let case_record = self
            .index
            .find_by_local(EntityType::Case, &LocalId::from_string(case_id))
            .await?
            .ok_or_else(|| BridgeError::Unattached {
                external_id: case_id.to_string(),
            })?;
        let decision_type_id = besluit
            .get("besluittype")
            .and_then(Value::as_str)
            .ok_or_else(|| MappingError::missing_field("besluittype"))
            .map_err(BridgeError::Mapping)?;
        let decision_type_record = self
            .index
            .find_by_local(
                EntityType::DecisionType,
                &LocalId::from_string(decision_type_id),
            )
            .await?
            .ok_or_else(|| BridgeError::Unattached {
                external_id: decision_type_id.to_string(),
            })?;

        let draft = json!({
            "casetype_id": decision_type_record.external_id.as_str(),
            "subject": besluit
                .get("toelichting")
                .and_then(Value::as_str)
                .unwrap_or("Besluit"),
            "source": "behandelaar",
        });
        let vendor_id = self.vendor.create_case(draft).await?;
        let external_id = ExternalId::new(vendor_id.clone()).map_err(BridgeError::Mapping)?;
        let mut record = self
            .index
            .find_or_create(&self.source, EntityType::Besluit, &external_id)
            .await?;
        self.index.attach(&mut record, besluit_id.clone()).await?;

        if let Err(error) = self
            .vendor
            .relate_case(&vendor_id, case_record.external_id.as_str())
            .await
        {
            warn!(
                "besluit case {} created but relating to {} failed: {}",
                vendor_id, case_record.external_id, error
            );
        }
        self.store.commit().await.map_err(BridgeError::store)?;
        Ok(vendor_id)
    }

    /// Link every decision type in the catalog into one case type.
    ///
    /// Returns the number of links actually added.
    pub async fn connect_decision_types_to_case_type(
        &self,
        case_type_id: &LocalId,
    ) -> BridgeResult<usize> {
        let catalog = CatalogHandle::ensure(&self.store).await?;
        let decision_types = catalog.decision_types(&self.store).await?;

        let mut case_type = self
            .load(EntityType::CaseType, case_type_id.as_str())
            .await?
            .ok_or_else(|| BridgeError::object_not_found("ZaakType", case_type_id.as_str()))?;
        let members = case_type
            .get_mut("besluittypen")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| {
                BridgeError::configuration("case type has no 'besluittypen' collection")
            })?;

        let mut added = 0;
        for decision_type in &decision_types {
            let entry = Value::String(decision_type.as_str().to_string());
            if !members.contains(&entry) {
                members.push(entry);
                added += 1;
            }
        }
        if added > 0 {
            self.store
                .put(
                    StoreKey::new(EntityType::CaseType, case_type_id.as_str()),
                    case_type,
                )
                .await
                .map_err(BridgeError::store)?;
        }
        self.store.commit().await.map_err(BridgeError::store)?;
        Ok(added)
    }

    /// Link every decision type in the catalog into every case type.
    pub async fn connect_decision_types_to_all_case_types(&self) -> BridgeResult<usize> {
        let catalog = CatalogHandle::ensure(&self.store).await?;
        let mut added = 0;
        for case_type_id in catalog.case_types(&self.store).await? {
            added += self
                .connect_decision_types_to_case_type(&case_type_id)
                .await?;
        }
        Ok(added)
    }

    async fn sync_case_type_row(
        &self,
        mapper: &ForwardMapper<'_, S>,
        catalog: &CatalogHandle,
        row: &Value,
    ) -> BridgeResult<bool> {
        let external_id = external_id_of(row)?;
        let (entity_type, classification) = match classify(&self.config, row) {
            Classification::DecisionType => (EntityType::DecisionType, Classification::DecisionType),
            Classification::CaseType => (EntityType::CaseType, Classification::CaseType),
        };
        let was_known = self
            .index
            .find_by_external(&self.source, entity_type, &external_id)
            .await?
            .is_some_and(|record| record.is_attached());

        match classification {
            Classification::DecisionType => mapper.map_decision_type(row, catalog).await?,
            Classification::CaseType => mapper.map_case_type(row, catalog).await?,
        };
        Ok(was_known)
    }

    async fn sync_case_row(
        &self,
        mapper: &ForwardMapper<'_, S>,
        resolver: &Resolver<'_, S>,
        catalog: &CatalogHandle,
        row: &Value,
    ) -> BridgeResult<bool> {
        let external_id = external_id_of(row)?;
        let was_known = self
            .index
            .find_by_external(&self.source, EntityType::Case, &external_id)
            .await?
            .is_some_and(|record| record.is_attached());

        let case_type_id = self.ensure_case_type_for(mapper, catalog, row).await?;
        let resolved = resolver
            .resolve_staged(row.clone(), EntityType::Case)
            .await?;
        mapper.map_case(&resolved, &case_type_id).await?;
        Ok(was_known)
    }

    /// The local id of the casetype a case row references, mapping the
    /// casetype from the vendor first if this bridge has never seen it.
    async fn ensure_case_type_for(
        &self,
        mapper: &ForwardMapper<'_, S>,
        catalog: &CatalogHandle,
        row: &Value,
    ) -> BridgeResult<LocalId> {
        let reference =
            case_type_reference(row).ok_or_else(|| MappingError::UnknownCaseType {
                external_id: row_label(row),
            })?;
        let external_id = ExternalId::new(reference).map_err(BridgeError::Mapping)?;

        if let Some(record) = self
            .index
            .find_by_external(&self.source, EntityType::CaseType, &external_id)
            .await?
        {
            if let Some(local_id) = record.local_object_id {
                return Ok(local_id);
            }
        }

        let raw = self
            .vendor
            .fetch_one(CASETYPE_PATH, external_id.as_str())
            .await?
            .ok_or_else(|| MappingError::UnknownCaseType {
                external_id: external_id.as_str().to_string(),
            })?;
        mapper.map_case_type(&raw, catalog).await
    }

    /// Document ids attached to a case through its file links.
    async fn attached_documents(&self, case: &Value) -> BridgeResult<Vec<LocalId>> {
        let links = case
            .get("zaakinformatieobjecten")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut documents = Vec::new();
        for link_id in links.iter().filter_map(Value::as_str) {
            let Some(link) = self.load(EntityType::ZaakInformatieObject, link_id).await? else {
                continue;
            };
            if let Some(document_id) = link.get("informatieobject").and_then(Value::as_str) {
                documents.push(LocalId::from_string(document_id));
            }
        }
        Ok(documents)
    }

    fn forward_mapper(&self) -> ForwardMapper<'_, S> {
        ForwardMapper::new(&self.config, &self.store, &self.index, self.source.clone())
    }

    fn resolver(&self) -> Resolver<'_, S> {
        Resolver::new(&self.store, &self.index, self.source.clone())
    }

    async fn load(&self, entity_type: EntityType, id: &str) -> BridgeResult<Option<Value>> {
        self.store
            .get(StoreKey::new(entity_type, id))
            .await
            .map_err(BridgeError::store)
    }
}

/// The casetype a case row references, as the vendor's external id.
fn case_type_reference(row: &Value) -> Option<String> {
    let casetype = row.pointer("/instance/casetype")?;
    match casetype {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(_) => casetype
            .get("reference")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| match casetype.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            }),
        _ => None,
    }
}

/// Best-effort identity of a row for log lines.
fn row_label(row: &Value) -> String {
    external_id_of(row)
        .map(|id| id.into_string())
        .unwrap_or_else(|_| "<no reference>".to_string())
}
