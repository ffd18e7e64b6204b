//! Outbound document transfer.
//!
//! A document attached to a case moves through four states on its way to
//! the vendor:
//!
//! ```text
//! Unregistered -> NumberReserved -> ContentUploaded -> Linked
//! ```
//!
//! Reserving a number stores the returned serial as the document's sync
//! record, so a re-sync sees the record and skips the reservation. That
//! skip is the whole duplicate-prevention mechanism: a document that ever
//! reserved a serial can never reserve a second one. Uploads leave a
//! reference token on the document itself and are skipped the same way.
//!
//! Transport failures fail the step closed. No retry; the caller decides
//! whether the pass continues.

use crate::error::{BridgeError, BridgeResult};
use crate::model::{EntityType, ExternalId, LocalId, SourceId};
use crate::store::{ObjectStore, StoreKey};
use crate::sync::SyncIndex;
use crate::vendor::{FileUpload, VendorClient};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, info};
use serde_json::Value;

/// Field on the document holding the vendor content-reference token.
const REFERENCE_FIELD: &str = "vendorReference";

/// Field on the document marking it as embedded in a pushed case.
const LINKED_FIELD: &str = "vendorLinked";

/// Where a document stands in the outbound transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// No vendor serial reserved yet
    Unregistered,
    /// Serial reserved, content not yet uploaded
    NumberReserved,
    /// Content uploaded, not yet embedded in a case payload
    ContentUploaded,
    /// Embedded in a case payload sent to the vendor
    Linked,
}

/// Outcome of one transfer step: the serial and, once uploaded, the
/// content reference to embed in the case payload.
#[derive(Debug, Clone)]
pub struct TransferHandle {
    pub serial: ExternalId,
    pub reference: Option<String>,
}

/// Drives documents through the transfer state machine.
pub struct DocumentTransfer<'a, S: ObjectStore, V: VendorClient> {
    store: &'a S,
    index: &'a SyncIndex<S>,
    vendor: &'a V,
    source: SourceId,
}

impl<'a, S: ObjectStore, V: VendorClient> DocumentTransfer<'a, S, V> {
    pub fn new(store: &'a S, index: &'a SyncIndex<S>, vendor: &'a V, source: SourceId) -> Self {
        Self {
            store,
            index,
            vendor,
            source,
        }
    }

    /// Current transfer state of a document.
    pub async fn state_of(&self, document_id: &LocalId) -> BridgeResult<TransferState> {
        let record = self
            .index
            .find_by_local(EntityType::Document, document_id)
            .await?;
        if record.is_none() {
            return Ok(TransferState::Unregistered);
        }
        let document = self.load(document_id).await?;
        if document.get(LINKED_FIELD).and_then(Value::as_bool) == Some(true) {
            return Ok(TransferState::Linked);
        }
        if document.get(REFERENCE_FIELD).and_then(Value::as_str).is_some() {
            return Ok(TransferState::ContentUploaded);
        }
        Ok(TransferState::NumberReserved)
    }

    /// `Unregistered -> NumberReserved`: reserve a vendor serial for the
    /// document, or return the one already reserved.
    pub async fn reserve_number(&self, document_id: &LocalId) -> BridgeResult<ExternalId> {
        if let Some(record) = self
            .index
            .find_by_local(EntityType::Document, document_id)
            .await?
        {
            debug!(
                "document {} already holds serial {}, reservation skipped",
                document_id, record.external_id
            );
            return Ok(record.external_id);
        }

        let serial = self.vendor.reserve_document_number().await?;
        let serial = ExternalId::new(serial).map_err(BridgeError::Mapping)?;
        let mut record = self
            .index
            .find_or_create(&self.source, EntityType::Document, &serial)
            .await?;
        self.index.attach(&mut record, document_id.clone()).await?;

        info!("reserved serial {} for document {}", serial, document_id);
        Ok(serial)
    }

    /// `NumberReserved -> ContentUploaded`: push the document's binary
    /// content to the vendor and record the returned reference token.
    ///
    /// A document that already carries a token is not re-uploaded.
    pub async fn upload_content(
        &self,
        case_vendor_id: &str,
        document_id: &LocalId,
    ) -> BridgeResult<String> {
        let mut document = self.load(document_id).await?;
        if let Some(reference) = document.get(REFERENCE_FIELD).and_then(Value::as_str) {
            debug!(
                "document {} already uploaded as {}, upload skipped",
                document_id, reference
            );
            return Ok(reference.to_string());
        }

        let upload = upload_of(&document)
            .ok_or_else(|| BridgeError::object_not_found("Document inhoud", document_id.as_str()))?;
        let reference = self.vendor.prepare_file(case_vendor_id, upload).await?;

        document[REFERENCE_FIELD] = Value::String(reference.clone());
        self.store
            .put(
                StoreKey::new(EntityType::Document, document_id.as_str()),
                document,
            )
            .await
            .map_err(BridgeError::store)?;

        info!(
            "uploaded document {} to case {} as {}",
            document_id, case_vendor_id, reference
        );
        Ok(reference)
    }

    /// Run a document up to `ContentUploaded`, skipping whatever steps
    /// its sync record shows as already done.
    pub async fn transfer(
        &self,
        case_vendor_id: &str,
        document_id: &LocalId,
    ) -> BridgeResult<TransferHandle> {
        let serial = self.reserve_number(document_id).await?;
        let reference = self.upload_content(case_vendor_id, document_id).await?;
        Ok(TransferHandle {
            serial,
            reference: Some(reference),
        })
    }

    /// `ContentUploaded -> Linked`: embed the transfer handle into a case
    /// payload's "files" list and mark the document linked.
    pub async fn link_into_case(
        &self,
        case_payload: &mut Value,
        document_id: &LocalId,
        handle: &TransferHandle,
    ) -> BridgeResult<()> {
        let entry = match &handle.reference {
            Some(reference) => serde_json::json!({
                "reference": reference,
                "number": handle.serial.as_str(),
            }),
            None => serde_json::json!({ "number": handle.serial.as_str() }),
        };
        if case_payload.get("files").and_then(Value::as_array).is_none() {
            case_payload["files"] = Value::Array(Vec::new());
        }
        if let Some(files) = case_payload.get_mut("files").and_then(Value::as_array_mut) {
            files.push(entry);
        }

        let mut document = self.load(document_id).await?;
        document[LINKED_FIELD] = Value::Bool(true);
        self.store
            .put(
                StoreKey::new(EntityType::Document, document_id.as_str()),
                document,
            )
            .await
            .map_err(BridgeError::store)?;
        Ok(())
    }

    async fn load(&self, document_id: &LocalId) -> BridgeResult<Value> {
        self.store
            .get(StoreKey::new(EntityType::Document, document_id.as_str()))
            .await
            .map_err(BridgeError::store)?
            .ok_or_else(|| BridgeError::object_not_found("Document", document_id.as_str()))
    }
}

/// Binary upload built from a document's stored fields; `inhoud` holds
/// base64 content.
fn upload_of(document: &Value) -> Option<FileUpload> {
    let encoded = document.get("inhoud").and_then(Value::as_str)?;
    let content = BASE64.decode(encoded).ok()?;
    Some(FileUpload {
        file_name: document
            .get("bestandsnaam")
            .and_then(Value::as_str)
            .unwrap_or("document.bin")
            .to_string(),
        content,
        mime_type: document
            .get("formaat")
            .and_then(Value::as_str)
            .unwrap_or("application/octet-stream")
            .to_string(),
    })
}
