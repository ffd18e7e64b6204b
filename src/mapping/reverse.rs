//! Reverse mapping: a local Zaak back into a vendor-shaped case payload.
//!
//! The inverse of the forward direction. Property values fan *in* from the
//! case's registered eigenschappen into the vendor "values" map, attached
//! documents into the "files" list, and roles into the "subjects" list.
//! Only roles whose role type the vendor already knows (its sync record
//! carries an upstream id) become subjects; locally invented role types
//! cannot be pushed.
//!
//! The same draft serves create and update: the caller strips the
//! immutable-field set for the call it is about to make. The vendor treats
//! more fields as immutable on update than on create.

use crate::error::{BridgeError, BridgeResult, MappingError};
use crate::model::{EntityType, ExternalId, SourceId};
use crate::store::{ObjectStore, StoreKey};
use crate::sync::SyncIndex;
use log::warn;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// Fields the vendor rejects on a create call.
const CREATE_DROP_FIELDS: &[&str] = &["self", "id"];

/// Fields the vendor rejects on an update call. Everything it considers
/// fixed at creation time: requestor, casetype linkage, source system,
/// confidentiality and the subject set.
const UPDATE_DROP_FIELDS: &[&str] = &[
    "self",
    "id",
    "requestor",
    "casetype_id",
    "source",
    "confidentiality",
    "subjects",
    "contactchannel",
];

/// Reverse mapping engine.
pub struct ReverseMapper<'a, S: ObjectStore> {
    store: &'a S,
    index: &'a SyncIndex<S>,
    source: SourceId,
}

impl<'a, S: ObjectStore> ReverseMapper<'a, S> {
    pub fn new(store: &'a S, index: &'a SyncIndex<S>, source: SourceId) -> Self {
        Self {
            store,
            index,
            source,
        }
    }

    /// Build the vendor-shaped payload for a local case.
    ///
    /// `case_type_external_id` is the vendor's id of the case's type; the
    /// case-type document supplies the property and role-type registers
    /// the fan-ins match against. A case without `bronorganisatie` cannot
    /// be pushed at all.
    pub async fn map_zaak_to_case(
        &self,
        case_type_external_id: &ExternalId,
        case_type: &Value,
        case: &Value,
    ) -> BridgeResult<Value> {
        let bronorganisatie = case
            .get("bronorganisatie")
            .and_then(Value::as_str)
            .ok_or(MappingError::MissingRequiredField {
                field: "bronorganisatie".to_string(),
            })
            .map_err(BridgeError::Mapping)?;

        let mut draft = json!({
            "casetype_id": case_type_external_id.as_str(),
            "source": bronorganisatie,
            "subject": case.get("omschrijving").and_then(Value::as_str).unwrap_or(""),
            "confidentiality": case
                .get("vertrouwelijkheidaanduiding")
                .and_then(Value::as_str)
                .unwrap_or("openbaar"),
        });
        if let Some(channel) = case.get("communicatiekanaal").and_then(Value::as_str) {
            draft["contactchannel"] = Value::String(channel.to_string());
        }

        draft["values"] = Value::Object(self.values_of(case_type, case).await?);
        draft["files"] = Value::Array(self.files_of(case).await?);
        draft["subjects"] = Value::Array(self.subjects_of(case_type, case).await?);

        Ok(draft)
    }

    /// The "values" map: every case property whose eigenschap is
    /// registered on the case type, keyed by the vendor field name.
    async fn values_of(
        &self,
        case_type: &Value,
        case: &Value,
    ) -> BridgeResult<Map<String, Value>> {
        let mut registered: HashMap<String, ()> = HashMap::new();
        for id in id_list(case_type, "eigenschappen") {
            if let Some(eigenschap) = self.load(EntityType::Eigenschap, &id).await? {
                if let Some(naam) = eigenschap.get("naam").and_then(Value::as_str) {
                    registered.insert(naam.to_string(), ());
                }
            }
        }

        let mut values = Map::new();
        for id in id_list(case, "eigenschappen") {
            let Some(pair) = self.load(EntityType::ZaakEigenschap, &id).await? else {
                continue;
            };
            let Some(naam) = pair.get("naam").and_then(Value::as_str) else {
                continue;
            };
            if !registered.contains_key(naam) {
                warn!("property '{}' not registered on case type, dropped", naam);
                continue;
            }
            let waarde = pair.get("waarde").cloned().unwrap_or(Value::Null);
            values.insert(naam.to_string(), waarde);
        }
        Ok(values)
    }

    /// The "files" list: one metadata descriptor per attached document.
    async fn files_of(&self, case: &Value) -> BridgeResult<Vec<Value>> {
        let mut files = Vec::new();
        for id in id_list(case, "zaakinformatieobjecten") {
            let Some(link) = self.load(EntityType::ZaakInformatieObject, &id).await? else {
                continue;
            };
            let Some(document_id) = link.get("informatieobject").and_then(Value::as_str) else {
                continue;
            };
            let Some(document) = self.load(EntityType::Document, document_id).await? else {
                warn!("case file references missing document {}", document_id);
                continue;
            };
            files.push(json!({
                "filename": document
                    .get("bestandsnaam")
                    .and_then(Value::as_str)
                    .unwrap_or(""),
                "description": document
                    .get("beschrijving")
                    .and_then(Value::as_str)
                    .unwrap_or(""),
                "origin": "Inkomend",
                "date_of_creation": document
                    .get("creatiedatum")
                    .and_then(Value::as_str)
                    .unwrap_or(""),
                "format": document.get("formaat").and_then(Value::as_str).unwrap_or(""),
                "trust_level": document
                    .get("vertrouwelijkheidaanduiding")
                    .and_then(Value::as_str)
                    .unwrap_or("Openbaar"),
            }));
        }
        Ok(files)
    }

    /// The "subjects" list: portal-access linkage for every role whose
    /// role type the vendor already knows.
    async fn subjects_of(&self, case_type: &Value, case: &Value) -> BridgeResult<Vec<Value>> {
        // Role types on the case type that carry a sync record, keyed by
        // generic description
        let mut known: HashMap<String, ExternalId> = HashMap::new();
        for id in id_list(case_type, "roltypen") {
            let Some(role_type) = self.load(EntityType::RoleType, &id).await? else {
                continue;
            };
            let record = self
                .index
                .find_by_local(
                    EntityType::RoleType,
                    &crate::model::LocalId::from_string(id.clone()),
                )
                .await?;
            let Some(record) = record else { continue };
            if record.source_id != self.source {
                continue;
            }
            if let Some(generic) = role_type
                .get("omschrijvingGeneriek")
                .and_then(Value::as_str)
            {
                known.insert(generic.to_string(), record.external_id.clone());
            }
        }

        let mut subjects = Vec::new();
        for id in id_list(case, "rollen") {
            let Some(role) = self.load(EntityType::Role, &id).await? else {
                continue;
            };
            let Some(generic) = role.get("omschrijvingGeneriek").and_then(Value::as_str) else {
                continue;
            };
            let Some(role_reference) = known.get(generic) else {
                continue;
            };
            subjects.push(json!({
                "role": role_reference.as_str(),
                "magic_string_prefix": generic,
                "pip_authorized": true,
            }));
        }
        Ok(subjects)
    }

    async fn load(&self, entity_type: EntityType, id: &str) -> BridgeResult<Option<Value>> {
        self.store
            .get(StoreKey::new(entity_type, id))
            .await
            .map_err(BridgeError::store)
    }
}

/// Strip the fields the vendor rejects on a create call.
pub fn strip_for_create(draft: &mut Value) {
    strip(draft, CREATE_DROP_FIELDS);
}

/// Strip the fields the vendor rejects on an update call.
pub fn strip_for_update(draft: &mut Value) {
    strip(draft, UPDATE_DROP_FIELDS);
}

fn strip(draft: &mut Value, fields: &[&str]) {
    if let Some(object) = draft.as_object_mut() {
        for field in fields {
            object.remove(*field);
        }
    }
}

/// String ids held in a list-valued field.
fn id_list(document: &Value, field: &str) -> Vec<String> {
    document
        .get(field)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_strips_more_than_create() {
        let full = json!({
            "id": "x",
            "casetype_id": "ct-1",
            "source": "001172120",
            "subject": "Aanvraag",
            "confidentiality": "openbaar",
            "subjects": [],
            "values": {},
        });

        let mut for_create = full.clone();
        strip_for_create(&mut for_create);
        assert!(for_create.get("id").is_none());
        assert!(for_create.get("casetype_id").is_some());
        assert!(for_create.get("subjects").is_some());

        let mut for_update = full;
        strip_for_update(&mut for_update);
        assert!(for_update.get("casetype_id").is_none());
        assert!(for_update.get("subjects").is_none());
        assert!(for_update.get("confidentiality").is_none());
        assert!(for_update.get("subject").is_some());
        assert!(for_update.get("values").is_some());
    }

    #[test]
    fn test_id_list_skips_non_strings() {
        let document = json!({"rollen": ["a", 7, "b"]});
        assert_eq!(id_list(&document, "rollen"), vec!["a", "b"]);
        assert!(id_list(&document, "missing").is_empty());
    }
}
