//! Forward mapping: vendor (xxllnc) records into ZGW drafts.
//!
//! `map_case_type` fans a raw casetype out into its sub-entities: every
//! phase becomes one status type, zero or more eigenschappen, zero or one
//! information-object type and zero or one role type; every result becomes
//! a result type. `map_case` fans the other way, matching upstream
//! milestone/role/attribute labels *into* the already-mapped case type's
//! sub-entities via lookup tables built once per case type.
//!
//! Sub-entities are keyed through the sync index by their own upstream id
//! when one exists (role references), and otherwise by a natural key
//! scoped to the parent's external id. Either way a repeated sync of the
//! same parent converges on the same local objects.

use crate::error::{BridgeError, BridgeResult, MappingError};
use crate::mapping::config::{EPOCH_PLACEHOLDER, MappingConfig, SELECTIELIJST_PLACEHOLDER};
use crate::mapping::rules::{apply_rules, apply_skeleton};
use crate::model::{CatalogHandle, EntityType, ExternalId, LocalId, SourceId};
use crate::store::{ObjectStore, StoreKey};
use crate::sync::SyncIndex;
use log::{debug, warn};
use serde_json::{Value, json};
use std::collections::HashSet;

/// Forward mapping engine.
pub struct ForwardMapper<'a, S: ObjectStore> {
    config: &'a MappingConfig,
    store: &'a S,
    index: &'a SyncIndex<S>,
    source: SourceId,
}

impl<'a, S: ObjectStore> ForwardMapper<'a, S> {
    pub fn new(
        config: &'a MappingConfig,
        store: &'a S,
        index: &'a SyncIndex<S>,
        source: SourceId,
    ) -> Self {
        Self {
            config,
            store,
            index,
            source,
        }
    }

    /// Map a raw casetype into a local CaseType with all its sub-entities
    /// persisted, and link it into the catalog's case-type set.
    ///
    /// Returns the case type's local id.
    pub async fn map_case_type(
        &self,
        raw: &Value,
        catalog: &CatalogHandle,
    ) -> BridgeResult<LocalId> {
        let external_id = external_id_of(raw)?;
        let mut sync = self
            .index
            .find_or_create(&self.source, EntityType::CaseType, &external_id)
            .await?;
        let local_id = sync
            .local_object_id
            .clone()
            .unwrap_or_else(LocalId::generate);

        let mut draft = json!({ "id": local_id.as_str() });
        apply_rules(
            &self.config.case_type_rules(),
            &self.config.translations,
            raw,
            &mut draft,
        );
        apply_skeleton(&self.config.case_type_skeleton, &mut draft);

        let mut status_types = Vec::new();
        let mut role_types = Vec::new();
        let mut eigenschappen = Vec::new();
        let mut information_object_types = Vec::new();
        // First phase naming a role wins; later phases naming the same
        // role (case-insensitive) are not re-emitted.
        let mut seen_roles: HashSet<String> = HashSet::new();

        for (position, phase) in phases_of(raw).iter().enumerate() {
            let phase = instance_of(phase);
            let name = phase.get("name").and_then(Value::as_str).unwrap_or("");
            let seq = phase
                .get("seq")
                .and_then(Value::as_u64)
                .unwrap_or(position as u64 + 1);
            let fields = phase
                .get("fields")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            let first_field = fields.first().map(instance_of);
            let status_type = json!({
                "zaaktype": local_id.as_str(),
                "omschrijving": name,
                "omschrijvingGeneriek": first_field
                    .and_then(|f| f.get("label"))
                    .and_then(Value::as_str)
                    .unwrap_or(""),
                "statustekst": first_field
                    .and_then(|f| f.get("help"))
                    .and_then(Value::as_str)
                    .unwrap_or(""),
                "volgnummer": seq,
            });
            let status_id = self
                .upsert_sub(
                    EntityType::StatusType,
                    format!("{}:statustype:{}", external_id, name),
                    status_type,
                )
                .await?;
            push_unique(&mut status_types, status_id);

            for field in &fields {
                let field = instance_of(field);
                let Some(magic) = field.get("magic_string").and_then(Value::as_str) else {
                    continue;
                };
                let label = field.get("label").and_then(Value::as_str).unwrap_or(magic);
                if field.get("type").and_then(Value::as_str) == Some("file") {
                    let iot = json!({
                        "zaaktype": local_id.as_str(),
                        "omschrijving": label,
                        "vertrouwelijkheidaanduiding": "openbaar",
                    });
                    let iot_id = self
                        .upsert_sub(
                            EntityType::InformationObjectType,
                            format!("{}:informatieobjecttype:{}", external_id, magic),
                            iot,
                        )
                        .await?;
                    push_unique(&mut information_object_types, iot_id);
                } else {
                    let eigenschap = json!({
                        "zaaktype": local_id.as_str(),
                        "naam": magic,
                        "definitie": label,
                        "toelichting": field.get("help").and_then(Value::as_str).unwrap_or(""),
                    });
                    let eigenschap_id = self
                        .upsert_sub(
                            EntityType::Eigenschap,
                            format!("{}:eigenschap:{}", external_id, magic),
                            eigenschap,
                        )
                        .await?;
                    push_unique(&mut eigenschappen, eigenschap_id);
                }
            }

            if let Some(role) = phase.pointer("/route/role") {
                if let Some(role_type) = self
                    .phase_role_type(&external_id, &local_id, role, &mut seen_roles)
                    .await?
                {
                    push_unique(&mut role_types, role_type);
                }
            }
        }

        let mut result_types = Vec::new();
        for result in results_of(raw) {
            let reference = result.get("reference").and_then(Value::as_str);
            let result = instance_of(&result);
            let result_type = result.get("type").and_then(Value::as_str).unwrap_or("");
            let document = json!({
                "zaaktype": local_id.as_str(),
                "omschrijving": result_type,
                "toelichting": result.get("label").and_then(Value::as_str).unwrap_or(""),
                "selectielijstklasse": result
                    .get("selection_list")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(SELECTIELIJST_PLACEHOLDER),
                "archiefnominatie": self.config.translations.translate(
                    "archiefnominatie",
                    result
                        .get("type_of_archiving")
                        .and_then(Value::as_str)
                        .unwrap_or("Vernietigen"),
                ),
                "archiefactietermijn": result
                    .get("period_of_preservation")
                    .and_then(Value::as_str)
                    .unwrap_or(""),
            });
            let key = match reference {
                Some(reference) => reference.to_string(),
                None => format!("{}:resultaattype:{}", external_id, result_type),
            };
            let id = self
                .upsert_sub(EntityType::ResultType, key, document)
                .await?;
            push_unique(&mut result_types, id);
        }

        draft["statustypen"] = Value::Array(status_types);
        draft["roltypen"] = Value::Array(role_types);
        draft["resultaattypen"] = Value::Array(result_types);
        draft["eigenschappen"] = Value::Array(eigenschappen);
        draft["informatieobjecttypen"] = Value::Array(information_object_types);
        draft["besluittypen"] = json!([]);
        draft["catalogus"] = Value::String(catalog.id().as_str().to_string());

        // Sub-entities are all persisted; now the parent, then the catalog
        self.store
            .put(StoreKey::new(EntityType::CaseType, local_id.as_str()), draft)
            .await
            .map_err(BridgeError::store)?;
        self.index.attach(&mut sync, local_id.clone()).await?;
        catalog.add_case_type(self.store, &local_id).await?;

        debug!("mapped casetype {} -> {}", external_id, local_id);
        Ok(local_id)
    }

    /// Map a decision-titled raw casetype into a BesluitType linked into
    /// the catalog's decision-type set.
    pub async fn map_decision_type(
        &self,
        raw: &Value,
        catalog: &CatalogHandle,
    ) -> BridgeResult<LocalId> {
        let external_id = external_id_of(raw)?;
        let mut sync = self
            .index
            .find_or_create(&self.source, EntityType::DecisionType, &external_id)
            .await?;
        let local_id = sync
            .local_object_id
            .clone()
            .unwrap_or_else(LocalId::generate);

        let title = raw
            .pointer("/instance/title")
            .and_then(Value::as_str)
            .unwrap_or("");

        // A decision casetype carries at most a file field in its phases;
        // that becomes the decision's information-object type.
        let mut information_object_types = Vec::new();
        for phase in phases_of(raw) {
            let phase = instance_of(&phase);
            let fields = phase
                .get("fields")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for field in &fields {
                let field = instance_of(field);
                if field.get("type").and_then(Value::as_str) != Some("file") {
                    continue;
                }
                let magic = field
                    .get("magic_string")
                    .and_then(Value::as_str)
                    .unwrap_or("besluit_document");
                let iot = json!({
                    "omschrijving": field.get("label").and_then(Value::as_str).unwrap_or(magic),
                    "vertrouwelijkheidaanduiding": "openbaar",
                });
                let id = self
                    .upsert_sub(
                        EntityType::InformationObjectType,
                        format!("{}:informatieobjecttype:{}", external_id, magic),
                        iot,
                    )
                    .await?;
                information_object_types.push(Value::String(id.into_string()));
            }
        }

        let draft = json!({
            "id": local_id.as_str(),
            "omschrijving": title,
            "catalogus": catalog.id().as_str(),
            "informatieobjecttypen": information_object_types,
            "publicatieIndicatie": false,
        });
        self.store
            .put(
                StoreKey::new(EntityType::DecisionType, local_id.as_str()),
                draft,
            )
            .await
            .map_err(BridgeError::store)?;
        self.index.attach(&mut sync, local_id.clone()).await?;
        catalog.add_decision_type(self.store, &local_id).await?;

        debug!("mapped decision type {} -> {}", external_id, local_id);
        Ok(local_id)
    }

    /// Map a raw case against its already-mapped case type.
    ///
    /// Returns the case's local id.
    pub async fn map_case(&self, raw: &Value, case_type_id: &LocalId) -> BridgeResult<LocalId> {
        let external_id = external_id_of(raw)?;
        let mut sync = self
            .index
            .find_or_create(&self.source, EntityType::Case, &external_id)
            .await?;
        let local_id = sync
            .local_object_id
            .clone()
            .unwrap_or_else(LocalId::generate);

        let case_type = self
            .load(EntityType::CaseType, case_type_id.as_str())
            .await?
            .ok_or_else(|| BridgeError::object_not_found("ZaakType", case_type_id.as_str()))?;

        let mut draft = json!({
            "id": local_id.as_str(),
            "zaaktype": case_type_id.as_str(),
        });
        apply_rules(
            &self.config.case_rules(),
            &self.config.translations,
            raw,
            &mut draft,
        );
        apply_skeleton(&self.config.case_skeleton, &mut draft);

        let instance = instance_of(raw);

        // Status fan-in: case-sensitive exact match, first match wins
        if let Some(label) = milestone_label(instance) {
            let statuses = self.sub_entities(&case_type, "statustypen").await?;
            match statuses
                .iter()
                .find(|(_, doc)| {
                    doc.get("omschrijving").and_then(Value::as_str) == Some(label.as_str())
                })
            {
                Some((status_type_id, _)) => {
                    let date_set = instance
                        .pointer("/milestone/instance/date")
                        .and_then(Value::as_str)
                        .unwrap_or(EPOCH_PLACEHOLDER);
                    let status = json!({
                        "zaak": local_id.as_str(),
                        "statustype": status_type_id,
                        "datumStatusGezet": date_set,
                    });
                    let status_id = self
                        .upsert_sub(
                            EntityType::Status,
                            format!("{}:status", external_id),
                            status,
                        )
                        .await?;
                    draft["status"] = Value::String(status_id.into_string());
                }
                None => {
                    // Mapping ambiguity is not an error
                    warn!(
                        "case {}: milestone '{}' matches no status type, skipped",
                        external_id, label
                    );
                }
            }
        }

        // Role fan-in: case-insensitive match against the role-type table
        let role_types = self.sub_entities(&case_type, "roltypen").await?;
        let mut roles = Vec::new();
        for entry in route_roles(instance) {
            let entry_instance = instance_of(&entry);
            let label = entry_instance
                .get("description")
                .and_then(Value::as_str)
                .or_else(|| entry_instance.get("name").and_then(Value::as_str));
            let Some(label) = label else { continue };
            let matched = role_types.iter().find(|(_, doc)| {
                ["omschrijving", "omschrijvingGeneriek"].iter().any(|f| {
                    doc.get(*f)
                        .and_then(Value::as_str)
                        .is_some_and(|v| v.eq_ignore_ascii_case(label))
                })
            });
            let Some((role_type_id, role_type)) = matched else {
                warn!(
                    "case {}: role '{}' matches no role type, skipped",
                    external_id, label
                );
                continue;
            };
            let omschrijving = role_type
                .get("omschrijving")
                .and_then(Value::as_str)
                .unwrap_or(label);
            let generic = role_type
                .get("omschrijvingGeneriek")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| omschrijving.to_lowercase());
            let role = json!({
                "zaak": local_id.as_str(),
                "roltype": role_type_id,
                "omschrijving": omschrijving,
                "omschrijvingGeneriek": generic,
                "toelichting": entry_instance
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or(""),
                "betrokkeneType": "natuurlijk_persoon",
            });
            let role_id = self
                .upsert_sub(
                    EntityType::Role,
                    format!("{}:rol:{}", external_id, label.to_lowercase()),
                    role,
                )
                .await?;
            roles.push(Value::String(role_id.into_string()));
        }
        draft["rollen"] = Value::Array(roles);

        // Property fan-in: attribute keys matched against eigenschap names
        let eigenschappen = self.sub_entities(&case_type, "eigenschappen").await?;
        let mut values = Vec::new();
        if let Some(attributes) = instance.get("attributes").and_then(Value::as_object) {
            for (name, value) in attributes {
                let matched = eigenschappen
                    .iter()
                    .find(|(_, doc)| doc.get("naam").and_then(Value::as_str) == Some(name));
                let Some((eigenschap_id, _)) = matched else {
                    continue;
                };
                let zaak_eigenschap = json!({
                    "zaak": local_id.as_str(),
                    "eigenschap": eigenschap_id,
                    "naam": name,
                    "waarde": serialize_attribute(value),
                });
                let id = self
                    .upsert_sub(
                        EntityType::ZaakEigenschap,
                        format!("{}:zaakeigenschap:{}", external_id, name),
                        zaak_eigenschap,
                    )
                    .await?;
                values.push(Value::String(id.into_string()));
            }
        }
        draft["eigenschappen"] = Value::Array(values);

        if draft.get("zaakinformatieobjecten").is_none() {
            draft["zaakinformatieobjecten"] = json!([]);
        }

        self.store
            .put(StoreKey::new(EntityType::Case, local_id.as_str()), draft)
            .await
            .map_err(BridgeError::store)?;
        self.index.attach(&mut sync, local_id.clone()).await?;

        debug!("mapped case {} -> {}", external_id, local_id);
        Ok(local_id)
    }

    /// Persist a fan-out sub-entity keyed by its own external identity,
    /// reusing the local object from any earlier sync of the same key.
    async fn upsert_sub(
        &self,
        entity_type: EntityType,
        external_key: String,
        mut document: Value,
    ) -> BridgeResult<LocalId> {
        let external_id = ExternalId::new(external_key).map_err(BridgeError::Mapping)?;
        let mut sync = self
            .index
            .find_or_create(&self.source, entity_type, &external_id)
            .await?;
        let local_id = sync
            .local_object_id
            .clone()
            .unwrap_or_else(LocalId::generate);
        document["id"] = Value::String(local_id.as_str().to_string());
        self.store
            .put(StoreKey::new(entity_type, local_id.as_str()), document)
            .await
            .map_err(BridgeError::store)?;
        self.index.attach(&mut sync, local_id.clone()).await?;
        Ok(local_id)
    }

    async fn phase_role_type(
        &self,
        parent_external_id: &ExternalId,
        parent_local_id: &LocalId,
        role: &Value,
        seen_roles: &mut HashSet<String>,
    ) -> BridgeResult<Option<LocalId>> {
        let reference = role.get("reference").and_then(Value::as_str);
        let role_instance = instance_of(role);
        let Some(name) = role_instance.get("name").and_then(Value::as_str) else {
            return Ok(None);
        };
        let dedup_key = name.to_lowercase();
        if !seen_roles.insert(dedup_key.clone()) {
            return Ok(None);
        }
        let document = json!({
            "zaaktype": parent_local_id.as_str(),
            "omschrijving": role_instance
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or(name),
            "omschrijvingGeneriek": dedup_key,
        });
        let key = match reference {
            Some(reference) => reference.to_string(),
            None => format!("{}:roltype:{}", parent_external_id, dedup_key),
        };
        let id = self.upsert_sub(EntityType::RoleType, key, document).await?;
        Ok(Some(id))
    }

    /// Load the (id, document) pairs behind an id list field of a parent.
    async fn sub_entities(
        &self,
        parent: &Value,
        field: &str,
    ) -> BridgeResult<Vec<(String, Value)>> {
        let entity_type = EntityType::CaseType
            .sub_type_for_field(field)
            .unwrap_or(EntityType::CaseType);
        let ids = parent
            .get(field)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut entities = Vec::new();
        for id in ids.iter().filter_map(Value::as_str) {
            if let Some(document) = self.load(entity_type, id).await? {
                entities.push((id.to_string(), document));
            }
        }
        Ok(entities)
    }

    async fn load(&self, entity_type: EntityType, id: &str) -> BridgeResult<Option<Value>> {
        self.store
            .get(StoreKey::new(entity_type, id))
            .await
            .map_err(BridgeError::store)
    }
}

/// The natural key of a raw vendor record: "reference", falling back to a
/// numeric "id".
pub fn external_id_of(raw: &Value) -> Result<ExternalId, MappingError> {
    if let Some(reference) = raw.get("reference").and_then(Value::as_str) {
        return ExternalId::new(reference.to_string());
    }
    match raw.get("id") {
        Some(Value::String(s)) => ExternalId::new(s.clone()),
        Some(Value::Number(n)) => ExternalId::new(n.to_string()),
        _ => Err(MappingError::MissingExternalId {
            field: "reference".to_string(),
        }),
    }
}

/// Membership lists hold each sub-entity id once, even when two phases
/// collapse onto the same sync key.
fn push_unique(list: &mut Vec<Value>, id: LocalId) {
    let id = Value::String(id.into_string());
    if !list.contains(&id) {
        list.push(id);
    }
}

/// Unwrap the vendor's "instance" envelope, if present.
fn instance_of(value: &Value) -> &Value {
    value.get("instance").unwrap_or(value)
}

fn phases_of(raw: &Value) -> Vec<Value> {
    instance_of(raw)
        .get("phases")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn results_of(raw: &Value) -> Vec<Value> {
    instance_of(raw)
        .get("results")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// The milestone label of a raw case, accepting both the plain-string and
/// the enveloped form.
fn milestone_label(instance: &Value) -> Option<String> {
    match instance.get("milestone")? {
        Value::String(s) => Some(s.clone()),
        milestone => milestone
            .pointer("/instance/phase_label")
            .or_else(|| milestone.get("label"))
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Role entries on a case's route, normalized to a list.
fn route_roles(instance: &Value) -> Vec<Value> {
    match instance.pointer("/route/role") {
        Some(Value::Array(entries)) => entries.clone(),
        Some(entry @ Value::Object(_)) => vec![entry.clone()],
        _ => Vec::new(),
    }
}

/// Serialize an upstream attribute value: arrays as JSON text, scalars as
/// plain strings.
fn serialize_attribute(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) => value.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_external_id_of_prefers_reference() {
        let raw = json!({"reference": "abc", "id": 7});
        assert_eq!(external_id_of(&raw).unwrap().as_str(), "abc");

        let raw = json!({"id": 7});
        assert_eq!(external_id_of(&raw).unwrap().as_str(), "7");

        assert!(external_id_of(&json!({})).is_err());
    }

    #[test]
    fn test_milestone_label_forms() {
        assert_eq!(
            milestone_label(&json!({"milestone": "Intake"})),
            Some("Intake".to_string())
        );
        assert_eq!(
            milestone_label(&json!({"milestone": {"instance": {"phase_label": "Afgerond"}}})),
            Some("Afgerond".to_string())
        );
        assert_eq!(milestone_label(&json!({})), None);
    }

    #[test]
    fn test_route_roles_normalization() {
        let single = json!({"route": {"role": {"reference": "r1"}}});
        assert_eq!(route_roles(&single).len(), 1);

        let many = json!({"route": {"role": [{"reference": "r1"}, {"reference": "r2"}]}});
        assert_eq!(route_roles(&many).len(), 2);

        assert!(route_roles(&json!({})).is_empty());
    }

    #[test]
    fn test_serialize_attribute() {
        assert_eq!(serialize_attribute(&json!("plain")), "plain");
        assert_eq!(serialize_attribute(&json!(["a", "b"])), r#"["a","b"]"#);
        assert_eq!(serialize_attribute(&json!(42)), "42");
    }
}
