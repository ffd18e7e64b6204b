//! Local entity types and the field-to-sub-type map.
//!
//! [`EntityType`] names every local schema the bridge can persist. Its
//! string form doubles as the store prefix, so all objects of one type
//! live under one listing key.
//!
//! [`EntityType::sub_type_for_field`] is the declared composition map the
//! cross-reference resolver threads through its recursion: when the
//! resolver descends into a named field of an object, this map tells it
//! which entity type the nested value belongs to. Fields without a
//! declared sub-type inherit the enclosing object's type (composition of
//! the same schema rather than a reference to another one).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The local schemas the bridge reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// A tracked unit of work (ZGW "zaak")
    Case,
    /// The template governing a class of cases (ZGW "zaaktype")
    CaseType,
    /// A named stage a case can be in
    StatusType,
    /// A case's current occupancy of a stage
    Status,
    /// A participant category declared on a case type
    RoleType,
    /// A concrete participant assignment on a case
    Role,
    /// A possible outcome of a case, with archival metadata
    ResultType,
    /// A named, typed field a case type declares ("eigenschap")
    Eigenschap,
    /// A value a case holds for an eigenschap
    ZaakEigenschap,
    /// A document type a case type admits
    InformationObjectType,
    /// A document attached to a case
    ZaakInformatieObject,
    /// A formal ruling template ("besluittype")
    DecisionType,
    /// A formal ruling attached to a case ("besluit")
    Besluit,
    /// The singleton aggregate of case types and decision types
    Catalog,
    /// The durable external-id ledger entry
    Synchronization,
    /// A transferable document with binary content
    Document,
}

impl EntityType {
    /// Store-prefix name of this entity type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Case => "Zaak",
            EntityType::CaseType => "ZaakType",
            EntityType::StatusType => "StatusType",
            EntityType::Status => "Status",
            EntityType::RoleType => "RolType",
            EntityType::Role => "Rol",
            EntityType::ResultType => "ResultaatType",
            EntityType::Eigenschap => "Eigenschap",
            EntityType::ZaakEigenschap => "ZaakEigenschap",
            EntityType::InformationObjectType => "InformatieObjectType",
            EntityType::ZaakInformatieObject => "ZaakInformatieObject",
            EntityType::DecisionType => "BesluitType",
            EntityType::Besluit => "Besluit",
            EntityType::Catalog => "Catalogus",
            EntityType::Synchronization => "Synchronization",
            EntityType::Document => "Document",
        }
    }

    /// Declared sub-entity type for a named field, if any.
    ///
    /// Returns `None` for fields that are plain nested data of the same
    /// schema; the resolver then keeps the current type while descending.
    pub fn sub_type_for_field(&self, field: &str) -> Option<EntityType> {
        match (self, field) {
            (EntityType::CaseType, "statustypen") => Some(EntityType::StatusType),
            (EntityType::CaseType, "roltypen") => Some(EntityType::RoleType),
            (EntityType::CaseType, "resultaattypen") => Some(EntityType::ResultType),
            (EntityType::CaseType, "eigenschappen") => Some(EntityType::Eigenschap),
            (EntityType::CaseType, "informatieobjecttypen") => {
                Some(EntityType::InformationObjectType)
            }
            (EntityType::CaseType, "besluittypen") => Some(EntityType::DecisionType),
            (EntityType::CaseType, "catalogus") => Some(EntityType::Catalog),
            (EntityType::Case, "zaaktype") => Some(EntityType::CaseType),
            (EntityType::Case, "status") => Some(EntityType::Status),
            (EntityType::Case, "rollen") => Some(EntityType::Role),
            (EntityType::Case, "eigenschappen") => Some(EntityType::ZaakEigenschap),
            (EntityType::Case, "zaakinformatieobjecten") => Some(EntityType::ZaakInformatieObject),
            (EntityType::Case, "besluiten") => Some(EntityType::Besluit),
            (EntityType::Status, "statustype") => Some(EntityType::StatusType),
            (EntityType::Role, "roltype") => Some(EntityType::RoleType),
            (EntityType::ZaakEigenschap, "eigenschap") => Some(EntityType::Eigenschap),
            (EntityType::ZaakInformatieObject, "informatieobject") => Some(EntityType::Document),
            (EntityType::DecisionType, "informatieobjecttypen") => {
                Some(EntityType::InformationObjectType)
            }
            (EntityType::Besluit, "besluittype") => Some(EntityType::DecisionType),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_prefix_names() {
        assert_eq!(EntityType::Case.as_str(), "Zaak");
        assert_eq!(EntityType::CaseType.as_str(), "ZaakType");
        assert_eq!(EntityType::Synchronization.as_str(), "Synchronization");
    }

    #[test]
    fn test_declared_sub_types() {
        assert_eq!(
            EntityType::CaseType.sub_type_for_field("statustypen"),
            Some(EntityType::StatusType)
        );
        assert_eq!(
            EntityType::Case.sub_type_for_field("zaaktype"),
            Some(EntityType::CaseType)
        );
    }

    #[test]
    fn test_undeclared_field_has_no_sub_type() {
        assert_eq!(EntityType::Case.sub_type_for_field("omschrijving"), None);
        assert_eq!(EntityType::StatusType.sub_type_for_field("anything"), None);
    }
}
