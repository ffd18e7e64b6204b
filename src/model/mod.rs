//! Domain model for the bridge.
//!
//! The bridge stores every record as a JSON document; the model layer
//! supplies the typed seams around those documents: the [`EntityType`]
//! enum naming each local schema, validated identity value objects
//! ([`ExternalId`], [`LocalId`], [`SourceId`]), and the [`CatalogHandle`]
//! giving explicit access to the singleton catalog object.

pub mod catalog;
pub mod entity_type;
pub mod external_id;
pub mod ids;

pub use catalog::CatalogHandle;
pub use entity_type::EntityType;
pub use external_id::ExternalId;
pub use ids::{LocalId, SourceId};
