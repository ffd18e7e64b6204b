//! ExternalId value object for remote record identifiers.
//!
//! A type-safe wrapper around the natural key a remote system uses for a
//! record (the xxllnc "reference" UUID, a numeric document serial, or any
//! other opaque string the source exposes). Validation happens at
//! construction time, so an empty external id cannot exist in the system.

use crate::error::{MappingError, MappingResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated external record identifier.
///
/// ## Validation Rules
///
/// - Must not be empty
/// - Surrounding whitespace is not trimmed; the remote key is stored as-is
///
/// ## Examples
///
/// ```rust
/// use zgw_bridge::model::ExternalId;
///
/// let ext_id = ExternalId::new("701984".to_string()).unwrap();
/// assert_eq!(ext_id.as_str(), "701984");
///
/// assert!(ExternalId::new("".to_string()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalId(String);

impl ExternalId {
    /// Create a new ExternalId with validation.
    pub fn new(value: String) -> MappingResult<Self> {
        if value.is_empty() {
            return Err(MappingError::MissingExternalId {
                field: "externalId".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the owned string value.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ExternalId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExternalId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<String> for ExternalId {
    type Error = MappingError;

    fn try_from(value: String) -> MappingResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ExternalId {
    type Error = MappingError;

    fn try_from(value: &str) -> MappingResult<Self> {
        Self::new(value.to_string())
    }
}
