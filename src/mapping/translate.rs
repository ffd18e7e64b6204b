//! Value-translation lookup used during mapping.
//!
//! A small fixed set of enumerations needs value substitution when
//! crossing the schema boundary: Dutch boolean-like words, archival
//! disposition codes, the internal/external indicator, confidentiality
//! designations. Lookups that miss pass the value through untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One value substitution: (table, from) → to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub table: String,
    pub from: String,
    pub to: String,
    pub language: String,
}

impl TranslationEntry {
    pub fn new(
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            from: from.into(),
            to: to.into(),
            language: language.into(),
        }
    }
}

/// Translation lookup over a set of entries.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: HashMap<(String, String), String>,
}

impl TranslationTable {
    /// Build a table from entries; later entries win on duplicate keys.
    pub fn from_entries(entries: impl IntoIterator<Item = TranslationEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            map.insert((entry.table, entry.from), entry.to);
        }
        Self { entries: map }
    }

    /// Translate a value within a named table; a miss returns the input.
    pub fn translate<'a>(&'a self, table: &str, value: &'a str) -> &'a str {
        self.entries
            .get(&(table.to_string(), value.to_string()))
            .map(String::as_str)
            .unwrap_or(value)
    }

    /// Whether the table holds an entry for this value.
    pub fn contains(&self, table: &str, value: &str) -> bool {
        self.entries
            .contains_key(&(table.to_string(), value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TranslationTable {
        TranslationTable::from_entries([
            TranslationEntry::new("boolean", "Ja", "true", "nl"),
            TranslationEntry::new("boolean", "Nee", "false", "nl"),
            TranslationEntry::new("archiefnominatie", "Bewaren", "blijvend_bewaren", "nl"),
        ])
    }

    #[test]
    fn test_translate_hit() {
        assert_eq!(table().translate("boolean", "Ja"), "true");
        assert_eq!(
            table().translate("archiefnominatie", "Bewaren"),
            "blijvend_bewaren"
        );
    }

    #[test]
    fn test_translate_miss_passes_through() {
        assert_eq!(table().translate("boolean", "misschien"), "misschien");
        assert_eq!(table().translate("unknown_table", "Ja"), "Ja");
    }
}
