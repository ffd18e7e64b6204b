//! Declarative field mapping rules.
//!
//! A [`MappingRule`] names a source dot-path in the raw document, a target
//! dot-path in the draft, and optionally a scalar coercion and a
//! translation table. Application is pure and total: an absent source
//! field simply leaves the target unset.
//!
//! Dot paths descend object keys; numeric segments index arrays
//! (`"instance.phases.0.name"`).

use crate::mapping::translate::TranslationTable;
use serde_json::{Map, Value};

/// Scalar coercion applied after translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerce {
    /// "true"/"false"/"Ja"/"Nee"-like strings become booleans
    Bool,
    /// Any scalar becomes its string form
    String,
    /// A scalar becomes a singleton array; arrays pass through
    Array,
}

/// One declarative field correspondence.
#[derive(Debug, Clone)]
pub struct MappingRule {
    /// Dot path into the draft being built
    pub target: String,
    /// Dot path into the raw source document
    pub source: String,
    /// Optional scalar coercion
    pub coerce: Option<Coerce>,
    /// Optional translation table name, consulted before coercion
    pub translate: Option<String>,
}

impl MappingRule {
    /// Straight copy rule.
    pub fn copy(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
            coerce: None,
            translate: None,
        }
    }

    /// Copy with a scalar coercion.
    pub fn coerced(target: impl Into<String>, source: impl Into<String>, coerce: Coerce) -> Self {
        Self {
            coerce: Some(coerce),
            ..Self::copy(target, source)
        }
    }

    /// Copy through a translation table.
    pub fn translated(
        target: impl Into<String>,
        source: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            translate: Some(table.into()),
            ..Self::copy(target, source)
        }
    }

    /// Copy through a translation table, then coerce.
    pub fn translated_coerced(
        target: impl Into<String>,
        source: impl Into<String>,
        table: impl Into<String>,
        coerce: Coerce,
    ) -> Self {
        Self {
            translate: Some(table.into()),
            coerce: Some(coerce),
            ..Self::copy(target, source)
        }
    }
}

/// Read a value at a dot path.
pub fn get_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for part in path.split('.') {
        if let Ok(index) = part.parse::<usize>() {
            current = current.get(index)?;
        } else {
            current = current.get(part)?;
        }
    }
    Some(current)
}

/// Write a value at a dot path, creating intermediate objects as needed.
pub fn set_path(data: &mut Value, path: &str, value: Value) {
    let mut current = data;
    let parts: Vec<&str> = path.split('.').collect();
    for (i, part) in parts.iter().enumerate() {
        if i == parts.len() - 1 {
            if let Value::Object(map) = current {
                map.insert(part.to_string(), value);
            }
            return;
        }
        let Value::Object(map) = current else {
            return;
        };
        current = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Apply a rule set to a raw document, building onto `draft`.
///
/// Absent source fields are skipped; present target fields are
/// overwritten (rules are authoritative over whatever the draft held).
pub fn apply_rules(
    rules: &[MappingRule],
    translations: &TranslationTable,
    raw: &Value,
    draft: &mut Value,
) {
    for rule in rules {
        let Some(found) = get_path(raw, &rule.source) else {
            continue;
        };
        if found.is_null() {
            continue;
        }
        let mut value = found.clone();
        if let Some(table) = &rule.translate {
            if let Value::String(s) = &value {
                value = Value::String(translations.translate(table, s).to_string());
            }
        }
        if let Some(coerce) = rule.coerce {
            value = apply_coercion(value, coerce);
        }
        set_path(draft, &rule.target, value);
    }
}

/// Apply skeleton defaults: set each default only where the draft has no
/// value yet. Never overwrites a present field.
pub fn apply_skeleton(skeleton: &Value, draft: &mut Value) {
    let Some(defaults) = skeleton.as_object() else {
        return;
    };
    let Some(target) = draft.as_object_mut() else {
        return;
    };
    for (field, default) in defaults {
        if !target.contains_key(field) {
            target.insert(field.clone(), default.clone());
        }
    }
}

fn apply_coercion(value: Value, coerce: Coerce) -> Value {
    match coerce {
        Coerce::Bool => match &value {
            Value::Bool(_) => value,
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" | "ja" | "yes" | "1" => Value::Bool(true),
                "false" | "nee" | "no" | "0" => Value::Bool(false),
                _ => value,
            },
            Value::Number(n) => Value::Bool(n.as_i64() == Some(1)),
            _ => value,
        },
        Coerce::String => match &value {
            Value::String(_) => value,
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            _ => value,
        },
        Coerce::Array => match value {
            Value::Array(_) => value,
            Value::String(s) if s.contains(',') => Value::Array(
                s.split(',')
                    .map(|part| Value::String(part.trim().to_string()))
                    .collect(),
            ),
            other => Value::Array(vec![other]),
        },
    }
}
