//! Content-based record classification.
//!
//! The vendor has no declared type field separating ordinary casetypes
//! from the specially-titled ones that model decisions. Classification is
//! an exact title match, evaluated once per record before any mapping
//! begins; the mappers never re-check.

use crate::mapping::config::MappingConfig;
use serde_json::Value;

/// How a raw casetype record should be mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Ordinary case type
    CaseType,
    /// Decision-indicating title: route to decision-type mapping
    DecisionType,
}

/// Classify a raw casetype record.
///
/// A record without a title classifies as a plain case type.
pub fn classify(config: &MappingConfig, raw: &Value) -> Classification {
    let title = raw
        .pointer("/instance/title")
        .and_then(Value::as_str)
        .unwrap_or("");
    if config.is_decision_title(title) {
        Classification::DecisionType
    } else {
        Classification::CaseType
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_title_dispatch() {
        let config = MappingConfig::standard();
        assert_eq!(
            classify(&config, &json!({"instance": {"title": "Besluit Toegekend"}})),
            Classification::DecisionType
        );
        assert_eq!(
            classify(&config, &json!({"instance": {"title": "Besluit light"}})),
            Classification::CaseType
        );
        assert_eq!(
            classify(&config, &json!({"instance": {}})),
            Classification::CaseType
        );
    }
}
