//! Builders for raw vendor payloads with just the structure under test.

use serde_json::{Value, json};

/// Builds a raw casetype row, one phase per `phase` call.
pub struct CaseTypeBuilder {
    reference: String,
    title: String,
    phases: Vec<Value>,
    results: Vec<Value>,
}

impl CaseTypeBuilder {
    pub fn new(reference: &str) -> Self {
        Self {
            reference: reference.to_string(),
            title: "Testzaaktype".to_string(),
            phases: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Add a phase naming a responsible role.
    pub fn phase_with_role(mut self, name: &str, role_name: &str) -> Self {
        let seq = self.phases.len() as u64 + 1;
        self.phases.push(json!({
            "name": name,
            "seq": seq,
            "fields": [],
            "route": {
                "role": {
                    "instance": {"name": role_name, "description": role_name},
                },
            },
        }));
        self
    }

    /// Add a bare phase with the given fields.
    pub fn phase_with_fields(mut self, name: &str, fields: Vec<Value>) -> Self {
        let seq = self.phases.len() as u64 + 1;
        self.phases.push(json!({
            "name": name,
            "seq": seq,
            "fields": fields,
        }));
        self
    }

    pub fn result(mut self, result_type: &str, label: &str) -> Self {
        self.results.push(json!({
            "instance": {
                "type": result_type,
                "label": label,
                "selection_list": "",
                "type_of_archiving": "Vernietigen",
                "period_of_preservation": "",
            },
        }));
        self
    }

    pub fn build(self) -> Value {
        json!({
            "reference": self.reference,
            "instance": {
                "title": self.title,
                "phases": self.phases,
                "results": self.results,
            },
        })
    }
}

/// Builds a raw case row against a casetype reference.
pub struct CaseBuilder {
    reference: String,
    casetype: String,
    instance: serde_json::Map<String, Value>,
}

impl CaseBuilder {
    pub fn new(reference: &str, casetype: &str) -> Self {
        Self {
            reference: reference.to_string(),
            casetype: casetype.to_string(),
            instance: serde_json::Map::new(),
        }
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.instance
            .insert("subject".to_string(), Value::String(subject.to_string()));
        self
    }

    pub fn milestone(mut self, label: &str) -> Self {
        self.instance
            .insert("milestone".to_string(), Value::String(label.to_string()));
        self
    }

    pub fn field(mut self, name: &str, value: Value) -> Self {
        self.instance.insert(name.to_string(), value);
        self
    }

    pub fn build(self) -> Value {
        let mut instance = self.instance;
        instance.insert(
            "casetype".to_string(),
            json!({"reference": self.casetype}),
        );
        json!({
            "reference": self.reference,
            "instance": instance,
        })
    }
}
