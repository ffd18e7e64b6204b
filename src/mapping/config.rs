//! Mapping configuration: skeleton defaults, translation tables and the
//! decision-title set, passed explicitly into the engine instead of living
//! as implicit constants.

use crate::mapping::rules::{Coerce, MappingRule};
use crate::mapping::translate::{TranslationEntry, TranslationTable};
use serde_json::{Value, json};

/// Placeholder archival classification for results without a selection
/// list entry.
pub const SELECTIELIJST_PLACEHOLDER: &str = "https://selectielijst.example.org/resultaten/onbekend";

/// Status-change date used when the upstream omits a timestamp.
pub const EPOCH_PLACEHOLDER: &str = "1970-01-01T00:00:00Z";

/// All configurable mapping behavior in one value object.
#[derive(Debug, Clone)]
pub struct MappingConfig {
    /// Defaults applied to a case draft for fields the vendor never
    /// supplies; only fills absent fields
    pub case_skeleton: Value,
    /// Defaults applied to a case-type draft
    pub case_type_skeleton: Value,
    /// Value substitution tables
    pub translations: TranslationTable,
    /// Raw casetype titles routed to decision-type mapping; exact,
    /// case-sensitive match after trimming
    pub decision_titles: Vec<String>,
}

impl MappingConfig {
    /// The stock xxllnc → ZGW configuration.
    pub fn standard() -> Self {
        Self {
            case_skeleton: json!({
                "verantwoordelijkeOrganisatie": "001172120",
                "bronorganisatie": "001172120",
                "betalingsindicatie": "geheel",
                "archiefnominatie": "vernietigen",
                "archiefstatus": "nog_te_archiveren",
                "vertrouwelijkheidaanduiding": "openbaar",
            }),
            case_type_skeleton: json!({
                "vertrouwelijkheidaanduiding": "openbaar",
                "verlengingMogelijk": false,
                "publicatieIndicatie": false,
                "indicatieInternOfExtern": "extern",
            }),
            translations: TranslationTable::from_entries(standard_translations()),
            decision_titles: vec![
                "Besluit Toegekend".to_string(),
                "Besluit Afgewezen".to_string(),
            ],
        }
    }

    /// Declarative scalar rules for casetype mapping.
    pub fn case_type_rules(&self) -> Vec<MappingRule> {
        vec![
            MappingRule::copy("identificatie", "reference"),
            MappingRule::copy("omschrijving", "instance.title"),
            MappingRule::copy("doel", "instance.subject"),
            MappingRule::coerced("doorlooptijd", "instance.lead_time_legal", Coerce::String),
            MappingRule::coerced("servicenorm", "instance.lead_time_service", Coerce::String),
            MappingRule::translated(
                "vertrouwelijkheidaanduiding",
                "instance.properties.designation_of_confidentiality",
                "confidentiality",
            ),
            MappingRule::coerced("trefwoorden", "instance.properties.keywords", Coerce::Array),
            MappingRule::translated_coerced(
                "verlengingMogelijk",
                "instance.properties.extension",
                "boolean",
                Coerce::Bool,
            ),
            MappingRule::translated_coerced(
                "publicatieIndicatie",
                "instance.properties.publication",
                "boolean",
                Coerce::Bool,
            ),
            MappingRule::translated(
                "indicatieInternOfExtern",
                "instance.properties.designation_of_internal_or_external",
                "intern_extern",
            ),
        ]
    }

    /// Declarative scalar rules for case mapping.
    pub fn case_rules(&self) -> Vec<MappingRule> {
        vec![
            MappingRule::copy("identificatie", "reference"),
            MappingRule::copy("omschrijving", "instance.subject"),
            MappingRule::copy("registratiedatum", "instance.date_of_registration"),
            MappingRule::copy("startdatum", "instance.date_of_registration"),
            MappingRule::copy("einddatumGepland", "instance.date_target"),
            MappingRule::copy("einddatum", "instance.date_of_completion"),
            MappingRule::copy("communicatiekanaal", "instance.channel_of_contact"),
            MappingRule::copy("betalingsindicatie", "instance.payment_status"),
            MappingRule::translated(
                "vertrouwelijkheidaanduiding",
                "instance.confidentiality",
                "confidentiality",
            ),
        ]
    }

    /// Whether a raw casetype title names a decision type.
    pub fn is_decision_title(&self, title: &str) -> bool {
        let trimmed = title.trim();
        self.decision_titles.iter().any(|t| t == trimmed)
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_translations() -> Vec<TranslationEntry> {
    vec![
        TranslationEntry::new("boolean", "Ja", "true", "nl"),
        TranslationEntry::new("boolean", "Nee", "false", "nl"),
        TranslationEntry::new("confidentiality", "Openbaar", "openbaar", "nl"),
        TranslationEntry::new("confidentiality", "Intern", "intern", "nl"),
        TranslationEntry::new("confidentiality", "public", "openbaar", "en"),
        TranslationEntry::new("confidentiality", "internal", "intern", "en"),
        TranslationEntry::new("confidentiality", "confidential", "confidentieel", "en"),
        TranslationEntry::new("archiefnominatie", "Bewaren", "blijvend_bewaren", "nl"),
        TranslationEntry::new("archiefnominatie", "Vernietigen", "vernietigen", "nl"),
        TranslationEntry::new("intern_extern", "Intern", "intern", "nl"),
        TranslationEntry::new("intern_extern", "Extern", "extern", "nl"),
    ]
}
