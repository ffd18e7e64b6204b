//! Canned vendor payloads modeled on real xxllnc responses.

use serde_json::{Value, json};

/// A three-phase casetype covering the full fan-out surface: status types,
/// eigenschappen, a file field, roles with a case-insensitive duplicate,
/// and two results.
pub fn melding_casetype() -> Value {
    json!({
        "reference": "ct-melding",
        "instance": {
            "title": "Melding openbare ruimte",
            "subject": "Meldingen over de openbare ruimte",
            "lead_time_legal": 56,
            "lead_time_service": 42,
            "properties": {
                "designation_of_confidentiality": "Openbaar",
                "keywords": "melding, openbare ruimte",
                "extension": "Nee",
                "publication": "Ja",
            },
            "phases": [
                {
                    "name": "Intake",
                    "seq": 1,
                    "fields": [
                        {
                            "label": "Ontvangen",
                            "help": "Case ontvangen",
                            "magic_string": "ontvangst_opmerking",
                            "type": "text",
                        },
                        {
                            "label": "Locatie",
                            "help": "Waar is het?",
                            "magic_string": "locatie",
                            "type": "text",
                        },
                        {
                            "label": "Foto",
                            "help": "Foto van de situatie",
                            "magic_string": "foto",
                            "type": "file",
                        },
                    ],
                    "route": {
                        "role": {
                            "reference": "role-behandelaar",
                            "instance": {"name": "Behandelaar", "description": "Case handler"},
                        },
                    },
                },
                {
                    "name": "Beoordelen",
                    "seq": 2,
                    "fields": [
                        {
                            "label": "Oordeel",
                            "help": "Beoordeling van de melding",
                            "magic_string": "oordeel",
                            "type": "text",
                        },
                    ],
                    "route": {
                        "role": {
                            "reference": "role-behandelaar",
                            "instance": {"name": "behandelaar", "description": "Case handler"},
                        },
                    },
                },
                {
                    "name": "Afhandelen",
                    "seq": 3,
                    "fields": [],
                    "route": {
                        "role": {
                            "reference": "role-manager",
                            "instance": {"name": "Manager", "description": "Team manager"},
                        },
                    },
                },
            ],
            "results": [
                {
                    "instance": {
                        "type": "Toegewezen",
                        "label": "Melding toegewezen",
                        "selection_list": "",
                        "type_of_archiving": "Vernietigen",
                        "period_of_preservation": "5 jaar",
                    },
                },
                {
                    "instance": {
                        "type": "Afgewezen",
                        "label": "Melding afgewezen",
                        "selection_list": "https://selectielijst.example.org/resultaten/12",
                        "type_of_archiving": "Bewaren",
                        "period_of_preservation": "",
                    },
                },
            ],
        },
    })
}

/// A casetype whose title routes it to decision-type mapping.
pub fn decision_casetype() -> Value {
    json!({
        "reference": "ct-besluit-toegekend",
        "instance": {
            "title": "Besluit Toegekend",
            "phases": [
                {
                    "name": "Besluiten",
                    "seq": 1,
                    "fields": [
                        {
                            "label": "Besluitdocument",
                            "magic_string": "besluit_document",
                            "type": "file",
                        },
                    ],
                },
            ],
        },
    })
}

/// A case of the melding casetype sitting in the Intake phase.
pub fn melding_case() -> Value {
    json!({
        "reference": "zaak-100",
        "instance": {
            "subject": "Kapotte lantaarnpaal",
            "date_of_registration": "2024-03-01",
            "date_target": "2024-04-12",
            "channel_of_contact": "webformulier",
            "payment_status": "deels",
            "milestone": {"instance": {"phase_label": "Intake"}},
            "route": {
                "role": [
                    {"instance": {"name": "Behandelaar", "description": "Case handler"}},
                ],
            },
            "attributes": {
                "locatie": "Dorpsstraat 1",
                "onbekend_veld": "wordt overgeslagen",
            },
            "casetype": {"reference": "ct-melding"},
        },
    })
}
