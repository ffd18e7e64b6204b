//! Shared fixtures and helpers for the integration suites.
#![allow(dead_code)]

pub mod builders;
pub mod fixtures;

use serde_json::json;
use zgw_bridge::model::{EntityType, LocalId, SourceId};
use zgw_bridge::store::{InMemoryStore, ObjectStore};
use zgw_bridge::vendor::MockVendorClient;
use zgw_bridge::{ExternalId, MappingConfig, StoreKey, SyncEngine};

pub type TestEngine = SyncEngine<InMemoryStore, MockVendorClient>;

/// Initialize test logging once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The source id every suite syncs under.
pub fn source() -> SourceId {
    SourceId::new("xxllnc")
}

/// An engine over a fresh in-memory store and a scripted vendor.
///
/// The returned store and vendor share state with the engine, so suites
/// can seed the vendor and inspect the store directly.
pub fn test_engine() -> (TestEngine, InMemoryStore, MockVendorClient) {
    init_logging();
    let store = InMemoryStore::new();
    let vendor = MockVendorClient::new();
    let engine = SyncEngine::new(
        store.clone(),
        vendor.clone(),
        MappingConfig::standard(),
        source(),
    );
    (engine, store, vendor)
}

/// A locally authored case of the melding casetype.
///
/// The case type is synced from the vendor, but the case itself never
/// was, so it carries no sync record and the first push takes the
/// create path. The case registers the "locatie" property and a
/// behandelaar role against the synced type.
pub async fn local_case(
    engine: &TestEngine,
    store: &InMemoryStore,
    vendor: &MockVendorClient,
) -> LocalId {
    vendor
        .seed_record("casetype", "ct-melding", fixtures::melding_casetype())
        .await;
    let case_type_id = engine
        .sync_one_case_type(&ExternalId::try_from("ct-melding").unwrap())
        .await
        .unwrap();

    let property_id = LocalId::generate();
    store
        .put(
            StoreKey::new(EntityType::ZaakEigenschap, property_id.as_str()),
            json!({
                "id": property_id.as_str(),
                "naam": "locatie",
                "waarde": "Dorpsstraat 1",
            }),
        )
        .await
        .unwrap();

    let role_id = LocalId::generate();
    store
        .put(
            StoreKey::new(EntityType::Role, role_id.as_str()),
            json!({
                "id": role_id.as_str(),
                "omschrijving": "Case handler",
                "omschrijvingGeneriek": "behandelaar",
                "betrokkeneType": "natuurlijk_persoon",
            }),
        )
        .await
        .unwrap();

    let case_id = LocalId::generate();
    store
        .put(
            StoreKey::new(EntityType::Case, case_id.as_str()),
            json!({
                "id": case_id.as_str(),
                "zaaktype": case_type_id.as_str(),
                "bronorganisatie": "001172120",
                "omschrijving": "Kapotte lantaarnpaal",
                "vertrouwelijkheidaanduiding": "openbaar",
                "eigenschappen": [property_id.as_str()],
                "rollen": [role_id.as_str()],
                "zaakinformatieobjecten": [],
            }),
        )
        .await
        .unwrap();

    case_id
}
