//! Case sync: parent-on-demand mapping, status/role/property fan-in,
//! skeleton defaults and per-record failure isolation.

mod common;

use common::builders::CaseBuilder;
use common::{fixtures, test_engine};
use serde_json::{Value, json};
use zgw_bridge::mapping::config::EPOCH_PLACEHOLDER;
use zgw_bridge::model::EntityType;
use zgw_bridge::store::{InMemoryStore, ObjectStore, StorePrefix};

async fn seed_melding_world(vendor: &zgw_bridge::vendor::MockVendorClient) {
    vendor
        .seed_record("casetype", "ct-melding", fixtures::melding_casetype())
        .await;
    vendor
        .seed_listing("case", vec![fixtures::melding_case()])
        .await;
}

async fn the_case(store: &InMemoryStore) -> Value {
    let matches = store
        .find_by_attribute(StorePrefix::of(EntityType::Case), "identificatie", "zaak-100")
        .await
        .unwrap();
    matches.into_iter().next().unwrap().1
}

#[tokio::test]
async fn test_case_sync_maps_missing_casetype_on_demand() {
    let (engine, store, vendor) = test_engine();
    seed_melding_world(&vendor).await;

    let report = engine.sync_all_cases().await.unwrap();
    assert_eq!(report.fetched, 1);
    assert_eq!(report.created, 1);
    assert_eq!(report.skipped, 0);

    // The casetype was fetched and mapped before the case referencing it
    assert_eq!(
        store.count(StorePrefix::of(EntityType::CaseType)).await.unwrap(),
        1
    );
    let case = the_case(&store).await;
    assert_eq!(case["omschrijving"], "Kapotte lantaarnpaal");
    assert_eq!(case["registratiedatum"], "2024-03-01");
    assert_eq!(case["startdatum"], "2024-03-01");
    assert_eq!(case["einddatumGepland"], "2024-04-12");
    assert_eq!(case["communicatiekanaal"], "webformulier");
    assert!(case["zaaktype"].is_string());
}

#[tokio::test]
async fn test_skeleton_defaults_never_overwrite_present_values() {
    let (engine, store, vendor) = test_engine();
    seed_melding_world(&vendor).await;

    engine.sync_all_cases().await.unwrap();

    let case = the_case(&store).await;
    // Vendor supplied "deels"; the skeleton default "geheel" must not win
    assert_eq!(case["betalingsindicatie"], "deels");
    // Fields the vendor never supplies get the skeleton defaults
    assert_eq!(case["bronorganisatie"], "001172120");
    assert_eq!(case["archiefnominatie"], "vernietigen");
}

#[tokio::test]
async fn test_milestone_fan_in_with_epoch_default() {
    let (engine, store, vendor) = test_engine();
    seed_melding_world(&vendor).await;

    engine.sync_all_cases().await.unwrap();

    let case = the_case(&store).await;
    let status_id = case["status"].as_str().expect("case carries a status");
    let status = store
        .get(zgw_bridge::StoreKey::new(EntityType::Status, status_id))
        .await
        .unwrap()
        .unwrap();
    // The upstream milestone carries no timestamp
    assert_eq!(status["datumStatusGezet"], EPOCH_PLACEHOLDER);

    let status_type = store
        .get(zgw_bridge::StoreKey::new(
            EntityType::StatusType,
            status["statustype"].as_str().unwrap(),
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status_type["omschrijving"], "Intake");
}

#[tokio::test]
async fn test_role_and_property_fan_in() {
    let (engine, store, vendor) = test_engine();
    seed_melding_world(&vendor).await;

    engine.sync_all_cases().await.unwrap();

    let case = the_case(&store).await;
    let roles = case["rollen"].as_array().unwrap();
    assert_eq!(roles.len(), 1);
    let role = store
        .get(zgw_bridge::StoreKey::new(
            EntityType::Role,
            roles[0].as_str().unwrap(),
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(role["omschrijving"], "Case handler");
    assert_eq!(role["betrokkeneType"], "natuurlijk_persoon");

    // Only the attribute matching a registered eigenschap survives
    let values = case["eigenschappen"].as_array().unwrap();
    assert_eq!(values.len(), 1);
    let value = store
        .get(zgw_bridge::StoreKey::new(
            EntityType::ZaakEigenschap,
            values[0].as_str().unwrap(),
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(value["naam"], "locatie");
    assert_eq!(value["waarde"], "Dorpsstraat 1");
}

#[tokio::test]
async fn test_unmatched_milestone_and_role_are_silently_skipped() {
    let (engine, store, vendor) = test_engine();
    vendor
        .seed_record("casetype", "ct-melding", fixtures::melding_casetype())
        .await;
    let case = CaseBuilder::new("zaak-200", "ct-melding")
        .subject("Onbekende fase")
        .milestone("Niet bestaand")
        .field(
            "route",
            json!({"role": [{"instance": {"name": "Onbekend", "description": "Onbekend"}}]}),
        )
        .build();
    vendor.seed_listing("case", vec![case]).await;

    let report = engine.sync_all_cases().await.unwrap();
    assert_eq!(report.created, 1);

    let matches = store
        .find_by_attribute(StorePrefix::of(EntityType::Case), "identificatie", "zaak-200")
        .await
        .unwrap();
    let case = &matches[0].1;
    assert!(case.get("status").is_none());
    assert!(case["rollen"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_record_is_skipped_and_pass_continues() {
    let (engine, _store, vendor) = test_engine();
    vendor
        .seed_record("casetype", "ct-melding", fixtures::melding_casetype())
        .await;
    vendor
        .seed_listing(
            "case",
            vec![json!({"instance": {"subject": "geen referentie"}}), fixtures::melding_case()],
        )
        .await;

    let report = engine.sync_all_cases().await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.created, 1);
}

#[tokio::test]
async fn test_sync_one_case_by_external_id() {
    let (engine, store, vendor) = test_engine();
    vendor
        .seed_record("casetype", "ct-melding", fixtures::melding_casetype())
        .await;
    vendor
        .seed_record("case", "zaak-100", fixtures::melding_case())
        .await;

    let local_id = engine
        .sync_one_case(&zgw_bridge::ExternalId::try_from("zaak-100").unwrap())
        .await
        .unwrap();

    let case = store
        .get(zgw_bridge::StoreKey::new(EntityType::Case, local_id.as_str()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(case["identificatie"], "zaak-100");

    let missing = engine
        .sync_one_case(&zgw_bridge::ExternalId::try_from("zaak-999").unwrap())
        .await;
    assert!(missing.is_err());
}
