//! Integration tests for JSON export

use dhp_vault::adapters::memory::InMemoryStorage;
use dhp_vault::core::{HistoryLimit, VaultStore};
use dhp_vault::domain::{DocumentKind, DocumentPayload, PatientId, VaultError};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

fn store() -> VaultStore {
    VaultStore::with_storage(Arc::new(InMemoryStorage::new()), HistoryLimit::default())
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_export_after_one_push() {
    let store = store();
    let p1 = PatientId::new("P1").unwrap();
    let document = json!({
        "hard": {"Patient Alias": "P1", "Blood Type": "A+"},
        "soft": {"notes": ["first visit"]}
    });
    store
        .push(
            DocumentKind::Dhp,
            &p1,
            DocumentPayload::try_from(document.clone()).unwrap(),
        )
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("dhp.json");
    store
        .export(DocumentKind::Dhp, &p1, &destination)
        .await
        .unwrap();

    assert_eq!(read_json(&destination), document);
}

#[tokio::test]
async fn test_export_overwrites_existing_file() {
    let store = store();
    let p1 = PatientId::new("P1").unwrap();

    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("plan.json");
    std::fs::write(&destination, "{\"stale\": true, \"padding\": \"xxxxxxxxxxxxxxxx\"}").unwrap();

    store
        .push(
            DocumentKind::PlanStatus,
            &p1,
            DocumentPayload::try_from(json!({"day": 3})).unwrap(),
        )
        .await
        .unwrap();
    store
        .export(DocumentKind::PlanStatus, &p1, &destination)
        .await
        .unwrap();

    assert_eq!(read_json(&destination), json!({"day": 3}));
}

#[tokio::test]
async fn test_export_reflects_rollback_and_keeps_chain() {
    let store = store();
    let p1 = PatientId::new("P1").unwrap();
    for day in 1..=3 {
        store
            .push(
                DocumentKind::PlanStatus,
                &p1,
                DocumentPayload::try_from(json!({ "day": day })).unwrap(),
            )
            .await
            .unwrap();
    }
    store
        .rollback(DocumentKind::PlanStatus, &p1, 1)
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("plan.json");
    store
        .export(DocumentKind::PlanStatus, &p1, &destination)
        .await
        .unwrap();

    assert_eq!(read_json(&destination), json!({"day": 2}));
    assert_eq!(
        store
            .history(DocumentKind::PlanStatus, &p1)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_export_unknown_patient_writes_nothing() {
    let store = store();
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("missing/ghost.json");

    let err = store
        .export(
            DocumentKind::Dhp,
            &PatientId::new("ghost").unwrap(),
            &destination,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, VaultError::PatientNotFound { .. }));
    assert!(!destination.exists());
    assert!(!destination.parent().unwrap().exists());
}
