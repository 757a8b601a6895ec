use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::Value;

use fleet_ops::models::fleet::{FleetCode, FleetMembership, MembershipStatus};
use fleet_ops::storage::{bootstrap, FileBackend, RecordStore};

fn code(owner: &str) -> FleetCode {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    FleetCode {
        code: "A7K9M2P4".to_string(),
        owner_id: owner.to_string(),
        created_at,
        expires_at: Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap(),
        is_active: true,
    }
}

#[tokio::test]
async fn test_file_backend_persists_across_stores() {
    let dir = tempfile::tempdir().unwrap();

    let store = RecordStore::new(Arc::new(FileBackend::new(dir.path())));
    store.save(&[code("user_owner")]).await.unwrap();

    // Un store nuevo sobre el mismo directorio ve los mismos registros
    let reopened = RecordStore::new(Arc::new(FileBackend::new(dir.path())));
    let loaded: Vec<FleetCode> = reopened.load().await.unwrap();
    assert_eq!(loaded, vec![code("user_owner")]);

    let raw = std::fs::read_to_string(dir.path().join("fleet_codes.json")).unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["records"][0]["expires_at"], "2024-01-08T12:00:00Z");
    assert!(!dir.path().join("fleet_codes.json.tmp").exists());
}

#[tokio::test]
async fn test_bootstrap_creates_every_collection() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(Arc::new(FileBackend::new(dir.path())));

    bootstrap(&store).await.unwrap();

    for key in [
        "users",
        "fleet_codes",
        "fleet_members",
        "trucks",
        "checklists",
        "checklist_completions",
    ] {
        assert!(dir.path().join(format!("{}.json", key)).exists(), "{} missing", key);
    }
}

#[tokio::test]
async fn test_bootstrap_migrates_legacy_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("fleet_members.json"),
        r#"[{"id":"member_1","driverId":"user_d","ownerId":"user_o","driverEmail":"d@example.com","driverName":"Dee","joinedAt":"2024-02-01T08:00:00.000Z","status":"removed"}]"#,
    )
    .unwrap();

    let store = RecordStore::new(Arc::new(FileBackend::new(dir.path())));
    bootstrap(&store).await.unwrap();

    let members: Vec<FleetMembership> = store.load().await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].driver_id, "user_d");
    assert_eq!(
        members[0].status,
        MembershipStatus::Removed {
            removed_at: Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap()
        }
    );

    let raw = std::fs::read_to_string(dir.path().join("fleet_members.json")).unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], 1);
}
