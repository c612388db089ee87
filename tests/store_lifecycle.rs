//! Point Store Lifecycle Tests
//!
//! Tests for:
//! - Round trip of point data through create/read/update
//! - Idempotent delete
//! - Schema upgrade from 1 to 2 keeps existing points
//! - Upgrades blocked by an open connection, fail fast or wait
//! - Closed connections refuse every operation
//! - Corrupted record files are reported, never skipped
//! - A partial trailing record left by a failed write is cut off

use std::fs;
use std::time::Duration;

use couloir::store::{
    reference_couloirs, PointStore, StoreErrorCode, RECORDS_FILE, STORE_DIR,
};
use tempfile::TempDir;
use tokio::sync::oneshot;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

// =============================================================================
// CRUD
// =============================================================================

#[tokio::test]
async fn test_create_read_update_roundtrip() {
    let temp_dir = create_temp_data_dir();
    let store = PointStore::open(temp_dir.path(), 2).await.unwrap();

    let data = reference_couloirs().remove(2);
    let id = store.create(data.clone()).await.unwrap();

    let point = store.read(id).await.unwrap().expect("point must exist");
    assert_eq!(point.id, id);
    assert_eq!(point.data, data);

    let mut changed = point.clone();
    changed.data.comment = "Icy in the upper third".to_string();
    changed.data.elevation_min = None;
    store.update(changed.clone()).await.unwrap();

    assert_eq!(store.read(id).await.unwrap(), Some(changed));
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_of_missing_point_is_not_found() {
    let temp_dir = create_temp_data_dir();
    let store = PointStore::open(temp_dir.path(), 2).await.unwrap();

    let id = store.create(reference_couloirs().remove(0)).await.unwrap();
    let point = store.read(id).await.unwrap().unwrap();
    assert!(store.delete(id).await.unwrap());

    let err = store.update(point).await.unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::StoreNotFound);
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let temp_dir = create_temp_data_dir();
    let store = PointStore::open(temp_dir.path(), 2).await.unwrap();
    let id = store.create(reference_couloirs().remove(0)).await.unwrap();

    assert!(store.delete(id).await.unwrap());
    assert!(!store.delete(id).await.unwrap());
    assert!(store.read(id).await.unwrap().is_none());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_seed_only_into_empty_store() {
    let temp_dir = create_temp_data_dir();
    let store = PointStore::open(temp_dir.path(), 2).await.unwrap();

    assert_eq!(store.seed_if_empty().await.unwrap(), 6);
    assert_eq!(store.seed_if_empty().await.unwrap(), 0);

    assert_eq!(store.reset(false).await.unwrap(), 0);
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(store.reset(true).await.unwrap(), 6);

    let ids: Vec<u64> = store.list().await.unwrap().iter().map(|p| p.id.value()).collect();
    assert_eq!(ids, vec![7, 8, 9, 10, 11, 12]);
}

// =============================================================================
// Migration
// =============================================================================

#[tokio::test]
async fn test_upgrade_keeps_points() {
    let temp_dir = create_temp_data_dir();

    let id = {
        let v1 = PointStore::open(temp_dir.path(), 1).await.unwrap();
        assert_eq!(v1.schema_version().await.unwrap(), 1);
        let id = v1.create(reference_couloirs().remove(1)).await.unwrap();
        assert!(v1.get_user("AK").await.is_err());
        v1.close().await;
        id
    };

    let v2 = PointStore::open(temp_dir.path(), 2).await.unwrap();
    assert_eq!(v2.schema_version().await.unwrap(), 2);
    assert!(v2.read(id).await.unwrap().is_some());
    assert!(v2.get_user("AK").await.unwrap().is_none());

    // Reopening at the persisted version runs no migration.
    v2.close().await;
    let again = PointStore::open(temp_dir.path(), 2).await.unwrap();
    assert_eq!(again.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_opening_older_version_than_persisted_fails() {
    let temp_dir = create_temp_data_dir();
    PointStore::open(temp_dir.path(), 2).await.unwrap().close().await;

    assert!(PointStore::open(temp_dir.path(), 1).await.is_err());
    assert!(PointStore::open(temp_dir.path(), 3).await.is_err());
}

#[tokio::test]
async fn test_upgrade_blocked_by_open_connection() {
    let temp_dir = create_temp_data_dir();
    let v1 = PointStore::open(temp_dir.path(), 1).await.unwrap();

    let err = PointStore::open(temp_dir.path(), 2).await.err().unwrap();
    assert_eq!(err.code(), StoreErrorCode::StoreBlocked);
    assert!(err.is_blocked());
    assert!(!err.is_fatal());
    assert!(err.user_guidance().is_some());

    // The old connection still works at its version.
    assert_eq!(v1.count().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_open_waiting_resumes_after_close() {
    let temp_dir = create_temp_data_dir();
    let v1 = PointStore::open(temp_dir.path(), 1).await.unwrap();
    v1.create(reference_couloirs().remove(0)).await.unwrap();

    let (blocked_tx, blocked_rx) = oneshot::channel();
    let data_dir = temp_dir.path().to_path_buf();
    let upgrade = tokio::spawn(async move {
        PointStore::open_waiting(&data_dir, 2, move |err| {
            let _ = blocked_tx.send(err.code());
        })
        .await
    });

    let code = tokio::time::timeout(Duration::from_secs(10), blocked_rx)
        .await
        .expect("blocked callback not called")
        .unwrap();
    assert_eq!(code, StoreErrorCode::StoreBlocked);

    v1.close().await;

    let v2 = tokio::time::timeout(Duration::from_secs(10), upgrade)
        .await
        .expect("upgrade did not resume")
        .unwrap()
        .unwrap();
    assert_eq!(v2.schema_version().await.unwrap(), 2);
    assert_eq!(v2.count().await.unwrap(), 1);
}

// =============================================================================
// Connection State
// =============================================================================

#[tokio::test]
async fn test_closed_connection_is_unavailable() {
    let temp_dir = create_temp_data_dir();
    let store = PointStore::open(temp_dir.path(), 2).await.unwrap();
    let clone = store.clone();

    store.close().await;
    store.close().await;

    assert!(!clone.is_open().await);
    let err = clone.list().await.unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::StoreUnavailable);
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_corrupted_records_are_reported() {
    let temp_dir = create_temp_data_dir();
    {
        let store = PointStore::open(temp_dir.path(), 2).await.unwrap();
        store.seed_if_empty().await.unwrap();
        store.close().await;
    }

    let records = temp_dir.path().join(STORE_DIR).join(RECORDS_FILE);
    let mut contents = fs::read(&records).unwrap();
    // Inside the collection name of the first record.
    contents[10] ^= 0xFF;
    fs::write(&records, contents).unwrap();

    let err = PointStore::open(temp_dir.path(), 2).await.err().unwrap();
    assert_eq!(err.code(), StoreErrorCode::DataCorruption);
    assert!(err.user_guidance().unwrap().contains("couloir init"));
}

#[tokio::test]
async fn test_partial_trailing_record_is_cut_on_open() {
    let temp_dir = create_temp_data_dir();
    let records = temp_dir.path().join(STORE_DIR).join(RECORDS_FILE);
    let id = {
        let store = PointStore::open(temp_dir.path(), 2).await.unwrap();
        let id = store.create(reference_couloirs().remove(0)).await.unwrap();
        store.close().await;
        id
    };
    let good_len = fs::metadata(&records).unwrap().len();

    {
        use std::io::Write;
        let mut file = fs::OpenOptions::new().append(true).open(&records).unwrap();
        file.write_all(&[0x40, 0x01, 0x00, 0x00, 0x06, 0x00, 0x00]).unwrap();
    }

    let store = PointStore::open(temp_dir.path(), 2).await.unwrap();
    assert_eq!(fs::metadata(&records).unwrap().len(), good_len);
    assert_eq!(store.count().await.unwrap(), 1);
    assert!(store.read(id).await.unwrap().is_some());

    assert_eq!(store.reset(true).await.unwrap(), 6);
    store.close().await;

    let reopened = PointStore::open(temp_dir.path(), 2).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 6);
}

// =============================================================================
// Credentials
// =============================================================================

#[tokio::test]
async fn test_default_users_and_renames() {
    use couloir::auth::{hash_password, Role, User};

    let temp_dir = create_temp_data_dir();
    let store = PointStore::open(temp_dir.path(), 2).await.unwrap();

    let users = vec![
        User::new("AK", "secret", Role::Admin),
        User::new("MJ", "other", Role::User),
    ];
    assert_eq!(store.set_default_users(users.clone()).await.unwrap(), 2);
    assert_eq!(store.set_default_users(users).await.unwrap(), 0);

    let ak = store
        .verify_credentials("AK", &hash_password("secret"))
        .await
        .unwrap()
        .expect("valid credentials");
    assert!(ak.is_admin());
    assert!(store
        .verify_credentials("AK", &hash_password("wrong"))
        .await
        .unwrap()
        .is_none());

    assert!(store.update_username("AK", "MJ").await.is_err());
    let renamed = store.update_username("AK", "AKR").await.unwrap();
    assert_eq!(renamed.username, "AKR");
    assert!(store.get_user("AK").await.unwrap().is_none());

    store.update_password("AKR", &hash_password("new")).await.unwrap();
    assert!(store
        .verify_credentials("AKR", &hash_password("new"))
        .await
        .unwrap()
        .is_some());
}
