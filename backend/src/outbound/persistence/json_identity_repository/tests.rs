//! Tests for the JSON snapshot identity repository.

use std::sync::Arc;

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use tokio::task::JoinSet;
use uuid::Uuid;

use super::*;

const ALICE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
const BOB_ID: &str = "9b2d7c1e-8a4f-4e7b-9c3d-1f2e3a4b5c6d";

struct Workspace {
    _temp: TempDir,
    path: Utf8PathBuf,
}

impl Workspace {
    fn open(&self) -> (JsonSnapshotIdentityRepository, SnapshotLoad) {
        JsonSnapshotIdentityRepository::open(&self.path).expect("open repository")
    }

    fn write_raw(&self, contents: &[u8]) {
        let parent = self.path.parent().expect("snapshot parent");
        std::fs::create_dir_all(parent).expect("create snapshot dir");
        std::fs::write(&self.path, contents).expect("write raw snapshot");
    }

    fn read_raw(&self) -> String {
        std::fs::read_to_string(&self.path).expect("read raw snapshot")
    }
}

#[fixture]
fn workspace() -> Workspace {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp dir");
    Workspace {
        path: root.join("data/users.json"),
        _temp: temp,
    }
}

fn record(id: &str, username: &str, email: &str) -> IdentityRecord {
    IdentityRecord::try_from_strings(id, username, email, "$argon2id$v=19$stub").expect("record")
}

fn id(value: &str) -> IdentityId {
    IdentityId::new(value).expect("id")
}

#[rstest]
#[tokio::test]
async fn missing_snapshot_opens_empty(workspace: Workspace) {
    let (repo, load) = workspace.open();

    assert_eq!(load, SnapshotLoad::Missing);
    assert!(repo.list_all().await.expect("list").is_empty());
    assert!(!workspace.path.exists(), "opening must not create the file");
}

#[rstest]
#[tokio::test]
async fn records_survive_reopen(workspace: Workspace) {
    let alice = record(ALICE_ID, "alice", "a@x.com");
    let bob = record(BOB_ID, "bob", "b@x.com");
    {
        let (repo, _) = workspace.open();
        repo.insert(&alice).await.expect("insert alice");
        repo.insert(&bob).await.expect("insert bob");
    }

    let (repo, load) = workspace.open();

    assert_eq!(load, SnapshotLoad::Loaded { records: 2 });
    assert_eq!(
        repo.find_by_id(&id(ALICE_ID)).await.expect("find"),
        Some(alice)
    );
    let by_email = repo
        .find_by_email(bob.email())
        .await
        .expect("find by email");
    assert_eq!(by_email, Some(bob));
}

#[rstest]
#[tokio::test]
async fn snapshot_uses_keyed_camel_case_layout(workspace: Workspace) {
    let (repo, _) = workspace.open();
    repo.insert(&record(ALICE_ID, "alice", "a@x.com"))
        .await
        .expect("insert");

    let document: serde_json::Value =
        serde_json::from_str(&workspace.read_raw()).expect("snapshot is JSON");

    assert_eq!(document[ALICE_ID]["id"], ALICE_ID);
    assert_eq!(document[ALICE_ID]["username"], "alice");
    assert_eq!(document[ALICE_ID]["email"], "a@x.com");
    assert_eq!(
        document[ALICE_ID]["credentialDigest"],
        "$argon2id$v=19$stub"
    );
}

#[rstest]
#[tokio::test]
async fn email_lookup_is_case_sensitive(workspace: Workspace) {
    let (repo, _) = workspace.open();
    repo.insert(&record(ALICE_ID, "alice", "a@x.com"))
        .await
        .expect("insert");

    let upper = EmailAddress::new("A@X.COM").expect("email");

    assert!(repo.find_by_email(&upper).await.expect("find").is_none());
}

#[rstest]
#[tokio::test]
async fn insert_rejects_duplicate_email_and_id(workspace: Workspace) {
    let (repo, _) = workspace.open();
    repo.insert(&record(ALICE_ID, "alice", "a@x.com"))
        .await
        .expect("insert");

    let same_email = repo
        .insert(&record(BOB_ID, "bob", "a@x.com"))
        .await
        .expect_err("duplicate email");
    let same_id = repo
        .insert(&record(ALICE_ID, "other", "other@x.com"))
        .await
        .expect_err("duplicate id");

    assert!(matches!(
        same_email,
        IdentityRepositoryError::DuplicateEmail { .. }
    ));
    assert!(matches!(same_id, IdentityRepositoryError::DuplicateId { .. }));
    assert_eq!(repo.list_all().await.expect("list").len(), 1);
}

#[rstest]
#[tokio::test]
async fn replace_updates_record_and_enforces_email_uniqueness(workspace: Workspace) {
    let (repo, _) = workspace.open();
    repo.insert(&record(ALICE_ID, "alice", "a@x.com"))
        .await
        .expect("insert alice");
    repo.insert(&record(BOB_ID, "bob", "b@x.com"))
        .await
        .expect("insert bob");

    let renamed = record(ALICE_ID, "alicia", "a@x.com");
    repo.replace(&id(ALICE_ID), &renamed)
        .await
        .expect("replace keeping own email");

    let stolen = record(BOB_ID, "bob", "a@x.com");
    let error = repo
        .replace(&id(BOB_ID), &stolen)
        .await
        .expect_err("email held by alice");

    assert!(matches!(error, IdentityRepositoryError::DuplicateEmail { .. }));
    let (reopened, _) = workspace.open();
    assert_eq!(
        reopened.find_by_id(&id(ALICE_ID)).await.expect("find"),
        Some(renamed)
    );
    let bob = reopened
        .find_by_id(&id(BOB_ID))
        .await
        .expect("find")
        .expect("bob present");
    assert_eq!(bob.email().as_ref(), "b@x.com");
}

#[rstest]
#[tokio::test]
async fn replace_and_delete_report_missing_ids(workspace: Workspace) {
    let (repo, _) = workspace.open();
    let ghost = record(ALICE_ID, "ghost", "g@x.com");

    let replaced = repo.replace(&id(ALICE_ID), &ghost).await;
    let deleted = repo.delete(&id(ALICE_ID)).await;

    assert!(matches!(
        replaced,
        Err(IdentityRepositoryError::NotFound { .. })
    ));
    assert!(matches!(deleted, Err(IdentityRepositoryError::NotFound { .. })));
}

#[rstest]
#[tokio::test]
async fn delete_is_durable(workspace: Workspace) {
    {
        let (repo, _) = workspace.open();
        repo.insert(&record(ALICE_ID, "alice", "a@x.com"))
            .await
            .expect("insert");
        repo.delete(&id(ALICE_ID)).await.expect("delete");
    }

    let (repo, load) = workspace.open();

    assert_eq!(load, SnapshotLoad::Loaded { records: 0 });
    assert!(repo.list_all().await.expect("list").is_empty());
    assert_eq!(workspace.read_raw(), "{}\n");
}

#[rstest]
#[case::garbage(b"this is not json".as_slice())]
#[case::wrong_shape(b"[1, 2, 3]".as_slice())]
#[case::mismatched_key(
    br#"{"9b2d7c1e-8a4f-4e7b-9c3d-1f2e3a4b5c6d": {"id": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "username": "a", "email": "a@x.com", "credentialDigest": "d"}}"#.as_slice()
)]
#[case::invalid_utf8(b"{\"k\": \"\xff\xfe\"}".as_slice())]
#[tokio::test]
async fn corrupt_snapshot_is_quarantined(workspace: Workspace, #[case] contents: &[u8]) {
    workspace.write_raw(contents);

    let (repo, load) = workspace.open();

    let SnapshotLoad::Recovered {
        quarantined: Some(moved),
        ..
    } = &load
    else {
        panic!("expected recovery with quarantine, got {load:?}");
    };
    assert!(repo.list_all().await.expect("list").is_empty());
    assert!(!workspace.path.exists());
    assert_eq!(std::fs::read(moved).expect("quarantined file"), contents);
}

#[rstest]
#[tokio::test]
async fn first_write_after_recovery_starts_fresh(workspace: Workspace) {
    workspace.write_raw(b"{ broken");
    let (repo, _) = workspace.open();

    repo.insert(&record(ALICE_ID, "alice", "a@x.com"))
        .await
        .expect("insert");

    let (_, load) = workspace.open();
    assert_eq!(load, SnapshotLoad::Loaded { records: 1 });
}

#[rstest]
#[tokio::test]
async fn undecodable_bytes_survive_the_next_write(workspace: Workspace) {
    let raw = b"{\"3fa85f64\": \"caf\xe9\"}";
    workspace.write_raw(raw);
    let (repo, load) = workspace.open();
    let SnapshotLoad::Recovered {
        quarantined: Some(moved),
        ..
    } = &load
    else {
        panic!("expected quarantine, got {load:?}");
    };

    repo.insert(&record(ALICE_ID, "alice", "a@x.com"))
        .await
        .expect("insert");

    assert_eq!(std::fs::read(moved).expect("quarantined file"), raw);
    assert!(workspace.read_raw().contains(ALICE_ID));
}

#[rstest]
#[tokio::test]
async fn opaque_ids_round_trip(workspace: Workspace) {
    let legacy = record("user-123", "legacy", "legacy@x.com");
    {
        let (repo, _) = workspace.open();
        repo.insert(&legacy).await.expect("insert");
    }

    let (repo, load) = workspace.open();

    assert_eq!(load, SnapshotLoad::Loaded { records: 1 });
    assert_eq!(
        repo.find_by_id(&id("user-123")).await.expect("find"),
        Some(legacy)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_inserts_are_all_persisted(workspace: Workspace) {
    let (repo, _) = workspace.open();
    let repo = Arc::new(repo);
    let mut tasks = JoinSet::new();
    for n in 0..16 {
        let repo = Arc::clone(&repo);
        tasks.spawn(async move {
            let key = Uuid::new_v4().to_string();
            repo.insert(&record(&key, &format!("user{n}"), &format!("u{n}@x.com")))
                .await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.expect("task completes").expect("insert");
    }

    assert_eq!(repo.list_all().await.expect("list").len(), 16);
    drop(repo);
    let (_, load) = workspace.open();
    assert_eq!(load, SnapshotLoad::Loaded { records: 16 });
}

#[cfg(unix)]
#[rstest]
#[tokio::test]
async fn failed_write_leaves_state_untouched(workspace: Workspace) {
    let (repo, _) = workspace.open();
    let parent = workspace.path.parent().expect("parent dir");
    std::fs::remove_dir_all(parent).expect("remove snapshot dir");

    let error = repo
        .insert(&record(ALICE_ID, "alice", "a@x.com"))
        .await
        .expect_err("write into removed directory");

    assert!(matches!(error, IdentityRepositoryError::Storage { .. }));
    assert!(repo.list_all().await.expect("list").is_empty());
    assert!(
        repo.find_by_id(&id(ALICE_ID))
            .await
            .expect("find")
            .is_none()
    );
}
