use chrono::Duration;
use learn_core::ProgressMap;
use learn_core::model::{ExerciseId, LearnerId};
use learn_core::time::fixed_now;
use storage::repository::{ProgressRepository, Storage};
use storage::sqlite::SqliteProgressRepository;

fn eid(s: &str) -> ExerciseId {
    ExerciseId::new(s).unwrap()
}

fn learner(s: &str) -> LearnerId {
    LearnerId::new(s).unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_persists_timestamps() {
    let repo = SqliteProgressRepository::connect("sqlite:file:memdb_progress_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut records = ProgressMap::new();
    records.insert(eid("circle"), fixed_now());
    records.insert(eid("linear-gradient"), fixed_now() + Duration::minutes(7));
    repo.save(&learner("ada"), &records).await.expect("save");

    let loaded = repo.load(&learner("ada")).await.expect("load");
    assert_eq!(loaded, records);
}

#[tokio::test]
async fn sqlite_save_replaces_previous_records() {
    let repo = SqliteProgressRepository::connect("sqlite:file:memdb_progress_replace?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut first = ProgressMap::new();
    first.insert(eid("circle"), fixed_now());
    first.insert(eid("capsule"), fixed_now());
    repo.save(&learner("ada"), &first).await.unwrap();

    let mut second = ProgressMap::new();
    second.insert(eid("capsule"), fixed_now());
    repo.save(&learner("ada"), &second).await.unwrap();

    let loaded = repo.load(&learner("ada")).await.unwrap();
    assert_eq!(loaded, second);
}

#[tokio::test]
async fn sqlite_keeps_learners_apart() {
    let repo = SqliteProgressRepository::connect("sqlite:file:memdb_progress_learners?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut ada = ProgressMap::new();
    ada.insert(eid("bold"), fixed_now());
    repo.save(&learner("ada"), &ada).await.unwrap();
    repo.save(&learner("bob"), &ProgressMap::new()).await.unwrap();

    assert_eq!(repo.load(&learner("ada")).await.unwrap(), ada);
    assert!(repo.load(&learner("bob")).await.unwrap().is_empty());
    assert!(repo.load(&learner("carol")).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteProgressRepository::connect("sqlite:file:memdb_progress_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(applied, 1);
}

#[tokio::test]
async fn storage_sqlite_builds_a_working_backend() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_storage?mode=memory&cache=shared")
        .await
        .expect("storage");

    let mut records = ProgressMap::new();
    records.insert(eid("vstack"), fixed_now());
    storage.progress.save(&learner("ada"), &records).await.unwrap();
    assert_eq!(storage.progress.load(&learner("ada")).await.unwrap(), records);
}

#[tokio::test]
async fn open_creates_a_missing_database_file_and_reopens_it() {
    let dir = std::env::temp_dir().join(format!("learn-sqlite-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("progress.sqlite3");
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite:{}", path.display());

    let mut records = ProgressMap::new();
    records.insert(eid("circle"), fixed_now());
    {
        let repo = SqliteProgressRepository::open(&url).await.expect("open");
        repo.save(&learner("ada"), &records).await.unwrap();
        repo.pool().close().await;
    }
    assert!(path.exists());

    let reopened = SqliteProgressRepository::open(&url).await.expect("reopen");
    assert_eq!(reopened.load(&learner("ada")).await.unwrap(), records);
    reopened.pool().close().await;

    let _ = std::fs::remove_dir_all(dir);
}
