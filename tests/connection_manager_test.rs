use ricedb::db::{ConnectTarget, ConnectionManager, Statement};
use ricedb::{DbError, ErrorKind};
use tempfile::TempDir;

fn sqlite_url(temp_dir: &TempDir) -> String {
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    format!("sqlite:{}?mode=rwc", db_path)
}

async fn open(temp_dir: &TempDir) -> ConnectionManager {
    let target = ConnectTarget::from_url(&sqlite_url(temp_dir)).unwrap();
    let mut manager = ConnectionManager::new(target);
    manager.connect().await.expect("connect failed");
    manager
}

async fn count_cities(manager: &mut ConnectionManager) -> i64 {
    manager
        .fetch_one("SELECT COUNT(*) AS n FROM cities")
        .await
        .expect("count failed")
        .expect("count returned no row")
        .try_i64("n")
        .unwrap()
}

#[tokio::test]
async fn test_unreachable_database_leaves_manager_disconnected() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("no/such/dir/test.db");
    let target =
        ConnectTarget::from_url(&format!("sqlite:{}?mode=ro", missing.to_string_lossy())).unwrap();

    let mut manager = ConnectionManager::new(target);
    let err = manager.connect().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connectivity);
    assert!(!manager.is_connected());

    // A failed connect must not leave anything to close.
    manager.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_close_twice_is_safe() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = open(&temp_dir).await;

    manager.disconnect().await.unwrap();
    manager.disconnect().await.unwrap();
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn test_reconnect_after_close() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = open(&temp_dir).await;
    manager.disconnect().await.unwrap();

    manager.connect().await.expect("reconnect failed");
    assert!(manager.is_connected());
    assert!(manager.fetch_one("SELECT 1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_committed_change_is_visible_to_new_session() {
    let temp_dir = TempDir::new().unwrap();
    let mut writer = open(&temp_dir).await;
    writer
        .execute("CREATE TABLE cities (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)")
        .await
        .unwrap();
    let affected = writer
        .execute(Statement::new("INSERT INTO cities (name) VALUES (?)").bind("Chennai"))
        .await
        .unwrap();
    assert_eq!(affected, 1);
    writer.disconnect().await.unwrap();

    let mut reader = open(&temp_dir).await;
    let rows = reader
        .fetch_all("SELECT name FROM cities")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].try_text("name").unwrap().as_deref(), Some("Chennai"));
}

#[tokio::test]
async fn test_unique_violation_rolls_back_and_keeps_data() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = open(&temp_dir).await;
    manager
        .execute("CREATE TABLE cities (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)")
        .await
        .unwrap();
    manager
        .execute(Statement::new("INSERT INTO cities (name) VALUES (?)").bind("Madurai"))
        .await
        .unwrap();

    let err = manager
        .execute(Statement::new("INSERT INTO cities (name) VALUES (?)").bind("Madurai"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(_)), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Constraint);

    assert_eq!(count_cities(&mut manager).await, 1);

    // The session is still usable after the rollback.
    manager
        .execute(Statement::new("INSERT INTO cities (name) VALUES (?)").bind("Salem"))
        .await
        .unwrap();
    assert_eq!(count_cities(&mut manager).await, 2);
}

#[tokio::test]
async fn test_not_null_violation_is_constraint() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = open(&temp_dir).await;
    manager
        .execute("CREATE TABLE cities (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)")
        .await
        .unwrap();

    let err = manager
        .execute(Statement::new("INSERT INTO cities (name) VALUES (?)").bind(Option::<String>::None))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constraint);
}

#[tokio::test]
async fn test_empty_result_is_not_a_failure() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = open(&temp_dir).await;
    manager
        .execute("CREATE TABLE cities (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)")
        .await
        .unwrap();

    let rows = manager.fetch_all("SELECT * FROM cities").await;
    assert!(matches!(rows, Ok(ref r) if r.is_empty()));

    let missing = manager.fetch_all("SELECT * FROM towns").await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn test_independent_managers() {
    let temp_dir = TempDir::new().unwrap();
    let mut first = open(&temp_dir).await;
    let mut second = open(&temp_dir).await;

    first
        .execute("CREATE TABLE cities (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)")
        .await
        .unwrap();
    first.disconnect().await.unwrap();

    // Closing one manager does not affect the other.
    assert!(second.is_connected());
    assert_eq!(count_cities(&mut second).await, 0);
}
