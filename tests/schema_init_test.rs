use ricedb::db::{ConnectTarget, ConnectionManager, Statement};
use ricedb::inspect;
use ricedb::schema::{self, seed, DiseaseSeed, Table};
use ricedb::ErrorKind;
use tempfile::TempDir;

fn sqlite_target(temp_dir: &TempDir) -> ConnectTarget {
    let db_path = temp_dir
        .path()
        .join("rice.db")
        .to_string_lossy()
        .to_string();
    ConnectTarget::from_url(&format!("sqlite:{}?mode=rwc", db_path)).unwrap()
}

async fn open(target: &ConnectTarget) -> ConnectionManager {
    let mut manager = ConnectionManager::new(target.clone());
    manager.connect().await.expect("connect failed");
    manager
}

async fn table_names(manager: &mut ConnectionManager) -> Vec<String> {
    manager
        .fetch_all(
            "SELECT name FROM sqlite_master WHERE type = 'table' \
             AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .await
        .unwrap()
        .iter()
        .map(|row| row.try_text("name").unwrap().unwrap())
        .collect()
}

#[tokio::test]
async fn test_initialize_creates_tables_and_seeds() {
    let temp_dir = TempDir::new().unwrap();
    let target = sqlite_target(&temp_dir);
    let seeds = seed::default_seeds().unwrap();

    let report = schema::initialize(&target, &seeds).await.expect("init failed");
    assert_eq!(report.database, None);
    assert_eq!(report.tables, Table::ALL.to_vec());
    assert_eq!(report.seeds_inserted, 4);
    assert_eq!(report.seeds_skipped, 0);

    let mut manager = open(&target).await;
    assert_eq!(
        table_names(&mut manager).await,
        vec!["diseases", "predictions", "users"]
    );
    assert_eq!(inspect::row_count(&mut manager, Table::Diseases).await.unwrap(), 4);
}

#[tokio::test]
async fn test_initialize_twice_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let target = sqlite_target(&temp_dir);
    let seeds = seed::default_seeds().unwrap();

    schema::initialize(&target, &seeds).await.expect("first init failed");
    let mut manager = open(&target).await;
    let tables_before = table_names(&mut manager).await;
    let diseases_before = inspect::list_diseases(&mut manager).await.unwrap();
    manager.disconnect().await.unwrap();

    let report = schema::initialize(&target, &seeds)
        .await
        .expect("second init failed");
    assert_eq!(report.seeds_inserted, 0);
    assert_eq!(report.seeds_skipped, 4);

    let mut manager = open(&target).await;
    assert_eq!(table_names(&mut manager).await, tables_before);
    assert_eq!(inspect::list_diseases(&mut manager).await.unwrap(), diseases_before);
}

#[tokio::test]
async fn test_end_to_end_seeded_blast_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let target = sqlite_target(&temp_dir);
    let seeds = seed::default_seeds().unwrap();
    schema::initialize(&target, &seeds).await.unwrap();

    let mut manager = open(&target).await;
    let blast = DiseaseSeed {
        name: "Blast".to_string(),
        description: Some("duplicate".to_string()),
        symptoms: None,
        treatment: None,
    };
    let inserted = schema::seed_diseases(&mut manager, &[blast]).await.unwrap();
    assert_eq!(inserted, 0);

    let count = manager
        .fetch_one("SELECT COUNT(*) AS total FROM diseases")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(count.try_i64("total").unwrap(), 4);

    let sample = inspect::sample_rows(&mut manager, Table::Diseases, 5).await.unwrap();
    let names: Vec<String> = sample
        .iter()
        .map(|row| row.try_text("name").unwrap().unwrap())
        .collect();
    let expected: Vec<String> = seeds.iter().map(|s| s.name.clone()).collect();
    assert_eq!(names, expected);

    // The original Blast row keeps its seeded description.
    let stored = inspect::find_disease(&mut manager, "Blast").await.unwrap().unwrap();
    assert_eq!(stored.description, seeds[1].description);
    assert_eq!(stored.symptoms.as_deref(), Some("Diamond-shaped lesions on leaves"));
}

#[tokio::test]
async fn test_custom_seed_list_adds_new_rows_only() {
    let temp_dir = TempDir::new().unwrap();
    let target = sqlite_target(&temp_dir);
    schema::initialize(&target, &seed::default_seeds().unwrap())
        .await
        .unwrap();

    let extended = seed::parse_seeds(
        r#"[
            {"name": "Blast"},
            {"name": "Sheath Blight", "symptoms": "Oval lesions on leaf sheaths"}
        ]"#,
    )
    .unwrap();
    let report = schema::initialize(&target, &extended).await.unwrap();
    assert_eq!(report.seeds_inserted, 1);
    assert_eq!(report.seeds_skipped, 1);

    let mut manager = open(&target).await;
    assert_eq!(inspect::row_count(&mut manager, Table::Diseases).await.unwrap(), 5);
}

#[tokio::test]
async fn test_prediction_requires_existing_disease() {
    let temp_dir = TempDir::new().unwrap();
    let target = sqlite_target(&temp_dir);
    schema::initialize(&target, &seed::default_seeds().unwrap())
        .await
        .unwrap();

    let mut manager = open(&target).await;
    let insert = "INSERT INTO predictions (image_filename, disease_id, confidence_score, predicted_class) \
                  VALUES (?, ?, ?, ?)";

    let err = manager
        .execute(
            Statement::new(insert)
                .bind("leaf_001.jpg")
                .bind(999i64)
                .bind(0.91)
                .bind("Blast"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constraint);

    let blast = inspect::find_disease(&mut manager, "Blast").await.unwrap().unwrap();
    manager
        .execute(
            Statement::new(insert)
                .bind("leaf_001.jpg")
                .bind(blast.id)
                .bind(0.91)
                .bind("Blast"),
        )
        .await
        .expect("valid prediction rejected");
    assert_eq!(inspect::row_count(&mut manager, Table::Predictions).await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let target = sqlite_target(&temp_dir);
    schema::initialize(&target, &[]).await.unwrap();

    let mut manager = open(&target).await;
    let insert = "INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)";
    manager
        .execute(
            Statement::new(insert)
                .bind("farmer")
                .bind("farmer@example.com")
                .bind("hash"),
        )
        .await
        .unwrap();
    let err = manager
        .execute(
            Statement::new(insert)
                .bind("farmer")
                .bind("other@example.com")
                .bind("hash"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constraint);
    assert_eq!(inspect::row_count(&mut manager, Table::Users).await.unwrap(), 1);
}

#[tokio::test]
async fn test_ensure_database_is_noop_for_sqlite() {
    let temp_dir = TempDir::new().unwrap();
    let target = sqlite_target(&temp_dir);
    assert_eq!(schema::ensure_database(&target).await.unwrap(), None);
}
