//! Unit tests for database initialization
//!
//! - Database file is created on first run
//! - Re-opening an existing database is safe (idempotent schema)
//! - Required tables and columns exist

use arms_common::db::init::{init_database, SCHEMA_VERSION};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("data").join("arms_workflow.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("arms_workflow.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&pool2.unwrap())
        .await
        .unwrap();
    assert_eq!(versions, 1, "schema_version should be recorded once");
}

#[tokio::test]
async fn test_required_tables_exist() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("arms_workflow.db"))
        .await
        .unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for expected in ["schema_version", "tasks", "uploads"] {
        assert!(tables.iter().any(|t| t == expected), "Missing table: {}", expected);
    }

    let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(version, SCHEMA_VERSION);
}

#[tokio::test]
async fn test_tasks_table_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("arms_workflow.db"))
        .await
        .unwrap();

    sqlx::query("INSERT INTO tasks (title, created_date) VALUES ('Case 1', '2025-01-01T00:00:00+00:00')")
        .execute(&pool)
        .await
        .unwrap();

    let (status, priority, assigned_to): (String, String, String) =
        sqlx::query_as("SELECT status, priority, assigned_to FROM tasks WHERE title = 'Case 1'")
            .fetch_one(&pool)
            .await
            .unwrap();

    assert_eq!(status, "Pending");
    assert_eq!(priority, "Medium");
    assert_eq!(assigned_to, "");
}
