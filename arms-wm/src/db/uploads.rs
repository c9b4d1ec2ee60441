//! Upload history queries

use arms_common::db::models::UploadRecord;
use arms_common::time::{now, parse_db_timestamp, to_db_text};
use arms_common::{Error, Result};
use sqlx::{Row, SqlitePool};

/// Record one ingestion event
pub async fn insert_upload(
    pool: &SqlitePool,
    filename: &str,
    original_name: &str,
    sheets_loaded: &[String],
    record_count: usize,
) -> Result<UploadRecord> {
    let upload_date = now();
    let sheets_json = serde_json::to_string(sheets_loaded)
        .map_err(|e| Error::Internal(format!("Serialize sheet list failed: {}", e)))?;
    let record_count = i64::try_from(record_count)
        .map_err(|_| Error::InvalidInput(format!("Record count too large: {}", record_count)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO uploads (filename, original_name, sheets_loaded, record_count, upload_date)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(filename)
    .bind(original_name)
    .bind(&sheets_json)
    .bind(record_count)
    .bind(to_db_text(&upload_date))
    .execute(pool)
    .await?;

    Ok(UploadRecord {
        id: result.last_insert_rowid(),
        filename: filename.to_string(),
        original_name: original_name.to_string(),
        sheets_loaded: sheets_loaded.to_vec(),
        record_count,
        upload_date,
    })
}

/// Upload history, newest first
pub async fn list_uploads(pool: &SqlitePool) -> Result<Vec<UploadRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, filename, original_name, sheets_loaded, record_count, upload_date
        FROM uploads
        ORDER BY upload_date DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let sheets_loaded: String = row.get("sheets_loaded");
            let upload_date: String = row.get("upload_date");

            Ok(UploadRecord {
                id: row.get("id"),
                filename: row.get("filename"),
                original_name: row.get("original_name"),
                sheets_loaded: serde_json::from_str(&sheets_loaded).map_err(|e| {
                    Error::Internal(format!("Corrupt sheets_loaded {:?}: {}", sheets_loaded, e))
                })?,
                record_count: row.get("record_count"),
                upload_date: parse_db_timestamp(&upload_date)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;

    #[tokio::test]
    async fn test_insert_and_list_uploads() {
        let pool = memory_pool().await;
        let sheets = vec!["Pending".to_string(), "UCC".to_string()];

        let first = insert_upload(&pool, "1700000000000-a.xlsx", "a.xlsx", &sheets, 12)
            .await
            .unwrap();
        let second = insert_upload(&pool, "1700000000001-b.csv", "b.csv", &[], 0)
            .await
            .unwrap();

        let listed = list_uploads(&pool).await.unwrap();
        assert_eq!(listed, vec![second, first]);
        assert_eq!(listed[1].sheets_loaded, sheets);
        assert_eq!(listed[1].record_count, 12);
    }

    #[tokio::test]
    async fn test_empty_history() {
        let pool = memory_pool().await;
        assert!(list_uploads(&pool).await.unwrap().is_empty());
    }
}
