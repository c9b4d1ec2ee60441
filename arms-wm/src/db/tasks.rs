//! Task queries

use arms_common::analysis::SynthesizedTask;
use arms_common::db::models::{NewTask, Task};
use arms_common::time::{now, parse_db_date, parse_db_timestamp, to_db_text};
use arms_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, warn};

/// Insert one task, returning it with its storage id and creation time
pub async fn insert_task(pool: &SqlitePool, task: NewTask) -> Result<Task> {
    let created_date = now();

    let result = sqlx::query(
        r#"
        INSERT INTO tasks (
            title, description, status, priority, assigned_to,
            workflow, created_date, due_date, row_data
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status.as_str())
    .bind(task.priority.as_str())
    .bind(&task.assigned_to)
    .bind(&task.workflow)
    .bind(to_db_text(&created_date))
    .bind(task.due_date.map(|date| date.format("%Y-%m-%d").to_string()))
    .bind(&task.row_data)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    debug!(task_id = id, title = %task.title, "Inserted task");

    Ok(Task::from_new(id, created_date, task))
}

/// Persist a synthesized batch one task at a time
///
/// Not atomic: if an insert fails, the tasks already written stay written and
/// the error is returned. Each stored task is paired with its batch sequence.
pub async fn persist_synthesized(
    pool: &SqlitePool,
    batch: Vec<SynthesizedTask>,
) -> Result<Vec<(usize, Task)>> {
    let total = batch.len();
    let mut persisted = Vec::with_capacity(total);

    for synthesized in batch {
        let sequence = synthesized.sequence;
        match insert_task(pool, synthesized.task).await {
            Ok(task) => persisted.push((sequence, task)),
            Err(e) => {
                warn!(
                    persisted = persisted.len(),
                    total,
                    sequence,
                    "Task batch insert stopped: {}",
                    e
                );
                return Err(e);
            }
        }
    }

    Ok(persisted)
}

/// All tasks, newest first
pub async fn list_tasks(pool: &SqlitePool) -> Result<Vec<Task>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, description, status, priority, assigned_to,
               workflow, created_date, due_date, row_data
        FROM tasks
        ORDER BY created_date DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_task).collect()
}

fn row_to_task(row: &SqliteRow) -> Result<Task> {
    let status: String = row.get("status");
    let priority: String = row.get("priority");
    let created_date: String = row.get("created_date");
    let due_date: Option<String> = row.get("due_date");

    Ok(Task {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        status: status
            .parse()
            .map_err(|e| Error::Internal(format!("Corrupt task row: {}", e)))?,
        priority: priority
            .parse()
            .map_err(|e| Error::Internal(format!("Corrupt task row: {}", e)))?,
        assigned_to: row.get("assigned_to"),
        workflow: row.get("workflow"),
        created_date: parse_db_timestamp(&created_date)?,
        due_date: due_date.as_deref().map(parse_db_date).transpose()?,
        row_data: row.get("row_data"),
    })
}
