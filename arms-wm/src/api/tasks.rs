//! Task endpoints
//!
//! Tasks come from two places: one per row of an uploaded dataset, or entered
//! by hand.

use arms_common::analysis::{find_workflow, synthesize_tasks};
use arms_common::db::models::{NewTask, Task, TaskPriority, TaskStatus};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::rows_from_body;
use crate::db;
use crate::{ApiError, ApiResult, AppState};

/// A persisted task together with its position in the batch that created it
#[derive(Debug, Serialize)]
pub struct CreatedTask {
    /// 1-based row position in the submitted data
    pub sequence: usize,
    #[serde(flatten)]
    pub task: Task,
}

/// Response to a bulk create
#[derive(Debug, Serialize)]
pub struct CreateTasksResponse {
    pub message: String,
    pub count: usize,
    pub tasks: Vec<CreatedTask>,
}

/// POST /api/tasks/create
///
/// Body: `{"data": [ {row}, ... ]}`. One pending task per row.
pub async fn create_tasks_from_data(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<CreateTasksResponse>> {
    let rows = rows_from_body(body)?;
    let batch = synthesize_tasks(&rows);

    let persisted = db::tasks::persist_synthesized(&state.db, batch).await?;
    info!(count = persisted.len(), "Created tasks from data");

    let count = persisted.len();
    let tasks = persisted
        .into_iter()
        .map(|(sequence, task)| CreatedTask { sequence, task })
        .collect();

    Ok(Json(CreateTasksResponse {
        message: format!("Created {} tasks successfully", count),
        count,
        tasks,
    }))
}

/// Manually entered task
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Defaults to the workflow's priority, then Medium
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Must name a catalog workflow
    #[serde(default)]
    pub workflow: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl CreateTaskRequest {
    fn into_new_task(self) -> ApiResult<NewTask> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ApiError::BadRequest("Title is required".to_string()));
        }

        let workflow = match self.workflow.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(
                find_workflow(name)
                    .ok_or_else(|| ApiError::BadRequest(format!("Unknown workflow: {}", name)))?,
            ),
        };

        let priority = self
            .priority
            .or(workflow.map(|w| w.priority))
            .unwrap_or_default();

        Ok(NewTask {
            title,
            description: self.description.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            priority,
            assigned_to: self.assigned_to.unwrap_or_default(),
            workflow: workflow.map(|w| w.name.to_string()),
            due_date: self.due_date,
            row_data: None,
        })
    }
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    request: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(request) = request?;
    let new_task = request.into_new_task()?;
    let task = db::tasks::insert_task(&state.db, new_task).await?;

    info!(task_id = task.id, title = %task.title, "Created task");
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks
///
/// All tasks, newest first.
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(db::tasks::list_tasks(&state.db).await?))
}

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", post(create_task).get(list_tasks))
        .route("/api/tasks/create", post(create_tasks_from_data))
}
