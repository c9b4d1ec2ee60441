//! Workflow catalog endpoints

use arms_common::analysis::{find_workflow, WorkflowDefinition, WORKFLOWS};
use axum::{extract::Path, routing::get, Json, Router};

use crate::{ApiError, ApiResult, AppState};

/// GET /api/workflows
pub async fn list_workflows() -> Json<&'static [WorkflowDefinition]> {
    Json(WORKFLOWS)
}

/// GET /api/workflows/:name
pub async fn get_workflow(
    Path(name): Path<String>,
) -> ApiResult<Json<&'static WorkflowDefinition>> {
    find_workflow(&name)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown workflow: {}", name)))
}

pub fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", get(list_workflows))
        .route("/api/workflows/:name", get(get_workflow))
}
