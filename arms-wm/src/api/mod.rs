//! HTTP API handlers for arms-wm

pub mod buildinfo;
pub mod health;
pub mod measures;
pub mod metrics;
pub mod tasks;
pub mod upload;
pub mod workflows;

pub use buildinfo::{buildinfo_routes, get_build_info};
pub use health::{health_check, health_routes};
pub use measures::{compute_custom_measure, measure_routes};
pub use metrics::{calculate_metrics, metrics_routes};
pub use tasks::{create_task, create_tasks_from_data, list_tasks, task_routes};
pub use upload::{list_uploads, upload_file, upload_routes};
pub use workflows::{get_workflow, list_workflows, workflow_routes};

use arms_common::RowRecord;
use axum::{extract::rejection::JsonRejection, Json};
use serde_json::Value;
use tracing::debug;

use crate::ApiError;

/// Row-records from a `{"data": [...]}` request body
///
/// A missing, untyped or unparseable body is treated like a body without
/// `data`.
pub fn rows_from_body(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Vec<RowRecord>, ApiError> {
    match body {
        Ok(Json(body)) => rows_from_data(body.get("data")),
        Err(rejection) => {
            debug!(rejection = %rejection.body_text(), "Unreadable data body");
            rows_from_data(None)
        }
    }
}

/// Row-records from a request's `data` field
///
/// `data` must be an array. Entries that are not JSON objects become empty
/// records.
pub fn rows_from_data(data: Option<&Value>) -> Result<Vec<RowRecord>, ApiError> {
    let Some(Value::Array(items)) = data else {
        return Err(ApiError::BadRequest("No data provided".to_string()));
    };

    Ok(items
        .iter()
        .map(|item| match item {
            Value::Object(record) => record.clone(),
            _ => RowRecord::new(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_from_data() {
        let body = json!({ "data": [{ "status": "pending" }, 7, null] });
        let rows = rows_from_data(body.get("data")).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["status"], json!("pending"));
        assert!(rows[1].is_empty());
        assert!(rows[2].is_empty());
    }

    #[test]
    fn test_missing_or_non_array_data_is_rejected() {
        for body in [json!({}), json!({ "data": null }), json!({ "data": { "a": 1 } })] {
            let err = rows_from_data(body.get("data")).unwrap_err();
            assert_eq!(err.to_string(), "No data provided");
        }
    }

    #[test]
    fn test_body_rows() {
        let rows = rows_from_body(Ok(Json(json!({ "data": [{ "a": 1 }] })))).unwrap();
        assert_eq!(rows.len(), 1);

        let err = rows_from_body(Ok(Json(json!("not an object")))).unwrap_err();
        assert_eq!(err.to_string(), "No data provided");
    }
}
