//! Custom measure endpoint
//!
//! A measure aggregates one exactly-named column with a chosen operation.

use arms_common::analysis::{compute_measure, MeasureOperation};
use axum::{extract::rejection::JsonRejection, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::rows_from_data;
use crate::{ApiError, ApiResult, AppState};

/// Custom measure request
#[derive(Debug, Deserialize)]
pub struct MeasureRequest {
    pub name: String,
    pub column: String,
    pub operation: MeasureOperation,
    /// Sheet the rows came from (echoed back, informational)
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Computed measure
#[derive(Debug, Serialize)]
pub struct MeasureResponse {
    pub name: String,
    pub sheet: Option<String>,
    pub column: String,
    pub operation: MeasureOperation,
    /// None when no cell in the column is numeric
    pub value: Option<f64>,
    pub computed_at: DateTime<Utc>,
}

/// POST /api/measures
pub async fn compute_custom_measure(
    request: Result<Json<MeasureRequest>, JsonRejection>,
) -> ApiResult<Json<MeasureResponse>> {
    let Json(request) = request?;
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Measure name is required".to_string()));
    }

    let rows = rows_from_data(request.data.as_ref())?;
    if !rows.iter().any(|row| row.contains_key(&request.column)) {
        return Err(ApiError::NotFound(format!(
            "Column not found: {}",
            request.column
        )));
    }

    let value = compute_measure(&rows, &request.column, request.operation);
    debug!(
        measure = %request.name,
        column = %request.column,
        operation = ?request.operation,
        ?value,
        "Computed custom measure"
    );

    Ok(Json(MeasureResponse {
        name: request.name,
        sheet: request.sheet,
        column: request.column,
        operation: request.operation,
        value,
        computed_at: Utc::now(),
    }))
}

pub fn measure_routes() -> Router<AppState> {
    Router::new().route("/api/measures", post(compute_custom_measure))
}
