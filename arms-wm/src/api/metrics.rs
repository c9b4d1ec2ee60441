//! Dashboard metrics endpoint

use arms_common::analysis::{MetricsAggregator, MetricsSummary};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tracing::debug;

use super::rows_from_body;
use crate::{ApiResult, AppState};

/// POST /api/metrics
///
/// Body: `{"data": [ {row}, ... ]}`. Responds with the eight-field summary.
pub async fn calculate_metrics(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<MetricsSummary>> {
    let rows = rows_from_body(body)?;
    let summary = MetricsAggregator::new(state.key_scope).compute(&rows);

    debug!(rows = rows.len(), "Computed metrics");
    Ok(Json(summary))
}

pub fn metrics_routes() -> Router<AppState> {
    Router::new().route("/api/metrics", post(calculate_metrics))
}
