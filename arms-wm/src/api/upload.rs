//! Spreadsheet upload endpoints

use arms_common::db::models::UploadRecord;
use arms_common::RowRecord;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::db;
use crate::services::ingestion::{parse_upload, FileKind, SheetSummary};
use crate::{ApiError, ApiResult, AppState};

/// Response to a processed upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub sheets: Vec<String>,
    pub total_records: usize,
    pub available_sheets: Vec<String>,
    pub sheet_summaries: Vec<SheetSummary>,
    pub data: Vec<RowRecord>,
}

/// POST /api/upload
///
/// Multipart fields:
/// - `file`: the workbook or CSV
/// - `selectedSheets` (optional): JSON array of sheet names to process
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!(rejection = %rejection.body_text(), "Upload is not multipart");
        ApiError::BadRequest("No file uploaded".to_string())
    })?;
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut selected_sheets: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                file = Some((original_name, bytes.to_vec()));
            }
            Some("selectedSheets") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                selected_sheets = parse_selected_sheets(&text)?;
            }
            other => debug!(field = ?other, "Ignoring multipart field"),
        }
    }

    let Some((original_name, bytes)) = file else {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    };

    // Reject before anything touches the disk
    FileKind::from_file_name(&original_name)?;

    let stored_name = stored_file_name(&original_name);
    tokio::fs::create_dir_all(&state.uploads_dir).await?;
    tokio::fs::write(state.uploads_dir.join(&stored_name), &bytes).await?;
    debug!(file = %stored_name, bytes = bytes.len(), "Stored upload");

    let workbook = parse_upload(&original_name, &bytes, &selected_sheets)?;

    db::uploads::insert_upload(
        &state.db,
        &stored_name,
        &original_name,
        &workbook.sheets,
        workbook.records.len(),
    )
    .await?;

    info!(
        file = %original_name,
        sheets = ?workbook.sheets,
        records = workbook.records.len(),
        "File processed"
    );

    Ok(Json(UploadResponse {
        message: "File processed successfully".to_string(),
        sheets: workbook.sheets,
        total_records: workbook.records.len(),
        available_sheets: workbook.available_sheets,
        sheet_summaries: workbook.summaries,
        data: workbook.records,
    }))
}

/// GET /api/uploads
///
/// Upload history, newest first.
pub async fn list_uploads(State(state): State<AppState>) -> ApiResult<Json<Vec<UploadRecord>>> {
    Ok(Json(db::uploads::list_uploads(&state.db).await?))
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload_file))
        .route("/api/uploads", get(list_uploads))
}

/// Blank text means "all sheets"
fn parse_selected_sheets(text: &str) -> ApiResult<Vec<String>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text)
        .map_err(|e| ApiError::BadRequest(format!("Invalid selectedSheets: {}", e)))
}

/// `<unix millis>-<client file name>`, stripped of any directory part
fn stored_file_name(original_name: &str) -> String {
    let base = Path::new(original_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload");
    format!("{}-{}", Utc::now().timestamp_millis(), base)
}
