//! Error types for arms-wm
//!
//! Every error renders as `{"error": "<message>"}` with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum::extract::rejection::JsonRejection;
use serde_json::json;
use thiserror::Error;

use crate::services::ingestion::IngestError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Spreadsheet could not be ingested
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// arms-common error
    #[error(transparent)]
    Common(#[from] arms_common::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Ingest(IngestError::UnsupportedFileType(_)) => StatusCode::BAD_REQUEST,
            ApiError::Common(arms_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Common(arms_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Ingest(IngestError::UnsupportedFileType(_)) => self.to_string(),
            ApiError::Ingest(err) => format!("Error processing file: {}", err),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "Request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
