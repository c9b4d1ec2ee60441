//! arms-wm library - ARMS workflow manager service
//!
//! HTTP front end over the shared analysis engine: spreadsheet uploads,
//! dashboard metrics, custom measures, and task tracking backed by SQLite.

use arms_common::analysis::KeyScope;
use arms_common::config::ServiceSettings;
use axum::{extract::DefaultBodyLimit, Router};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Where uploaded files are stored
    pub uploads_dir: PathBuf,
    /// Request body limit (uploads)
    pub max_upload_bytes: usize,
    /// Which rows the column resolver inspects
    pub key_scope: KeyScope,
    /// Optional directory of static front-end assets
    pub static_assets: Option<PathBuf>,
    /// Service start time (for uptime)
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state from resolved settings
    pub fn new(db: SqlitePool, uploads_dir: PathBuf, settings: &ServiceSettings) -> Self {
        Self {
            db,
            uploads_dir,
            max_upload_bytes: settings.max_upload_bytes,
            key_scope: settings.key_scope,
            static_assets: settings.static_assets.clone(),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(api::health_routes())
        .merge(api::buildinfo_routes())
        .merge(api::upload_routes())
        .merge(api::metrics_routes())
        .merge(api::measure_routes())
        .merge(api::task_routes())
        .merge(api::workflow_routes());

    if let Some(dir) = &state.static_assets {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
