//! # ARMS Common Library
//!
//! Shared code for the ARMS workflow manager:
//! - Row-record representation of spreadsheet rows
//! - Schema inference and metrics aggregation (`analysis`)
//! - Database models and schema initialization
//! - Configuration loading
//! - Timestamp helpers

pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod row;
pub mod time;

pub use analysis::{compute_metrics, synthesize_tasks, MetricsSummary};
pub use error::{Error, Result};
pub use row::RowRecord;
