//! Database access layer for arms-wm
//!
//! Schema creation lives in `arms_common::db`. This module holds the queries
//! the HTTP handlers run against it.

pub mod tasks;
pub mod uploads;
