//! Timestamp utilities
//!
//! Timestamps are stored in SQLite as RFC 3339 text.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Render a timestamp for storage
pub fn to_db_text(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

/// Parse a stored timestamp
pub fn parse_db_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid stored timestamp {:?}: {}", text, e)))
}

/// Parse a stored `YYYY-MM-DD` date
pub fn parse_db_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| Error::Internal(format!("Invalid stored date {:?}: {}", text, e)))
}
