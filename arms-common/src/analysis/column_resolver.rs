//! Fuzzy column lookup
//!
//! Spreadsheets arrive with whatever headers their authors chose ("Status",
//! "Current Status", "case_state"...). The resolver finds the actual key for
//! a semantic column by case-insensitive substring match: a key matches when
//! it *contains* one of the candidate fragments.

use serde::{Deserialize, Serialize};

use crate::row::RowRecord;

/// Which row keys are considered when resolving a column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScope {
    /// Only the first row's keys. A column that is blank in the first row of
    /// a sparse sheet is not found.
    #[default]
    FirstRow,
    /// Union of all rows' keys, in first-seen order
    AllRows,
}

/// Resolve a semantic column from the first row's keys
///
/// Returns the first key, in the row's natural key order, that contains any
/// of `candidates` (case-insensitive). Returns None for an empty row set.
pub fn resolve_column(rows: &[RowRecord], candidates: &[&str]) -> Option<String> {
    resolve_column_in(rows, candidates, KeyScope::FirstRow)
}

/// Resolve a semantic column with an explicit key scope
pub fn resolve_column_in(
    rows: &[RowRecord],
    candidates: &[&str],
    scope: KeyScope,
) -> Option<String> {
    let first = rows.first()?;
    let needles: Vec<String> = candidates.iter().map(|c| c.to_lowercase()).collect();

    let matches = |key: &str| {
        let key = key.to_lowercase();
        needles.iter().any(|needle| key.contains(needle.as_str()))
    };

    match scope {
        KeyScope::FirstRow => first.keys().find(|key| matches(key.as_str())).cloned(),
        KeyScope::AllRows => {
            let mut seen = std::collections::HashSet::new();
            rows.iter()
                .flat_map(|row| row.keys())
                .filter(|key| seen.insert(key.as_str()))
                .find(|key| matches(key.as_str()))
                .cloned()
        }
    }
}
