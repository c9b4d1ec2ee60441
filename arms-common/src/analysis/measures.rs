//! User-defined measures over a named column
//!
//! Unlike the dashboard metrics, measures address a column by its exact name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::row::RowRecord;

/// Aggregation applied by a custom measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureOperation {
    Sum,
    Average,
    Count,
    #[serde(rename = "Distinct Count")]
    DistinctCount,
    Min,
    Max,
}

/// Compute a measure over `column`
///
/// Returns None when no row has the column, or when a numeric operation
/// other than Sum finds no numeric cells. Numeric operations read numbers and
/// strings that parse entirely as numbers; other cells are skipped.
pub fn compute_measure(
    rows: &[RowRecord],
    column: &str,
    operation: MeasureOperation,
) -> Option<f64> {
    if !rows.iter().any(|row| row.contains_key(column)) {
        return None;
    }

    let cells = rows
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|value| !value.is_null());

    match operation {
        MeasureOperation::Count => Some(cells.count() as f64),
        MeasureOperation::DistinctCount => {
            let distinct: HashSet<String> = cells.map(Value::to_string).collect();
            Some(distinct.len() as f64)
        }
        MeasureOperation::Sum => Some(cells.filter_map(numeric).sum()),
        MeasureOperation::Average => {
            let values: Vec<f64> = cells.filter_map(numeric).collect();
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        MeasureOperation::Min => cells.filter_map(numeric).reduce(f64::min),
        MeasureOperation::Max => cells.filter_map(numeric).reduce(f64::max),
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
