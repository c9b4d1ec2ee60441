//! Dashboard metrics over row-records of unknown schema
//!
//! Each metric resolves its own governing column (no shared resolution state
//! between metrics) and falls back to a fixed rule when no column matches.
//! Nothing here fails: missing columns and malformed cells degrade to the
//! documented fallbacks.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use super::column_resolver::{resolve_column_in, KeyScope};
use crate::row::{cell_text, leading_float, RowRecord};

/// Candidate fragments for each semantic column, in caller priority order
pub mod candidates {
    pub const STATUS: &[&str] = &["status", "state", "current_status"];
    pub const UCC: &[&str] = &["ucc", "ucc_action", "action"];
    pub const TEAM_MEMBER: &[&str] = &["analyst", "team_member", "assigned_to"];
    pub const JUDGMENT: &[&str] = &["judgment", "judgment_amount", "amount"];
    pub const WORK_UNITS: &[&str] = &["work_units", "units", "work"];
    pub const CHAPTER: &[&str] = &["chapter", "case_type", "type"];
}

/// Fixed eight-field metrics summary
///
/// Every field is always serialized. `judgment_amount` holds the same entry
/// count as `total_judgment_entries`; it is not a currency sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_pending: u64,
    pub open_ucc_actions: u64,
    pub distinct_team_members: u64,
    pub judgment_amount: u64,
    pub total_work_units: f64,
    pub chapter_11_cases: u64,
    pub chapter_7_cases: u64,
    pub total_judgment_entries: u64,
}

/// Compute metrics resolving columns from the first row's keys
pub fn compute_metrics(rows: &[RowRecord]) -> MetricsSummary {
    MetricsAggregator::default().compute(rows)
}

/// Metrics computation with configurable column resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsAggregator {
    key_scope: KeyScope,
}

impl MetricsAggregator {
    pub fn new(key_scope: KeyScope) -> Self {
        Self { key_scope }
    }

    /// Compute all eight metrics. An empty row set yields the zero summary
    /// without attempting any column resolution.
    pub fn compute(&self, rows: &[RowRecord]) -> MetricsSummary {
        if rows.is_empty() {
            return MetricsSummary::default();
        }

        let judgment_entries = self.judgment_entries(rows);
        let (chapter_11_cases, chapter_7_cases) = self.chapter_cases(rows);

        let summary = MetricsSummary {
            total_pending: self.total_pending(rows),
            open_ucc_actions: self.open_ucc_actions(rows),
            distinct_team_members: self.distinct_team_members(rows),
            judgment_amount: judgment_entries,
            total_work_units: self.total_work_units(rows),
            chapter_11_cases,
            chapter_7_cases,
            total_judgment_entries: judgment_entries,
        };

        tracing::debug!(
            rows = rows.len(),
            total_pending = summary.total_pending,
            chapter_11_cases = summary.chapter_11_cases,
            chapter_7_cases = summary.chapter_7_cases,
            "Computed metrics"
        );

        summary
    }

    fn resolve(&self, rows: &[RowRecord], candidates: &[&str]) -> Option<String> {
        let column = resolve_column_in(rows, candidates, self.key_scope);
        tracing::trace!(?candidates, column = ?column, "Resolved column");
        column
    }

    fn total_pending(&self, rows: &[RowRecord]) -> u64 {
        match self.resolve(rows, candidates::STATUS) {
            Some(column) => count_rows(rows, |row| {
                cell_text(row.get(&column)).to_lowercase().contains("pending")
            }),
            None => rows.len() as u64,
        }
    }

    fn open_ucc_actions(&self, rows: &[RowRecord]) -> u64 {
        match self.resolve(rows, candidates::UCC) {
            Some(column) => count_rows(rows, |row| {
                cell_text(row.get(&column)).to_lowercase().contains("open")
            }),
            None => 0,
        }
    }

    fn distinct_team_members(&self, rows: &[RowRecord]) -> u64 {
        let Some(column) = self.resolve(rows, candidates::TEAM_MEMBER) else {
            return 0;
        };

        // Numbers key by their normalized text (5 == 5.0), everything else by
        // its JSON form, so 5 and "5" stay distinct
        let members: HashSet<String> = rows
            .iter()
            .filter_map(|row| row.get(&column))
            .filter(|value| is_truthy(value))
            .map(|value| match value {
                Value::Number(_) => cell_text(Some(value)),
                other => other.to_string(),
            })
            .collect();
        members.len() as u64
    }

    fn judgment_entries(&self, rows: &[RowRecord]) -> u64 {
        match self.resolve(rows, candidates::JUDGMENT) {
            Some(column) => count_rows(rows, |row| match row.get(&column) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            }),
            None => 0,
        }
    }

    fn total_work_units(&self, rows: &[RowRecord]) -> f64 {
        match self.resolve(rows, candidates::WORK_UNITS) {
            Some(column) => rows
                .iter()
                .map(|row| {
                    leading_float(row.get(&column))
                        .filter(|v| !v.is_nan())
                        .unwrap_or(0.0)
                })
                .sum(),
            None => rows.len() as f64,
        }
    }

    /// Returns (chapter 11, chapter 7).
    ///
    /// With a chapter column, rows are counted once each. Without one, every
    /// cell of every row is scanned and each matching cell counts, so a row
    /// with two matching cells contributes two.
    fn chapter_cases(&self, rows: &[RowRecord]) -> (u64, u64) {
        match self.resolve(rows, candidates::CHAPTER) {
            Some(column) => {
                let eleven = count_rows(rows, |row| {
                    mentions_chapter(&cell_text(row.get(&column)), "11")
                });
                let seven = count_rows(rows, |row| {
                    mentions_chapter(&cell_text(row.get(&column)), "7")
                });
                (eleven, seven)
            }
            None => {
                let mut eleven = 0;
                let mut seven = 0;
                for value in rows.iter().flat_map(|row| row.values()) {
                    let text = cell_text(Some(value)).to_lowercase();
                    if text.contains("chapter 11") || text.contains("ch 11") {
                        eleven += 1;
                    }
                    if text.contains("chapter 7") || text.contains("ch 7") {
                        seven += 1;
                    }
                }
                (eleven, seven)
            }
        }
    }
}

fn count_rows<F>(rows: &[RowRecord], predicate: F) -> u64
where
    F: Fn(&RowRecord) -> bool,
{
    rows.iter().filter(|row| predicate(row)).count() as u64
}

/// Dedicated-column chapter check: the bare number as a case-sensitive
/// substring, or "chapter N" / "ch N" case-insensitively.
fn mentions_chapter(text: &str, number: &str) -> bool {
    if text.contains(number) {
        return true;
    }
    let lower = text.to_lowercase();
    lower.contains(&format!("chapter {number}")) || lower.contains(&format!("ch {number}"))
}

/// Empty strings, zero, false and null do not name a team member
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}
