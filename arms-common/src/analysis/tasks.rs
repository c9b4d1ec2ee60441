//! Task synthesis from row-records
//!
//! One task per row, in input order, with default workflow fields. Synthesis
//! is pure; persisting the result is the caller's job.

use serde::{Deserialize, Serialize};

use crate::db::models::{NewTask, TaskPriority, TaskStatus};
use crate::row::RowRecord;

/// A task derived from one row of an upload batch
///
/// `sequence` is the row's 1-based position in the batch. It is only
/// meaningful for the batch that produced it and is unrelated to the id the
/// task receives in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedTask {
    pub sequence: usize,
    #[serde(flatten)]
    pub task: NewTask,
}

/// Map each row to a pending, medium-priority task titled "Case {i}"
pub fn synthesize_tasks(rows: &[RowRecord]) -> Vec<SynthesizedTask> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let sequence = index + 1;
            SynthesizedTask {
                sequence,
                task: NewTask {
                    title: format!("Case {sequence}"),
                    description: format!("Process case from row {sequence}"),
                    status: TaskStatus::Pending,
                    priority: TaskPriority::Medium,
                    assigned_to: String::new(),
                    workflow: None,
                    due_date: None,
                    row_data: Some(serde_json::Value::Object(row.clone()).to_string()),
                },
            }
        })
        .collect()
}
