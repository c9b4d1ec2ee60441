//! Schema inference and aggregation over row-records
//!
//! - `column_resolver`: fuzzy column lookup
//! - `metrics`: eight-field dashboard summary
//! - `tasks`: one task per row
//! - `measures`: user-defined aggregations on a named column
//! - `catalog`: fixed workflow definitions

pub mod catalog;
pub mod column_resolver;
pub mod measures;
pub mod metrics;
pub mod tasks;

pub use catalog::{find_workflow, WorkflowDefinition, WORKFLOWS};
pub use column_resolver::{resolve_column, resolve_column_in, KeyScope};
pub use measures::{compute_measure, MeasureOperation};
pub use metrics::{compute_metrics, MetricsAggregator, MetricsSummary};
pub use tasks::{synthesize_tasks, SynthesizedTask};
