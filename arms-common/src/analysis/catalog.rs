//! Workflow catalog
//!
//! The fixed set of case-management workflows with their monthly targets and
//! SLAs, used by dashboards to label and prioritize work.

use serde::Serialize;

use crate::db::models::TaskPriority;

/// One workflow's configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkflowDefinition {
    pub name: &'static str,
    pub workflow_type: &'static str,
    pub target_metric: &'static str,
    pub monthly_target: &'static str,
    pub priority: TaskPriority,
    pub sla_hours: u32,
    pub quality_required: bool,
}

const fn workflow(
    name: &'static str,
    workflow_type: &'static str,
    target_metric: &'static str,
    monthly_target: &'static str,
    priority: TaskPriority,
    sla_hours: u32,
) -> WorkflowDefinition {
    WorkflowDefinition {
        name,
        workflow_type,
        target_metric,
        monthly_target,
        priority,
        sla_hours,
        quality_required: true,
    }
}

pub const WORKFLOWS: &[WorkflowDefinition] = &[
    workflow("Trades Tape Imports", "Volume Completion %", "Batches", "100%", TaskPriority::High, 24),
    workflow("Pending", "Volume Completion %", "Items", "100%", TaskPriority::High, 72),
    workflow("Placements", "Target Placements", "Cases", "50", TaskPriority::Medium, 72),
    workflow("Judgments", "Target Accuracy %", "Judgments", "98%", TaskPriority::Medium, 72),
    workflow("UCC", "Target UCC Filings", "Filings", "30", TaskPriority::Medium, 72),
    workflow("Credit Files", "Target Files", "Files", "150", TaskPriority::Low, 72),
    workflow("Chapter 11", "Quality Timeliness %", "Cases", "95%", TaskPriority::Critical, 24),
    workflow("Chapter 7", "Quality Timeliness %", "Cases", "95%", TaskPriority::Critical, 24),
    workflow("Trade References", "Volume Processing %", "References", "100%", TaskPriority::High, 48),
    workflow("Credit File Audits", "Quality Compliance %", "Audits", "100%", TaskPriority::Medium, 72),
];

/// Look up a workflow by name (case-insensitive)
pub fn find_workflow(name: &str) -> Option<&'static WorkflowDefinition> {
    WORKFLOWS.iter().find(|w| w.name.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_ten_unique_workflows() {
        assert_eq!(WORKFLOWS.len(), 10);
        let mut names: Vec<_> = WORKFLOWS.iter().map(|w| w.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_find_workflow() {
        let chapter_11 = find_workflow("chapter 11").unwrap();
        assert_eq!(chapter_11.priority, TaskPriority::Critical);
        assert_eq!(chapter_11.sla_hours, 24);
        assert!(find_workflow("Payroll").is_none());
    }
}
