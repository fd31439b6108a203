use crate::domain::model::{GroupResult, ProgressReport};
use crate::domain::ports::EvaluationObserver;

/// Discards every checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EvaluationObserver for NoopObserver {}

/// Emits each checkpoint as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EvaluationObserver for TracingObserver {
    fn program_selected(&self, requested: Option<&str>, selected: Option<&str>) {
        tracing::debug!(
            requested = requested.unwrap_or("-"),
            selected = selected.unwrap_or("-"),
            "Program selected"
        );
    }

    fn program_fallback(&self, requested: &str, selected: Option<&str>) {
        tracing::warn!(
            "⚠️ Program '{}' not found in agreement, using '{}'",
            requested,
            selected.unwrap_or("<unnamed>")
        );
    }

    fn scope_resolved(&self, cells: usize) {
        if cells == 0 {
            tracing::debug!("Program has no requirement cells, articulations are not filtered");
        } else {
            tracing::debug!("Program scope holds {} cells", cells);
        }
    }

    fn articulations_extracted(&self, kept: usize, total: usize) {
        tracing::debug!(
            "Kept {} articulations for this program (from {} total)",
            kept,
            total
        );
    }

    fn groups_built(&self, groups: usize) {
        tracing::debug!("Extracted {} requirement groups", groups);
    }

    fn group_evaluated(&self, result: &GroupResult) {
        tracing::debug!(
            group = %result.group_id,
            satisfied = result.satisfied,
            "{}: {}/{} completed",
            result.title.as_deref().unwrap_or("Untitled group"),
            result.completed_count,
            result.required_count
        );
    }

    fn report_ready(&self, report: &ProgressReport) {
        tracing::info!(
            "📊 {}/{} groups satisfied, weighted progress {}%, courses {}% ({} completed, {} remaining)",
            report.satisfied_groups,
            report.total_groups,
            report.progress_percentage,
            report.course_progress_percentage,
            report.completed_required.len(),
            report.missing_required.len()
        );
    }
}
