use crate::core::evaluator::Evaluation;
use crate::domain::model::{AgreementContext, ProgressReport};

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

/// Average of each group's capped completion ratio, as a percentage.
///
/// With no groups at all this falls back to distinct completed courses over all articulations.
pub fn weighted_percentage(evaluation: &Evaluation) -> f64 {
    let groups = &evaluation.group_results;
    if groups.is_empty() {
        return percentage(evaluation.completed.len(), evaluation.total_articulations);
    }
    let sum: f64 = groups.iter().map(|g| g.completion_ratio()).sum();
    round1(sum / groups.len() as f64 * 100.0)
}

/// Completed entries over all listed entries, ignoring group weighting.
pub fn course_percentage(evaluation: &Evaluation) -> f64 {
    percentage(
        evaluation.completed.len(),
        evaluation.completed.len() + evaluation.missing.len(),
    )
}

pub fn summarize(
    evaluation: Evaluation,
    program: Option<String>,
    context: AgreementContext,
) -> ProgressReport {
    let total_groups = if evaluation.group_results.is_empty() {
        evaluation.total_articulations.max(1)
    } else {
        evaluation.group_results.len()
    };
    let satisfied_groups = evaluation
        .group_results
        .iter()
        .filter(|g| g.satisfied)
        .count();

    ProgressReport {
        program,
        progress_percentage: weighted_percentage(&evaluation),
        course_progress_percentage: course_percentage(&evaluation),
        total_groups,
        satisfied_groups,
        total_required: evaluation.completed.len() + evaluation.missing.len(),
        completed_required: evaluation.completed,
        missing_required: evaluation.missing,
        group_results: evaluation.group_results,
        context,
    }
}
