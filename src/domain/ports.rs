use crate::domain::model::{GroupResult, ProgressReport};
use crate::utils::error::Result;

/// Source of raw agreement documents, addressed by file name.
pub trait DocumentStore: Send + Sync {
    fn load(&self, file: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// Checkpoints the engine reports while evaluating one (document, student) pair.
///
/// Every hook has an empty default so observers only implement what they need.
pub trait EvaluationObserver {
    /// `requested` is the program asked for; `None` when the caller gave no name.
    fn program_selected(&self, _requested: Option<&str>, _selected: Option<&str>) {}

    /// The requested program was not in the bundle and the first program was used instead.
    fn program_fallback(&self, _requested: &str, _selected: Option<&str>) {}

    fn scope_resolved(&self, _cells: usize) {}

    fn articulations_extracted(&self, _kept: usize, _total: usize) {}

    fn groups_built(&self, _groups: usize) {}

    fn group_evaluated(&self, _result: &GroupResult) {}

    fn report_ready(&self, _report: &ProgressReport) {}
}
