use crate::core::articulation::ArticulationSet;
use crate::core::catalog::AgreementKey;
use crate::core::document::normalize;
use crate::core::evaluator::evaluate;
use crate::core::groups::build_groups;
use crate::core::observer::TracingObserver;
use crate::core::progress::summarize;
use crate::core::scope::ProgramScope;
use crate::domain::model::{AgreementContext, ProgressReport, RequirementGroup, StudentCourse};
use crate::domain::ports::{DocumentStore, EvaluationObserver};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Unmatched alternatives named in a "Select N" entry before it trails off.
    pub choice_preview_limit: usize,
    /// Cap a section's choose-N amount at its number of cells.
    pub clamp_section_requirements: bool,
    /// Headings treated as generic in addition to the built-in list.
    pub extra_generic_titles: Vec<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            choice_preview_limit: 5,
            clamp_section_requirements: false,
            extra_generic_titles: Vec::new(),
        }
    }
}

/// A program's requirement structure, independent of any student.
#[derive(Debug, Clone)]
pub struct PreparedProgram {
    pub name: Option<String>,
    pub context: AgreementContext,
    pub scope_size: usize,
    pub articulations: ArticulationSet,
    pub groups: Vec<RequirementGroup>,
}

pub struct ProgressEngine<O: EvaluationObserver = TracingObserver> {
    options: EngineOptions,
    observer: O,
}

impl ProgressEngine<TracingObserver> {
    pub fn new(options: EngineOptions) -> Self {
        Self::with_observer(options, TracingObserver)
    }
}

impl Default for ProgressEngine<TracingObserver> {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl<O: EvaluationObserver> ProgressEngine<O> {
    pub fn with_observer(options: EngineOptions, observer: O) -> Self {
        Self { options, observer }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Normalize the document and build the chosen program's groups and articulations.
    pub fn prepare(&self, document: &Value, program: Option<&str>) -> Result<PreparedProgram> {
        let normalized = normalize(document, program, &self.observer)?;

        let scope = ProgramScope::resolve(&normalized.nodes);
        self.observer.scope_resolved(scope.len());

        let articulations = ArticulationSet::extract(&normalized.articulation_records, &scope);
        self.observer
            .articulations_extracted(articulations.len(), articulations.source_records);

        let groups = build_groups(&normalized.nodes, &self.options);
        self.observer.groups_built(groups.len());

        Ok(PreparedProgram {
            name: normalized.name,
            context: normalized.context,
            scope_size: scope.len(),
            articulations,
            groups,
        })
    }

    /// Score one student against an already prepared program.
    pub fn evaluate_prepared(
        &self,
        program: &PreparedProgram,
        courses: &[StudentCourse],
    ) -> ProgressReport {
        let evaluation = evaluate(
            courses,
            &program.articulations,
            &program.groups,
            &self.options,
            &self.observer,
        );
        let report = summarize(evaluation, program.name.clone(), program.context.clone());
        self.observer.report_ready(&report);
        report
    }

    pub fn evaluate(
        &self,
        document: &Value,
        program: Option<&str>,
        courses: &[StudentCourse],
    ) -> Result<ProgressReport> {
        let prepared = self.prepare(document, program)?;
        Ok(self.evaluate_prepared(&prepared, courses))
    }

    /// Load the document an agreement key points at and evaluate its program.
    pub async fn evaluate_key<S: DocumentStore>(
        &self,
        store: &S,
        key: &AgreementKey,
        courses: &[StudentCourse],
    ) -> Result<ProgressReport> {
        tracing::debug!("Loading agreement document: {}", key.document_file());
        let bytes = store.load(key.document_file()).await?;
        let document: Value = serde_json::from_slice(&bytes)?;
        self.evaluate(&document, Some(key.program()), courses)
    }
}
