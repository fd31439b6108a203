use crate::core::articulation::ArticulationSet;
use crate::core::engine::EngineOptions;
use crate::domain::model::{
    Articulation, Choice, CourseEntry, GroupResult, InstructionKind, RequirementGroup,
    SectionRule, StudentCourse,
};
use crate::domain::ports::EvaluationObserver;
use std::collections::{HashMap, HashSet};

/// Sending alternatives listed before the rest collapse into "(+N more)".
const SENDING_PREVIEW: usize = 3;

/// The student's completed courses keyed by normalized code.
#[derive(Debug, Clone, Default)]
pub struct StudentRecord {
    by_code: HashMap<String, StudentCourse>,
}

impl StudentRecord {
    /// Later duplicates replace earlier ones; blank codes and unfinished courses are ignored.
    pub fn new(courses: &[StudentCourse]) -> Self {
        let by_code = courses
            .iter()
            .filter(|course| course.completed)
            .filter_map(|course| {
                let code = course.normalized_code();
                (!code.is_empty()).then(|| (code, course.clone()))
            })
            .collect();
        Self { by_code }
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// First sending alternative, in listed order, that the student has taken.
    pub fn find_match(&self, articulation: &Articulation) -> Option<&StudentCourse> {
        articulation
            .sending
            .iter()
            .find_map(|sending| self.by_code.get(&sending.code.normalized()))
    }
}

/// Everything the evaluator derives for one program.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub group_results: Vec<GroupResult>,
    /// Deduplicated across groups and ungrouped articulations.
    pub completed: Vec<CourseEntry>,
    pub missing: Vec<CourseEntry>,
    pub total_articulations: usize,
}

struct CellOutcome {
    matched: bool,
    entry: CourseEntry,
}

fn sending_summary(articulation: &Articulation) -> String {
    let mut summary = articulation
        .sending
        .iter()
        .take(SENDING_PREVIEW)
        .map(|s| s.code.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if articulation.sending.len() > SENDING_PREVIEW {
        summary.push_str(&format!(
            " (+{} more)",
            articulation.sending.len() - SENDING_PREVIEW
        ));
    }
    summary
}

fn evaluate_articulation(
    articulation: &Articulation,
    student: &StudentRecord,
    group: Option<&RequirementGroup>,
) -> CellOutcome {
    let mut entry = CourseEntry {
        course_code: articulation.receiving.display_code(),
        course_name: articulation.receiving.display_name(),
        normalized_code: articulation.receiving.normalized_code(),
        group_id: group.map(|g| g.id.clone()),
        group_title: group.and_then(|g| g.title.text.clone()),
        cell_id: (!articulation.cell_id.is_empty()).then(|| articulation.cell_id.clone()),
        ..CourseEntry::default()
    };

    match student.find_match(articulation) {
        Some(course) => {
            entry.satisfied_by = Some(course.course_code.clone());
            entry.student_grade = Some(course.grade.clone());
            entry.student_credits = Some(course.credits);
            CellOutcome {
                matched: true,
                entry,
            }
        }
        None => {
            entry.can_be_satisfied_by = Some(sending_summary(articulation));
            CellOutcome {
                matched: false,
                entry,
            }
        }
    }
}

fn choice_entry(
    group: &RequirementGroup,
    section_index: usize,
    needed: usize,
    unmatched: Vec<CourseEntry>,
    preview_limit: usize,
) -> CourseEntry {
    let mut names = unmatched
        .iter()
        .take(preview_limit)
        .map(|entry| {
            if entry.course_name.trim().is_empty() {
                entry.course_code.clone()
            } else {
                entry.course_name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ");
    if unmatched.len() > preview_limit {
        names.push_str("...");
    }

    CourseEntry {
        course_code: format!("Select {needed}"),
        course_name: names,
        group_id: Some(group.id.clone()),
        group_title: group.title.text.clone(),
        choice: Some(Choice {
            count: needed,
            section_index,
            alternatives: unmatched,
        }),
        ..CourseEntry::default()
    }
}

#[derive(Default)]
struct GroupTally {
    completed: Vec<CourseEntry>,
    missing: Vec<CourseEntry>,
    effective_completed: usize,
    effective_required: usize,
}

impl GroupTally {
    fn add_section(
        &mut self,
        group: &RequirementGroup,
        index: usize,
        rule: &SectionRule,
        outcomes: &mut HashMap<String, CellOutcome>,
        preview_limit: usize,
    ) {
        let (matched, unmatched): (Vec<_>, Vec<_>) = rule
            .cell_ids
            .iter()
            .filter_map(|cell_id| outcomes.remove(cell_id))
            .partition(|outcome| outcome.matched);
        let matched: Vec<CourseEntry> = matched.into_iter().map(|o| o.entry).collect();
        let unmatched: Vec<CourseEntry> = unmatched.into_iter().map(|o| o.entry).collect();

        if rule.choose_n {
            let count = matched.len();
            self.effective_completed += count.min(rule.required);
            self.effective_required += rule.required;
            self.completed
                .extend(matched.into_iter().take(rule.required));
            if count < rule.required {
                let needed = rule.required - count;
                self.missing
                    .push(choice_entry(group, index, needed, unmatched, preview_limit));
            }
        } else {
            self.effective_completed += matched.len();
            self.effective_required += rule.required;
            self.completed.extend(matched);
            self.missing.extend(unmatched);
        }
    }
}

fn evaluate_group(
    group: &RequirementGroup,
    articulations: &ArticulationSet,
    student: &StudentRecord,
    options: &EngineOptions,
) -> GroupResult {
    let mut outcomes: HashMap<String, CellOutcome> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for cell_id in &group.cell_ids {
        let Some(articulation) = articulations.for_cell(cell_id) else {
            continue;
        };
        if !outcomes.contains_key(cell_id) {
            order.push(cell_id);
        }
        outcomes.insert(
            cell_id.clone(),
            evaluate_articulation(articulation, student, Some(group)),
        );
    }

    let mut tally = GroupTally::default();
    if group.sections.is_empty() {
        for cell_id in order {
            if let Some(outcome) = outcomes.remove(cell_id) {
                if outcome.matched {
                    tally.completed.push(outcome.entry);
                } else {
                    tally.missing.push(outcome.entry);
                }
            }
        }
        tally.effective_completed = tally.completed.len();
        tally.effective_required = group.required_count;
    } else {
        for (index, rule) in group.sections.iter().enumerate() {
            tally.add_section(
                group,
                index,
                rule,
                &mut outcomes,
                options.choice_preview_limit,
            );
        }
    }

    let instruction = if group.uses_choose_n() {
        InstructionKind::ChooseAmount
    } else {
        InstructionKind::from(&group.policy)
    };

    GroupResult {
        group_id: group.id.clone(),
        title: group.title.text.clone(),
        instruction,
        required_count: tally.effective_required,
        total_options: group.cell_ids.len(),
        completed_count: tally.effective_completed,
        satisfied: tally.effective_completed >= tally.effective_required,
        remaining_needed: tally
            .effective_required
            .saturating_sub(tally.effective_completed),
        completed: tally.completed,
        missing: tally.missing,
    }
}

/// Keep the first entry per dedup key; entries without a key are dropped.
pub fn dedup_entries(entries: Vec<CourseEntry>) -> Vec<CourseEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            let key = entry.dedup_key();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

/// Match the student's courses against every group and every ungrouped articulation.
pub fn evaluate(
    courses: &[StudentCourse],
    articulations: &ArticulationSet,
    groups: &[RequirementGroup],
    options: &EngineOptions,
    observer: &dyn EvaluationObserver,
) -> Evaluation {
    let student = StudentRecord::new(courses);
    let mut completed = Vec::new();
    let mut missing = Vec::new();

    let mut group_results = Vec::with_capacity(groups.len());
    for group in groups {
        let result = evaluate_group(group, articulations, &student, options);
        observer.group_evaluated(&result);
        completed.extend(result.completed.iter().cloned());
        missing.extend(result.missing.iter().cloned());
        group_results.push(result);
    }

    let grouped: HashSet<&str> = groups
        .iter()
        .flat_map(|g| g.cell_ids.iter().map(String::as_str))
        .collect();

    for articulation in articulations.iter() {
        if !articulation.cell_id.is_empty() && grouped.contains(articulation.cell_id.as_str()) {
            continue;
        }
        let outcome = evaluate_articulation(articulation, &student, None);
        if outcome.matched {
            completed.push(outcome.entry);
        } else {
            missing.push(outcome.entry);
        }
    }

    Evaluation {
        group_results,
        completed: dedup_entries(completed),
        missing: dedup_entries(missing),
        total_articulations: articulations.len(),
    }
}
