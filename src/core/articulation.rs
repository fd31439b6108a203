use crate::core::scope::ProgramScope;
use crate::core::source::{decode_each, ArticulationBody, ArticulationRecord, SendingItem};
use crate::domain::model::{Articulation, CourseCode, ReceivingRequirement, SendingCourse};
use serde_json::Value;
use std::collections::HashMap;

/// Articulations usable by one program, indexed by cell id.
#[derive(Debug, Clone, Default)]
pub struct ArticulationSet {
    articulations: Vec<Articulation>,
    by_cell: HashMap<String, usize>,
    /// Raw records seen, before scope filtering and validation.
    pub source_records: usize,
}

impl ArticulationSet {
    pub fn extract(records: &[Value], scope: &ProgramScope) -> Self {
        let decoded: Vec<ArticulationRecord> = decode_each(records);
        let articulations: Vec<Articulation> = decoded
            .into_iter()
            .filter(|record| scope.admits(&record.template_cell_id))
            .filter_map(build_articulation)
            .collect();

        let by_cell = articulations
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.cell_id.is_empty())
            .map(|(i, a)| (a.cell_id.clone(), i))
            .collect();

        Self {
            articulations,
            by_cell,
            source_records: records.len(),
        }
    }

    pub fn from_articulations(articulations: Vec<Articulation>) -> Self {
        let by_cell = articulations
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.cell_id.is_empty())
            .map(|(i, a)| (a.cell_id.clone(), i))
            .collect();
        let source_records = articulations.len();
        Self {
            articulations,
            by_cell,
            source_records,
        }
    }

    /// Later records win when two share a cell id.
    pub fn for_cell(&self, cell_id: &str) -> Option<&Articulation> {
        self.by_cell.get(cell_id).map(|&i| &self.articulations[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Articulation> {
        self.articulations.iter()
    }

    pub fn len(&self) -> usize {
        self.articulations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articulations.is_empty()
    }
}

fn receiving_requirement(body: &ArticulationBody) -> Option<ReceivingRequirement> {
    match body.kind.as_deref() {
        Some("Course") => {
            let course = body.course.as_ref()?;
            let code = CourseCode::new(&course.prefix, &course.course_number)?;
            Some(ReceivingRequirement::Course {
                code,
                title: course.course_title.clone(),
            })
        }
        Some("Series") => {
            let name = body.series.as_ref()?.name.trim();
            if name.is_empty() {
                return None;
            }
            Some(ReceivingRequirement::Series {
                name: name.to_string(),
            })
        }
        _ => None,
    }
}

fn sending_course(item: &SendingItem) -> Option<SendingCourse> {
    if item.kind.as_deref() != Some("Course") {
        return None;
    }
    let code = CourseCode::new(&item.prefix, &item.course_number)?;
    Some(SendingCourse {
        code,
        title: item.course_title.clone(),
    })
}

/// Bare courses plus the members of each course group, one level deep.
fn sending_alternatives(body: &ArticulationBody) -> Vec<SendingCourse> {
    let Some(sending) = &body.sending_articulation else {
        return Vec::new();
    };
    sending
        .items
        .iter()
        .flat_map(|item| match item.kind.as_deref() {
            Some("CourseGroup") => item
                .items
                .iter()
                .filter_map(sending_course)
                .collect::<Vec<_>>(),
            _ => sending_course(item).into_iter().collect::<Vec<_>>(),
        })
        .collect()
}

fn build_articulation(record: ArticulationRecord) -> Option<Articulation> {
    let receiving = receiving_requirement(&record.articulation)?;
    let sending = sending_alternatives(&record.articulation);
    if sending.is_empty() {
        return None;
    }
    Some(Articulation {
        cell_id: record.template_cell_id,
        receiving,
        sending,
    })
}
