use crate::core::engine::EngineOptions;
use crate::core::source::{GroupNode, Instruction, RequirementNode, SectionBody, SectionNode};
use crate::core::subject::infer_subject;
use crate::domain::model::{
    courses_for_amount, AmountUnit, GroupTitle, RequirementGroup, SectionRule, SelectionPolicy,
};

/// Administrative headings that say nothing about the subject of the courses below them.
const GENERIC_TITLES: &[&str] = &[
    "REQUIRED FOR ADMISSION",
    "ADDITIONAL MAJOR PREPARATION COURSES",
    "PREPARATION COURSES FOR THE MAJOR",
    "HIGHLY RECOMMENDED",
    "RECOMMENDED",
    "TECHNICAL ELECTIVES",
    "REQUIREMENTS",
    "THE MAJOR PROGRAM",
    "SELECTIVE MAJOR REQUIREMENTS ADMISSIONS INFORMATION",
    "TRANSFER ADMISSIONS GUARANTEE (TAG)",
    "GENERAL INFORMATION",
];

const CHOOSE_N_ADVISEMENT: &str = "NFollowing";
const CHOOSE_N_INSTRUCTION: &str = "NFromArea";

fn is_generic(title: &str, extra: &[String]) -> bool {
    let title = title.trim().to_uppercase();
    GENERIC_TITLES.iter().any(|generic| *generic == title)
        || extra.iter().any(|generic| generic.trim().to_uppercase() == title)
}

/// Headings keyed by tree position, in document order.
struct TitleIndex {
    titles: Vec<(f64, String)>,
}

impl TitleIndex {
    fn new(nodes: &[RequirementNode]) -> Self {
        let titles = nodes
            .iter()
            .filter_map(|node| match node {
                RequirementNode::RequirementTitle(title) => {
                    Some((title.position, title.content.trim().to_string()))
                }
                _ => None,
            })
            .collect();
        Self { titles }
    }

    /// Nearest heading at or before `position`; of equal positions the later one wins.
    fn nearest(&self, position: f64) -> Option<&str> {
        self.titles
            .iter()
            .filter(|(pos, _)| *pos <= position)
            .fold(None, |best: Option<&(f64, String)>, entry| match best {
                Some(current) if current.0 > entry.0 => Some(current),
                _ => Some(entry),
            })
            .map(|(_, text)| text.as_str())
            .filter(|text| !text.is_empty())
    }
}

fn section_bodies(group: &GroupNode) -> impl Iterator<Item = &SectionBody> {
    group.sections.iter().filter_map(|section| match section {
        SectionNode::Section(body) => Some(body),
        _ => None,
    })
}

fn policy(instruction: Option<&Instruction>) -> SelectionPolicy {
    match instruction {
        Some(instruction) if instruction.kind.as_deref() == Some(CHOOSE_N_INSTRUCTION) => {
            SelectionPolicy::ChooseAmount {
                amount: instruction.amount,
                unit: AmountUnit::from_source(instruction.amount_unit_type.as_deref()),
            }
        }
        _ => SelectionPolicy::AllRequired,
    }
}

fn section_rule(body: &SectionBody, options: &EngineOptions) -> SectionRule {
    let cell_ids: Vec<String> = body
        .cells()
        .filter(|cell| !cell.id.is_empty())
        .map(|cell| cell.id.clone())
        .collect();

    let choose_n = body
        .advisements
        .iter()
        .find(|adv| adv.kind.as_deref() == Some(CHOOSE_N_ADVISEMENT));

    let mut required = match choose_n {
        Some(adv) => courses_for_amount(
            adv.amount,
            AmountUnit::from_source(adv.amount_unit_type.as_deref()),
        )
        .unwrap_or(cell_ids.len()),
        None => cell_ids.len(),
    };
    if options.clamp_section_requirements {
        required = required.min(cell_ids.len());
    }

    SectionRule {
        cell_ids,
        required,
        choose_n: choose_n.is_some(),
    }
}

fn resolve_title(group: &GroupNode, heading: Option<&str>, options: &EngineOptions) -> GroupTitle {
    let needs_inference = match heading {
        Some(text) => is_generic(text, &options.extra_generic_titles),
        None => true,
    };
    if needs_inference {
        let cells = section_bodies(group).flat_map(|body| body.cells());
        if let Some(subject) = infer_subject(cells) {
            return GroupTitle::inferred(subject);
        }
    }
    match heading {
        Some(text) => GroupTitle::heading(text),
        None => GroupTitle::unresolved(),
    }
}

fn build_group(
    index: usize,
    group: &GroupNode,
    titles: &TitleIndex,
    options: &EngineOptions,
) -> RequirementGroup {
    let title = resolve_title(group, titles.nearest(group.position), options);
    let policy = policy(group.instruction.as_ref());

    let sections: Vec<SectionRule> = section_bodies(group)
        .map(|body| section_rule(body, options))
        .filter(|rule| !rule.cell_ids.is_empty())
        .collect();
    let cell_ids: Vec<String> = sections
        .iter()
        .flat_map(|rule| rule.cell_ids.iter().cloned())
        .collect();

    let required_count = if !sections.is_empty() {
        sections.iter().map(|rule| rule.required).sum()
    } else {
        match policy {
            SelectionPolicy::ChooseAmount { amount, unit } => {
                courses_for_amount(amount, unit).unwrap_or(cell_ids.len())
            }
            SelectionPolicy::AllRequired => cell_ids.len(),
        }
    };

    let id = if group.group_id.trim().is_empty() {
        format!("group-{index}")
    } else {
        group.group_id.clone()
    };

    RequirementGroup {
        id,
        title,
        policy,
        sections,
        cell_ids,
        required_count,
        attributes: group.attributes.clone(),
    }
}

/// Build the requirement groups of one program tree, in tree order.
pub fn build_groups(nodes: &[RequirementNode], options: &EngineOptions) -> Vec<RequirementGroup> {
    let titles = TitleIndex::new(nodes);
    nodes
        .iter()
        .filter_map(|node| match node {
            RequirementNode::RequirementGroup(group) => Some(group),
            _ => None,
        })
        .enumerate()
        .map(|(index, group)| build_group(index, group, &titles, options))
        .collect()
}
