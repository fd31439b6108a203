use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Canonical form used for course equality: whitespace removed, upper-cased.
///
/// `"MATH 150"`, `"math150"` and `" Math\t150 "` all normalize to `"MATH150"`.
pub fn normalize_course_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCode {
    pub prefix: String,
    pub number: String,
}

impl CourseCode {
    /// Both halves must be non-blank.
    pub fn new(prefix: &str, number: &str) -> Option<Self> {
        let prefix = prefix.trim();
        let number = number.trim();
        if prefix.is_empty() || number.is_empty() {
            return None;
        }
        Some(Self {
            prefix: prefix.to_string(),
            number: number.to_string(),
        })
    }

    pub fn normalized(&self) -> String {
        normalize_course_code(&self.to_string())
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.prefix, self.number)
    }
}

/// One course from the student's transcript, as handed over by the extraction service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentCourse {
    #[serde(
        default,
        alias = "courseCode",
        alias = "code",
        deserialize_with = "lenient_string"
    )]
    pub course_code: String,
    #[serde(
        default,
        alias = "courseName",
        alias = "name",
        deserialize_with = "lenient_string"
    )]
    pub course_name: String,
    #[serde(default, deserialize_with = "lenient_credits")]
    pub credits: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub grade: String,
    #[serde(default = "default_completed", deserialize_with = "lenient_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

fn lenient_credits<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_completed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(!matches!(value, serde_json::Value::Bool(false)))
}

impl StudentCourse {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            course_code: code.to_string(),
            course_name: name.to_string(),
            completed: true,
            ..Self::default()
        }
    }

    pub fn normalized_code(&self) -> String {
        normalize_course_code(&self.course_code)
    }
}

/// The receiving-side requirement one articulation satisfies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReceivingRequirement {
    Course { code: CourseCode, title: String },
    /// A named course series treated as one unit.
    Series { name: String },
}

impl ReceivingRequirement {
    pub fn display_code(&self) -> String {
        match self {
            Self::Course { code, .. } => code.to_string(),
            Self::Series { name } => name.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::Course { title, .. } => title.clone(),
            Self::Series { .. } => "Course Series".to_string(),
        }
    }

    pub fn normalized_code(&self) -> String {
        normalize_course_code(&self.display_code())
    }

    pub fn is_series(&self) -> bool {
        matches!(self, Self::Series { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendingCourse {
    pub code: CourseCode,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Articulation {
    pub cell_id: String,
    pub receiving: ReceivingRequirement,
    /// Any one of these satisfies the requirement; order is preserved from the source.
    pub sending: Vec<SendingCourse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountUnit {
    Course,
    /// Quarter or semester units.
    Credit,
}

impl AmountUnit {
    pub fn from_source(raw: Option<&str>) -> Self {
        match raw {
            None | Some("Course") => Self::Course,
            Some(_) => Self::Credit,
        }
    }
}

/// Credit units assumed to make up one course when a rule is stated in credits.
///
/// Heuristic only: it holds for 4-unit courses and is kept for compatibility with
/// existing reports. Do not change it without confirming real course-credit sizes.
pub const CREDITS_PER_COURSE: f64 = 4.0;

/// Course count demanded by a "choose N" amount, or `None` when the amount is zero or absent.
pub fn courses_for_amount(amount: f64, unit: AmountUnit) -> Option<usize> {
    if amount.is_nan() || amount <= 0.0 {
        return None;
    }
    Some(match unit {
        AmountUnit::Course => amount.floor() as usize,
        AmountUnit::Credit => ((amount / CREDITS_PER_COURSE).floor() as usize).max(1),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionPolicy {
    AllRequired,
    ChooseAmount { amount: f64, unit: AmountUnit },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionKind {
    AllRequired,
    ChooseAmount,
}

impl From<&SelectionPolicy> for InstructionKind {
    fn from(policy: &SelectionPolicy) -> Self {
        match policy {
            SelectionPolicy::AllRequired => Self::AllRequired,
            SelectionPolicy::ChooseAmount { .. } => Self::ChooseAmount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleSource {
    /// Nearest preceding heading in the tree.
    Heading,
    /// Derived from the group's course prefixes.
    Inferred,
    /// No heading and nothing to infer from.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTitle {
    pub text: Option<String>,
    pub source: TitleSource,
}

impl GroupTitle {
    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            source: TitleSource::Heading,
        }
    }

    pub fn inferred(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            source: TitleSource::Inferred,
        }
    }

    pub fn unresolved() -> Self {
        Self {
            text: None,
            source: TitleSource::Unresolved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRule {
    pub cell_ids: Vec<String>,
    pub required: usize,
    pub choose_n: bool,
}

impl SectionRule {
    pub fn total_options(&self) -> usize {
        self.cell_ids.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementGroup {
    pub id: String,
    pub title: GroupTitle,
    pub policy: SelectionPolicy,
    pub sections: Vec<SectionRule>,
    /// Every cell of the group in tree order.
    pub cell_ids: Vec<String>,
    pub required_count: usize,
    #[serde(default)]
    pub attributes: Vec<serde_json::Value>,
}

impl RequirementGroup {
    pub fn uses_choose_n(&self) -> bool {
        self.sections.iter().any(|s| s.choose_n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub count: usize,
    pub section_index: usize,
    pub alternatives: Vec<CourseEntry>,
}

/// One line of a completed or missing list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseEntry {
    pub course_code: String,
    pub course_name: String,
    pub normalized_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfied_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_credits: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_be_satisfied_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice: Option<Choice>,
}

impl CourseEntry {
    pub fn is_choice(&self) -> bool {
        self.choice.is_some()
    }

    /// Key used to collapse duplicates in the program-level lists.
    pub fn dedup_key(&self) -> String {
        match &self.choice {
            Some(choice) => format!(
                "SELECT:{}:{}",
                self.group_id.as_deref().unwrap_or_default(),
                choice.section_index
            ),
            None => self.normalized_code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupResult {
    pub group_id: String,
    pub title: Option<String>,
    pub instruction: InstructionKind,
    pub required_count: usize,
    pub total_options: usize,
    pub completed_count: usize,
    pub satisfied: bool,
    pub remaining_needed: usize,
    pub completed: Vec<CourseEntry>,
    pub missing: Vec<CourseEntry>,
}

impl GroupResult {
    /// Capped completion ratio; an empty requirement counts as done.
    pub fn completion_ratio(&self) -> f64 {
        if self.required_count == 0 {
            return 1.0;
        }
        (self.completed_count as f64 / self.required_count as f64).min(1.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgreementContext {
    pub sending_id: Option<i64>,
    pub sending_name: Option<String>,
    pub receiving_id: Option<i64>,
    pub receiving_name: Option<String>,
    pub year_id: Option<i64>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub program: Option<String>,
    pub progress_percentage: f64,
    pub course_progress_percentage: f64,
    pub total_groups: usize,
    pub satisfied_groups: usize,
    pub total_required: usize,
    pub completed_required: Vec<CourseEntry>,
    pub missing_required: Vec<CourseEntry>,
    pub group_results: Vec<GroupResult>,
    pub context: AgreementContext,
}
