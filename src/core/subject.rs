use crate::core::source::{Cell, CourseRef};
use std::collections::HashMap;

/// Known course prefixes and the subject they stand for. Order matters for partial matches.
const PREFIX_SUBJECTS: &[(&str, &str)] = &[
    ("MATH", "Mathematics"),
    ("MAT", "Mathematics"),
    ("PHYS", "Physics"),
    ("PHY", "Physics"),
    ("CHEM", "Chemistry"),
    ("CHE", "Chemistry"),
    ("BIO", "Biology"),
    ("BIOL", "Biology"),
    ("ECS", "Computer Science"),
    ("CISP", "Computer Science"),
    ("CIS", "Computer Science"),
    ("CS", "Computer Science"),
    ("CSCI", "Computer Science"),
    ("ENG", "Engineering"),
    ("ENGR", "Engineering"),
    ("EEC", "Electrical Engineering"),
    ("ECE", "Electrical Engineering"),
    ("EECS", "Electrical Engineering & CS"),
    ("CMN", "Communication"),
    ("COMM", "Communication"),
    ("SPCH", "Communication"),
    ("ENL", "English"),
    ("ENGL", "English"),
    ("UWP", "Writing"),
    ("COM", "Comparative Literature"),
    ("ACCT", "Accounting"),
    ("MGT", "Management"),
    ("BUS", "Business"),
    ("ECON", "Economics"),
    ("STAT", "Statistics"),
    ("NAS", "Native American Studies"),
    ("HIST", "History"),
    ("PHIL", "Philosophy"),
    ("PSYC", "Psychology"),
    ("SOC", "Sociology"),
];

/// Most frequent value; ties go to whichever appeared first.
fn most_common(values: &[String]) -> Option<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value.as_str()).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for value in values {
        let count = counts[value.as_str()];
        let better = match best {
            Some((_, top)) => count > top,
            None => true,
        };
        if better {
            best = Some((value.as_str(), count));
        }
    }
    best.map(|(value, _)| value)
}

fn subject_for_prefix(prefix: &str) -> Option<&'static str> {
    PREFIX_SUBJECTS
        .iter()
        .find(|(key, _)| *key == prefix)
        .or_else(|| {
            PREFIX_SUBJECTS
                .iter()
                .find(|(key, _)| prefix.starts_with(key) || key.starts_with(prefix))
        })
        .map(|(_, subject)| *subject)
}

/// Guess a subject name for a group from the courses in its cells.
///
/// Returns `None` when the cells hold no courses at all.
pub fn infer_subject<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Option<String> {
    let mut prefixes = Vec::new();
    let mut departments = Vec::new();

    let mut collect = |course: &CourseRef| {
        let prefix = course.prefix.trim();
        if !prefix.is_empty() {
            prefixes.push(prefix.to_uppercase());
        }
        let department = course.department.trim();
        if !department.is_empty() {
            departments.push(department.to_string());
        }
    };

    for cell in cells {
        match cell.kind.as_deref() {
            Some("Course") => {
                if let Some(course) = &cell.course {
                    collect(course);
                }
            }
            Some("Series") => {
                if let Some(series) = &cell.series {
                    series.courses.iter().for_each(&mut collect);
                }
            }
            _ => {}
        }
    }

    if let Some(subject) = most_common(&prefixes).and_then(subject_for_prefix) {
        return Some(subject.to_string());
    }
    most_common(&departments).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_cell(prefix: &str, department: &str) -> Cell {
        Cell {
            id: format!("{prefix}-cell"),
            kind: Some("Course".to_string()),
            course: Some(CourseRef {
                prefix: prefix.to_string(),
                department: department.to_string(),
                ..CourseRef::default()
            }),
            series: None,
        }
    }

    #[test]
    fn test_most_frequent_prefix_wins() {
        let cells = vec![
            course_cell("PHYS", ""),
            course_cell("math", ""),
            course_cell("MATH", ""),
        ];
        assert_eq!(infer_subject(&cells).as_deref(), Some("Mathematics"));
    }

    #[test]
    fn test_partial_prefix_match_in_table_order() {
        let cells = vec![course_cell("MATHS", "")];
        assert_eq!(infer_subject(&cells).as_deref(), Some("Mathematics"));
    }

    #[test]
    fn test_series_courses_count() {
        let cell = Cell {
            id: "s1".to_string(),
            kind: Some("Series".to_string()),
            course: None,
            series: Some(crate::core::source::SeriesRef {
                name: "CHEM 2A-2B".to_string(),
                courses: vec![
                    CourseRef {
                        prefix: "CHEM".to_string(),
                        ..CourseRef::default()
                    },
                    CourseRef {
                        prefix: "CHEM".to_string(),
                        ..CourseRef::default()
                    },
                ],
            }),
        };
        assert_eq!(infer_subject([&cell]).as_deref(), Some("Chemistry"));
    }

    #[test]
    fn test_falls_back_to_department() {
        let cells = vec![
            course_cell("XYZ", "Astronomy"),
            course_cell("XYZ", "Astronomy"),
        ];
        assert_eq!(infer_subject(&cells).as_deref(), Some("Astronomy"));
    }

    #[test]
    fn test_no_courses_yields_none() {
        assert_eq!(infer_subject(&Vec::<Cell>::new()), None);
        let header = Cell {
            kind: Some("GeneralText".to_string()),
            ..Cell::default()
        };
        assert_eq!(infer_subject([&header]), None);
    }
}
