use crate::core::source::decode_each;
use crate::domain::model::StudentCourse;
use crate::utils::error::{ProgressError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Course list produced by the transcript extraction service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub college_name: Option<String>,
    pub courses: Vec<StudentCourse>,
}

/// The extraction service sometimes wraps its JSON in a markdown code fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Accepts a bare course list or `{"college_name": ..., "courses": [...]}`.
pub fn parse_json(bytes: &[u8]) -> Result<Transcript> {
    let text = String::from_utf8_lossy(bytes);
    let value: Value = serde_json::from_str(strip_code_fence(&text))?;

    let (college_name, courses) = match value {
        Value::Array(items) => (None, items),
        Value::Object(mut object) => {
            let college_name = object
                .get("college_name")
                .or_else(|| object.get("collegeName"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string);
            let courses = match object.remove("courses") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            (college_name, courses)
        }
        _ => (None, Vec::new()),
    };

    Ok(Transcript {
        college_name,
        courses: decode_each(&courses),
    })
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default, alias = "courseCode", alias = "code")]
    course_code: Option<String>,
    #[serde(default, alias = "courseName", alias = "name")]
    course_name: Option<String>,
    #[serde(default)]
    credits: Option<String>,
    #[serde(default)]
    grade: Option<String>,
}

impl From<CsvRow> for StudentCourse {
    fn from(row: CsvRow) -> Self {
        Self {
            course_code: row.course_code.unwrap_or_default(),
            course_name: row.course_name.unwrap_or_default(),
            credits: row
                .credits
                .and_then(|c| c.trim().parse().ok())
                .unwrap_or(0.0),
            grade: row.grade.unwrap_or_default(),
            completed: true,
        }
    }
}

/// Header row required: `course_code,course_name,credits,grade`. Bad rows are skipped.
pub fn parse_csv(bytes: &[u8]) -> Result<Transcript> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let has_code = headers
        .iter()
        .any(|h| matches!(h, "course_code" | "courseCode" | "code"));
    if !has_code {
        return Err(ProgressError::CsvError(csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "missing course_code column",
        ))));
    }

    let mut courses = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        match row {
            Ok(row) => courses.push(StudentCourse::from(row)),
            Err(e) => tracing::debug!("Skipping unreadable transcript row: {}", e),
        }
    }

    Ok(Transcript {
        college_name: None,
        courses,
    })
}

/// Read a transcript file, choosing the format by extension (`.csv`, otherwise JSON).
pub async fn load(path: &Path) -> Result<Transcript> {
    let bytes = tokio::fs::read(path).await?;
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        parse_csv(&bytes)
    } else {
        parse_json(&bytes)
    }
}
