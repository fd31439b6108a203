//! Serde view of the agreement source format.
//!
//! The upstream data is loosely typed: ids arrive as strings or numbers, lists may be
//! missing, and individual entries may be garbage. Everything here decodes leniently and
//! drops entries that cannot be understood instead of failing the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode a field that may hold JSON directly or as an encoded string.
///
/// Returns `None` for null, absent, or undecodable values.
pub fn decode_embedded(value: Option<&Value>) -> Option<Value> {
    match value? {
        Value::Null => None,
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!("Dropping undecodable embedded field: {}", e);
                None
            }
        },
        other => Some(other.clone()),
    }
}

/// Decode each element on its own, keeping the ones that fit `T`.
pub fn decode_each<T: DeserializeOwned>(values: &[Value]) -> Vec<T> {
    values
        .iter()
        .filter_map(|value| match serde_json::from_value::<T>(value.clone()) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::debug!("Dropping malformed entry: {}", e);
                None
            }
        })
        .collect()
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match decode_embedded(value.as_ref()) {
        Some(Value::Array(items)) => decode_each(&items),
        _ => Vec::new(),
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum RequirementNode {
    RequirementTitle(TitleNode),
    RequirementGroup(GroupNode),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleNode {
    #[serde(default, deserialize_with = "lenient_number")]
    pub position: f64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    #[serde(default, deserialize_with = "lenient_text")]
    pub group_id: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub position: f64,
    #[serde(default)]
    pub instruction: Option<Instruction>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub sections: Vec<SectionNode>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub attributes: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub selection_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: f64,
    #[serde(default)]
    pub amount_unit_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum SectionNode {
    Section(SectionBody),
    SectionHeader {},
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionBody {
    #[serde(default, deserialize_with = "lenient_list")]
    pub rows: Vec<Row>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub advisements: Vec<Advisement>,
}

impl SectionBody {
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Row {
    #[serde(default, deserialize_with = "lenient_list")]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisement {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: f64,
    #[serde(default)]
    pub amount_unit_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cell {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub course: Option<CourseRef>,
    #[serde(default)]
    pub series: Option<SeriesRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRef {
    #[serde(default, deserialize_with = "lenient_text")]
    pub prefix: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub course_number: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub course_title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub department: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesRef {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub courses: Vec<CourseRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticulationRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub template_cell_id: String,
    #[serde(default)]
    pub articulation: ArticulationBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticulationBody {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub course: Option<CourseRef>,
    #[serde(default)]
    pub series: Option<SeriesRef>,
    #[serde(default)]
    pub sending_articulation: Option<SendingArticulation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendingArticulation {
    #[serde(default, deserialize_with = "lenient_list")]
    pub items: Vec<SendingItem>,
}

/// Either a bare course or a `CourseGroup` of interchangeable courses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendingItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub prefix: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub course_number: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub course_title: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub items: Vec<SendingItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_embedded_accepts_both_forms() {
        let inline = json!([1, 2]);
        assert_eq!(decode_embedded(Some(&inline)), Some(json!([1, 2])));

        let encoded = json!("[1, 2]");
        assert_eq!(decode_embedded(Some(&encoded)), Some(json!([1, 2])));

        let broken = json!("[1, 2");
        assert_eq!(decode_embedded(Some(&broken)), None);
        assert_eq!(decode_embedded(Some(&Value::Null)), None);
        assert_eq!(decode_embedded(None), None);
    }

    #[test]
    fn test_unknown_node_types_decode_as_other() {
        let nodes: Vec<RequirementNode> = decode_each(&[
            json!({"type": "GeneralText", "content": "hello"}),
            json!({"type": "RequirementTitle", "position": 0, "content": "MATH"}),
            json!("not an object"),
        ]);
        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[0], RequirementNode::Other));
        assert!(matches!(nodes[1], RequirementNode::RequirementTitle(_)));
    }

    #[test]
    fn test_group_node_tolerates_encoded_sections_and_numeric_ids() {
        let node: RequirementNode = serde_json::from_value(json!({
            "type": "RequirementGroup",
            "groupId": 42,
            "position": "3",
            "sections": "[{\"type\": \"Section\", \"rows\": [{\"cells\": [{\"id\": 7}]}]}, {\"type\": \"SectionHeader\"}]"
        }))
        .unwrap();

        let RequirementNode::RequirementGroup(group) = node else {
            panic!("expected a group");
        };
        assert_eq!(group.group_id, "42");
        assert_eq!(group.position, 3.0);
        assert_eq!(group.sections.len(), 2);
        let SectionNode::Section(body) = &group.sections[0] else {
            panic!("expected a section");
        };
        assert_eq!(body.cells().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["7"]);
    }
}
