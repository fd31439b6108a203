use crate::core::source::{decode_each, decode_embedded, RequirementNode};
use crate::domain::model::AgreementContext;
use crate::domain::ports::EvaluationObserver;
use crate::utils::error::{ProgressError, Result};
use serde_json::{Map, Value};

/// Keys under which a program's requirement tree may appear.
const NODE_KEYS: [&str; 3] = ["templateAssets", "program", "nodes"];
/// Keys under which a bundle may list its programs.
const PROGRAM_LIST_KEYS: [&str; 1] = ["programs"];

const AGREEMENT_URL_BASE: &str = "https://assist.org/transfer/results";

/// The known layouts of an agreement document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentShape {
    /// One program's tree next to its articulation list.
    Flat { nodes: Vec<Value> },
    /// Many programs sharing one articulation list.
    Bundle { programs: Vec<Map<String, Value>> },
    /// A program already picked out of a bundle, carried with the bundle itself.
    Selected {
        program: Map<String, Value>,
        requested: Option<String>,
        parent: Box<Value>,
    },
}

/// One program's slice of a document, ready for scope resolution and extraction.
#[derive(Debug, Clone)]
pub struct NormalizedProgram {
    pub name: Option<String>,
    pub nodes: Vec<RequirementNode>,
    pub articulation_records: Vec<Value>,
    pub context: AgreementContext,
}

/// Strip the `{"result": ...}` envelope some sources wrap documents in.
fn unwrap_envelope(document: &Value) -> &Value {
    match document.get("result") {
        Some(inner @ Value::Object(_)) => inner,
        _ => document,
    }
}

fn first_embedded(object: &Value, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|key| decode_embedded(object.get(*key)))
}

fn is_program_entry(entry: &Value) -> bool {
    entry.get("name").is_some() && NODE_KEYS.iter().any(|key| entry.get(*key).is_some())
}

fn as_list(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

impl DocumentShape {
    pub fn detect(document: &Value) -> Result<Self> {
        let document = unwrap_envelope(document);
        if !document.is_object() {
            return Err(ProgressError::malformed("document is not a JSON object"));
        }

        if let Some(Value::Object(program)) = document.get("major_data") {
            let parent = document.get("full_result").cloned().unwrap_or(Value::Null);
            let requested = document
                .get("requested_major")
                .and_then(Value::as_str)
                .or_else(|| program.get("name").and_then(Value::as_str))
                .map(str::to_string);
            return Ok(Self::Selected {
                program: program.clone(),
                requested,
                parent: Box::new(parent),
            });
        }

        if let Some(Value::Array(programs)) = first_embedded(document, &PROGRAM_LIST_KEYS) {
            let programs: Vec<_> = programs
                .into_iter()
                .filter_map(|p| match p {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect();
            if !programs.is_empty() {
                return Ok(Self::Bundle { programs });
            }
        }

        match first_embedded(document, &NODE_KEYS) {
            Some(Value::Array(entries)) => {
                if entries.first().is_some_and(is_program_entry) {
                    let programs = entries
                        .into_iter()
                        .filter_map(|p| match p {
                            Value::Object(map) => Some(map),
                            _ => None,
                        })
                        .collect();
                    Ok(Self::Bundle { programs })
                } else {
                    Ok(Self::Flat { nodes: entries })
                }
            }
            Some(_) => Err(ProgressError::malformed("requirement tree is not a list")),
            None => Err(ProgressError::malformed("no requirement tree found")),
        }
    }
}

fn program_name(program: &Map<String, Value>) -> Option<String> {
    program
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn program_nodes(program: &Map<String, Value>) -> Vec<Value> {
    NODE_KEYS
        .iter()
        .find_map(|key| decode_embedded(program.get(*key)))
        .map(|v| as_list(Some(v)))
        .unwrap_or_default()
}

/// Pick a program out of a bundle: case-insensitive name match, else the first one.
fn select_program<'a>(
    programs: &'a [Map<String, Value>],
    requested: Option<&str>,
    observer: &dyn EvaluationObserver,
) -> Option<&'a Map<String, Value>> {
    let requested = requested.map(str::trim).filter(|r| !r.is_empty());
    if let Some(wanted) = requested {
        let wanted = wanted.to_uppercase();
        if let Some(found) = programs.iter().find(|p| {
            program_name(p).is_some_and(|name| name.trim().to_uppercase() == wanted)
        }) {
            return Some(found);
        }
    }

    let first = programs.first();
    if let Some(wanted) = requested {
        observer.program_fallback(wanted, first.and_then(|p| p.get("name")).and_then(Value::as_str));
    }
    first
}

fn institution(value: Option<Value>) -> (Option<i64>, Option<String>) {
    let Some(value) = value else {
        return (None, None);
    };
    let id = value.get("id").and_then(Value::as_i64);
    let name = value
        .get("names")
        .and_then(Value::as_array)
        .and_then(|names| names.first())
        .and_then(|first| first.get("name"))
        .or_else(|| value.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);
    (id, name)
}

pub fn agreement_url(sending_id: i64, receiving_id: i64, year_id: i64) -> String {
    format!(
        "{AGREEMENT_URL_BASE}?year={year_id}&institution={sending_id}&agreement={receiving_id}\
         &agreementType=to&viewAgreementsOptions=true&view=agreement&viewBy=major\
         &viewSendingAgreements=false"
    )
}

/// Institution and year metadata of a document, when it carries any.
pub fn agreement_context(document: &Value) -> AgreementContext {
    let document = unwrap_envelope(document);
    let (sending_id, sending_name) = institution(decode_embedded(document.get("sendingInstitution")));
    let (receiving_id, receiving_name) =
        institution(decode_embedded(document.get("receivingInstitution")));
    let year_id = decode_embedded(document.get("academicYear"))
        .and_then(|year| year.get("id").and_then(Value::as_i64));

    let source_url = match (sending_id, receiving_id, year_id) {
        (Some(s), Some(r), Some(y)) => Some(agreement_url(s, r, y)),
        _ => None,
    };

    AgreementContext {
        sending_id,
        sending_name,
        receiving_id,
        receiving_name,
        year_id,
        source_url,
    }
}

fn articulation_list(object: &Value) -> Vec<Value> {
    as_list(decode_embedded(unwrap_envelope(object).get("articulations")))
}

/// Resolve one program's tree and the articulation records it can draw on.
///
/// `program` names the program to pick when the document bundles several; it is ignored
/// for single-program documents.
pub fn normalize(
    document: &Value,
    program: Option<&str>,
    observer: &dyn EvaluationObserver,
) -> Result<NormalizedProgram> {
    match DocumentShape::detect(document)? {
        DocumentShape::Flat { nodes } => {
            let name = program.map(str::to_string);
            observer.program_selected(program, name.as_deref());
            Ok(NormalizedProgram {
                name,
                nodes: decode_each(&nodes),
                articulation_records: articulation_list(document),
                context: agreement_context(document),
            })
        }
        DocumentShape::Bundle { programs } => {
            let selected = select_program(&programs, program, observer)
                .ok_or_else(|| ProgressError::malformed("bundle holds no programs"))?;
            let name = program_name(selected);
            observer.program_selected(program, name.as_deref());

            // A program may carry its own articulations; otherwise it shares the bundle's.
            let own = as_list(decode_embedded(selected.get("articulations")));
            let articulation_records = if own.is_empty() {
                articulation_list(document)
            } else {
                own
            };

            Ok(NormalizedProgram {
                name,
                nodes: decode_each(&program_nodes(selected)),
                articulation_records,
                context: agreement_context(document),
            })
        }
        DocumentShape::Selected {
            program: selected,
            requested,
            parent,
        } => {
            let nodes = program_nodes(&selected);
            if nodes.is_empty() && !parent.is_null() {
                // The picked program lost its tree; resolve it against the parent instead.
                let wanted = program.or(requested.as_deref());
                return normalize(&parent, wanted, observer);
            }

            let name = program_name(&selected).or(requested);
            observer.program_selected(program, name.as_deref());
            Ok(NormalizedProgram {
                name,
                nodes: decode_each(&nodes),
                articulation_records: articulation_list(&parent),
                context: agreement_context(&parent),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::observer::NoopObserver;
    use serde_json::json;
    use std::cell::RefCell;

    fn bundle() -> Value {
        json!({
            "result": {
                "templateAssets": serde_json::to_string(&json!([
                    {"name": "Mathematics, B.S.", "templateAssets": [
                        {"type": "RequirementTitle", "position": 0, "content": "MATH"}
                    ]},
                    {"name": "Computer Science, B.A.", "templateAssets": "[{\"type\": \"RequirementTitle\", \"position\": 0, \"content\": \"CS\"}, {\"type\": \"RequirementTitle\", \"position\": 5, \"content\": \"MORE\"}]"}
                ])).unwrap(),
                "articulations": "[{\"templateCellId\": \"c1\"}]",
                "sendingInstitution": "{\"id\": 110, \"names\": [{\"name\": \"De Anza College\"}]}",
                "receivingInstitution": {"id": 79, "names": [{"name": "University of California, Berkeley"}]},
                "academicYear": "{\"id\": 75}"
            }
        })
    }

    #[derive(Default)]
    struct RecordingObserver {
        fallbacks: RefCell<Vec<String>>,
    }

    impl EvaluationObserver for RecordingObserver {
        fn program_fallback(&self, requested: &str, _selected: Option<&str>) {
            self.fallbacks.borrow_mut().push(requested.to_string());
        }
    }

    #[test]
    fn test_detect_flat_document() {
        let doc = json!({"templateAssets": [{"type": "RequirementTitle"}], "articulations": []});
        assert!(matches!(
            DocumentShape::detect(&doc).unwrap(),
            DocumentShape::Flat { .. }
        ));
    }

    #[test]
    fn test_detect_bundle_document() {
        assert!(matches!(
            DocumentShape::detect(&bundle()).unwrap(),
            DocumentShape::Bundle { ref programs } if programs.len() == 2
        ));
    }

    #[test]
    fn test_missing_tree_is_malformed() {
        let err = DocumentShape::detect(&json!({"articulations": []})).unwrap_err();
        assert!(matches!(err, ProgressError::MalformedDocument { .. }));

        let err = normalize(&json!([1, 2, 3]), None, &NoopObserver).unwrap_err();
        assert!(matches!(err, ProgressError::MalformedDocument { .. }));
    }

    #[test]
    fn test_bundle_selects_program_case_insensitively() {
        let program = normalize(&bundle(), Some("computer science, b.a."), &NoopObserver).unwrap();
        assert_eq!(program.name.as_deref(), Some("Computer Science, B.A."));
        assert_eq!(program.nodes.len(), 2);
        assert_eq!(program.articulation_records.len(), 1);
    }

    #[test]
    fn test_bundle_falls_back_to_first_program_with_warning() {
        let observer = RecordingObserver::default();
        let program = normalize(&bundle(), Some("Underwater Basket Weaving"), &observer).unwrap();
        assert_eq!(program.name.as_deref(), Some("Mathematics, B.S."));
        assert_eq!(
            observer.fallbacks.borrow().as_slice(),
            ["Underwater Basket Weaving".to_string()]
        );

        let observer = RecordingObserver::default();
        let program = normalize(&bundle(), None, &observer).unwrap();
        assert_eq!(program.name.as_deref(), Some("Mathematics, B.S."));
        assert!(observer.fallbacks.borrow().is_empty());
    }

    #[test]
    fn test_selected_program_without_tree_resolves_against_parent() {
        let doc = json!({
            "major_data": {"name": "Computer Science, B.A."},
            "full_result": bundle()["result"].clone(),
            "requested_major": "Computer Science, B.A."
        });
        let program = normalize(&doc, None, &NoopObserver).unwrap();
        assert_eq!(program.name.as_deref(), Some("Computer Science, B.A."));
        assert_eq!(program.nodes.len(), 2);
    }

    fn program_list() -> Value {
        json!({
            "programs": [
                {"name": "Chemistry", "nodes": [
                    {"type": "RequirementTitle", "position": 0, "content": "CHEM"}
                ]},
                {"name": "Physics", "nodes": [
                    {"type": "RequirementTitle", "position": 0, "content": "PHYS"},
                    {"type": "RequirementGroup", "groupId": "g1", "position": 1, "sections": []}
                ], "articulations": [
                    {"templateCellId": "p1"},
                    {"templateCellId": "p2"}
                ]}
            ],
            "articulations": [{"templateCellId": "shared"}]
        })
    }

    #[test]
    fn test_single_program_node_list_under_program_key() {
        let doc = json!({
            "program": [
                {"type": "RequirementTitle", "position": 0, "content": "MATH"},
                {"type": "RequirementGroup", "groupId": "g1", "position": 1, "sections": []}
            ],
            "articulations": [{"templateCellId": "c1"}, {"templateCellId": "c2"}]
        });
        assert!(matches!(
            DocumentShape::detect(&doc).unwrap(),
            DocumentShape::Flat { ref nodes } if nodes.len() == 2
        ));

        let program = normalize(&doc, Some("Mathematics"), &NoopObserver).unwrap();
        assert_eq!(program.name.as_deref(), Some("Mathematics"));
        assert_eq!(program.nodes.len(), 2);
        assert_eq!(program.articulation_records.len(), 2);
    }

    #[test]
    fn test_program_list_with_nodes_is_a_bundle() {
        assert!(matches!(
            DocumentShape::detect(&program_list()).unwrap(),
            DocumentShape::Bundle { ref programs } if programs.len() == 2
        ));

        let program = normalize(&program_list(), Some("physics"), &NoopObserver).unwrap();
        assert_eq!(program.name.as_deref(), Some("Physics"));
        assert_eq!(program.nodes.len(), 2);
    }

    #[test]
    fn test_program_articulations_take_precedence_over_shared_list() {
        let physics = normalize(&program_list(), Some("Physics"), &NoopObserver).unwrap();
        let cells: Vec<_> = physics
            .articulation_records
            .iter()
            .filter_map(|r| r.get("templateCellId").and_then(Value::as_str))
            .collect();
        assert_eq!(cells, vec!["p1", "p2"]);

        let chemistry = normalize(&program_list(), Some("Chemistry"), &NoopObserver).unwrap();
        assert_eq!(chemistry.articulation_records, vec![json!({"templateCellId": "shared"})]);
    }

    #[test]
    fn test_context_builds_agreement_url() {
        let context = agreement_context(&bundle());
        assert_eq!(context.sending_id, Some(110));
        assert_eq!(context.sending_name.as_deref(), Some("De Anza College"));
        assert_eq!(context.receiving_id, Some(79));
        assert_eq!(context.year_id, Some(75));
        let url = context.source_url.unwrap();
        assert!(url.starts_with("https://assist.org/transfer/results?year=75&institution=110&agreement=79"));
    }

    #[test]
    fn test_undecodable_articulations_degrade_to_empty() {
        let doc = json!({"templateAssets": [], "articulations": "{not json"});
        let program = normalize(&doc, None, &NoopObserver).unwrap();
        assert!(program.nodes.is_empty());
        assert!(program.articulation_records.is_empty());
    }
}
