#![allow(dead_code)]

use serde_json::{json, Value};
use transfer_progress::StudentCourse;

pub fn course_cell(id: &str, prefix: &str, number: &str) -> Value {
    json!({
        "id": id,
        "type": "Course",
        "course": {"prefix": prefix, "courseNumber": number, "courseTitle": format!("{prefix} {number}")}
    })
}

pub fn section(cells: Vec<Value>) -> Value {
    json!({"type": "Section", "rows": [{"cells": cells}], "advisements": []})
}

pub fn choose_section(amount: u32, cells: Vec<Value>) -> Value {
    json!({
        "type": "Section",
        "rows": cells.into_iter().map(|cell| json!({"cells": [cell]})).collect::<Vec<_>>(),
        "advisements": [{"type": "NFollowing", "amount": amount, "amountUnitType": "Course"}]
    })
}

pub fn title(position: i64, content: &str) -> Value {
    json!({"type": "RequirementTitle", "position": position, "content": content})
}

pub fn group(id: &str, position: i64, sections: Vec<Value>) -> Value {
    json!({
        "type": "RequirementGroup",
        "groupId": id,
        "position": position,
        "instruction": {"type": "Following", "selectionType": "Complete"},
        "sections": sections
    })
}

/// Articulation record mapping `receiving` ("PREFIX NUMBER") to any of `sending`.
pub fn articulation(cell: &str, receiving: &str, sending: &[&str]) -> Value {
    let (prefix, number) = receiving.split_once(' ').expect("receiving code");
    let items: Vec<Value> = sending
        .iter()
        .map(|code| {
            let (prefix, number) = code.split_once(' ').expect("sending code");
            json!({"type": "CourseGroup", "items": [
                {"type": "Course", "prefix": prefix, "courseNumber": number, "courseTitle": ""}
            ]})
        })
        .collect();
    json!({
        "templateCellId": cell,
        "articulation": {
            "type": "Course",
            "course": {"prefix": prefix, "courseNumber": number, "courseTitle": format!("{receiving} title")},
            "sendingArticulation": {"items": items}
        }
    })
}

/// Two-program bundle shaped like the upstream agreement files: every nested list is
/// encoded as a JSON string and the whole thing sits under `result`.
pub fn bundle_document() -> Value {
    let computer_science = json!([
        title(0, "REQUIREMENTS"),
        group("cs-math", 1, vec![section(vec![
            course_cell("a1", "MATH", "1A"),
            course_cell("a2", "MATH", "1B"),
        ])]),
        title(2, "Science Elective"),
        group("cs-science", 3, vec![choose_section(1, vec![
            course_cell("b1", "PHYS", "7A"),
            course_cell("b2", "CHEM", "1A"),
            course_cell("b3", "BIO", "1A"),
        ])]),
    ]);
    let economics = json!([
        title(0, "Economics Core"),
        group("econ-core", 1, vec![section(vec![course_cell("x1", "ECON", "1")])]),
    ]);
    let programs = json!([
        {"name": "Economics, B.A.", "templateAssets": economics.to_string()},
        {"name": "Computer Science, B.A.", "templateAssets": computer_science.to_string()},
    ]);
    let articulations = json!([
        articulation("a1", "MATH 1A", &["MATH 1A"]),
        articulation("a2", "MATH 1B", &["MATH 1B", "MATH 1BH"]),
        articulation("b1", "PHYS 7A", &["PHYS 4A"]),
        articulation("b2", "CHEM 1A", &["CHEM 1A"]),
        articulation("b3", "BIO 1A", &["BIOL 6A"]),
        articulation("x1", "ECON 1", &["ECON 1"]),
    ]);

    json!({
        "result": {
            "templateAssets": programs.to_string(),
            "articulations": articulations.to_string(),
            "sendingInstitution": json!({"id": 51, "names": [{"name": "Cabrillo College"}]}).to_string(),
            "receivingInstitution": json!({"id": 79, "names": [{"name": "University of California, Berkeley"}]}).to_string(),
            "academicYear": json!({"id": 75}).to_string()
        }
    })
}

pub fn courses(codes: &[&str]) -> Vec<StudentCourse> {
    codes
        .iter()
        .map(|code| StudentCourse {
            grade: "A".to_string(),
            credits: 4.0,
            ..StudentCourse::new(code, "")
        })
        .collect()
}
