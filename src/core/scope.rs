use crate::core::source::{RequirementNode, SectionNode};
use std::collections::HashSet;

/// Cell ids that belong to one program.
///
/// An empty scope means the program has no tree, and callers must not filter by it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramScope {
    cells: HashSet<String>,
}

impl ProgramScope {
    pub fn resolve(nodes: &[RequirementNode]) -> Self {
        let cells = nodes
            .iter()
            .filter_map(|node| match node {
                RequirementNode::RequirementGroup(group) => Some(group),
                _ => None,
            })
            .flat_map(|group| group.sections.iter())
            .filter_map(|section| match section {
                SectionNode::Section(body) => Some(body),
                _ => None,
            })
            .flat_map(|body| body.cells())
            .filter(|cell| !cell.id.is_empty())
            .map(|cell| cell.id.clone())
            .collect();
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when the cell belongs to the program, or when there is nothing to filter by.
    pub fn admits(&self, cell_id: &str) -> bool {
        self.cells.is_empty() || self.cells.contains(cell_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::decode_each;
    use serde_json::json;

    #[test]
    fn test_collects_cells_from_sections_only() {
        let nodes: Vec<RequirementNode> = decode_each(&[
            json!({"type": "RequirementTitle", "position": 0, "content": "MATH"}),
            json!({
                "type": "RequirementGroup",
                "groupId": "g1",
                "sections": [
                    {"type": "Section", "rows": [{"cells": [{"id": "a"}, {"id": "b"}]}]},
                    {"type": "SectionHeader", "rows": [{"cells": [{"id": "header-cell"}]}]},
                    {"type": "Section", "rows": [{"cells": [{"id": "c"}, {"id": ""}]}]}
                ]
            }),
        ]);

        let scope = ProgramScope::resolve(&nodes);
        assert_eq!(scope.len(), 3);
        assert!(scope.admits("a"));
        assert!(scope.admits("c"));
        assert!(!scope.admits("header-cell"));
        assert!(!scope.admits("zzz"));
    }

    #[test]
    fn test_empty_scope_admits_everything() {
        let scope = ProgramScope::resolve(&[]);
        assert!(scope.is_empty());
        assert!(scope.admits("anything"));
    }
}
