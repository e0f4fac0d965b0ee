use serde::Serialize;
use std::path::PathBuf;

use super::{StructureIndex, resolve};
use crate::models::Section;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLocation {
    pub file: PathBuf,
    pub line: usize,
    pub end_line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureNode {
    pub path: String,
    pub title: String,
    pub level: usize,
    pub location: NodeLocation,
    pub children: Vec<StructureNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Structure {
    pub sections: Vec<StructureNode>,
    pub total_sections: usize,
}

impl StructureIndex {
    /// The document outline, cut off below `max_depth` levels when given.
    ///
    /// Top-level sections are depth 1; nodes at `max_depth` keep an empty
    /// `children` list.
    pub fn get_structure(&self, max_depth: Option<usize>) -> Structure {
        let sections = self
            .top_level
            .iter()
            .map(|address| node(resolve(&self.documents, address), max_depth, 1))
            .collect();
        Structure {
            sections,
            total_sections: self.sections.len(),
        }
    }
}

// Nesting is bounded by the six heading levels, so plain recursion is fine.
fn node(section: &Section, max_depth: Option<usize>, depth: usize) -> StructureNode {
    let children = if max_depth.is_none_or(|max| depth < max) {
        section
            .children
            .iter()
            .map(|child| node(child, max_depth, depth + 1))
            .collect()
    } else {
        Vec::new()
    };

    StructureNode {
        path: section.path.clone(),
        title: section.title.clone(),
        level: section.level,
        location: NodeLocation {
            file: section.source_location.file.clone(),
            line: section.source_location.line,
            end_line: section.source_location.end_line,
        },
        children,
    }
}
