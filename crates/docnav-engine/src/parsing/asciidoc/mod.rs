//! AsciiDoc parsing.
//!
//! The root file's lines are first expanded through its `include::` directives
//! into one stream where every line remembers its physical origin. A single
//! pass over that stream then builds the section outline and the content
//! elements together.

mod body;
mod includes;

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::{DEFAULT_MAX_INCLUDE_DEPTH, compute_end_lines, empty_document_root, file_prefix};
use crate::error::Result;
use crate::io::FileEditor;
use crate::models::{CrossReference, Document, DocumentFormat, XrefKind};
use includes::SourceLine;

pub(crate) static SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(={1,6})\s+(.+?)(?:\s+=*)?$").expect("Invalid section heading regex")
});
static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([a-zA-Z0-9_-]+):\s*(.*)$").expect("Invalid attribute regex"));
static XREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<<([^,>]+)(?:,([^>]+))?>>").expect("Invalid xref regex"));
static XREF_MACRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"xref:([^\[\s]+)\[([^\]]*)\]").expect("Invalid xref macro regex"));

#[derive(Debug, Clone)]
pub struct AsciidocParser {
    base_path: PathBuf,
    max_include_depth: usize,
}

impl AsciidocParser {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn parse_file(&self, path: &Path) -> Result<Document> {
        let content = FileEditor::new().read_file(path)?;
        let root_lines: Vec<String> = content.lines().map(str::to_string).collect();

        let attributes = parse_attributes(&root_lines);
        let expansion = includes::expand(path, root_lines, self.max_include_depth)?;
        let prefix = file_prefix(path, &self.base_path);

        let mut document = Document::new(path, DocumentFormat::Asciidoc);
        document.cross_references = cross_references(&expansion.lines);
        document.includes = expansion.includes;

        if expansion.lines.iter().all(|line| line.text.trim().is_empty()) {
            let root = empty_document_root(path, &prefix);
            document.title = root.title.clone();
            document.sections = vec![root];
            document.attributes = attributes;
            return Ok(document);
        }

        let body = body::scan(&expansion.lines, &prefix, &attributes, &expansion.last_lines);
        let mut sections = body.sections;
        compute_end_lines(&mut sections, &expansion.last_lines);

        log::debug!(
            "Parsed {}: {} top-level sections, {} elements",
            path.display(),
            sections.len(),
            body.elements.len()
        );

        document.title = body.title.unwrap_or_default();
        document.sections = sections;
        document.elements = body.elements;
        document.parse_warnings = body.warnings;
        document.attributes = attributes;
        Ok(document)
    }
}

/// `:name: value` lines of the root file up to its first heading.
fn parse_attributes(lines: &[String]) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    for line in lines {
        if let Some(caps) = ATTRIBUTE.captures(line) {
            attributes.insert(caps[1].to_string(), caps[2].trim().to_string());
        } else if SECTION.is_match(line) {
            break;
        }
    }
    attributes
}

/// Replace `{name}` references, one literal pass per attribute.
pub(crate) fn substitute_attributes(text: &str, attributes: &BTreeMap<String, String>) -> String {
    let mut result = text.to_string();
    for (name, value) in attributes {
        result = result.replace(&format!("{{{name}}}"), value);
    }
    result
}

fn cross_references(lines: &[SourceLine]) -> Vec<CrossReference> {
    let mut references = Vec::new();
    for line in lines {
        for caps in XREF.captures_iter(&line.text) {
            references.push(CrossReference {
                kind: XrefKind::Internal,
                target: caps[1].trim().to_string(),
                text: caps.get(2).map(|m| m.as_str().trim().to_string()),
                source_location: line.location(),
            });
        }
        for caps in XREF_MACRO.captures_iter(&line.text) {
            let text = caps[2].trim();
            references.push(CrossReference {
                kind: XrefKind::External,
                target: caps[1].to_string(),
                text: (!text.is_empty()).then(|| text.to_string()),
                source_location: line.location(),
            });
        }
    }
    references
}
