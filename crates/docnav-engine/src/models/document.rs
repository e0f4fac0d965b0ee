use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{CrossReference, Element, ParseWarning, Section, SourceLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Asciidoc,
    Markdown,
}

impl DocumentFormat {
    /// Format implied by a file extension, if it is one we parse.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "adoc" | "asciidoc" => Some(DocumentFormat::Asciidoc),
            "md" | "markdown" => Some(DocumentFormat::Markdown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Asciidoc => "asciidoc",
            DocumentFormat::Markdown => "markdown",
        }
    }

    /// Heading marker for a section at `level`, e.g. `===` or `##`.
    pub fn heading_marker(&self, level: usize) -> String {
        match self {
            DocumentFormat::Asciidoc => "=".repeat(level + 1),
            DocumentFormat::Markdown => "#".repeat(level.max(1)),
        }
    }
}

/// An `include::target[options]` directive that was expanded (or attempted).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncludeInfo {
    pub source_location: SourceLocation,
    pub target_path: PathBuf,
    pub options: BTreeMap<String, String>,
    /// False when the target did not exist and contributed no lines.
    pub resolved: bool,
}

/// Parse output for one root file, including everything it includes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub file_path: PathBuf,
    pub format: DocumentFormat,
    pub title: String,
    pub sections: Vec<Section>,
    pub elements: Vec<Element>,
    pub attributes: BTreeMap<String, String>,
    pub cross_references: Vec<CrossReference>,
    pub includes: Vec<IncludeInfo>,
    #[serde(skip_serializing_if = "serde_yaml::Mapping::is_empty")]
    pub frontmatter: serde_yaml::Mapping,
    pub parse_warnings: Vec<ParseWarning>,
}

impl Document {
    pub fn new(file_path: impl Into<PathBuf>, format: DocumentFormat) -> Self {
        Self {
            file_path: file_path.into(),
            format,
            title: String::new(),
            sections: Vec::new(),
            elements: Vec::new(),
            attributes: BTreeMap::new(),
            cross_references: Vec::new(),
            includes: Vec::new(),
            frontmatter: serde_yaml::Mapping::new(),
            parse_warnings: Vec::new(),
        }
    }

    /// Every section of the document in pre-order.
    pub fn all_sections(&self) -> Vec<&Section> {
        self.sections
            .iter()
            .flat_map(|root| std::iter::once(root).chain(root.descendants()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("guide.adoc", Some(DocumentFormat::Asciidoc))]
    #[case("guide.AsciiDoc", Some(DocumentFormat::Asciidoc))]
    #[case("notes/readme.md", Some(DocumentFormat::Markdown))]
    #[case("notes.markdown", Some(DocumentFormat::Markdown))]
    #[case("image.png", None)]
    #[case("Makefile", None)]
    fn test_format_from_path(#[case] path: &str, #[case] expected: Option<DocumentFormat>) {
        assert_eq!(DocumentFormat::from_path(Path::new(path)), expected);
    }

    #[rstest]
    #[case(DocumentFormat::Asciidoc, 0, "=")]
    #[case(DocumentFormat::Asciidoc, 2, "===")]
    #[case(DocumentFormat::Markdown, 0, "#")]
    #[case(DocumentFormat::Markdown, 3, "###")]
    fn test_heading_marker(#[case] format: DocumentFormat, #[case] level: usize, #[case] expected: &str) {
        assert_eq!(format.heading_marker(level), expected);
    }

    #[test]
    fn test_all_sections_flattens_tree() {
        let mut doc = Document::new("doc.adoc", DocumentFormat::Asciidoc);
        let mut root = Section::new("Doc", 0, "doc", SourceLocation::new("doc.adoc", 1));
        let mut a = Section::new("A", 1, "doc:a", SourceLocation::new("doc.adoc", 3));
        a.children
            .push(Section::new("B", 2, "doc:a.b", SourceLocation::new("doc.adoc", 5)));
        root.children.push(a);
        root.children
            .push(Section::new("C", 1, "doc:c", SourceLocation::new("doc.adoc", 7)));
        doc.sections.push(root);

        let paths: Vec<&str> = doc.all_sections().iter().map(|s| s.path.as_str()).collect();

        assert_eq!(paths, vec!["doc", "doc:a", "doc:a.b", "doc:c"]);
    }
}
