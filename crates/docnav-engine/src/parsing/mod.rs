//! Format parsers turning files on disk into [`Document`]s.
//!
//! Both formats share the same outline machinery: headings are fed to an
//! [`OutlineBuilder`] in document order, which nests them with an explicit
//! ancestor stack and allocates their paths, and [`compute_end_lines`] then
//! closes every section's line range per physical file.

pub mod asciidoc;
pub mod markdown;
mod outline;
mod slug;

pub use asciidoc::AsciidocParser;
pub use markdown::MarkdownParser;
pub use outline::{OutlineBuilder, PathAllocator, child_path, compute_end_lines};
pub use slug::slugify;

use relative_path::RelativePathBuf;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{Document, DocumentFormat, Section, SourceLocation};

pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 20;

/// Parses any supported document, picking the format from the extension.
#[derive(Debug, Clone)]
pub struct DocumentParser {
    asciidoc: AsciidocParser,
    markdown: MarkdownParser,
}

impl DocumentParser {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        Self {
            asciidoc: AsciidocParser::new(base_path.clone()),
            markdown: MarkdownParser::new(base_path),
        }
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.asciidoc = self.asciidoc.with_max_include_depth(depth);
        self
    }

    pub fn parse_file(&self, path: &Path) -> Result<Document> {
        match DocumentFormat::from_path(path) {
            Some(DocumentFormat::Asciidoc) => self.asciidoc.parse_file(path),
            Some(DocumentFormat::Markdown) => self.markdown.parse_file(path),
            None => Err(Error::Validation(format!(
                "Unsupported document format: {}",
                path.display()
            ))),
        }
    }
}

/// Base-relative path without extension, using `/` separators.
///
/// Files outside `base_path` fall back to their file stem.
pub fn file_prefix(path: &Path, base_path: &Path) -> String {
    relative_prefix(path, base_path)
        .or_else(|| {
            let path = path.canonicalize().ok()?;
            let base = base_path.canonicalize().ok()?;
            relative_prefix(&path, &base)
        })
        .unwrap_or_else(|| file_stem(path))
}

fn relative_prefix(path: &Path, base_path: &Path) -> Option<String> {
    let relative = RelativePathBuf::from_path(path.strip_prefix(base_path).ok()?).ok()?;
    let text = relative.as_str();
    if text.is_empty() {
        return None;
    }
    Some(match relative.extension() {
        Some(ext) => text[..text.len() - ext.len() - 1].to_string(),
        None => text.to_string(),
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The single root section standing in for a document with no content.
pub(crate) fn empty_document_root(path: &Path, prefix: &str) -> Section {
    Section::new(
        file_stem(path),
        0,
        prefix,
        SourceLocation::new(path, 1).with_end_line(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_docs_dir, create_test_file};
    use rstest::rstest;

    #[rstest]
    #[case("/docs/guide.adoc", "/docs", "guide")]
    #[case("/docs/chapters/01_intro.adoc", "/docs", "chapters/01_intro")]
    #[case("/docs/notes/todo.md", "/docs/", "notes/todo")]
    #[case("/elsewhere/api.md", "/docs", "api")]
    #[case("/docs/archive.tar.md", "/docs", "archive.tar")]
    fn test_file_prefix(#[case] path: &str, #[case] base: &str, #[case] expected: &str) {
        assert_eq!(file_prefix(Path::new(path), Path::new(base)), expected);
    }

    #[test]
    fn test_parse_file_dispatches_on_extension() {
        let docs = create_test_docs_dir();
        let adoc = create_test_file(&docs, "guide.adoc", "= Guide\n\n== Intro\n");
        let md = create_test_file(&docs, "notes.md", "# Notes\n\n## Todo\n");
        let parser = DocumentParser::new(docs.path());

        let adoc = parser.parse_file(&adoc).unwrap();
        let md = parser.parse_file(&md).unwrap();

        assert_eq!(adoc.format, DocumentFormat::Asciidoc);
        assert_eq!(adoc.sections[0].children[0].path, "guide:intro");
        assert_eq!(md.format, DocumentFormat::Markdown);
        assert_eq!(md.sections[0].children[0].path, "notes:todo");
    }

    #[test]
    fn test_parse_file_rejects_unknown_extension() {
        let docs = create_test_docs_dir();
        let txt = create_test_file(&docs, "notes.txt", "plain");

        let result = DocumentParser::new(docs.path()).parse_file(&txt);

        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
