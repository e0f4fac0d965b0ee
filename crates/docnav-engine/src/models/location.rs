use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where a piece of parsed structure physically lives on disk.
///
/// `line` and `end_line` are 1-based and inclusive. `resolved_from` is only
/// set when the content arrived through an include directive, and then points
/// at the outermost directive of the include chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_from: Option<Box<SourceLocation>>,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
            end_line: None,
            resolved_from: None,
        }
    }

    pub fn with_end_line(mut self, end_line: usize) -> Self {
        self.end_line = Some(end_line);
        self
    }

    pub fn with_resolved_from(mut self, site: Option<SourceLocation>) -> Self {
        self.resolved_from = site.map(Box::new);
        self
    }

    pub fn is_in(&self, file: &Path) -> bool {
        self.file == file
    }
}
