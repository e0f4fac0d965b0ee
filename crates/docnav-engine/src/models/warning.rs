use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnclosedBlock,
    UnclosedTable,
    OrphanedFile,
    DuplicatePath,
}

/// A non-fatal problem found while parsing or validating a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseWarning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

impl ParseWarning {
    pub fn new(kind: WarningKind, file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.message)
    }
}
