use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::Result;
use crate::index::StructureIndex;
use crate::io::{ScanOptions, scan_documents};
use crate::models::WarningKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    OrphanedFile,
    UnclosedBlock,
    UnclosedTable,
    DuplicatePath,
    CircularInclude,
    UnresolvedInclude,
}

impl From<WarningKind> for IssueKind {
    fn from(kind: WarningKind) -> Self {
        match kind {
            WarningKind::UnclosedBlock => IssueKind::UnclosedBlock,
            WarningKind::UnclosedTable => IssueKind::UnclosedTable,
            WarningKind::OrphanedFile => IssueKind::OrphanedFile,
            WarningKind::DuplicatePath => IssueKind::DuplicatePath,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub validation_time_ms: u128,
}

/// Check the indexed corpus against what is on disk.
///
/// `build_errors` are the include failures collected while the index was
/// built; any of them makes the report invalid. Orphaned files and parse
/// warnings only ever produce warnings.
pub fn validate_structure(
    index: &StructureIndex,
    docs_root: &Path,
    scan: &ScanOptions,
    build_errors: &[ValidationIssue],
) -> Result<ValidationReport> {
    let started = Instant::now();
    let mut warnings = Vec::new();

    let indexed: HashSet<PathBuf> = index.indexed_files().into_iter().map(canonical).collect();
    for file in scan_documents(docs_root, scan)? {
        let file = canonical(&file);
        if !indexed.contains(&file) {
            warnings.push(ValidationIssue {
                kind: IssueKind::OrphanedFile,
                path: relative_display(&file, docs_root),
                message: "File is not included in any document".to_string(),
            });
        }
    }

    for document in index.documents() {
        for warning in &document.parse_warnings {
            warnings.push(ValidationIssue {
                kind: warning.kind.into(),
                path: format!("{}:{}", relative_display(&warning.file, docs_root), warning.line),
                message: warning.message.clone(),
            });
        }
    }

    let errors = build_errors.to_vec();
    Ok(ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
        validation_time_ms: started.elapsed().as_millis(),
    })
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// `path` relative to `root` for reports, or as given when outside it.
pub(crate) fn relative_display(path: &Path, root: &Path) -> String {
    let path = canonical(path);
    path.strip_prefix(canonical(root)).unwrap_or(&path).display().to_string()
}
