pub mod scan;

pub use scan::{ScanOptions, scan_documents, validate_docs_root};

use log::{debug, warn};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The stage of a file operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStep {
    Read,
    Backup,
    WriteTemp,
    Replace,
    Restore,
    Scan,
}

impl fmt::Display for IoStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IoStep::Read => "read",
            IoStep::Backup => "backup",
            IoStep::WriteTemp => "temp file write",
            IoStep::Replace => "atomic replace",
            IoStep::Restore => "restore",
            IoStep::Scan => "scan",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Permission denied during {step} of {path}")]
    PermissionDenied { path: PathBuf, step: IoStep },
    #[error("Encoding error reading file (not valid UTF-8): {0}")]
    Encoding(PathBuf),
    #[error("IO error during {step} of {path}: {source}")]
    Failed {
        path: PathBuf,
        step: IoStep,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid line range {start}-{end} for {path} ({total} lines)")]
    InvalidRange {
        path: PathBuf,
        start: usize,
        end: usize,
        total: usize,
    },
    #[error("Invalid docs root: {0}")]
    InvalidDocsRoot(String),
}

impl IoError {
    fn from_io(path: &Path, step: IoStep, err: std::io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            ErrorKind::NotFound if step == IoStep::Read => IoError::NotFound(path),
            ErrorKind::PermissionDenied => IoError::PermissionDenied { path, step },
            ErrorKind::InvalidData if step == IoStep::Read => IoError::Encoding(path),
            _ => IoError::Failed {
                path,
                step,
                source: err,
            },
        }
    }

    pub fn step(&self) -> Option<IoStep> {
        match self {
            IoError::NotFound(_) | IoError::Encoding(_) => Some(IoStep::Read),
            IoError::PermissionDenied { step, .. } | IoError::Failed { step, .. } => Some(*step),
            IoError::InvalidRange { .. } | IoError::InvalidDocsRoot(_) => None,
        }
    }
}

/// Line-oriented UTF-8 file access with backup-and-replace writes.
///
/// Writes go through a sibling `.tmp` file that is renamed over the target,
/// with a `.bak` copy of the previous contents kept until the rename has
/// succeeded. Not safe for concurrent writers of the same path.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileEditor;

impl FileEditor {
    pub fn new() -> Self {
        Self
    }

    /// Read an entire file as UTF-8.
    pub fn read_file(&self, path: &Path) -> Result<String, IoError> {
        fs::read_to_string(path).map_err(|e| IoError::from_io(path, IoStep::Read, e))
    }

    /// Read lines `start..=end` (1-based), keeping their line endings.
    pub fn read_lines(&self, path: &Path, start: usize, end: usize) -> Result<Vec<String>, IoError> {
        let content = self.read_file(path)?;
        let lines = split_lines(&content);
        check_range(path, start, end, lines.len())?;
        Ok(lines[start - 1..end].iter().map(|l| l.to_string()).collect())
    }

    /// Replace the contents of `path` atomically.
    pub fn write_file(&self, path: &Path, content: &str) -> Result<(), IoError> {
        let mut rollback = Rollback::new(path);

        if path.exists() {
            fs::copy(path, &rollback.backup)
                .map_err(|e| IoError::from_io(path, IoStep::Backup, e))?;
            rollback.backup_created = true;
            debug!("Created backup: {}", rollback.backup.display());
        }

        rollback.temp_pending = true;
        fs::write(&rollback.temp, content)
            .map_err(|e| IoError::from_io(&rollback.temp, IoStep::WriteTemp, e))?;
        debug!("Wrote temp file: {}", rollback.temp.display());

        fs::rename(&rollback.temp, path).map_err(|e| IoError::from_io(path, IoStep::Replace, e))?;
        rollback.temp_pending = false;
        debug!("Replaced {} with temp file", path.display());

        rollback.commit();
        Ok(())
    }

    /// Replace lines `start_line..=end_line` (1-based) with `new_content`.
    ///
    /// `new_content` is inserted verbatim and should carry its own trailing
    /// newline.
    pub fn update_section(
        &self,
        path: &Path,
        start_line: usize,
        end_line: usize,
        new_content: &str,
    ) -> Result<(), IoError> {
        let mut content = self.read_file(path)?;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        let lines = split_lines(&content);
        check_range(path, start_line, end_line, lines.len())?;

        let mut out = lines[..start_line - 1].concat();
        out.push_str(new_content);
        out.push_str(&lines[end_line..].concat());

        self.write_file(path, &out)
    }
}

/// Split text into lines that keep their `\n` terminator.
pub(crate) fn split_lines(content: &str) -> Vec<&str> {
    content.split_inclusive('\n').collect()
}

fn check_range(path: &Path, start: usize, end: usize, total: usize) -> Result<(), IoError> {
    if start < 1 || end < start || end > total {
        return Err(IoError::InvalidRange {
            path: path.to_path_buf(),
            start,
            end,
            total,
        });
    }
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Undoes a partially completed write when dropped before `commit`.
struct Rollback<'a> {
    target: &'a Path,
    backup: PathBuf,
    temp: PathBuf,
    backup_created: bool,
    temp_pending: bool,
    committed: bool,
}

impl<'a> Rollback<'a> {
    fn new(target: &'a Path) -> Self {
        Self {
            target,
            backup: sibling(target, ".bak"),
            temp: sibling(target, ".tmp"),
            backup_created: false,
            temp_pending: false,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
        if self.backup_created {
            match fs::remove_file(&self.backup) {
                Ok(()) => debug!("Deleted backup: {}", self.backup.display()),
                Err(e) => warn!("Could not delete backup {}: {e}", self.backup.display()),
            }
        }
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        if self.temp_pending && self.temp.exists() {
            match fs::remove_file(&self.temp) {
                Ok(()) => debug!("Cleaned up temp file: {}", self.temp.display()),
                Err(e) => warn!("Could not clean up temp file {}: {e}", self.temp.display()),
            }
        }

        if self.backup_created && self.backup.exists() {
            if !self.target.exists() {
                match fs::copy(&self.backup, self.target) {
                    Ok(_) => debug!("Restored {} from backup", self.target.display()),
                    Err(e) => {
                        // Keep the backup, it is the only intact copy left
                        let err = IoError::from_io(self.target, IoStep::Restore, e);
                        warn!("{err}; backup kept at {}", self.backup.display());
                        return;
                    }
                }
            }
            match fs::remove_file(&self.backup) {
                Ok(()) => debug!("Cleaned up backup: {}", self.backup.display()),
                Err(e) => warn!("Could not remove backup {}: {e}", self.backup.display()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_docs_dir, create_test_file};
    use pretty_assertions::assert_eq;

    fn leftovers(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".bak") || n.ends_with(".tmp"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_read_missing_file() {
        let docs = create_test_docs_dir();

        let result = FileEditor::new().read_file(&docs.path().join("missing.adoc"));

        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_read_invalid_utf8_is_encoding_error() {
        let docs = create_test_docs_dir();
        let path = docs.path().join("latin1.adoc");
        fs::write(&path, [0x3d, 0x20, 0xe9, 0xff, 0x0a]).unwrap();

        let result = FileEditor::new().read_file(&path);

        assert!(matches!(result, Err(IoError::Encoding(_))));
    }

    #[test]
    fn test_read_lines_keeps_line_endings() {
        let docs = create_test_docs_dir();
        let path = create_test_file(&docs, "doc.adoc", "one\ntwo\nthree\n");

        let lines = FileEditor::new().read_lines(&path, 2, 3).unwrap();

        assert_eq!(lines, vec!["two\n", "three\n"]);
    }

    #[test]
    fn test_read_lines_rejects_bad_ranges() {
        let docs = create_test_docs_dir();
        let path = create_test_file(&docs, "doc.adoc", "one\ntwo\n");
        let editor = FileEditor::new();

        assert!(matches!(editor.read_lines(&path, 0, 1), Err(IoError::InvalidRange { .. })));
        assert!(matches!(editor.read_lines(&path, 2, 1), Err(IoError::InvalidRange { .. })));
        assert!(matches!(
            editor.read_lines(&path, 1, 3),
            Err(IoError::InvalidRange { total: 2, .. })
        ));
    }

    #[test]
    fn test_write_file_replaces_content_and_cleans_up() {
        // Given an existing file
        let docs = create_test_docs_dir();
        let path = create_test_file(&docs, "doc.adoc", "old\n");

        // When writing new content
        FileEditor::new().write_file(&path, "new\n").unwrap();

        // Then the content is replaced and no backup or temp files remain
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert!(leftovers(docs.path()).is_empty());
    }

    #[test]
    fn test_write_file_creates_new_file() {
        let docs = create_test_docs_dir();
        let path = docs.path().join("fresh.md");

        FileEditor::new().write_file(&path, "# Fresh\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "# Fresh\n");
        assert!(leftovers(docs.path()).is_empty());
    }

    #[test]
    fn test_write_failure_at_backup_step_leaves_no_artifacts() {
        // Given a target that cannot be backed up (a directory)
        let docs = create_test_docs_dir();
        let target = docs.path().join("chapter.adoc");
        fs::create_dir(&target).unwrap();

        // When writing
        let err = FileEditor::new().write_file(&target, "content").unwrap_err();

        // Then the backup step is reported and nothing is left behind
        assert_eq!(err.step(), Some(IoStep::Backup));
        assert!(target.is_dir());
        assert!(leftovers(docs.path()).is_empty());
    }

    #[test]
    fn test_write_failure_at_temp_step_reports_step() {
        let docs = create_test_docs_dir();
        let target = docs.path().join("no-such-dir").join("doc.adoc");

        let err = FileEditor::new().write_file(&target, "content").unwrap_err();

        assert_eq!(err.step(), Some(IoStep::WriteTemp));
        assert!(!target.exists());
    }

    #[test]
    fn test_update_section_splices_inclusive_range() {
        let docs = create_test_docs_dir();
        let path = create_test_file(&docs, "doc.adoc", "a\nb\nc\nd\n");

        FileEditor::new().update_section(&path, 2, 3, "X\nY\nZ\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nX\nY\nZ\nd\n");
    }

    #[test]
    fn test_update_section_last_line_without_newline() {
        let docs = create_test_docs_dir();
        let path = create_test_file(&docs, "doc.adoc", "a\nb\nc");

        FileEditor::new().update_section(&path, 3, 3, "C\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nC\n");
    }

    #[test]
    fn test_update_section_terminates_unterminated_tail() {
        let docs = create_test_docs_dir();
        let path = create_test_file(&docs, "doc.adoc", "a\nb\nc");

        FileEditor::new().update_section(&path, 1, 1, "A\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "A\nb\nc\n");
    }

    #[test]
    fn test_update_section_rejects_range_past_end() {
        let docs = create_test_docs_dir();
        let path = create_test_file(&docs, "doc.adoc", "a\nb\n");

        let result = FileEditor::new().update_section(&path, 2, 5, "X\n");

        assert!(matches!(result, Err(IoError::InvalidRange { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
    }
}
