use std::path::PathBuf;

use crate::io::IoError;

/// Errors returned by parsing, querying and editing operations.
///
/// Problems that should not abort a build are reported as
/// [`crate::models::ParseWarning`] values instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Section '{path}' not found")]
    NotFound {
        path: String,
        suggestions: Vec<String>,
    },

    #[error(
        "Circular include detected: {} is already in the include chain {}",
        .file.display(),
        display_chain(.chain)
    )]
    CircularInclude { file: PathBuf, chain: Vec<PathBuf> },

    #[error(transparent)]
    Io(IoError),

    #[error("Hash conflict: expected {expected}, current content hash is {current_hash}")]
    Conflict {
        expected: String,
        current_hash: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Invalid position '{0}'. Use 'before', 'after', or 'append'.")]
    InvalidPosition(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// True for both an unknown section path and a missing file on disk.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::Io(IoError::NotFound(_)))
    }

    pub fn current_hash(&self) -> Option<&str> {
        match self {
            Error::Conflict { current_hash, .. } => Some(current_hash),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        // A bad line range is a caller mistake, not a file system failure
        match err {
            IoError::InvalidRange { .. } => Error::Validation(err.to_string()),
            other => Error::Io(other),
        }
    }
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::IoStep;

    #[test]
    fn test_invalid_range_becomes_validation_error() {
        let err: Error = IoError::InvalidRange {
            path: PathBuf::from("doc.adoc"),
            start: 5,
            end: 2,
            total: 10,
        }
        .into();

        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("doc.adoc"));
    }

    #[test]
    fn test_io_errors_keep_their_step() {
        let err: Error = IoError::PermissionDenied {
            path: PathBuf::from("doc.adoc"),
            step: IoStep::WriteTemp,
        }
        .into();

        assert!(matches!(
            err,
            Error::Io(IoError::PermissionDenied {
                step: IoStep::WriteTemp,
                ..
            })
        ));
    }

    #[test]
    fn test_not_found_covers_missing_files() {
        let missing: Error = IoError::NotFound(PathBuf::from("gone.adoc")).into();
        let unknown = Error::NotFound {
            path: "guide:nope".to_string(),
            suggestions: vec![],
        };

        assert!(missing.is_not_found());
        assert!(unknown.is_not_found());
        assert!(!Error::Validation("x".to_string()).is_not_found());
    }

    #[test]
    fn test_circular_include_message_lists_chain() {
        let err = Error::CircularInclude {
            file: PathBuf::from("/docs/a.adoc"),
            chain: vec![PathBuf::from("/docs/a.adoc"), PathBuf::from("/docs/b.adoc")],
        };

        assert_eq!(
            err.to_string(),
            "Circular include detected: /docs/a.adoc is already in the include chain /docs/a.adoc -> /docs/b.adoc"
        );
    }

    #[test]
    fn test_conflict_exposes_current_hash() {
        let err = Error::Conflict {
            expected: "deadbeef".to_string(),
            current_hash: "abc12345".to_string(),
        };

        assert_eq!(err.current_hash(), Some("abc12345"));
    }
}
