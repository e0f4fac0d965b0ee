//! Discovery of document files below a docs root.

use glob::Pattern;
use log::warn;
use relative_path::RelativePathBuf;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{IoError, IoStep};
use crate::models::DocumentFormat;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Skip paths matched by the root `.gitignore`.
    pub respect_gitignore: bool,
    /// Descend into dot-directories and pick up dot-files.
    pub include_hidden: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            include_hidden: false,
        }
    }
}

/// Find every AsciiDoc and Markdown file under `root`, sorted by path.
pub fn scan_documents(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, IoError> {
    validate_docs_root(root)?;

    let ignore = if options.respect_gitignore {
        GitIgnore::load(root)
    } else {
        GitIgnore::default()
    };

    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || ((options.include_hidden || !is_hidden(entry))
                    && !ignore.is_ignored(root, entry))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            match e.into_io_error() {
                Some(source) => IoError::from_io(&path, IoStep::Scan, source),
                None => IoError::InvalidDocsRoot(format!(
                    "filesystem loop detected below {}",
                    path.display()
                )),
            }
        })?;
        if entry.file_type().is_file() && DocumentFormat::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

pub fn validate_docs_root(path: &Path) -> Result<(), IoError> {
    if !path.is_dir() {
        return Err(IoError::InvalidDocsRoot(format!(
            "{} is not an existing directory",
            path.display()
        )));
    }
    Ok(())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// The subset of `.gitignore` syntax we honour: glob patterns, optional
/// leading `/` anchoring and trailing `/` for directories. Negations are
/// ignored.
#[derive(Debug, Default)]
struct GitIgnore {
    rules: Vec<IgnoreRule>,
}

#[derive(Debug)]
struct IgnoreRule {
    pattern: Pattern,
    anchored: bool,
    dir_only: bool,
}

impl GitIgnore {
    fn load(root: &Path) -> Self {
        let path = root.join(".gitignore");
        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    fn parse(content: &str) -> Self {
        let mut rules = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let dir_only = line.ends_with('/');
            let line = line.trim_end_matches('/');
            let anchored = line.contains('/');
            let line = line.trim_start_matches('/');
            match Pattern::new(line) {
                Ok(pattern) => rules.push(IgnoreRule {
                    pattern,
                    anchored,
                    dir_only,
                }),
                Err(e) => warn!("Ignoring invalid .gitignore pattern '{line}': {e}"),
            }
        }
        Self { rules }
    }

    fn is_ignored(&self, root: &Path, entry: &DirEntry) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            return false;
        };
        let Ok(relative) = RelativePathBuf::from_path(relative) else {
            return false;
        };
        self.matches(relative.as_str(), entry.file_type().is_dir())
    }

    fn matches(&self, relative: &str, is_dir: bool) -> bool {
        let name = relative.rsplit('/').next().unwrap_or(relative);
        self.rules.iter().any(|rule| {
            if rule.dir_only && !is_dir {
                return false;
            }
            if rule.anchored {
                rule.pattern.matches(relative)
            } else {
                rule.pattern.matches(name)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_docs_dir, create_test_file};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                RelativePathBuf::from_path(f.strip_prefix(root).unwrap())
                    .unwrap()
                    .into_string()
            })
            .collect()
    }

    #[test]
    fn test_scan_finds_both_formats_recursively() {
        // Given a docs tree with mixed files
        let docs = create_test_docs_dir();
        create_test_file(&docs, "index.adoc", "= Index");
        create_test_file(&docs, "chapters/intro.adoc", "== Intro");
        create_test_file(&docs, "notes/todo.md", "# Todo");
        create_test_file(&docs, "notes/image.png", "");

        // When scanning
        let files = scan_documents(docs.path(), &ScanOptions::default()).unwrap();

        // Then only document files are returned, sorted
        assert_eq!(
            names(docs.path(), &files),
            vec!["chapters/intro.adoc", "index.adoc", "notes/todo.md"]
        );
    }

    #[test]
    fn test_scan_skips_hidden_directories() {
        let docs = create_test_docs_dir();
        create_test_file(&docs, "visible.md", "# Visible");
        create_test_file(&docs, ".git/notes.md", "# Hidden");
        create_test_file(&docs, ".cache/doc.adoc", "= Hidden");

        let files = scan_documents(docs.path(), &ScanOptions::default()).unwrap();
        assert_eq!(names(docs.path(), &files), vec!["visible.md"]);

        let options = ScanOptions {
            include_hidden: true,
            ..ScanOptions::default()
        };
        let files = scan_documents(docs.path(), &options).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_scan_respects_gitignore() {
        let docs = create_test_docs_dir();
        create_test_file(&docs, ".gitignore", "# build output\nbuild/\n*.draft.md\n/generated/*.adoc\n");
        create_test_file(&docs, "keep.md", "# Keep");
        create_test_file(&docs, "idea.draft.md", "# Draft");
        create_test_file(&docs, "build/out.adoc", "= Out");
        create_test_file(&docs, "generated/api.adoc", "= Api");
        create_test_file(&docs, "sub/generated/api.adoc", "= Kept");

        let files = scan_documents(docs.path(), &ScanOptions::default()).unwrap();
        assert_eq!(
            names(docs.path(), &files),
            vec!["keep.md", "sub/generated/api.adoc"]
        );

        let options = ScanOptions {
            respect_gitignore: false,
            ..ScanOptions::default()
        };
        assert_eq!(scan_documents(docs.path(), &options).unwrap().len(), 5);
    }

    #[test]
    fn test_scan_invalid_root() {
        let result = scan_documents(Path::new("/this/path/does/not/exist"), &ScanOptions::default());

        assert!(matches!(result, Err(IoError::InvalidDocsRoot(_))));
    }

    #[rstest]
    #[case("target/", "target", true, true)]
    #[case("target/", "target", false, false)]
    #[case("*.log", "deep/dir/run.log", false, true)]
    #[case("/docs/*.md", "docs/a.md", false, true)]
    #[case("/docs/*.md", "other/docs/a.md", false, false)]
    #[case("!keep.md", "keep.md", false, false)]
    fn test_gitignore_rules(
        #[case] rules: &str,
        #[case] path: &str,
        #[case] is_dir: bool,
        #[case] ignored: bool,
    ) {
        assert_eq!(GitIgnore::parse(rules).matches(path, is_dir), ignored);
    }
}
