//! `include::target[options]` expansion with per-line provenance.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::io::FileEditor;
use crate::models::{IncludeInfo, SourceLocation};

static INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^include::(.+?)\[(.*)\]$").expect("Invalid include regex"));

/// One physical line of the expanded stream.
#[derive(Debug, Clone)]
pub(crate) struct SourceLine {
    pub text: String,
    pub file: PathBuf,
    pub line: usize,
    /// Outermost include directive this line arrived through.
    pub resolved_from: Option<SourceLocation>,
}

impl SourceLine {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.file.clone(), self.line).with_resolved_from(self.resolved_from.clone())
    }
}

#[derive(Debug, Default)]
pub(crate) struct Expansion {
    pub lines: Vec<SourceLine>,
    pub includes: Vec<IncludeInfo>,
    /// Physical line count of every file that contributed lines.
    pub last_lines: HashMap<PathBuf, usize>,
}

/// A file whose lines are being emitted.
struct Frame {
    file: PathBuf,
    canonical: PathBuf,
    lines: Vec<String>,
    next: usize,
    depth: usize,
    resolved_from: Option<SourceLocation>,
}

/// Expand includes depth-first starting at `root`.
///
/// Runs on an explicit frame stack bounded by `max_depth`; directives found
/// at the depth limit are kept as literal lines. A target that is already
/// being expanded higher up the stack is a cycle and fails the whole parse.
pub(crate) fn expand(root: &Path, root_lines: Vec<String>, max_depth: usize) -> Result<Expansion> {
    let editor = FileEditor::new();
    let mut expansion = Expansion::default();
    expansion.last_lines.insert(root.to_path_buf(), root_lines.len());

    let mut stack = vec![Frame {
        file: root.to_path_buf(),
        canonical: resolve(root),
        lines: root_lines,
        next: 0,
        depth: 0,
        resolved_from: None,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(slot) = frame.lines.get_mut(frame.next) else {
            stack.pop();
            continue;
        };
        let text = std::mem::take(slot);
        frame.next += 1;
        let line = frame.next;

        let directive = (frame.depth < max_depth)
            .then(|| INCLUDE.captures(&text))
            .flatten()
            .map(|caps| (caps[1].trim().to_string(), parse_options(&caps[2])));

        let Some((target, options)) = directive else {
            expansion.lines.push(SourceLine {
                text,
                file: frame.file.clone(),
                line,
                resolved_from: frame.resolved_from.clone(),
            });
            continue;
        };

        let site = SourceLocation::new(frame.file.clone(), line);
        let target_path = resolve(&frame.file.parent().unwrap_or(Path::new("")).join(&target));
        let depth = frame.depth + 1;
        let resolved_from = frame.resolved_from.clone().unwrap_or_else(|| site.clone());

        if stack.iter().any(|f| f.canonical == target_path) {
            return Err(Error::CircularInclude {
                file: target_path,
                chain: stack.iter().map(|f| f.canonical.clone()).collect(),
            });
        }

        let resolved = target_path.is_file();
        expansion.includes.push(IncludeInfo {
            source_location: site,
            target_path: target_path.clone(),
            options,
            resolved,
        });
        if !resolved {
            continue;
        }

        let content = editor.read_file(&target_path)?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        expansion.last_lines.insert(target_path.clone(), lines.len());
        stack.push(Frame {
            file: target_path.clone(),
            canonical: target_path,
            lines,
            next: 0,
            depth,
            resolved_from: Some(resolved_from),
        });
    }

    Ok(expansion)
}

/// `key=value` pairs separated by commas; entries without `=` are dropped.
fn parse_options(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|opt| opt.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn resolve(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_docs_dir, create_test_file};
    use pretty_assertions::assert_eq;

    fn expand_file(path: &Path, max_depth: usize) -> Result<Expansion> {
        let content = std::fs::read_to_string(path).unwrap();
        expand(path, content.lines().map(str::to_string).collect(), max_depth)
    }

    fn texts(expansion: &Expansion) -> Vec<&str> {
        expansion.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_include_lines_replace_directive() {
        // Given a root including a chapter
        let docs = create_test_docs_dir();
        let root = create_test_file(&docs, "main.adoc", "= Main\ninclude::chapter.adoc[]\nafter\n");
        create_test_file(&docs, "chapter.adoc", "== Chapter\nbody\n");

        // When expanding
        let expansion = expand_file(&root, 20).unwrap();

        // Then the chapter lines sit where the directive was
        assert_eq!(texts(&expansion), vec!["= Main", "== Chapter", "body", "after"]);
        let chapter = &expansion.lines[1];
        assert_eq!(chapter.line, 1);
        assert!(chapter.file.ends_with("chapter.adoc"));
        let site = chapter.resolved_from.as_ref().unwrap();
        assert_eq!((site.file.as_path(), site.line), (root.as_path(), 2));
        assert_eq!(expansion.lines[3].line, 3);
        assert!(expansion.lines[3].resolved_from.is_none());
    }

    #[test]
    fn test_nested_includes_keep_outermost_site() {
        let docs = create_test_docs_dir();
        let root = create_test_file(&docs, "main.adoc", "= Main\n\ninclude::parts/a.adoc[]\n");
        create_test_file(&docs, "parts/a.adoc", "== A\ninclude::b.adoc[]\n");
        create_test_file(&docs, "parts/b.adoc", "=== B\n");

        let expansion = expand_file(&root, 20).unwrap();

        let b = expansion.lines.iter().find(|l| l.text == "=== B").unwrap();
        let site = b.resolved_from.as_ref().unwrap();
        assert_eq!(site.file, root);
        assert_eq!(site.line, 3);
        assert_eq!(expansion.includes.len(), 2);
    }

    #[test]
    fn test_missing_include_is_recorded_without_lines() {
        let docs = create_test_docs_dir();
        let root = create_test_file(&docs, "main.adoc", "= Main\ninclude::missing.adoc[leveloffset=+1, lines=1..5]\nend\n");

        let expansion = expand_file(&root, 20).unwrap();

        assert_eq!(texts(&expansion), vec!["= Main", "end"]);
        let include = &expansion.includes[0];
        assert!(!include.resolved);
        assert!(include.target_path.ends_with("missing.adoc"));
        assert_eq!(include.options.get("leveloffset").map(String::as_str), Some("+1"));
        assert_eq!(include.options.get("lines").map(String::as_str), Some("1..5"));
    }

    #[test]
    fn test_self_include_is_a_cycle() {
        let docs = create_test_docs_dir();
        let root = create_test_file(&docs, "loop.adoc", "= Loop\ninclude::loop.adoc[]\n");

        let result = expand_file(&root, 20);

        assert!(matches!(result, Err(Error::CircularInclude { .. })));
    }

    #[test]
    fn test_cycle_reports_full_chain() {
        let docs = create_test_docs_dir();
        let a = create_test_file(&docs, "a.adoc", "= A\ninclude::b.adoc[]\n");
        create_test_file(&docs, "b.adoc", "== B\ninclude::c.adoc[]\n");
        create_test_file(&docs, "c.adoc", "=== C\ninclude::a.adoc[]\n");

        let Err(Error::CircularInclude { file, chain }) = expand_file(&a, 20) else {
            panic!("expected a circular include error");
        };

        let names: Vec<String> = chain
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.adoc", "b.adoc", "c.adoc"]);
        assert!(file.ends_with("a.adoc"));
    }

    #[test]
    fn test_depth_limit_keeps_directive_literally() {
        let docs = create_test_docs_dir();
        let root = create_test_file(&docs, "main.adoc", "include::one.adoc[]\n");
        create_test_file(&docs, "one.adoc", "one\ninclude::two.adoc[]\n");
        create_test_file(&docs, "two.adoc", "two\n");

        let expansion = expand_file(&root, 1).unwrap();

        assert_eq!(texts(&expansion), vec!["one", "include::two.adoc[]"]);
    }

    #[test]
    fn test_last_lines_counts_physical_lines() {
        let docs = create_test_docs_dir();
        let root = create_test_file(&docs, "main.adoc", "= Main\ninclude::part.adoc[]\n");
        let part = create_test_file(&docs, "part.adoc", "a\nb\nc\n");

        let expansion = expand_file(&root, 20).unwrap();

        assert_eq!(expansion.last_lines.get(&root), Some(&2));
        assert_eq!(expansion.last_lines.get(&part.canonicalize().unwrap()), Some(&3));
    }
}
