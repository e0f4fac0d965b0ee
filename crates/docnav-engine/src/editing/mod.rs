//! Section-level writes: resolve a path through the index, splice the file
//! through the [`FileEditor`].
//!
//! Both operations leave the index stale. Callers rebuild it before trusting
//! any further read.

pub mod hash;

pub use hash::content_hash;

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::index::StructureIndex;
use crate::io::{FileEditor, split_lines};
use crate::models::{DocumentFormat, Section};

const MAX_SUGGESTIONS: usize = 5;

static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:={1,6}|#{1,6})\s+\S").expect("Invalid heading line regex"));

/// Where [`insert_content`] places new text relative to a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Directly above the section heading.
    Before,
    /// After the section and all of its descendants, as a sibling.
    After,
    /// At the end of the section's own text, ahead of its first child.
    Append,
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "before" => Ok(Position::Before),
            "after" => Ok(Position::After),
            "append" => Ok(Position::Append),
            _ => Err(Error::InvalidPosition(s.to_string())),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Position::Before => "before",
            Position::After => "after",
            Position::Append => "append",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditLocation {
    pub file: PathBuf,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateOutcome {
    pub path: String,
    pub location: EditLocation,
    pub previous_hash: String,
    pub new_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertOutcome {
    pub inserted_at: EditLocation,
    pub previous_hash: String,
    pub new_hash: String,
}

/// Replace a section's lines with `content`.
///
/// With `preserve_title` the section keeps its current heading and any
/// heading line leading `content` is dropped. Without it, `content` must
/// bring its own heading. A mismatching `expected_hash` fails with
/// [`Error::Conflict`] before anything is written.
pub fn update_section(
    index: &StructureIndex,
    editor: &FileEditor,
    path: &str,
    content: &str,
    preserve_title: bool,
    expected_hash: Option<&str>,
) -> Result<UpdateOutcome> {
    let (path, section) = find_section(index, path)?;
    let file = &section.source_location.file;
    let start = section.source_location.line;

    let current = editor.read_file(file)?;
    let lines = split_lines(&current);
    let end = section.source_location.end_line.unwrap_or(lines.len());
    let previous_hash = content_hash(&lines[(start - 1).min(lines.len())..end.min(lines.len())].concat());

    if let Some(expected) = expected_hash
        && expected != previous_hash
    {
        return Err(Error::Conflict {
            expected: expected.to_string(),
            current_hash: previous_hash,
        });
    }

    let mut new_content = if preserve_title {
        let format = DocumentFormat::from_path(file).unwrap_or(DocumentFormat::Markdown);
        format!(
            "{} {}\n\n{}",
            format.heading_marker(section.level),
            section.title,
            strip_heading(content)
        )
    } else if starts_with_heading(content) {
        content.to_string()
    } else {
        return Err(Error::Validation(
            "Content must include a section title when preserve_title is false".to_string(),
        ));
    };
    if !new_content.ends_with('\n') {
        new_content.push('\n');
    }

    editor.update_section(file, start, end, &new_content)?;

    Ok(UpdateOutcome {
        path,
        location: EditLocation {
            file: file.clone(),
            line: start,
        },
        previous_hash,
        new_hash: content_hash(&new_content),
    })
}

/// Insert `content` next to a section without disturbing the outline.
///
/// The hashes in the outcome cover the whole file.
pub fn insert_content(
    index: &StructureIndex,
    editor: &FileEditor,
    path: &str,
    position: Position,
    content: &str,
) -> Result<InsertOutcome> {
    let (_, section) = find_section(index, path)?;
    let file = &section.source_location.file;

    let current = editor.read_file(file)?;
    let lines = split_lines(&current);
    let at = match position {
        Position::Before => section.source_location.line - 1,
        Position::After => section.subtree_end_line().unwrap_or(lines.len()),
        Position::Append => section.source_location.end_line.unwrap_or(lines.len()),
    }
    .min(lines.len());

    let mut block = content.to_string();
    if !block.ends_with('\n') {
        block.push('\n');
    }
    let heading_first = starts_with_heading(&block);
    if heading_first && at > 0 && !lines[at - 1].trim().is_empty() {
        block.insert(0, '\n');
    }
    let heading_next = lines.get(at).is_some_and(|line| starts_with_heading(line));
    if heading_next && !heading_first && !block.ends_with("\n\n") {
        block.push('\n');
    }

    let mut updated = lines[..at].concat();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&block);
    updated.push_str(&lines[at..].concat());

    editor.write_file(file, &updated)?;

    Ok(InsertOutcome {
        inserted_at: EditLocation {
            file: file.clone(),
            line: at + 1,
        },
        previous_hash: content_hash(&current),
        new_hash: content_hash(&updated),
    })
}

fn find_section<'a>(index: &'a StructureIndex, path: &str) -> Result<(String, &'a Section)> {
    let path = path.trim_start_matches('/');
    match index.get_section(path) {
        Some(section) => Ok((path.to_string(), section)),
        None => Err(Error::NotFound {
            path: path.to_string(),
            suggestions: index.get_suggestions(path, MAX_SUGGESTIONS),
        }),
    }
}

fn starts_with_heading(text: &str) -> bool {
    HEADING_LINE.is_match(text.trim_start())
}

/// `content` without a leading heading line and the blank lines after it.
fn strip_heading(content: &str) -> &str {
    let trimmed = content.trim_start();
    if !HEADING_LINE.is_match(trimmed) {
        return content;
    }
    match trimmed.split_once('\n') {
        Some((_, rest)) => rest.trim_start_matches(['\n', '\r']),
        None => "",
    }
}
