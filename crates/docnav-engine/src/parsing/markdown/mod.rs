//! GitHub-flavoured Markdown parsing.
//!
//! Only ATX headings (`#`) open sections; the first H1 is the document title
//! and takes the file prefix as its path. Setext underlines are reported in
//! the log but otherwise treated as text.

mod folder;

pub use folder::sort_markdown_files;

use log::warn;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::{OutlineBuilder, compute_end_lines, empty_document_root, file_prefix};
use crate::error::Result;
use crate::io::FileEditor;
use crate::models::{
    Document, DocumentFormat, Element, ElementKind, ListType, ParseWarning, Section, SourceLocation,
    WarningKind,
};

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?$").expect("Invalid heading regex"));
static FRONTMATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|$)").expect("Invalid frontmatter regex")
});
static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(`{3,}|~{3,})([a-zA-Z0-9_+-]*)?\s*$").expect("Invalid fence regex"));
static TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\|(.+)\|$").expect("Invalid table regex"));
static TABLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|[\s:|-]+\|$").expect("Invalid table regex"));
static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[([^\]]*)\]\(([^)\s]+)(?:\s+"([^"]*)")?\)"#).expect("Invalid image regex")
});
static UNORDERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+.+$").expect("Invalid list regex"));
static ORDERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\.\s+.+$").expect("Invalid list regex"));
static SETEXT_H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^={3,}\s*$").expect("Invalid setext regex"));
static SETEXT_H2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{3,}\s*$").expect("Invalid setext regex"));

#[derive(Debug, Clone)]
pub struct MarkdownParser {
    base_path: PathBuf,
}

impl MarkdownParser {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn parse_file(&self, path: &Path) -> Result<Document> {
        let content = FileEditor::new().read_file(path)?;
        let total_lines = content.lines().count();
        let (frontmatter, body) = split_frontmatter(&content, path);
        let offset = total_lines - body.lines().count();
        let prefix = file_prefix(path, &self.base_path);

        let mut document = Document::new(path, DocumentFormat::Markdown);
        let fm_title = frontmatter
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string);
        document.frontmatter = frontmatter;

        if body.lines().all(|line| line.trim().is_empty()) {
            let root = empty_document_root(path, &prefix);
            document.title = fm_title.unwrap_or_else(|| root.title.clone());
            document.sections = vec![root];
            return Ok(document);
        }

        let mut scanner = Scanner::new(path, &prefix);
        for (i, text) in body.lines().enumerate() {
            scanner.line(text, offset + i + 1);
        }
        let body = scanner.finish();

        let mut sections = body.sections;
        compute_end_lines(&mut sections, &HashMap::from([(path.to_path_buf(), total_lines)]));

        document.title = fm_title.or(body.title).unwrap_or_default();
        document.sections = sections;
        document.elements = body.elements;
        document.parse_warnings = body.warnings;
        Ok(document)
    }
}

/// Split off a leading `---` YAML block. Invalid YAML is logged and dropped.
fn split_frontmatter<'a>(content: &'a str, path: &Path) -> (Mapping, &'a str) {
    let Some(caps) = FRONTMATTER.captures(content) else {
        return (Mapping::new(), content);
    };
    let rest = &content[caps.get(0).map_or(0, |m| m.end())..];
    let mapping = match serde_yaml::from_str::<Value>(&caps[1]) {
        Ok(Value::Mapping(mapping)) => mapping,
        Ok(Value::Null) => Mapping::new(),
        Ok(_) => {
            warn!("Ignoring frontmatter in {}: not a mapping", path.display());
            Mapping::new()
        }
        Err(e) => {
            warn!("Invalid YAML frontmatter in {}: {e}", path.display());
            Mapping::new()
        }
    };
    (mapping, rest)
}

struct Fence {
    marker: char,
    width: usize,
    language: Option<String>,
    location: SourceLocation,
    content: Vec<String>,
}

struct Table {
    location: SourceLocation,
    columns: usize,
    rows: usize,
    has_separator: bool,
    content: Vec<String>,
}

struct List {
    element: usize,
    list_type: ListType,
    content: Vec<String>,
}

struct Body {
    sections: Vec<Section>,
    title: Option<String>,
    elements: Vec<Element>,
    warnings: Vec<ParseWarning>,
}

struct Scanner {
    file: PathBuf,
    outline: OutlineBuilder,
    title: Option<String>,
    current_path: String,
    previous: String,
    fence: Option<Fence>,
    table: Option<Table>,
    list: Option<List>,
    elements: Vec<Element>,
}

impl Scanner {
    fn new(file: &Path, prefix: &str) -> Self {
        Self {
            file: file.to_path_buf(),
            outline: OutlineBuilder::new(prefix, 1),
            title: None,
            current_path: prefix.to_string(),
            previous: String::new(),
            fence: None,
            table: None,
            list: None,
            elements: Vec::new(),
        }
    }

    fn line(&mut self, text: &str, line: usize) {
        self.dispatch(text, line);
        self.previous = text.to_string();
    }

    fn dispatch(&mut self, text: &str, line: usize) {
        if let Some(fence) = self.fence.as_mut() {
            let closes = FENCE.captures(text).is_some_and(|caps| {
                caps[1].starts_with(fence.marker) && caps[1].len() >= fence.width
            });
            if closes {
                self.close_fence(line);
            } else {
                fence.content.push(text.to_string());
            }
            return;
        }

        if let Some(caps) = FENCE.captures(text) {
            self.close_table();
            self.close_list();
            let marker = &caps[1];
            self.fence = Some(Fence {
                marker: marker.chars().next().unwrap_or('`'),
                width: marker.len(),
                language: caps.get(2).map(|m| m.as_str().to_string()).filter(|l| !l.is_empty()),
                location: self.location(line),
                content: Vec::new(),
            });
            return;
        }

        if let Some(caps) = HEADING.captures(text) {
            self.close_table();
            self.close_list();
            let level = caps[1].len();
            let title = caps[2].trim().to_string();
            if level == 1 && self.title.is_none() {
                self.title = Some(title.clone());
            }
            let location = self.location(line);
            self.current_path = self.outline.add_heading(title, level, location, None);
            return;
        }

        self.check_setext(text, line);

        if let Some(caps) = TABLE_ROW.captures(text) {
            self.close_list();
            match self.table.as_mut() {
                None => {
                    let columns = caps[1].split('|').count();
                    self.table = Some(Table {
                        location: self.location(line).with_end_line(line),
                        columns,
                        rows: 0,
                        has_separator: false,
                        content: vec![text.to_string()],
                    });
                }
                Some(table) => {
                    if TABLE_SEPARATOR.is_match(text) {
                        table.has_separator = true;
                    } else if table.has_separator {
                        table.rows += 1;
                    }
                    table.location.end_line = Some(line);
                    table.content.push(text.to_string());
                }
            }
            return;
        }
        self.close_table();

        if let Some(caps) = IMAGE.captures(text) {
            let kind = ElementKind::Image {
                target: caps[2].to_string(),
                alt: Some(caps[1].to_string()),
                title: caps.get(3).map(|m| m.as_str().to_string()),
            };
            self.push_element(kind, self.location(line).with_end_line(line));
            self.close_list();
            return;
        }

        let list_type = if UNORDERED.is_match(text) {
            Some(ListType::Unordered)
        } else if ORDERED.is_match(text) {
            Some(ListType::Ordered)
        } else {
            None
        };
        if let Some(list_type) = list_type {
            self.list_item(list_type, text, line);
            return;
        }

        if !text.trim().is_empty() {
            self.close_list();
        }
    }

    fn check_setext(&self, text: &str, line: usize) {
        let underline = if SETEXT_H1.is_match(text) {
            "==="
        } else if SETEXT_H2.is_match(text) {
            "---"
        } else {
            return;
        };
        if !self.previous.trim().is_empty() && !self.previous.starts_with('#') {
            warn!(
                "Setext-style heading at {}:{} (underlined with '{underline}') is not supported; use '#' headings",
                self.file.display(),
                line - 1
            );
        }
    }

    fn list_item(&mut self, list_type: ListType, text: &str, line: usize) {
        match self.list.as_mut() {
            Some(list) if list.list_type == list_type => {
                list.content.push(text.to_string());
                self.elements[list.element].source_location.end_line = Some(line);
            }
            _ => {
                self.close_list();
                let kind = ElementKind::List {
                    list_type,
                    content: String::new(),
                };
                let element = self.push_element(kind, self.location(line).with_end_line(line));
                self.list = Some(List {
                    element,
                    list_type,
                    content: vec![text.to_string()],
                });
            }
        }
    }

    fn location(&self, line: usize) -> SourceLocation {
        SourceLocation::new(self.file.clone(), line)
    }

    fn push_element(&mut self, kind: ElementKind, location: SourceLocation) -> usize {
        self.elements
            .push(Element::new(kind, location, self.current_path.clone()));
        self.elements.len() - 1
    }

    fn close_fence(&mut self, end_line: usize) {
        if let Some(fence) = self.fence.take() {
            let kind = ElementKind::Code {
                language: fence.language,
                content: fence.content.join("\n"),
            };
            self.push_element(kind, fence.location.with_end_line(end_line));
        }
    }

    /// Rows seen without a `|---|` separator line are not a table.
    fn close_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        if table.has_separator {
            let kind = ElementKind::Table {
                columns: table.columns,
                rows: table.rows,
                content: table.content.join("\n"),
            };
            self.push_element(kind, table.location);
        }
    }

    fn close_list(&mut self) {
        if let Some(list) = self.list.take()
            && let Some(content) = self.elements[list.element].kind.content_mut()
        {
            *content = list.content.join("\n");
        }
    }

    fn finish(mut self) -> Body {
        self.close_table();
        self.close_list();

        let mut warnings = Vec::new();
        if let Some(fence) = self.fence.take() {
            let start = fence.location.line;
            warnings.push(ParseWarning::new(
                WarningKind::UnclosedBlock,
                self.file.clone(),
                start,
                format!("Code block starting at line {start} is not properly closed"),
            ));
        }

        Body {
            sections: self.outline.finish(),
            title: self.title,
            elements: self.elements,
            warnings,
        }
    }
}
