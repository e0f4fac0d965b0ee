//! Single pass over the expanded line stream collecting headings and blocks.
//!
//! Delimited blocks are tracked as state: while a `----` listing or a `|===`
//! table is open, only its closing delimiter is significant, so headings and
//! list markers inside them are treated as content.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::LazyLock;

use super::includes::SourceLine;
use super::{SECTION, substitute_attributes};
use crate::models::{
    DiagramKind, Element, ElementKind, ListType, ParseWarning, Section, SourceLocation, WarningKind,
};
use crate::parsing::OutlineBuilder;

static SOURCE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[source(?:,\s*([a-zA-Z0-9_+-]+))?\]$").expect("Invalid source block regex")
});
static DIAGRAM_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(plantuml|mermaid|ditaa)(?:,\s*([a-zA-Z0-9_-]+))?(?:,\s*([a-zA-Z0-9_]+))?\]$")
        .expect("Invalid diagram block regex")
});
static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\[\[([^\],]+)(?:,[^\]]*)?\]\]|\[#([^\].%]+)[^\]]*\])$").expect("Invalid anchor regex")
});
static LISTING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{4,}$").expect("Invalid listing regex"));
static TABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\|===$").expect("Invalid table regex"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^image::(.+?)\[(.*)\]$").expect("Invalid image regex"));
static ADMONITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(NOTE|TIP|IMPORTANT|WARNING|CAUTION):\s*(.*)$").expect("Invalid admonition regex")
});
static UNORDERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\*+\s+.+$").expect("Invalid list regex"));
static ORDERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.+\s+.+$").expect("Invalid list regex"));
static DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+::(\s+.+)?$").expect("Invalid list regex"));

pub(crate) struct Body {
    pub sections: Vec<Section>,
    pub title: Option<String>,
    pub elements: Vec<Element>,
    pub warnings: Vec<ParseWarning>,
}

/// Attribute line waiting for the `----` that opens its block.
enum Pending {
    Code(Option<String>),
    Diagram {
        kind: DiagramKind,
        name: Option<String>,
        format: Option<String>,
    },
}

struct OpenBlock {
    /// Anonymous listings produce no element.
    element: Option<usize>,
    location: SourceLocation,
    content: Vec<String>,
}

struct OpenList {
    element: usize,
    list_type: ListType,
    content: Vec<String>,
}

pub(crate) fn scan(
    lines: &[SourceLine],
    prefix: &str,
    attributes: &BTreeMap<String, String>,
    last_lines: &HashMap<PathBuf, usize>,
) -> Body {
    let mut scanner = Scanner {
        attributes,
        outline: OutlineBuilder::new(prefix, 0),
        title: None,
        current_path: prefix.to_string(),
        pending: None,
        pending_anchor: None,
        listing: None,
        table: None,
        list: None,
        elements: Vec::new(),
    };
    for line in lines {
        scanner.line(line);
    }
    scanner.finish(last_lines)
}

struct Scanner<'a> {
    attributes: &'a BTreeMap<String, String>,
    outline: OutlineBuilder,
    title: Option<String>,
    current_path: String,
    pending: Option<Pending>,
    pending_anchor: Option<String>,
    listing: Option<OpenBlock>,
    table: Option<OpenBlock>,
    list: Option<OpenList>,
    elements: Vec<Element>,
}

impl Scanner<'_> {
    fn line(&mut self, line: &SourceLine) {
        let text = line.text.as_str();

        if let Some(block) = self.listing.as_mut() {
            if LISTING.is_match(text) {
                self.close_block(false, line.line);
            } else {
                block.content.push(text.to_string());
            }
            return;
        }
        if let Some(block) = self.table.as_mut() {
            if TABLE.is_match(text) {
                self.close_block(true, line.line);
            } else {
                block.content.push(text.to_string());
            }
            return;
        }

        if let Some(caps) = ANCHOR.captures(text) {
            let id = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().trim().to_string());
            self.pending_anchor = id;
            return;
        }

        if let Some(caps) = SECTION.captures(text) {
            self.close_list();
            let level = caps[1].len() - 1;
            let title = substitute_attributes(caps[2].trim(), self.attributes);
            if level == 0 && self.title.is_none() {
                self.title = Some(title.clone());
            }
            let anchor = self.pending_anchor.take();
            self.current_path = self.outline.add_heading(title, level, line.location(), anchor);
            return;
        }

        if !text.trim().is_empty() {
            self.pending_anchor = None;
        }

        if let Some(caps) = SOURCE_ATTR.captures(text) {
            self.pending = Some(Pending::Code(caps.get(1).map(|m| m.as_str().to_string())));
            return;
        }
        if let Some(caps) = DIAGRAM_ATTR.captures(text) {
            let kind = match &caps[1] {
                "plantuml" => DiagramKind::Plantuml,
                "mermaid" => DiagramKind::Mermaid,
                _ => DiagramKind::Ditaa,
            };
            self.pending = Some(Pending::Diagram {
                kind,
                name: caps.get(2).map(|m| m.as_str().to_string()),
                format: caps.get(3).map(|m| m.as_str().to_string()),
            });
            return;
        }

        if LISTING.is_match(text) {
            let element = self.pending.take().map(|pending| {
                let kind = match pending {
                    Pending::Code(language) => ElementKind::Code {
                        language,
                        content: String::new(),
                    },
                    Pending::Diagram { kind, name, format } => ElementKind::Diagram {
                        diagram_type: kind,
                        name,
                        format,
                        content: String::new(),
                    },
                };
                self.push_element(kind, line.location())
            });
            self.listing = Some(OpenBlock {
                element,
                location: line.location(),
                content: Vec::new(),
            });
            return;
        }

        if TABLE.is_match(text) {
            let kind = ElementKind::Table {
                columns: 0,
                rows: 0,
                content: String::new(),
            };
            let element = self.push_element(kind, line.location());
            self.table = Some(OpenBlock {
                element: Some(element),
                location: line.location(),
                content: Vec::new(),
            });
            return;
        }

        if let Some(caps) = IMAGE.captures(text) {
            let alt = Some(caps[2].trim()).filter(|alt| !alt.is_empty()).map(str::to_string);
            let kind = ElementKind::Image {
                target: caps[1].to_string(),
                alt,
                title: None,
            };
            self.push_element(kind, line.location().with_end_line(line.line));
            return;
        }

        if let Some(caps) = ADMONITION.captures(text) {
            let kind = ElementKind::Admonition {
                admonition_type: caps[1].to_string(),
                content: caps[2].to_string(),
            };
            self.push_element(kind, line.location().with_end_line(line.line));
            self.close_list();
            return;
        }

        let list_type = if UNORDERED.is_match(text) {
            Some(ListType::Unordered)
        } else if ORDERED.is_match(text) {
            Some(ListType::Ordered)
        } else if DESCRIPTION.is_match(text) {
            Some(ListType::Description)
        } else {
            None
        };
        if let Some(list_type) = list_type {
            self.list_item(list_type, line);
            return;
        }

        if !text.trim().is_empty() {
            self.close_list();
        }
    }

    fn list_item(&mut self, list_type: ListType, line: &SourceLine) {
        match self.list.as_mut() {
            Some(list) if list.list_type == list_type => {
                list.content.push(line.text.clone());
                self.elements[list.element].source_location.end_line = Some(line.line);
            }
            _ => {
                self.close_list();
                let kind = ElementKind::List {
                    list_type,
                    content: String::new(),
                };
                let element = self.push_element(kind, line.location().with_end_line(line.line));
                self.list = Some(OpenList {
                    element,
                    list_type,
                    content: vec![line.text.clone()],
                });
            }
        }
    }

    fn push_element(&mut self, kind: ElementKind, location: SourceLocation) -> usize {
        self.elements
            .push(Element::new(kind, location, self.current_path.clone()));
        self.elements.len() - 1
    }

    fn close_list(&mut self) {
        if let Some(list) = self.list.take() {
            set_content(&mut self.elements[list.element], list.content);
        }
    }

    fn close_block(&mut self, table: bool, end_line: usize) {
        let block = if table { self.table.take() } else { self.listing.take() };
        if let Some(OpenBlock {
            element: Some(index),
            content,
            ..
        }) = block
        {
            let element = &mut self.elements[index];
            element.source_location.end_line = Some(end_line);
            set_content(element, content);
        }
    }

    fn finish(mut self, last_lines: &HashMap<PathBuf, usize>) -> Body {
        self.close_list();

        let mut warnings = Vec::new();
        for (block, is_table) in [(self.listing.take(), false), (self.table.take(), true)] {
            let Some(block) = block else {
                continue;
            };
            let start = block.location.line;
            let file = block.location.file.clone();
            let end = last_lines.get(&file).copied().unwrap_or(start);

            let label = match block.element.map(|i| &self.elements[i].kind) {
                Some(ElementKind::Code { .. }) => "Code",
                Some(ElementKind::Diagram { diagram_type, .. }) => match diagram_type {
                    DiagramKind::Plantuml => "Plantuml",
                    DiagramKind::Mermaid => "Mermaid",
                    DiagramKind::Ditaa => "Ditaa",
                },
                _ => "Listing",
            };
            let warning = if is_table {
                ParseWarning::new(
                    WarningKind::UnclosedTable,
                    file,
                    start,
                    format!("Table starting at line {start} is not properly closed"),
                )
            } else {
                ParseWarning::new(
                    WarningKind::UnclosedBlock,
                    file,
                    start,
                    format!("{label} block starting at line {start} is not properly closed"),
                )
            };
            warnings.push(warning);

            if let Some(index) = block.element {
                let element = &mut self.elements[index];
                element.source_location.end_line = Some(end);
                set_content(element, block.content);
            }
        }

        Body {
            sections: self.outline.finish(),
            title: self.title,
            elements: self.elements,
            warnings,
        }
    }
}

fn set_content(element: &mut Element, lines: Vec<String>) {
    if let ElementKind::Table { columns, rows, .. } = &mut element.kind {
        let row_lines: Vec<&String> = lines.iter().filter(|l| l.starts_with('|')).collect();
        *columns = row_lines.first().map(|row| row.matches('|').count()).unwrap_or(0);
        *rows = row_lines.len();
    }
    if let Some(content) = element.kind.content_mut() {
        *content = lines.join("\n");
    }
}
