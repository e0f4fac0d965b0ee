use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    Plantuml,
    Mermaid,
    Ditaa,
}

impl DiagramKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramKind::Plantuml => "plantuml",
            DiagramKind::Mermaid => "mermaid",
            DiagramKind::Ditaa => "ditaa",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Unordered,
    Ordered,
    Description,
}

impl ListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::Unordered => "unordered",
            ListType::Ordered => "ordered",
            ListType::Description => "description",
        }
    }
}

/// Kind-specific payload of an [`Element`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Code {
        language: Option<String>,
        content: String,
    },
    Table {
        columns: usize,
        rows: usize,
        content: String,
    },
    Image {
        target: String,
        alt: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Diagram {
        diagram_type: DiagramKind,
        name: Option<String>,
        format: Option<String>,
        content: String,
    },
    Admonition {
        admonition_type: String,
        content: String,
    },
    List {
        list_type: ListType,
        content: String,
    },
}

impl ElementKind {
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKind::Code { .. } => ElementType::Code,
            ElementKind::Table { .. } => ElementType::Table,
            ElementKind::Image { .. } => ElementType::Image,
            ElementKind::Diagram { .. } => ElementType::Diagram,
            ElementKind::Admonition { .. } => ElementType::Admonition,
            ElementKind::List { .. } => ElementType::List,
        }
    }

    /// Captured block text, for kinds that have any.
    pub fn content(&self) -> Option<&str> {
        match self {
            ElementKind::Code { content, .. }
            | ElementKind::Table { content, .. }
            | ElementKind::Diagram { content, .. }
            | ElementKind::Admonition { content, .. }
            | ElementKind::List { content, .. } => Some(content),
            ElementKind::Image { .. } => None,
        }
    }

    pub(crate) fn content_mut(&mut self) -> Option<&mut String> {
        match self {
            ElementKind::Code { content, .. }
            | ElementKind::Table { content, .. }
            | ElementKind::Diagram { content, .. }
            | ElementKind::Admonition { content, .. }
            | ElementKind::List { content, .. } => Some(content),
            ElementKind::Image { .. } => None,
        }
    }
}

/// Element category used for filtering queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Code,
    Table,
    Image,
    Diagram,
    Admonition,
    List,
}

impl ElementType {
    pub const ALL: [ElementType; 6] = [
        ElementType::Code,
        ElementType::Table,
        ElementType::Image,
        ElementType::Diagram,
        ElementType::Admonition,
        ElementType::List,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Code => "code",
            ElementType::Table => "table",
            ElementType::Image => "image",
            ElementType::Diagram => "diagram",
            ElementType::Admonition => "admonition",
            ElementType::List => "list",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown element type '{0}'")]
pub struct UnknownElementType(pub String);

impl FromStr for ElementType {
    type Err = UnknownElementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "code" => Ok(ElementType::Code),
            "table" => Ok(ElementType::Table),
            "image" => Ok(ElementType::Image),
            "diagram" | "plantuml" | "mermaid" | "ditaa" => Ok(ElementType::Diagram),
            "admonition" => Ok(ElementType::Admonition),
            "list" => Ok(ElementType::List),
            _ => Err(UnknownElementType(s.to_string())),
        }
    }
}

/// A non-heading content block attached to a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    #[serde(flatten)]
    pub kind: ElementKind,
    pub source_location: SourceLocation,
    /// Path of the enclosing section. Lookup key only.
    pub parent_section: String,
    /// Ordinal among elements sharing `parent_section`, assigned at index build.
    pub index: usize,
}

impl Element {
    pub fn new(kind: ElementKind, source_location: SourceLocation, parent_section: impl Into<String>) -> Self {
        Self {
            kind,
            source_location,
            parent_section: parent_section.into(),
            index: 0,
        }
    }

    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// Short human-readable hint of what the element looks like in source.
    pub fn preview(&self) -> String {
        match &self.kind {
            ElementKind::Code { language, .. } => match language {
                Some(lang) if !lang.is_empty() => format!("[source, {lang}]"),
                _ => "[source]".to_string(),
            },
            ElementKind::Diagram {
                diagram_type,
                name,
                format,
                ..
            } => {
                let parts: Vec<&str> = std::iter::once(diagram_type.as_str())
                    .chain(name.as_deref())
                    .chain(format.as_deref())
                    .collect();
                format!("[{}]", parts.join(", "))
            }
            ElementKind::Image { target, alt, .. } => {
                format!("image::{target}[{}]", alt.as_deref().unwrap_or(""))
            }
            ElementKind::Table { .. } => "|===".to_string(),
            ElementKind::Admonition {
                admonition_type,
                content,
            } => {
                if content.chars().count() > 30 {
                    let head: String = content.chars().take(30).collect();
                    format!("{admonition_type}: {head}...")
                } else {
                    format!("{admonition_type}: {content}")
                }
            }
            ElementKind::List { list_type, .. } => format!("{} list", list_type.as_str()),
        }
    }
}
