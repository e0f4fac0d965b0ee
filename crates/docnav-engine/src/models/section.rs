use serde::Serialize;

use super::SourceLocation;

/// A heading-delimited node of a document outline.
///
/// A section owns its subtree: `children` are kept in document order and are
/// never shared between sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub title: String,
    pub level: usize,
    pub path: String,
    pub source_location: SourceLocation,
    pub children: Vec<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

impl Section {
    pub fn new(
        title: impl Into<String>,
        level: usize,
        path: impl Into<String>,
        source_location: SourceLocation,
    ) -> Self {
        Self {
            title: title.into(),
            level,
            path: path.into(),
            source_location,
            children: Vec::new(),
            anchor: None,
        }
    }

    /// All sections below this one, in pre-order.
    pub fn descendants(&self) -> Vec<&Section> {
        let mut out = Vec::new();
        let mut worklist: Vec<&Section> = self.children.iter().rev().collect();
        while let Some(section) = worklist.pop() {
            out.push(section);
            worklist.extend(section.children.iter().rev());
        }
        out
    }

    /// Last line covered by this section and every descendant living in the
    /// same physical file.
    ///
    /// Descendants pulled in from other files are ignored: their lines belong
    /// to the included file, and the include directive itself already falls
    /// inside this section's own range.
    pub fn subtree_end_line(&self) -> Option<usize> {
        let own = self.source_location.end_line?;
        let end = self
            .descendants()
            .into_iter()
            .filter(|s| s.source_location.file == self.source_location.file)
            .filter_map(|s| s.source_location.end_line)
            .fold(own, usize::max);
        Some(end)
    }
}
