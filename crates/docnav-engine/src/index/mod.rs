//! In-memory lookup tables over a set of parsed documents.
//!
//! The index owns the documents it was built from and addresses sections by
//! their route through the owning document's tree, so lookups hand out plain
//! borrows. There is no incremental maintenance: after any write to disk the
//! whole index is rebuilt with [`StructureIndex::build_from_documents`].

mod search;
mod structure;
mod suggestions;

pub use search::SearchResult;
pub use structure::{NodeLocation, Structure, StructureNode};

use log::{info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::io::FileEditor;
use crate::models::{Document, Element, ElementType, Section};

/// Position of a section: owning document, root, then child indices.
#[derive(Debug, Clone)]
struct SectionRef {
    document: usize,
    root: usize,
    route: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct ElementRef {
    document: usize,
    element: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub total_sections: usize,
    pub total_elements: usize,
    pub total_documents: usize,
    pub sections_with_content: usize,
    pub index_ready: bool,
    pub sections_by_level: BTreeMap<usize, usize>,
    pub elements_by_type: BTreeMap<ElementType, usize>,
}

#[derive(Debug, Default)]
pub struct StructureIndex {
    documents: Vec<Document>,
    /// Accepted sections in document pre-order.
    sections: Vec<SectionRef>,
    by_path: HashMap<String, usize>,
    by_level: BTreeMap<usize, Vec<usize>>,
    by_file: HashMap<PathBuf, Vec<usize>>,
    /// Every document root, including rejected duplicates.
    top_level: Vec<SectionRef>,
    elements: Vec<ElementRef>,
    by_type: HashMap<ElementType, Vec<usize>>,
    by_parent: HashMap<String, Vec<usize>>,
    content: HashMap<String, String>,
    ready: bool,
}

impl StructureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index contents with `documents`.
    ///
    /// The first section to claim a path wins; later ones are left out of
    /// every table and reported in the returned warnings, though their
    /// children are still visited.
    pub fn build_from_documents(&mut self, documents: Vec<Document>) -> Vec<String> {
        self.clear();
        self.documents = documents;

        let mut warnings = Vec::new();
        let mut files = FileCache::default();

        for document in 0..self.documents.len() {
            let roots = self.documents[document].sections.len();
            let mut worklist: Vec<SectionRef> = (0..roots)
                .rev()
                .map(|root| SectionRef {
                    document,
                    root,
                    route: Vec::new(),
                })
                .collect();
            self.top_level.extend(worklist.iter().rev().cloned());

            while let Some(address) = worklist.pop() {
                let section = resolve(&self.documents, &address);
                let children = section.children.len();
                for child in (0..children).rev() {
                    let mut route = address.route.clone();
                    route.push(child);
                    worklist.push(SectionRef {
                        document,
                        root: address.root,
                        route,
                    });
                }

                if let Some(&first) = self.by_path.get(&section.path) {
                    let first = resolve(&self.documents, &self.sections[first]);
                    let message = format!(
                        "Duplicate section path: '{}' (first at {}:{}, duplicate at {}:{})",
                        section.path,
                        first.source_location.file.display(),
                        first.source_location.line,
                        section.source_location.file.display(),
                        section.source_location.line
                    );
                    warn!("{message}");
                    warnings.push(message);
                    continue;
                }

                let slot = self.sections.len();
                self.by_path.insert(section.path.clone(), slot);
                self.by_level.entry(section.level).or_default().push(slot);
                self.by_file
                    .entry(section.source_location.file.clone())
                    .or_default()
                    .push(slot);
                if let Some(text) = files.section_text(section) {
                    self.content.insert(section.path.clone(), text);
                }
                self.sections.push(address);
            }

            for element in 0..self.documents[document].elements.len() {
                self.index_element(ElementRef { document, element });
            }
        }

        self.ready = true;
        info!(
            "Index built: {} sections, {} elements from {} documents",
            self.sections.len(),
            self.elements.len(),
            self.documents.len()
        );
        warnings
    }

    fn index_element(&mut self, address: ElementRef) {
        let slot = self.elements.len();
        let element = &mut self.documents[address.document].elements[address.element];
        let siblings = self
            .by_parent
            .entry(element.parent_section.clone())
            .or_default();
        element.index = siblings.len();
        siblings.push(slot);
        self.by_type
            .entry(element.element_type())
            .or_default()
            .push(slot);
        self.elements.push(address);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Look up a section; a leading `/` on `path` is ignored.
    pub fn get_section(&self, path: &str) -> Option<&Section> {
        let slot = *self.by_path.get(path.trim_start_matches('/'))?;
        Some(self.section_at(slot))
    }

    /// Cached text of the section's own line range.
    pub fn get_section_content(&self, path: &str) -> Option<&str> {
        self.content
            .get(path.trim_start_matches('/'))
            .map(String::as_str)
    }

    pub fn get_sections_at_level(&self, level: usize) -> Vec<&Section> {
        self.sections_in(self.by_level.get(&level))
    }

    pub fn get_sections_by_file(&self, file: &Path) -> Vec<&Section> {
        self.sections_in(self.by_file.get(file))
    }

    /// All indexed sections in document order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        (0..self.sections.len()).map(|slot| self.section_at(slot))
    }

    /// Files that contributed at least one indexed section.
    pub fn indexed_files(&self) -> HashSet<&Path> {
        self.by_file.keys().map(PathBuf::as_path).collect()
    }

    pub fn get_elements(&self, element_type: Option<ElementType>, section: Option<&str>) -> Vec<&Element> {
        let slots: Vec<usize> = match element_type {
            Some(element_type) => self.by_type.get(&element_type).cloned().unwrap_or_default(),
            None => (0..self.elements.len()).collect(),
        };
        slots
            .into_iter()
            .map(|slot| self.element_at(slot))
            .filter(|element| section.is_none_or(|path| element.parent_section == path))
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_sections: self.sections.len(),
            total_elements: self.elements.len(),
            total_documents: self.documents.len(),
            sections_with_content: self.content.len(),
            index_ready: self.ready,
            sections_by_level: self
                .by_level
                .iter()
                .map(|(level, slots)| (*level, slots.len()))
                .collect(),
            elements_by_type: self
                .by_type
                .iter()
                .map(|(element_type, slots)| (*element_type, slots.len()))
                .collect(),
        }
    }

    fn section_at(&self, slot: usize) -> &Section {
        resolve(&self.documents, &self.sections[slot])
    }

    fn element_at(&self, slot: usize) -> &Element {
        let address = self.elements[slot];
        &self.documents[address.document].elements[address.element]
    }

    fn sections_in(&self, slots: Option<&Vec<usize>>) -> Vec<&Section> {
        slots
            .map(|slots| slots.iter().map(|&slot| self.section_at(slot)).collect())
            .unwrap_or_default()
    }
}

fn resolve<'a>(documents: &'a [Document], address: &SectionRef) -> &'a Section {
    let root = &documents[address.document].sections[address.root];
    address
        .route
        .iter()
        .fold(root, |section, &child| &section.children[child])
}

/// Each source file is read at most once per build.
#[derive(Default)]
struct FileCache {
    files: HashMap<PathBuf, Option<Vec<String>>>,
}

impl FileCache {
    fn section_text(&mut self, section: &Section) -> Option<String> {
        let location = &section.source_location;
        let lines = self
            .files
            .entry(location.file.clone())
            .or_insert_with(|| match FileEditor::new().read_file(&location.file) {
                Ok(content) => Some(content.lines().map(str::to_string).collect()),
                Err(e) => {
                    warn!("Failed to read content for section '{}': {e}", section.path);
                    None
                }
            })
            .as_ref()?;

        let start = location.line.saturating_sub(1).min(lines.len());
        let end = location.end_line.unwrap_or(lines.len()).clamp(start, lines.len());
        Some(lines[start..end].join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::DocumentParser;
    use crate::tests::{create_test_docs_dir, create_test_file};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    pub(super) fn build(docs: &TempDir, files: &[(&str, &str)]) -> (StructureIndex, Vec<String>) {
        let parser = DocumentParser::new(docs.path());
        let documents = files
            .iter()
            .map(|(name, content)| {
                let path = create_test_file(docs, name, content);
                parser.parse_file(&path).unwrap()
            })
            .collect();
        let mut index = StructureIndex::new();
        let warnings = index.build_from_documents(documents);
        (index, warnings)
    }

    #[test]
    fn test_lookup_by_path_level_and_file() {
        // Given two documents
        let docs = create_test_docs_dir();
        let (index, warnings) = build(
            &docs,
            &[
                ("guide.adoc", "= Guide\n\n== Install\nSteps\n\n== Usage\nRun it\n"),
                ("notes.md", "# Notes\n\n## Ideas\n"),
            ],
        );

        // Then every section is reachable
        assert!(warnings.is_empty());
        assert_eq!(index.get_section("guide:install").unwrap().title, "Install");
        assert_eq!(index.get_section("/guide:usage").unwrap().title, "Usage");
        assert!(index.get_section("guide:missing").is_none());

        let level_one: Vec<&str> = index
            .get_sections_at_level(1)
            .iter()
            .map(|s| s.path.as_str())
            .collect();
        assert_eq!(level_one, vec!["guide:install", "guide:usage", "notes"]);
        assert_eq!(index.get_sections_by_file(&docs.path().join("notes.md")).len(), 2);
        assert!(index.is_ready());
    }

    #[test]
    fn test_section_content_is_cached_from_disk() {
        let docs = create_test_docs_dir();
        let (index, _) = build(&docs, &[("guide.adoc", "= Guide\n\n== Install\nSteps\nMore\n\n== Usage\n")]);

        assert_eq!(index.get_section_content("guide:install"), Some("== Install\nSteps\nMore\n"));
        assert_eq!(index.get_section_content("guide:usage"), Some("== Usage"));
    }

    #[test]
    fn test_duplicate_paths_first_wins_and_children_survive() {
        let docs = create_test_docs_dir();
        let parser = DocumentParser::new(docs.path());
        let a = create_test_file(&docs, "guide.adoc", "= Guide\n\n== Intro\n");
        let b = create_test_file(&docs, "guide.md", "# Guide\n\n## Extra\n");
        let documents = vec![parser.parse_file(&a).unwrap(), parser.parse_file(&b).unwrap()];

        let mut index = StructureIndex::new();
        let warnings = index.build_from_documents(documents);

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Duplicate section path: 'guide' (first at "));
        assert!(warnings[0].contains("guide.md:1)"));
        assert_eq!(index.get_section("guide").unwrap().level, 0);
        assert!(index.get_section("guide:extra").is_some());
        assert_eq!(index.stats().total_sections, 3);
    }

    #[test]
    fn test_elements_get_ordinals_per_parent() {
        let docs = create_test_docs_dir();
        let content = "= Doc\n\n== A\n\n[source,rust]\n----\nx\n----\n\nNOTE: n\n\n== B\n\n[source]\n----\ny\n----\n";
        let (index, _) = build(&docs, &[("doc.adoc", content)]);

        let code = index.get_elements(Some(ElementType::Code), None);
        assert_eq!(code.len(), 2);
        assert_eq!((code[0].parent_section.as_str(), code[0].index), ("doc:a", 0));
        assert_eq!((code[1].parent_section.as_str(), code[1].index), ("doc:b", 0));

        let in_a = index.get_elements(None, Some("doc:a"));
        let ordinals: Vec<(ElementType, usize)> = in_a.iter().map(|e| (e.element_type(), e.index)).collect();
        assert_eq!(ordinals, vec![(ElementType::Code, 0), (ElementType::Admonition, 1)]);
        assert!(index.get_elements(Some(ElementType::Table), None).is_empty());
    }

    #[test]
    fn test_stats() {
        let docs = create_test_docs_dir();
        let (index, _) = build(&docs, &[("doc.adoc", "= Doc\n\n== A\n\n* item\n")]);

        let stats = index.stats();

        assert_eq!(stats.total_documents, 1);
        assert_eq!(stats.total_sections, 2);
        assert_eq!(stats.sections_by_level, BTreeMap::from([(0, 1), (1, 1)]));
        assert_eq!(stats.elements_by_type, BTreeMap::from([(ElementType::List, 1)]));
        assert_eq!(stats.sections_with_content, 2);
    }

    #[test]
    fn test_rebuild_replaces_previous_generation() {
        let docs = create_test_docs_dir();
        let (mut index, _) = build(&docs, &[("old.adoc", "= Old\n")]);

        let path = create_test_file(&docs, "new.adoc", "= New\n");
        let document = DocumentParser::new(docs.path()).parse_file(&path).unwrap();
        index.build_from_documents(vec![document]);

        assert!(index.get_section("old").is_none());
        assert!(index.get_section("new").is_some());
        assert_eq!(index.documents().len(), 1);
    }
}
