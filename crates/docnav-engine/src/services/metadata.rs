use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::error::{Error, Result};
use crate::index::StructureIndex;
use crate::models::DocumentFormat;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectMetadata {
    pub total_files: usize,
    pub total_sections: usize,
    pub total_words: usize,
    /// Newest modification time of any indexed file, in unix seconds.
    pub last_modified: Option<u64>,
    pub formats: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionMetadata {
    pub path: String,
    pub title: String,
    pub file: PathBuf,
    pub word_count: usize,
    pub last_modified: Option<u64>,
    /// Direct children only.
    pub subsection_count: usize,
}

pub fn project_metadata(index: &StructureIndex) -> ProjectMetadata {
    let files = index.indexed_files();
    let total_words = index
        .sections()
        .filter_map(|section| index.get_section_content(&section.path))
        .map(word_count)
        .sum();
    let formats: BTreeSet<&'static str> = files
        .iter()
        .filter_map(|file| DocumentFormat::from_path(file))
        .map(|format| format.as_str())
        .collect();

    ProjectMetadata {
        total_files: files.len(),
        total_sections: index.stats().total_sections,
        total_words,
        last_modified: files.iter().filter_map(|file| modified_secs(file)).max(),
        formats: formats.into_iter().collect(),
    }
}

pub fn section_metadata(index: &StructureIndex, path: &str) -> Result<SectionMetadata> {
    let path = path.trim_start_matches('/');
    let Some(section) = index.get_section(path) else {
        return Err(Error::NotFound {
            path: path.to_string(),
            suggestions: index.get_suggestions(path, 5),
        });
    };

    Ok(SectionMetadata {
        path: path.to_string(),
        title: section.title.clone(),
        file: section.source_location.file.clone(),
        word_count: index.get_section_content(path).map(word_count).unwrap_or(0),
        last_modified: modified_secs(&section.source_location.file),
        subsection_count: section.children.len(),
    })
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn modified_secs(path: &Path) -> Option<u64> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    Some(modified.duration_since(UNIX_EPOCH).ok()?.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::StructureIndex;
    use crate::parsing::DocumentParser;
    use crate::tests::{create_test_docs_dir, create_test_file};
    use pretty_assertions::assert_eq;

    fn indexed_docs() -> (tempfile::TempDir, StructureIndex) {
        let docs = create_test_docs_dir();
        let guide = create_test_file(&docs, "guide.adoc", "= Guide\n\n== Intro\n\none two three\n\n=== Deep\n\nfour\n");
        let notes = create_test_file(&docs, "notes.md", "# Notes\n\nfive six\n");
        let parser = DocumentParser::new(docs.path());
        let documents = vec![parser.parse_file(&guide).unwrap(), parser.parse_file(&notes).unwrap()];
        let mut index = StructureIndex::new();
        index.build_from_documents(documents);
        (docs, index)
    }

    #[test]
    fn test_project_metadata() {
        let (_docs, index) = indexed_docs();

        let metadata = project_metadata(&index);

        assert_eq!(metadata.total_files, 2);
        assert_eq!(metadata.total_sections, 4);
        // "= Guide" | "== Intro one two three" | "=== Deep four" | "# Notes five six"
        assert_eq!(metadata.total_words, 2 + 5 + 3 + 4);
        assert_eq!(metadata.formats, vec!["asciidoc", "markdown"]);
        assert!(metadata.last_modified.is_some());
    }

    #[test]
    fn test_section_metadata() {
        let (_docs, index) = indexed_docs();

        let metadata = section_metadata(&index, "/guide:intro").unwrap();

        assert_eq!(metadata.path, "guide:intro");
        assert_eq!(metadata.title, "Intro");
        assert_eq!(metadata.word_count, 5);
        assert_eq!(metadata.subsection_count, 1);
        assert!(metadata.file.ends_with("guide.adoc"));
    }

    #[test]
    fn test_section_metadata_unknown_path() {
        let (_docs, index) = indexed_docs();

        assert!(section_metadata(&index, "guide:missing").unwrap_err().is_not_found());
    }
}
