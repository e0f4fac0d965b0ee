use serde::Serialize;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::index::StructureIndex;
use crate::io::FileEditor;
use crate::models::DocumentFormat;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentLocation {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionContent {
    pub path: String,
    pub title: String,
    pub content: String,
    pub location: ContentLocation,
    pub format: DocumentFormat,
}

/// Current text of a section, read back from disk rather than the cache.
pub fn read_section_content(index: &StructureIndex, editor: &FileEditor, path: &str) -> Result<SectionContent> {
    let path = path.trim_start_matches('/');
    let Some(section) = index.get_section(path) else {
        return Err(Error::NotFound {
            path: path.to_string(),
            suggestions: index.get_suggestions(path, 5),
        });
    };

    let file = &section.source_location.file;
    let start_line = section.source_location.line;
    let lines = match section.source_location.end_line {
        Some(end_line) => editor.read_lines(file, start_line, end_line)?,
        None => {
            let text = editor.read_file(file)?;
            text.split_inclusive('\n')
                .skip(start_line - 1)
                .map(str::to_string)
                .collect()
        }
    };
    let end_line = start_line + lines.len().saturating_sub(1);

    Ok(SectionContent {
        path: section.path.clone(),
        title: section.title.clone(),
        content: lines.concat(),
        location: ContentLocation {
            file: file.clone(),
            start_line,
            end_line,
        },
        format: DocumentFormat::from_path(file).unwrap_or(DocumentFormat::Markdown),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::StructureIndex;
    use crate::parsing::DocumentParser;
    use crate::tests::{create_test_docs_dir, create_test_file};
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_reads_current_section_lines() {
        // Given an indexed file that changed on disk afterwards
        let docs = create_test_docs_dir();
        let file = create_test_file(&docs, "guide.adoc", "= Guide\n\n== Intro\n\nHello.\n\n== Next\n");
        let document = DocumentParser::new(docs.path()).parse_file(&file).unwrap();
        let mut index = StructureIndex::new();
        index.build_from_documents(vec![document]);
        fs::write(&file, "= Guide\n\n== Intro\n\nChanged.\n\n== Next\n").unwrap();

        // When reading the section
        let content = read_section_content(&index, &FileEditor::new(), "/guide:intro").unwrap();

        // Then the disk content wins over the index cache
        assert_eq!(content.content, "== Intro\n\nChanged.\n\n");
        assert_eq!(content.title, "Intro");
        assert_eq!(content.location.start_line, 3);
        assert_eq!(content.location.end_line, 6);
        assert_eq!(content.format, DocumentFormat::Asciidoc);
    }

    #[test]
    fn test_unknown_section() {
        let index = StructureIndex::new();

        let err = read_section_content(&index, &FileEditor::new(), "nope").unwrap_err();

        assert!(err.is_not_found());
    }
}
