//! Whole-tree builds: scan a docs root, parse what it finds, index the result.
//!
//! A document that fails to parse is logged and left out; it never stops the
//! rest of the tree from being indexed.

use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::editing::{self, InsertOutcome, Position, UpdateOutcome};
use crate::error::{Error, Result};
use crate::index::StructureIndex;
use crate::io::{FileEditor, ScanOptions, scan_documents, validate_docs_root};
use crate::models::{Document, DocumentFormat};
use crate::parsing::markdown::sort_markdown_files;
use crate::parsing::{DEFAULT_MAX_INCLUDE_DEPTH, DocumentParser};
use crate::services::validation::relative_display;
use crate::services::{IssueKind, SectionContent, ValidationIssue, ValidationReport, read_section_content, validate_structure};

#[derive(Debug, Clone)]
pub struct CorpusOptions {
    pub scan: ScanOptions,
    pub max_include_depth: usize,
    /// Markdown file names that are never indexed.
    pub skip_files: Vec<String>,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            scan: ScanOptions::default(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            skip_files: vec!["README.md".to_string(), "CLAUDE.md".to_string()],
        }
    }
}

/// Result of one corpus build.
#[derive(Debug, Default)]
pub struct CorpusBuild {
    pub index: StructureIndex,
    /// Include failures: circular and unresolved includes.
    pub errors: Vec<ValidationIssue>,
    /// Duplicate-path warnings from the index.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DocsRoot {
    root: PathBuf,
    options: CorpusOptions,
}

impl DocsRoot {
    pub fn new(root: impl Into<PathBuf>, options: CorpusOptions) -> Result<Self> {
        let root = root.into();
        validate_docs_root(&root)?;
        Ok(Self { root, options })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &CorpusOptions {
        &self.options
    }

    /// AsciiDoc files in path order, then Markdown files in folder order.
    pub fn document_files(&self) -> Result<Vec<PathBuf>> {
        let files = scan_documents(&self.root, &self.options.scan)?;
        let (asciidoc, markdown): (Vec<PathBuf>, Vec<PathBuf>) = files
            .into_iter()
            .partition(|file| DocumentFormat::from_path(file) == Some(DocumentFormat::Asciidoc));

        let markdown = markdown
            .into_iter()
            .filter(|file| !self.is_skipped(file))
            .collect();

        let mut ordered = asciidoc;
        ordered.extend(sort_markdown_files(markdown, &self.root));
        Ok(ordered)
    }

    pub fn build_index(&self) -> Result<CorpusBuild> {
        let parser = DocumentParser::new(&self.root).with_max_include_depth(self.options.max_include_depth);
        let mut documents: Vec<Document> = Vec::new();
        let mut errors = Vec::new();

        for file in self.document_files()? {
            match parser.parse_file(&file) {
                Ok(document) => {
                    for include in document.includes.iter().filter(|include| !include.resolved) {
                        let site = &include.source_location;
                        errors.push(ValidationIssue {
                            kind: IssueKind::UnresolvedInclude,
                            path: format!("{}:{}", relative_display(&site.file, &self.root), site.line),
                            message: format!("Include target not found: {}", include.target_path.display()),
                        });
                    }
                    documents.push(document);
                }
                Err(e) => {
                    warn!("Failed to parse {}: {e}", file.display());
                    if let Error::CircularInclude { .. } = e {
                        errors.push(ValidationIssue {
                            kind: IssueKind::CircularInclude,
                            path: relative_display(&file, &self.root),
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        let mut index = StructureIndex::new();
        let warnings = index.build_from_documents(documents);
        info!(
            "Indexed {} with {} include error(s)",
            self.root.display(),
            errors.len()
        );

        Ok(CorpusBuild {
            index,
            errors,
            warnings,
        })
    }

    fn is_skipped(&self, file: &Path) -> bool {
        file.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.options.skip_files.iter().any(|skip| skip == name))
    }
}

/// A docs root together with its current index.
///
/// Every successful write is followed by a full rebuild, so queries never
/// observe an index older than the files on disk as far as this workspace
/// knows.
#[derive(Debug)]
pub struct Workspace {
    docs: DocsRoot,
    editor: FileEditor,
    build: CorpusBuild,
}

impl Workspace {
    pub fn open(docs: DocsRoot) -> Result<Self> {
        let build = docs.build_index()?;
        Ok(Self {
            docs,
            editor: FileEditor::new(),
            build,
        })
    }

    pub fn docs_root(&self) -> &DocsRoot {
        &self.docs
    }

    pub fn index(&self) -> &StructureIndex {
        &self.build.index
    }

    pub fn build_errors(&self) -> &[ValidationIssue] {
        &self.build.errors
    }

    pub fn build_warnings(&self) -> &[String] {
        &self.build.warnings
    }

    pub fn rebuild(&mut self) -> Result<()> {
        self.build = self.docs.build_index()?;
        Ok(())
    }

    pub fn read_section(&self, path: &str) -> Result<SectionContent> {
        read_section_content(&self.build.index, &self.editor, path)
    }

    pub fn validate(&self) -> Result<ValidationReport> {
        validate_structure(
            &self.build.index,
            self.docs.path(),
            &self.docs.options().scan,
            &self.build.errors,
        )
    }

    pub fn update_section(
        &mut self,
        path: &str,
        content: &str,
        preserve_title: bool,
        expected_hash: Option<&str>,
    ) -> Result<UpdateOutcome> {
        let outcome = editing::update_section(
            &self.build.index,
            &self.editor,
            path,
            content,
            preserve_title,
            expected_hash,
        )?;
        self.rebuild()?;
        Ok(outcome)
    }

    pub fn insert_content(&mut self, path: &str, position: Position, content: &str) -> Result<InsertOutcome> {
        let outcome = editing::insert_content(&self.build.index, &self.editor, path, position, content)?;
        self.rebuild()?;
        Ok(outcome)
    }
}
