//! Read-side services layered over the [`crate::index::StructureIndex`].

pub mod content;
pub mod metadata;
pub mod validation;

pub use content::{ContentLocation, SectionContent, read_section_content};
pub use metadata::{ProjectMetadata, SectionMetadata, project_metadata, section_metadata};
pub use validation::{IssueKind, ValidationIssue, ValidationReport, validate_structure};
