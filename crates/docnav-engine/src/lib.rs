pub mod corpus;
pub mod editing;
pub mod error;
pub mod index;
pub mod io;
pub mod models;
pub mod parsing;
pub mod services;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use corpus::{CorpusBuild, CorpusOptions, DocsRoot, Workspace};
pub use editing::{InsertOutcome, Position, UpdateOutcome, content_hash, insert_content, update_section};
pub use error::{Error, Result};
pub use index::{IndexStats, SearchResult, Structure, StructureIndex, StructureNode};
pub use io::{FileEditor, IoError, IoStep, ScanOptions};
pub use models::*;
pub use parsing::DocumentParser;
