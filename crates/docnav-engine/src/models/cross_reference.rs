use serde::Serialize;

use super::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum XrefKind {
    /// `<<target>>` or `<<target,text>>` inside the corpus.
    Internal,
    /// `xref:other.adoc#anchor[text]` pointing at another document.
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossReference {
    pub kind: XrefKind,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub source_location: SourceLocation,
}
