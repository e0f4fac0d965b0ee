pub mod cross_reference;
pub mod document;
pub mod element;
pub mod location;
pub mod section;
pub mod warning;

pub use cross_reference::{CrossReference, XrefKind};
pub use document::{Document, DocumentFormat, IncludeInfo};
pub use element::{DiagramKind, Element, ElementKind, ElementType, ListType, UnknownElementType};
pub use location::SourceLocation;
pub use section::Section;
pub use warning::{ParseWarning, WarningKind};
