//! Statute document model and the e-Gov XML structure parser.

mod hierarchy;
mod parser;
mod text;
mod types;

pub use hierarchy::{create_egov_hierarchy, ElementSpec, HierarchyRegistry};
pub use parser::parse_document;
pub use text::normalize_text;
pub use types::{
    Article, Document, DocumentNode, DivisionBlock, Item, LawMetadata, LawType, Numeral,
    Paragraph, StructureNode,
};
