//! Error types for the citation engine.
//!
//! Uses the dual pattern the rest of the crate relies on: `CitationError`
//! for failures that abort a single call, and `ParseWarning` for recoverable
//! problems that are collected alongside the result.

use serde::Serialize;
use thiserror::Error;

/// Main error type for the citation library.
#[derive(Debug, Error)]
pub enum CitationError {
    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// Missing required XML element.
    #[error("Missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// The law dictionary table is inconsistent.
    #[error("Invalid law dictionary: {0}")]
    InvalidDictionary(String),

    /// Engine configuration is out of range.
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// YAML deserialization error.
    #[error("YAML parsing failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Result type alias for citation operations.
pub type Result<T> = std::result::Result<T, CitationError>;

/// Recoverable problem found while parsing or resolving a document.
///
/// Warnings never abort processing; the affected element is skipped or
/// degraded and the rest of the document is still handled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "warning", rename_all = "kebab-case")]
pub enum ParseWarning {
    /// An element was never closed; parsing stopped at the last closed element.
    Structural { element: String, offset: usize },

    /// An article block could not be parsed and was skipped.
    MalformedArticle { offset: usize, message: String },

    /// The same article numeral appeared twice in one division.
    DuplicateArticle { division: String, article: String },

    /// A numeral could not be normalized and fell back to zero.
    NumeralFallback { element: String, raw: String },

    /// A law name or promulgation number matched no dictionary entry.
    IdentityResolutionMiss { name: String },
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural { element, offset } => {
                write!(f, "unterminated <{element}> at byte {offset}")
            }
            Self::MalformedArticle { offset, message } => {
                write!(f, "malformed article at byte {offset}: {message}")
            }
            Self::DuplicateArticle { division, article } => {
                write!(f, "duplicate article {article} in {division}")
            }
            Self::NumeralFallback { element, raw } => {
                write!(f, "unparseable numeral '{raw}' in <{element}>")
            }
            Self::IdentityResolutionMiss { name } => {
                write!(f, "no dictionary entry for '{name}'")
            }
        }
    }
}
