//! Hourei Citations - Citation graph extraction for Japanese statutes.
//!
//! This crate parses statutes in e-Gov law XML, finds every reference one
//! provision makes to another, resolves each reference to a concrete target
//! and emits confidence-scored edges for a citation graph.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use hourei_citations::{CitationEngine, LawDictionary, LawIdentity};
//! use hourei_citations::types::{LawId, ResolutionMethod};
//!
//! let dictionary = LawDictionary::new(vec![LawIdentity::new("129AC0000000089", "民法")]).unwrap();
//! let engine = CitationEngine::new(Arc::new(dictionary));
//!
//! let citations = engine.extract_text(&LawId::new("L1"), "民法第九十条の規定による");
//! assert_eq!(citations.len(), 1);
//! assert_eq!(citations[0].method, ResolutionMethod::DirectPattern);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration constants and engine settings
//! - [`types`]: Core data types (LawId, ProvisionNumber, Citation, Target, etc.)
//! - [`error`]: Error and warning types and Result alias
//! - [`numeral`]: Kanji numeral normalization
//! - [`xml`]: XML utilities and the depth-tracked markup scanner
//! - [`document`]: Document model and structure parser
//! - [`dictionary`]: Law identity resolution
//! - [`matcher`]: Citation pattern matching
//! - [`context`]: Context resolution of relative references
//! - [`range`]: Range expansion
//! - [`scoring`]: Confidence scoring and deduplication
//! - [`verifier`]: Optional verifier collaborator
//! - [`graph`]: Citation graph emission
//! - [`engine`]: Main extraction service

pub mod config;
pub mod context;
pub mod dictionary;
pub mod document;
pub mod engine;
pub mod error;
pub mod graph;
pub mod matcher;
pub mod numeral;
pub mod range;
pub mod scoring;
pub mod types;
pub mod verifier;
pub mod xml;

// Re-export main entry points
pub use document::parse_document;
pub use engine::{CitationEngine, Extraction};

// Re-export commonly used items
pub use config::EngineConfig;
pub use dictionary::{LawDictionary, LawIdentity};
pub use error::{CitationError, ParseWarning, Result};
pub use graph::{EdgeSink, GraphEdge, GraphNode};
pub use types::{Citation, CitationKind, LawId, ProvisionNumber, Target};
pub use verifier::{Verifier, VerifierError, VerifierSession};
