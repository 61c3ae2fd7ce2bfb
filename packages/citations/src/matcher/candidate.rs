//! Raw citation candidates produced by the matcher, before resolution.

use crate::dictionary::{PromulgationNumber, Resolution};
use crate::types::{
    CitationRole, Indirect, ProvisionNumber, RangeUnit, Relative, RelativeParagraph, Span,
    StructureLevel,
};

use super::patterns::PatternKind;

/// A law named in the text, resolved against the dictionary when possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LawMention {
    pub name: Option<String>,
    pub promulgation: Option<PromulgationNumber>,
    pub resolution: Option<Resolution>,
}

impl LawMention {
    /// Name to report: the written name, else the promulgation number.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.promulgation.as_ref().map(ToString::to_string))
            .unwrap_or_default()
    }
}

/// What a locator is relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// The law being parsed (第N条).
    CurrentLaw,
    /// The current article (第N項).
    CurrentArticle,
    /// The current paragraph (第N号).
    CurrentParagraph,
    /// A named law.
    Law(LawMention),
    /// 同法 and friends.
    SaidLaw,
    /// A defined term.
    Alias(String),
    Article(Relative),
    Paragraph(RelativeParagraph),
    Item(Relative),
}

impl Anchor {
    /// Whether the anchor names a law rather than a position.
    #[must_use]
    pub fn is_law_scope(&self) -> bool {
        matches!(self, Self::Law(_) | Self::SaidLaw | Self::Alias(_))
    }
}

/// Article, paragraph and item numbers written in a citation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator {
    pub article: Option<ProvisionNumber>,
    pub paragraph: Option<u32>,
    pub item: Option<u32>,
}

/// Numbered or relative structural reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureTarget {
    /// Explicit path such as 第一章第二節.
    Numbered(Vec<(StructureLevel, ProvisionNumber)>),
    /// 前章, 次節, 本章, ...
    Relative(StructureLevel, Relative),
}

/// Shape of a candidate reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Provision {
        anchor: Anchor,
        locator: Locator,
    },
    Range {
        anchor: Anchor,
        unit: RangeUnit,
        start: Locator,
        end: Locator,
    },
    /// A law as a whole.
    Law { anchor: Anchor },
    Structure {
        anchor: Anchor,
        target: StructureTarget,
    },
    Indirect(Indirect),
}

impl Reference {
    #[must_use]
    pub fn anchor(&self) -> Option<&Anchor> {
        match self {
            Self::Provision { anchor, .. }
            | Self::Range { anchor, .. }
            | Self::Law { anchor }
            | Self::Structure { anchor, .. } => Some(anchor),
            Self::Indirect(_) => None,
        }
    }

    pub(crate) fn anchor_mut(&mut self) -> Option<&mut Anchor> {
        match self {
            Self::Provision { anchor, .. }
            | Self::Range { anchor, .. }
            | Self::Law { anchor }
            | Self::Structure { anchor, .. } => Some(anchor),
            Self::Indirect(_) => None,
        }
    }

    pub(crate) fn locators_mut(&mut self) -> Vec<&mut Locator> {
        match self {
            Self::Provision { locator, .. } => vec![locator],
            Self::Range { start, end, .. } => vec![start, end],
            _ => Vec::new(),
        }
    }

    /// The locator that determines scope for a following sibling: the
    /// locator itself, or the end of a range.
    #[must_use]
    pub fn trailing_locator(&self) -> Option<&Locator> {
        match self {
            Self::Provision { locator, .. } => Some(locator),
            Self::Range { end, .. } => Some(end),
            _ => None,
        }
    }
}

/// One matched citation candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub span: Span,
    pub text: String,
    pub pattern: PatternKind,
    pub reference: Reference,
    pub role: CitationRole,
    /// Local compound group id within the scanned text.
    pub compound: Option<u32>,
}

impl Candidate {
    #[must_use]
    pub fn new(source: &str, span: Span, pattern: PatternKind, reference: Reference) -> Self {
        Self {
            span,
            text: source[span.start..span.end].to_string(),
            pattern,
            reference,
            role: CitationRole::Reference,
            compound: None,
        }
    }

    /// Grow the span leftwards to `start`, refreshing the text.
    pub(crate) fn extend_to(&mut self, source: &str, start: usize) {
        self.span.start = start;
        self.text = source[self.span.start..self.span.end].to_string();
    }
}

/// What an alias definition stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionReferent {
    /// Index into [`ScanOutput::candidates`](super::ScanOutput).
    Candidate(usize),
    /// A plain defined term, not a citation.
    Term(String),
}

/// 以下「term」という found in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub term: String,
    /// Span of the defining phrase itself.
    pub span: Span,
    pub referent: DefinitionReferent,
}
