//! Core data types shared by every stage of the citation pipeline.
//!
//! These types describe where a citation occurs (its source location), what
//! it points to (its target) and how confident the engine is about it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// Opaque canonical identifier of a law, e.g. an e-Gov law id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LawId(String);

impl LawId {
    /// Wrap an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LawId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Normalized number of an article or structural unit.
///
/// Branch numbering (第三十二条の五) is kept as a list of sub-numbers, so the
/// derived ordering places `32 < 32-2 < 32-5 < 33`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ProvisionNumber {
    /// Main integer number.
    pub base: u32,
    /// Branch numbers introduced by の, outermost first.
    pub branches: Vec<u32>,
}

impl ProvisionNumber {
    /// Plain number without branches.
    #[must_use]
    pub fn new(base: u32) -> Self {
        Self {
            base,
            branches: Vec::new(),
        }
    }

    /// Number with branch sub-numbers.
    #[must_use]
    pub fn with_branches(base: u32, branches: impl IntoIterator<Item = u32>) -> Self {
        Self {
            base,
            branches: branches.into_iter().collect(),
        }
    }

    /// Whether this number carries branch sub-numbers.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        !self.branches.is_empty()
    }

    /// The number one step before this one by arithmetic alone.
    ///
    /// `32-3` → `32-2`, `32-2` → `32`, `32` → `31`, `1` → `None`.
    #[must_use]
    pub fn arithmetic_predecessor(&self) -> Option<Self> {
        match self.branches.split_last() {
            Some((&last, rest)) if last > 2 => {
                let mut branches = rest.to_vec();
                branches.push(last - 1);
                Some(Self::with_branches(self.base, branches))
            }
            Some((_, rest)) => Some(Self::with_branches(self.base, rest.iter().copied())),
            None if self.base > 1 => Some(Self::new(self.base - 1)),
            None => None,
        }
    }
}

impl fmt::Display for ProvisionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for branch in &self.branches {
            write!(f, "-{branch}")?;
        }
        Ok(())
    }
}

impl FromStr for ProvisionNumber {
    type Err = String;

    /// Parse the Arabic forms used by e-Gov `Num` attributes (`32_5`) and by
    /// `Display` (`32-5`). A range-deleted `1:3` keeps its first number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = s.split(':').next().unwrap_or_default().trim();
        let mut parts = first.split(['_', '-']);
        let base = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(|| format!("invalid provision number '{s}'"))?;
        let branches = parts
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format!("invalid provision number '{s}'"))?;
        Ok(Self { base, branches })
    }
}

impl Serialize for ProvisionNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Main body of a law versus one of its supplementary provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Division {
    /// 本則.
    #[default]
    MainBody,
    /// 附則; the index is set only when the law has several of them.
    Supplementary { index: Option<usize> },
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MainBody => f.write_str("main"),
            Self::Supplementary { index: None } => f.write_str("supplementary"),
            Self::Supplementary { index: Some(i) } => write!(f, "supplementary[{i}]"),
        }
    }
}

impl Serialize for Division {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Structural level above the article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureLevel {
    /// 編.
    Part,
    /// 章.
    Chapter,
    /// 節.
    Section,
    /// 款.
    Subsection,
    /// 目 (the e-Gov `Division` element).
    Subdivision,
}

impl StructureLevel {
    /// All levels, outermost first.
    pub const ALL: [Self; 5] = [
        Self::Part,
        Self::Chapter,
        Self::Section,
        Self::Subsection,
        Self::Subdivision,
    ];

    /// Level named by the counter character in 第N章 etc.
    #[must_use]
    pub fn from_counter(counter: &str) -> Option<Self> {
        match counter {
            "編" => Some(Self::Part),
            "章" => Some(Self::Chapter),
            "節" => Some(Self::Section),
            "款" => Some(Self::Subsection),
            "目" => Some(Self::Subdivision),
            _ => None,
        }
    }

    /// e-Gov element name of this level.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Part => "Part",
            Self::Chapter => "Chapter",
            Self::Section => "Section",
            Self::Subsection => "Subsection",
            Self::Subdivision => "Division",
        }
    }

    /// Counter character used in statute text.
    #[must_use]
    pub fn counter(self) -> &'static str {
        match self {
            Self::Part => "編",
            Self::Chapter => "章",
            Self::Section => "節",
            Self::Subsection => "款",
            Self::Subdivision => "目",
        }
    }
}

/// One step of a structural path, e.g. chapter 3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StructureRef {
    pub level: StructureLevel,
    pub number: ProvisionNumber,
}

impl StructureRef {
    #[must_use]
    pub fn new(level: StructureLevel, number: ProvisionNumber) -> Self {
        Self { level, number }
    }
}

/// Byte range of a citation inside its normalized text unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the two ranges share at least one byte.
    #[must_use]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Where a citation occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub law_id: LawId,
    pub division: Division,
    pub article: ProvisionNumber,
    pub paragraph: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<u32>,
}

/// Direction of a relative reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relative {
    /// 前.
    Preceding,
    /// 次.
    Following,
    /// 同.
    Same,
}

/// Relative paragraph reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "form", content = "count", rename_all = "kebab-case")]
pub enum RelativeParagraph {
    /// 前項 (count 1) or 前二項, 前三項, ...
    Preceding(u32),
    /// 次項.
    Following,
    /// 同項.
    Same,
    /// 前各項.
    AllPreceding,
}

/// Reference resolved only through earlier text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "form", rename_all = "kebab-case")]
pub enum Contextual {
    /// 同法, 同令 or 同規則.
    SaidLaw,
    /// A term introduced by 以下「…」という.
    Alias { term: String },
}

/// Reference to law that cannot be pinned to a provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Indirect {
    /// 他の法令, その他の法令, 関係法令.
    OtherLaws,
    /// 政令で定める.
    CabinetOrder,
    /// 省令で定める, 内閣府令で定める.
    MinisterialOrdinance,
    /// 別に法律で定める.
    SeparateAct,
}

/// Granularity of a range reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeUnit {
    Article,
    Paragraph,
    Item,
}

/// What kind of reference the citation text is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CitationKind {
    /// Provision of the law being parsed.
    Internal,
    /// Provision or whole of another law that was resolved.
    External {
        law_name: Option<String>,
        promulgation: Option<String>,
    },
    /// Another law that the dictionary does not know.
    ExternalUnresolved {
        law_name: Option<String>,
        promulgation: Option<String>,
    },
    RelativeArticle { relative: Relative },
    RelativeParagraph { relative: RelativeParagraph },
    RelativeItem { relative: Relative },
    Structural { level: StructureLevel },
    Range { unit: RangeUnit },
    Contextual { context: Contextual },
    Indirect { indirect: Indirect },
}

impl CitationKind {
    /// Short label used on graph edges.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External { .. } => "external",
            Self::ExternalUnresolved { .. } => "external-unresolved",
            Self::RelativeArticle { .. } => "relative-article",
            Self::RelativeParagraph { .. } => "relative-paragraph",
            Self::RelativeItem { .. } => "relative-item",
            Self::Structural { .. } => "structural",
            Self::Range { .. } => "range",
            Self::Contextual { .. } => "contextual",
            Self::Indirect { .. } => "indirect",
        }
    }
}

/// What a citation points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Target {
    /// A concrete article, optionally narrowed to a paragraph and item.
    Provision {
        law_id: LawId,
        article: ProvisionNumber,
        #[serde(skip_serializing_if = "Option::is_none")]
        paragraph: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        item: Option<u32>,
    },
    /// A law as a whole.
    Law { law_id: LawId },
    /// A part, chapter, section, subsection or subdivision.
    Structure {
        law_id: LawId,
        path: Vec<StructureRef>,
    },
    /// Every paragraph of `article` numbered below `before` (前各項).
    PrecedingParagraphs {
        law_id: LawId,
        article: ProvisionNumber,
        before: u32,
    },
    /// No canonical target; keeps whatever locator survived.
    Unresolved {
        #[serde(skip_serializing_if = "Option::is_none")]
        article: Option<ProvisionNumber>,
        #[serde(skip_serializing_if = "Option::is_none")]
        paragraph: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        item: Option<u32>,
    },
}

impl Target {
    /// Target law, if the target is resolved.
    #[must_use]
    pub fn law_id(&self) -> Option<&LawId> {
        match self {
            Self::Provision { law_id, .. }
            | Self::Law { law_id }
            | Self::Structure { law_id, .. }
            | Self::PrecedingParagraphs { law_id, .. } => Some(law_id),
            Self::Unresolved { .. } => None,
        }
    }

    /// Unresolved target with no locator at all.
    #[must_use]
    pub fn unknown() -> Self {
        Self::Unresolved {
            article: None,
            paragraph: None,
            item: None,
        }
    }
}

/// How a citation's target was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMethod {
    DirectPattern,
    Dictionary,
    Context,
    RangeExpansion,
    Unresolved,
}

impl ResolutionMethod {
    /// Rank used to break ties; higher wins.
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            Self::DirectPattern => 4,
            Self::Dictionary => 3,
            Self::RangeExpansion => 2,
            Self::Context => 1,
            Self::Unresolved => 0,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectPattern => "direct-pattern",
            Self::Dictionary => "dictionary",
            Self::Context => "context",
            Self::RangeExpansion => "range-expansion",
            Self::Unresolved => "unresolved",
        }
    }
}

/// How the citing provision uses the cited one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CitationRole {
    #[default]
    Reference,
    /// 準用.
    MutatisMutandis,
    /// 読み替え.
    ReadAs,
    /// みなす.
    Deemed,
    /// に基づく.
    BasedOn,
    /// による.
    AccordingTo,
}

/// A resolved (or explicitly unresolved) reference from one provision to
/// another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    pub source: SourceLocation,
    /// Matched text as it appears in the normalized source.
    pub text: String,
    pub span: Span,
    #[serde(flatten)]
    pub kind: CitationKind,
    pub target: Target,
    pub confidence: f64,
    pub method: ResolutionMethod,
    pub role: CitationRole,
    /// Shared by citations listed together with 及び, 又は and the like.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compound: Option<u32>,
    /// Set when the verifier replaced the engine's own resolution.
    pub verified: bool,
}

impl Citation {
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        self.method == ResolutionMethod::Unresolved
    }
}
