//! Hierarchical model of a parsed statute.

use chrono::NaiveDate;
use serde::Serialize;

use crate::dictionary::{Era, PromulgationNumber};
use crate::error::ParseWarning;
use crate::types::{Division, ProvisionNumber, StructureLevel};

/// Kind of legal instrument, from the `LawType` attribute of the law root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LawType {
    Constitution,
    /// 法律.
    Act,
    /// 政令.
    CabinetOrder,
    /// 勅令.
    ImperialOrdinance,
    /// 府令, 省令.
    MinisterialOrdinance,
    /// 規則.
    Rule,
    Misc,
}

impl LawType {
    /// Map an e-Gov `LawType` attribute value.
    #[must_use]
    pub fn from_attribute(value: &str) -> Self {
        match value {
            "Constitution" => Self::Constitution,
            "Act" => Self::Act,
            "CabinetOrder" => Self::CabinetOrder,
            "ImperialOrdinance" => Self::ImperialOrdinance,
            "MinisterialOrdinance" => Self::MinisterialOrdinance,
            "Rule" => Self::Rule,
            _ => Self::Misc,
        }
    }

    /// Kind word used in promulgation numbers, where it does not depend on
    /// the issuing ministry.
    #[must_use]
    pub fn promulgation_kind(self) -> Option<&'static str> {
        match self {
            Self::Act => Some("法律"),
            Self::CabinetOrder => Some("政令"),
            Self::ImperialOrdinance => Some("勅令"),
            _ => None,
        }
    }
}

/// Law-level metadata from the root element, `LawNum` and `LawTitle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LawMetadata {
    pub title: Option<String>,
    pub title_kana: Option<String>,
    /// Abbreviations listed in the `Abbrev` attribute.
    pub abbreviations: Vec<String>,
    /// Law number as written, e.g. 昭和二十二年法律第六十七号.
    pub law_num: Option<String>,
    pub law_type: Option<LawType>,
    pub era: Option<Era>,
    pub year: Option<u32>,
    pub promulgation: Option<PromulgationNumber>,
    pub promulgation_date: Option<NaiveDate>,
}

/// A numeral as written plus its normalized value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Numeral {
    pub raw: String,
    pub number: ProvisionNumber,
}

impl Numeral {
    #[must_use]
    pub fn new(raw: impl Into<String>, number: ProvisionNumber) -> Self {
        Self {
            raw: raw.into(),
            number,
        }
    }
}

/// Numbered item (号) or sub-item (イ, (1), ...) of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Title as written (一, イ, (1)).
    pub label: String,
    pub number: Option<u32>,
    pub text: String,
    pub children: Vec<Item>,
}

/// Paragraph (項) of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    /// 1-based paragraph number.
    pub number: u32,
    /// `true` for the paragraph synthesized for an article without any.
    pub implicit: bool,
    pub text: String,
    pub items: Vec<Item>,
}

/// Article (条).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub numeral: Numeral,
    /// 条見出し such as (定義).
    pub caption: Option<String>,
    pub title: Option<String>,
    /// Never empty: an article without paragraphs holds one implicit paragraph.
    pub paragraphs: Vec<Paragraph>,
    pub deleted: bool,
    pub division: Division,
}

impl Article {
    #[must_use]
    pub fn number(&self) -> &ProvisionNumber {
        &self.numeral.number
    }

    /// Highest paragraph number, used when a reference spills over from the
    /// following article.
    #[must_use]
    pub fn last_paragraph(&self) -> u32 {
        self.paragraphs.iter().map(|p| p.number).max().unwrap_or(1)
    }
}

/// Part, chapter, section, subsection or subdivision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureNode {
    pub level: StructureLevel,
    pub numeral: Numeral,
    pub title: Option<String>,
    pub division: Division,
    pub children: Vec<DocumentNode>,
}

/// Node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "kebab-case")]
pub enum DocumentNode {
    Structure(StructureNode),
    Article(Article),
}

/// Main provision or one supplementary provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionBlock {
    pub division: Division,
    /// `AmendLawNum` of a supplementary provision.
    pub amend_law_num: Option<String>,
    /// Supplementary provision published in extract (抄).
    pub extract: bool,
    pub nodes: Vec<DocumentNode>,
}

impl DivisionBlock {
    /// Articles in document order, depth first.
    #[must_use]
    pub fn articles(&self) -> Vec<&Article> {
        let mut out = Vec::new();
        collect_articles(&self.nodes, &mut out);
        out
    }

    /// Article numbers in document order.
    #[must_use]
    pub fn outline(&self) -> Vec<ProvisionNumber> {
        self.articles()
            .into_iter()
            .map(|article| article.number().clone())
            .collect()
    }
}

fn collect_articles<'a>(nodes: &'a [DocumentNode], out: &mut Vec<&'a Article>) {
    for node in nodes {
        match node {
            DocumentNode::Article(article) => out.push(article),
            DocumentNode::Structure(structure) => collect_articles(&structure.children, out),
        }
    }
}

/// A parsed statute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub metadata: LawMetadata,
    /// Main body first, then supplementary provisions in document order.
    pub divisions: Vec<DivisionBlock>,
    pub warnings: Vec<ParseWarning>,
}

impl Document {
    /// Every article of every division in document order.
    #[must_use]
    pub fn articles(&self) -> Vec<&Article> {
        self.divisions
            .iter()
            .flat_map(DivisionBlock::articles)
            .collect()
    }

    #[must_use]
    pub fn division(&self, division: Division) -> Option<&DivisionBlock> {
        self.divisions.iter().find(|block| block.division == division)
    }
}
