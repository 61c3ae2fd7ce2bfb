//! The pattern-family table.
//!
//! Every citation form is one entry of [`PatternKind`]. The declaration
//! order is the precedence order used to break ties between overlapping
//! matches of equal length: longer, more specific forms come first.

use regex::Regex;
use std::sync::LazyLock;

use crate::numeral::NUMERAL_CHARS;

/// One citation form recognized by the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternKind {
    /// 第A条から第B条まで.
    ArticleRange,
    /// [第N条]第A項から第B項まで.
    ParagraphRange,
    /// [第N条][第N項]第A号から第B号まで.
    ItemRange,
    /// Law name followed by a parenthesised promulgation number, or a bare
    /// promulgation number.
    Promulgation,
    /// 前条, 次条, 同条 with optional paragraph and item.
    RelativeArticle,
    /// 前項, 次項, 同項, 前N項, 前各項 with optional item.
    RelativeParagraph,
    /// 前号, 次号, 同号.
    RelativeItem,
    /// 第N条[のM][第N項][第N号].
    Article,
    /// 第N項[第N号].
    Paragraph,
    /// 第N号.
    Item,
    /// 同法, 同令, 同規則.
    SaidLaw,
    /// A term introduced by 以下「…」という.
    AliasTerm,
    /// A name or abbreviation from the law dictionary.
    LawName,
    /// 第N編, 第N章, ... possibly chained (第一章第二節).
    Structure,
    /// 前章, 次節, 本章, この節, 同款 ...
    RelativeStructure,
    /// 他の法令, 政令で定める, ...
    Indirect,
}

/// Overlap suppression only compares matches of the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Provision,
    Structure,
    Indirect,
}

impl PatternKind {
    #[must_use]
    pub fn family(self) -> Family {
        match self {
            Self::Structure | Self::RelativeStructure => Family::Structure,
            Self::Indirect => Family::Indirect,
            _ => Family::Provision,
        }
    }
}

/// Expand `{N}` (a numeral) and `{B}` (branch suffixes) in a template.
#[allow(clippy::expect_used)] // Templates below are static and valid
fn compile(template: &str) -> Regex {
    let pattern = template
        .replace("{N}", &format!("[{NUMERAL_CHARS}]+"))
        .replace("{B}", &format!("(?:の[{NUMERAL_CHARS}]+)*"));
    Regex::new(&pattern).expect("valid regex")
}

pub(crate) static ARTICLE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"第(?P<a1>{N})条(?P<b1>{B})から第(?P<a2>{N})条(?P<b2>{B})まで")
});

pub(crate) static PARAGRAPH_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?:第(?P<a>{N})条(?P<b>{B}))?第(?P<p1>{N})項から第(?P<p2>{N})項まで")
});

pub(crate) static ITEM_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?:第(?P<a>{N})条(?P<b>{B}))?(?:第(?P<p>{N})項)?第(?P<i1>{N})号から第(?P<i2>{N})号まで")
});

pub(crate) static PROMULGATION: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?P<era>明治|大正|昭和|平成|令和)(?P<year>元|{N})年(?P<kind>[^0-9第\s()、。「」]{1,12}?)第(?P<num>{N})号")
});

pub(crate) static RELATIVE_ARTICLE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?P<rel>前条|次条|同条)(?:第(?P<p>{N})項)?(?:第(?P<i>{N})号)?")
});

pub(crate) static RELATIVE_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?P<rel>前各項|前(?P<n>[二三四五六七八九2-9])項|前項|次項|同項)(?:第(?P<i>{N})号)?")
});

pub(crate) static RELATIVE_ITEM: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?P<rel>前号|次号|同号)"));

pub(crate) static ARTICLE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"第(?P<a>{N})条(?P<b>{B})(?:第(?P<p>{N})項)?(?:第(?P<i>{N})号)?")
});

pub(crate) static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| compile(r"第(?P<p>{N})項(?:第(?P<i>{N})号)?"));

pub(crate) static ITEM: LazyLock<Regex> = LazyLock::new(|| compile(r"第(?P<i>{N})号"));

pub(crate) static SAID_LAW: LazyLock<Regex> = LazyLock::new(|| compile(r"同(?:法|令|規則)"));

pub(crate) static STRUCTURE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?:第{N}{B}(?:編|章|節|款|目))+"));

pub(crate) static STRUCTURE_PART: LazyLock<Regex> =
    LazyLock::new(|| compile(r"第(?P<n>{N})(?P<b>{B})(?P<level>編|章|節|款|目)"));

pub(crate) static RELATIVE_STRUCTURE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?P<rel>前|次|本|同|この)(?P<level>編|章|節|款)"));

pub(crate) static INDIRECT: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?P<other>(?:その他の|他の|関係)法令)|(?P<separate>別に法律で定める)|(?P<cabinet>政令で定める)|(?P<ministry>(?:内閣府|総務省|法務省|外務省|財務省|文部科学省|厚生労働省|農林水産省|経済産業省|国土交通省|環境省|防衛省|主務省)令で定める)",
    )
});

pub(crate) static DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"以下(?:[^「」。()]{0,20}?)「(?P<term>[^」]{1,30})」という")
});

/// A relative article reference that ends exactly at the end of the text.
pub(crate) static RELATIVE_ARTICLE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?P<rel>前条|次条|同条)$"));

/// A relative paragraph reference that ends exactly at the end of the text.
pub(crate) static RELATIVE_PARAGRAPH_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?P<rel>前項|次項|同項)$"));

/// A candidate law name ending exactly at the end of the text.
pub(crate) static LAW_NAME_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?P<name>[^\s0-9、。,.「」『』()第]{1,40}?(?:法律|法|政令|省令|府令|規則|条例|勅令))$")
});
