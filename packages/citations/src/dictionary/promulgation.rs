//! Japanese eras and promulgation numbers (公布番号) such as
//! 昭和二十二年法律第六十七号.

use std::fmt;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::numeral::{self, NUMERAL_CHARS};

/// A promulgation number written out in full.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PROMULGATION: LazyLock<Regex> = LazyLock::new(|| {
    let n = NUMERAL_CHARS;
    Regex::new(&format!(
        r"^(?P<era>明治|大正|昭和|平成|令和)(?P<year>元|[{n}]+)年(?P<kind>[^{n}第\s]+?)第(?P<num>[{n}]+)号$"
    ))
    .expect("valid regex")
});

/// Japanese era used for promulgation years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Era {
    Meiji,
    Taisho,
    Showa,
    Heisei,
    Reiwa,
}

impl Era {
    /// Era named in kanji (昭和) or by its e-Gov attribute value (Showa).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "明治" | "Meiji" => Some(Self::Meiji),
            "大正" | "Taisho" => Some(Self::Taisho),
            "昭和" | "Showa" => Some(Self::Showa),
            "平成" | "Heisei" => Some(Self::Heisei),
            "令和" | "Reiwa" => Some(Self::Reiwa),
            _ => None,
        }
    }

    #[must_use]
    pub fn kanji(self) -> &'static str {
        match self {
            Self::Meiji => "明治",
            Self::Taisho => "大正",
            Self::Showa => "昭和",
            Self::Heisei => "平成",
            Self::Reiwa => "令和",
        }
    }

    /// Gregorian year of the era's first year.
    #[must_use]
    pub fn start_year(self) -> i32 {
        match self {
            Self::Meiji => 1868,
            Self::Taisho => 1912,
            Self::Showa => 1926,
            Self::Heisei => 1989,
            Self::Reiwa => 2019,
        }
    }

    /// Gregorian year for a year of this era (元年 is year 1).
    #[must_use]
    pub fn gregorian_year(self, year: u32) -> i32 {
        self.start_year() + i32::try_from(year).unwrap_or(i32::MAX - self.start_year()) - 1
    }

    /// Calendar date for an era year, month and day.
    #[must_use]
    pub fn date(self, year: u32, month: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.gregorian_year(year), month, day)
    }
}

/// Promulgation number identifying a law: era, year, kind and number.
///
/// Kanji and Arabic spellings of the same number compare equal.
///
/// # Examples
/// ```
/// use hourei_citations::dictionary::PromulgationNumber;
///
/// let a = PromulgationNumber::parse("昭和二十二年法律第六十七号").unwrap();
/// let b = PromulgationNumber::parse("昭和22年法律第67号").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.gregorian_year(), 1947);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PromulgationNumber {
    pub era: Era,
    pub year: u32,
    /// 法律, 政令, 厚生労働省令, ...
    pub kind: String,
    pub number: u32,
}

impl PromulgationNumber {
    /// Parse a complete promulgation number.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let caps = PROMULGATION.captures(text.trim())?;
        Self::from_parts(&caps["era"], &caps["year"], &caps["kind"], &caps["num"])
    }

    /// Build from the captured parts of a promulgation clause.
    #[must_use]
    pub fn from_parts(era: &str, year: &str, kind: &str, number: &str) -> Option<Self> {
        let era = Era::parse(era)?;
        let year = if year == "元" {
            1
        } else {
            numeral::try_parse(year)?
        };
        let number = numeral::try_parse(number)?;
        let kind = kind.trim();
        if kind.is_empty() || year == 0 || number == 0 {
            return None;
        }
        Some(Self {
            era,
            year,
            kind: kind.to_string(),
            number,
        })
    }

    #[must_use]
    pub fn gregorian_year(&self) -> i32 {
        self.era.gregorian_year(self.year)
    }
}

impl fmt::Display for PromulgationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = if self.year == 1 {
            "元".to_string()
        } else {
            numeral::format(self.year)
        };
        write!(
            f,
            "{}{}年{}第{}号",
            self.era.kanji(),
            year,
            self.kind,
            numeral::format(self.number)
        )
    }
}
