//! Japanese numeral normalization.
//!
//! Statute text spells numbers in kanji (三十二, 百二十五, 千), in full-width
//! digits (３２) or in ASCII. Everything here is a pure function.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::ProvisionNumber;

/// Character class body matching any numeral character this module reads.
pub(crate) const NUMERAL_CHARS: &str = "0-9０-９〇零一二三四五六七八九十百千万壱弐参拾";

/// Label such as 第三十二条の五, 三十二の五 or 第3章の2.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PROVISION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    let n = NUMERAL_CHARS;
    Regex::new(&format!(
        r"^第?(?P<base>[{n}]+)(?:条|編|章|節|款|目|項|号)?(?P<branches>(?:の[{n}]+)*)$"
    ))
    .expect("valid regex")
});

const KANJI_DIGITS: [char; 10] = ['〇', '一', '二', '三', '四', '五', '六', '七', '八', '九'];

fn digit_value(ch: char) -> Option<u64> {
    match ch {
        '〇' | '零' => Some(0),
        '一' | '壱' => Some(1),
        '二' | '弐' => Some(2),
        '三' | '参' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        '0'..='9' => Some(u64::from(ch) - u64::from('0')),
        '０'..='９' => Some(u64::from(ch) - u64::from('０')),
        _ => None,
    }
}

fn place_value(ch: char) -> Option<u64> {
    match ch {
        '十' | '拾' => Some(10),
        '百' => Some(100),
        '千' => Some(1000),
        _ => None,
    }
}

/// Parse a numeral, returning `None` when the text is empty, contains a
/// character that is not part of a numeral, or overflows `u32`.
///
/// # Examples
/// ```
/// use hourei_citations::numeral::try_parse;
///
/// assert_eq!(try_parse("三十二"), Some(32));
/// assert_eq!(try_parse("百二十五"), Some(125));
/// assert_eq!(try_parse("３２"), Some(32));
/// assert_eq!(try_parse("条"), None);
/// ```
#[must_use]
pub fn try_parse(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut result: u64 = 0;
    let mut segment: u64 = 0;
    let mut pending: Option<u64> = None;

    for ch in text.chars() {
        if let Some(d) = digit_value(ch) {
            pending = Some(pending.unwrap_or(0).checked_mul(10)?.checked_add(d)?);
        } else if let Some(unit) = place_value(ch) {
            let value = pending.take().unwrap_or(1).checked_mul(unit)?;
            segment = segment.checked_add(value)?;
        } else if ch == '万' {
            let block = segment.checked_add(pending.take().unwrap_or(0))?;
            let block = if block == 0 { 1 } else { block };
            result = result.checked_add(block.checked_mul(10_000)?)?;
            segment = 0;
        } else {
            return None;
        }
        let limit = u64::from(u32::MAX);
        if result > limit || segment > limit || pending.is_some_and(|p| p > limit) {
            return None;
        }
    }

    let total = result + segment + pending.unwrap_or(0);
    u32::try_from(total).ok()
}

/// Parse a numeral, returning 0 for empty or unparseable input.
///
/// # Examples
/// ```
/// use hourei_citations::numeral::parse;
///
/// assert_eq!(parse("十"), 10);
/// assert_eq!(parse("二十"), 20);
/// assert_eq!(parse("千"), 1000);
/// assert_eq!(parse(""), 0);
/// ```
#[must_use]
pub fn parse(text: &str) -> u32 {
    try_parse(text).unwrap_or(0)
}

fn format_below_ten_thousand(n: u32, out: &mut String) {
    for (unit, symbol) in [(1000, '千'), (100, '百'), (10, '十')] {
        let digit = (n / unit) % 10;
        if digit > 1 {
            out.push(KANJI_DIGITS[digit as usize]);
        }
        if digit > 0 {
            out.push(symbol);
        }
    }
    let ones = n % 10;
    if ones > 0 {
        out.push(KANJI_DIGITS[ones as usize]);
    }
}

/// Render a number in canonical kanji.
///
/// Place values 十, 百 and 千 drop a leading 一. Values of one hundred million
/// and above have no kanji form here and are rendered in Arabic digits,
/// which [`parse`] still accepts.
#[must_use]
pub fn format(n: u32) -> String {
    if n == 0 {
        return "〇".to_string();
    }
    if n >= 100_000_000 {
        return n.to_string();
    }
    let mut out = String::new();
    let man = n / 10_000;
    if man > 0 {
        format_below_ten_thousand(man, &mut out);
        out.push('万');
    }
    format_below_ten_thousand(n % 10_000, &mut out);
    out
}

/// Render an article label such as 第三十二条の五.
#[must_use]
pub fn format_article(number: &ProvisionNumber) -> String {
    let mut out = format!("第{}条", format(number.base));
    for branch in &number.branches {
        out.push('の');
        out.push_str(&format(*branch));
    }
    out
}

/// Parse a provision label into a [`ProvisionNumber`].
///
/// Accepts kanji labels (第三十二条の五, 三十二の五, 第二章) as well as the
/// Arabic `Num` attribute forms (32_5, 32-5).
///
/// # Examples
/// ```
/// use hourei_citations::numeral::parse_provision;
/// use hourei_citations::types::ProvisionNumber;
///
/// assert_eq!(
///     parse_provision("第三十二条の五"),
///     Some(ProvisionNumber::with_branches(32, [5]))
/// );
/// assert_eq!(parse_provision("32_5"), Some(ProvisionNumber::with_branches(32, [5])));
/// assert_eq!(parse_provision("附則"), None);
/// ```
#[must_use]
pub fn parse_provision(label: &str) -> Option<ProvisionNumber> {
    let label = label.trim();
    if let Ok(number) = label.parse::<ProvisionNumber>() {
        return Some(number);
    }
    let caps = PROVISION_LABEL.captures(label)?;
    let base = try_parse(&caps["base"])?;
    let branches = caps["branches"]
        .split('の')
        .filter(|part| !part.is_empty())
        .map(try_parse)
        .collect::<Option<Vec<_>>>()?;
    Some(ProvisionNumber { base, branches })
}
