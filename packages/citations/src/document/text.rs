//! Text normalization applied to every text unit before matching.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// NFKC-normalize and collapse whitespace.
///
/// Full-width digits and parentheses become ASCII (３ → 3, （ → (), the
/// ideographic space becomes a plain space, and runs of whitespace shrink to
/// one space. Byte offsets reported for citations refer to this form.
///
/// # Examples
/// ```
/// use hourei_citations::document::normalize_text;
///
/// assert_eq!(normalize_text("第３条（定義）\n　前項"), "第3条(定義) 前項");
/// ```
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let nfkc: String = text.nfkc().collect();
    WHITESPACE.replace_all(nfkc.trim(), " ").into_owned()
}
