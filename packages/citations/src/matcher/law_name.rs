//! Heuristic recognition of law names the dictionary does not know.
//!
//! A name is only guessed when it sits directly in front of an article
//! reference or a promulgation clause, and it must end in a law-kind
//! suffix (法, 法律, 政令, 規則, ...).

use crate::config::MAX_LAW_NAME_CHARS;

use super::patterns::LAW_NAME_SUFFIX;

/// Particles and connectives after which a law name may start.
const SPLITTERS: &[&str] = &[
    "の規定",
    "において",
    "について",
    "並びに",
    "若しくは",
    "により",
    "及び",
    "又は",
    "とし",
    "は",
    "が",
    "を",
    "、",
];

/// Prefixes that mark a relative or generic expression, never a name.
const EXCLUDED_PREFIXES: &[&str] = &["同", "前", "次", "本", "この", "当該", "各"];

/// Bare law kinds, which name no particular law.
const GENERIC_KINDS: &[&str] = &["法律", "政令", "省令", "府令", "規則", "条例", "勅令"];

/// Ordinary words that happen to end in 法.
const NON_LAW_ENDINGS: &[&str] = &["方法", "手法", "用法", "技法", "製法", "工法", "寸法", "文法"];

/// Guess a law name ending exactly at the end of `prefix`.
///
/// Returns the byte offset in `prefix` where the name starts, together with
/// the name.
pub(crate) fn guess(prefix: &str) -> Option<(usize, String)> {
    let caps = LAW_NAME_SUFFIX.captures(prefix)?;
    let matched = caps.name("name")?;
    let mut start = matched.start();

    let candidate = matched.as_str();
    if let Some(cut) = SPLITTERS
        .iter()
        .filter_map(|splitter| {
            candidate
                .rfind(splitter)
                .map(|position| position + splitter.len())
        })
        .max()
    {
        start += cut;
    }
    let name = &prefix[start..];

    let chars = name.chars().count();
    if !(2..=MAX_LAW_NAME_CHARS).contains(&chars)
        || EXCLUDED_PREFIXES.iter().any(|p| name.starts_with(p))
        || name.ends_with("法令")
        || name.contains(['条', '項', '号'])
        || GENERIC_KINDS.contains(&name)
        || NON_LAW_ENDINGS.iter().any(|w| name.ends_with(w))
    {
        return None;
    }
    Some((start, name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_guess_after_particle() {
        let prefix = "前項の規定は架空法";
        let (start, name) = guess(prefix).unwrap();
        assert_eq!(name, "架空法");
        assert_eq!(&prefix[start..], "架空法");
    }

    #[test]
    fn test_guess_whole_prefix() {
        assert_eq!(guess("架空振興法").map(|(_, n)| n), Some("架空振興法".to_string()));
        assert_eq!(
            guess("及び架空事業規則").map(|(_, n)| n),
            Some("架空事業規則".to_string())
        );
    }

    #[test]
    fn test_rejects_relative_and_generic() {
        assert_eq!(guess("同法"), None);
        assert_eq!(guess("この法律"), None);
        assert_eq!(guess("当該規則"), None);
        assert_eq!(guess("その他の関係法令"), None);
        assert_eq!(guess("この場合において法"), None);
        assert_eq!(guess("定める方法"), None);
    }

    #[test]
    fn test_requires_law_suffix() {
        assert_eq!(guess("前項の規定"), None);
        assert_eq!(guess(""), None);
    }
}
