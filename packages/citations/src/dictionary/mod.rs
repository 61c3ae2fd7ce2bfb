//! Law identity resolution.
//!
//! A [`LawDictionary`] maps law names, abbreviations and promulgation
//! numbers to canonical [`LawId`]s. It is built once, never mutated, and
//! shared between threads behind an `Arc`.

mod promulgation;

pub use promulgation::{Era, PromulgationNumber};

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MIN_SUBSTRING_CHARS;
use crate::error::{CitationError, Result};
use crate::types::LawId;

/// One entry of the law dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LawIdentity {
    /// Canonical identifier.
    pub id: LawId,

    /// Primary (official) name.
    pub name: String,

    /// Abbreviations and other names the law is cited by.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Promulgation number, e.g. 明治二十九年法律第八十九号.
    #[serde(default)]
    pub promulgation: Option<String>,
}

impl LawIdentity {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: LawId::new(id),
            name: name.into(),
            aliases: Vec::new(),
            promulgation: None,
        }
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_promulgation(mut self, promulgation: impl Into<String>) -> Self {
        self.promulgation = Some(promulgation.into());
        self
    }
}

/// Which lookup step produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchVia {
    PrimaryName,
    Alias,
    PromulgationNumber,
    Substring,
}

/// Successful dictionary lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub law_id: LawId,
    /// Primary name of the resolved law.
    pub name: String,
    pub via: MatchVia,
}

#[derive(Deserialize)]
struct DictionaryFile {
    laws: Vec<LawIdentity>,
}

/// Immutable lookup table from law names to canonical identifiers.
#[derive(Debug)]
pub struct LawDictionary {
    entries: Vec<LawIdentity>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    by_promulgation: HashMap<PromulgationNumber, usize>,
    name_pattern: Option<Regex>,
}

impl LawDictionary {
    /// Build and validate a dictionary.
    ///
    /// Ids must be non-empty and unique and every law needs a name. When two
    /// entries share a name or alias the earlier one wins, so lookups stay
    /// deterministic in insertion order.
    pub fn new(entries: Vec<LawIdentity>) -> Result<Self> {
        let mut ids = HashMap::new();
        let mut by_name = HashMap::new();
        let mut by_alias = HashMap::new();
        let mut by_promulgation = HashMap::new();

        for (index, entry) in entries.iter().enumerate() {
            if entry.id.as_str().trim().is_empty() {
                return Err(CitationError::InvalidDictionary(format!(
                    "entry {index} ('{}') has an empty id",
                    entry.name
                )));
            }
            if entry.name.trim().is_empty() {
                return Err(CitationError::InvalidDictionary(format!(
                    "law {} has an empty name",
                    entry.id
                )));
            }
            if ids.insert(entry.id.clone(), index).is_some() {
                return Err(CitationError::InvalidDictionary(format!(
                    "duplicate law id {}",
                    entry.id
                )));
            }

            by_name.entry(entry.name.clone()).or_insert(index);
            for alias in entry.aliases.iter().filter(|a| !a.trim().is_empty()) {
                by_alias.entry(alias.clone()).or_insert(index);
            }
            if let Some(raw) = &entry.promulgation {
                let number = PromulgationNumber::parse(raw).ok_or_else(|| {
                    CitationError::InvalidDictionary(format!(
                        "law {} has an unparseable promulgation number '{raw}'",
                        entry.id
                    ))
                })?;
                by_promulgation.entry(number).or_insert(index);
            }
        }

        let name_pattern = build_name_pattern(by_name.keys().chain(by_alias.keys()))?;

        Ok(Self {
            entries,
            by_name,
            by_alias,
            by_promulgation,
            name_pattern,
        })
    }

    /// Load a dictionary from YAML of the form `laws: [{id, name, aliases,
    /// promulgation}]`.
    ///
    /// # Examples
    /// ```
    /// use hourei_citations::dictionary::LawDictionary;
    ///
    /// let yaml = "laws:\n  - id: L1\n    name: 民法\n";
    /// let dictionary = LawDictionary::from_yaml_str(yaml).unwrap();
    /// assert_eq!(dictionary.resolve("民法").unwrap().law_id.as_str(), "L1");
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: DictionaryFile = serde_yaml_ng::from_str(yaml)?;
        Self::new(file.laws)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a canonical id.
    #[must_use]
    pub fn get(&self, id: &LawId) -> Option<&LawIdentity> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    /// Resolve a law name, alias or promulgation number.
    ///
    /// Lookup order: exact primary name, exact alias, promulgation number,
    /// then substring containment in either direction over the entries in
    /// insertion order. Returns `None` when nothing matches.
    #[must_use]
    pub fn resolve(&self, query: &str) -> Option<Resolution> {
        self.resolve_with(query, DEFAULT_MIN_SUBSTRING_CHARS)
    }

    /// [`resolve`](Self::resolve) with an explicit minimum query length for
    /// the substring step.
    #[must_use]
    pub fn resolve_with(&self, query: &str, min_substring_chars: usize) -> Option<Resolution> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Some(&index) = self.by_name.get(query) {
            return Some(self.resolution(index, MatchVia::PrimaryName));
        }
        if let Some(&index) = self.by_alias.get(query) {
            return Some(self.resolution(index, MatchVia::Alias));
        }
        if let Some(number) = PromulgationNumber::parse(query) {
            return self.resolve_promulgation(&number);
        }
        self.resolve_substring(query, min_substring_chars)
    }

    /// Resolve by promulgation number alone.
    #[must_use]
    pub fn resolve_promulgation(&self, number: &PromulgationNumber) -> Option<Resolution> {
        self.by_promulgation
            .get(number)
            .map(|&index| self.resolution(index, MatchVia::PromulgationNumber))
    }

    fn resolve_substring(&self, query: &str, min_chars: usize) -> Option<Resolution> {
        if query.chars().count() < min_chars.max(1) {
            return None;
        }
        self.entries.iter().position(|entry| {
            std::iter::once(&entry.name)
                .chain(entry.aliases.iter())
                .filter(|name| !name.is_empty())
                .any(|name| name.contains(query) || query.contains(name.as_str()))
        })
        .map(|index| self.resolution(index, MatchVia::Substring))
    }

    fn resolution(&self, index: usize, via: MatchVia) -> Resolution {
        let entry = &self.entries[index];
        Resolution {
            law_id: entry.id.clone(),
            name: entry.name.clone(),
            via,
        }
    }

    /// Pattern matching every known name and alias, longest alternative
    /// first, or `None` for an empty dictionary.
    pub(crate) fn name_pattern(&self) -> Option<&Regex> {
        self.name_pattern.as_ref()
    }
}

fn build_name_pattern<'a>(names: impl Iterator<Item = &'a String>) -> Result<Option<Regex>> {
    let mut names: Vec<&String> = names.filter(|n| !n.trim().is_empty()).collect();
    if names.is_empty() {
        return Ok(None);
    }
    names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    names.dedup();
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&alternation)
        .size_limit(64 * 1024 * 1024)
        .build()
        .map(Some)
        .map_err(|e| CitationError::InvalidDictionary(format!("name pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> LawDictionary {
        LawDictionary::new(vec![
            LawIdentity::new("129AC0000000089", "民法")
                .with_promulgation("明治二十九年法律第八十九号"),
            LawIdentity::new("322AC0000000067", "地方自治法")
                .with_aliases(["自治法"])
                .with_promulgation("昭和二十二年法律第六十七号"),
            LawIdentity::new("405AC0000000088", "行政手続法")
                .with_promulgation("平成五年法律第八十八号"),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_exact_name_and_alias() {
        let dict = dictionary();
        let hit = dict.resolve("民法").unwrap();
        assert_eq!(hit.law_id.as_str(), "129AC0000000089");
        assert_eq!(hit.via, MatchVia::PrimaryName);

        let hit = dict.resolve("自治法").unwrap();
        assert_eq!(hit.law_id.as_str(), "322AC0000000067");
        assert_eq!(hit.via, MatchVia::Alias);
        assert_eq!(hit.name, "地方自治法");
    }

    #[test]
    fn test_resolve_promulgation_number_in_any_spelling() {
        let dict = dictionary();
        let hit = dict.resolve("昭和22年法律第67号").unwrap();
        assert_eq!(hit.law_id.as_str(), "322AC0000000067");
        assert_eq!(hit.via, MatchVia::PromulgationNumber);
        assert!(dict.resolve("昭和二十三年法律第一号").is_none());
    }

    #[test]
    fn test_substring_fallback_uses_insertion_order() {
        let dict = dictionary();
        // "手続法" is contained in 行政手続法 only.
        let hit = dict.resolve("手続法").unwrap();
        assert_eq!(hit.law_id.as_str(), "405AC0000000088");
        assert_eq!(hit.via, MatchVia::Substring);

        // "法" is contained in every name but is below the minimum length.
        assert!(dict.resolve("法").is_none());
        assert!(dict.resolve_with("手続法", 4).is_none());

        // A query containing a known name resolves to the first such entry.
        let hit = dict.resolve("改正民法").unwrap();
        assert_eq!(hit.law_id.as_str(), "129AC0000000089");
    }

    #[test]
    fn test_unknown_name_misses() {
        assert!(dictionary().resolve("架空法").is_none());
        assert!(dictionary().resolve("").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = LawDictionary::new(vec![
            LawIdentity::new("L1", "民法"),
            LawIdentity::new("L1", "商法"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate law id L1"));
    }

    #[test]
    fn test_empty_id_and_bad_promulgation_rejected() {
        assert!(LawDictionary::new(vec![LawIdentity::new(" ", "民法")]).is_err());
        assert!(LawDictionary::new(vec![
            LawIdentity::new("L1", "民法").with_promulgation("明治の法律")
        ])
        .is_err());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
laws:
  - id: "322AC0000000067"
    name: 地方自治法
    aliases: [自治法]
    promulgation: 昭和二十二年法律第六十七号
  - id: "129AC0000000089"
    name: 民法
"#;
        let dict = LawDictionary::from_yaml_str(yaml).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.resolve("自治法").unwrap().via, MatchVia::Alias);
        assert!(dict.get(&LawId::new("129AC0000000089")).is_some());
    }

    #[test]
    fn test_name_pattern_prefers_longest() {
        let dict = dictionary();
        let pattern = dict.name_pattern().unwrap();
        let found = pattern.find("地方自治法第二条").unwrap();
        assert_eq!(found.as_str(), "地方自治法");
    }
}
