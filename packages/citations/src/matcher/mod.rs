//! Citation candidate matching over normalized text.
//!
//! [`PatternMatcher::scan`] runs every pattern family over one text unit and
//! returns non-overlapping candidates in document order:
//!
//! 1. alias definitions (以下「…」という) are located first so their
//!    contents are not mistaken for citations; a term defined in the same
//!    unit is matched later only when it stands for a law or provision
//! 2. law mentions (dictionary names, aliases, 同法, promulgation numbers)
//!    and locators (第N条, 前項, ranges, ...) are matched
//! 3. overlaps inside one family are suppressed, longest match first
//! 4. law mentions are attached to the locator that directly follows them
//! 5. compound lists are grouped and roles assigned

mod candidate;
mod grouping;
mod law_name;
mod patterns;

pub use candidate::{
    Anchor, Candidate, Definition, DefinitionReferent, LawMention, Locator, Reference,
    StructureTarget,
};
pub use patterns::{Family, PatternKind};

use std::sync::Arc;

use regex::Captures;

use crate::config::DEFAULT_MIN_SUBSTRING_CHARS;
use crate::dictionary::{LawDictionary, PromulgationNumber};
use crate::numeral;
use crate::types::{
    Indirect, ProvisionNumber, RangeUnit, Relative, RelativeParagraph, Span, StructureLevel,
};

use patterns::{
    ARTICLE, ARTICLE_RANGE, DEFINITION, INDIRECT, ITEM, ITEM_RANGE, PARAGRAPH, PARAGRAPH_RANGE,
    PROMULGATION, RELATIVE_ARTICLE, RELATIVE_ARTICLE_SUFFIX, RELATIVE_ITEM, RELATIVE_PARAGRAPH,
    RELATIVE_PARAGRAPH_SUFFIX, RELATIVE_STRUCTURE, SAID_LAW, STRUCTURE, STRUCTURE_PART,
};

/// Context the matcher needs from earlier text.
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    /// Alias terms defined before this text unit.
    pub alias_terms: Vec<String>,
}

/// Result of scanning one text unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    /// Candidates sorted by start offset.
    pub candidates: Vec<Candidate>,
    pub definitions: Vec<Definition>,
    /// Number of compound groups among the candidates.
    pub compound_groups: u32,
}

/// Finds citation candidates in normalized statute text.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    dictionary: Arc<LawDictionary>,
    min_substring_chars: usize,
}

impl PatternMatcher {
    #[must_use]
    pub fn new(dictionary: Arc<LawDictionary>) -> Self {
        Self {
            dictionary,
            min_substring_chars: DEFAULT_MIN_SUBSTRING_CHARS,
        }
    }

    /// Minimum query length for substring name lookups.
    #[must_use]
    pub fn with_min_substring_chars(mut self, chars: usize) -> Self {
        self.min_substring_chars = chars;
        self
    }

    /// Scan one normalized text unit.
    #[must_use]
    pub fn scan(&self, text: &str, context: &MatchContext) -> ScanOutput {
        let found = find_definitions(text);
        let definition_spans: Vec<Span> = found.iter().map(|(_, span)| *span).collect();
        let outside_definitions = |c: &Candidate| {
            !definition_spans
                .iter()
                .any(|d| d.start <= c.span.start && c.span.end <= d.end)
        };

        let mut pool = self.law_mentions(text, &context.alias_terms);
        pool.extend(locators(text));
        pool.extend(structures(text));
        pool.extend(indirect(text));
        pool.retain(outside_definitions);

        // Terms defined in this unit are looked for only when they name a
        // law or a provision.
        let preliminary = self.attach_prefixes(text, suppress_overlaps(pool.clone()));
        let local_terms: Vec<(String, usize)> = found
            .iter()
            .filter(|(_, span)| {
                definition_referent(text, *span, &preliminary).is_some_and(|index| {
                    matches!(
                        preliminary[index].reference,
                        Reference::Law { .. } | Reference::Provision { .. }
                    )
                })
            })
            .map(|(term, span)| (term.clone(), span.end))
            .collect();
        let mut local = alias_mentions(text, local_terms.iter().map(|(t, from)| (t, *from)));
        local.retain(outside_definitions);
        pool.extend(local);

        let mut candidates = self.attach_prefixes(text, suppress_overlaps(pool));
        let compound_groups = grouping::group_compounds(text, &mut candidates);
        grouping::assign_roles(text, &mut candidates);

        let definitions = found
            .into_iter()
            .map(|(term, span)| {
                let referent = definition_referent(text, span, &candidates).map_or_else(
                    || DefinitionReferent::Term(term.clone()),
                    DefinitionReferent::Candidate,
                );
                Definition {
                    term,
                    span,
                    referent,
                }
            })
            .collect();

        ScanOutput {
            candidates,
            definitions,
            compound_groups,
        }
    }

    /// Law-level candidates for every law named in the text.
    fn law_mentions(&self, text: &str, alias_terms: &[String]) -> Vec<Candidate> {
        let mut found = Vec::new();

        if let Some(pattern) = self.dictionary.name_pattern() {
            for m in pattern.find_iter(text) {
                // 民法施行法 and the like are different laws
                if text[m.end()..].starts_with("施行") {
                    continue;
                }
                let mention = LawMention {
                    name: Some(m.as_str().to_string()),
                    promulgation: None,
                    resolution: self
                        .dictionary
                        .resolve_with(m.as_str(), self.min_substring_chars),
                };
                found.push(law_candidate(
                    text,
                    Span::new(m.start(), m.end()),
                    PatternKind::LawName,
                    Anchor::Law(mention),
                ));
            }
        }

        found.extend(alias_mentions(text, alias_terms.iter().map(|term| (term, 0))));

        for m in SAID_LAW.find_iter(text) {
            found.push(law_candidate(
                text,
                Span::new(m.start(), m.end()),
                PatternKind::SaidLaw,
                Anchor::SaidLaw,
            ));
        }

        for caps in PROMULGATION.captures_iter(text) {
            if let Some(candidate) = self.promulgation_mention(text, &caps) {
                found.push(candidate);
            }
        }

        found
    }

    /// A promulgation number, together with the law name in front of it
    /// when written as 地方自治法(昭和二十二年法律第六十七号).
    fn promulgation_mention(&self, text: &str, caps: &Captures<'_>) -> Option<Candidate> {
        let whole = caps.get(0)?;
        let number =
            PromulgationNumber::from_parts(&caps["era"], &caps["year"], &caps["kind"], &caps["num"])?;

        let mut span = Span::new(whole.start(), whole.end());
        let mut name = None;
        if let Some(open) = text[..span.start].strip_suffix('(').map(str::len) {
            if let Some((start, found)) = self.name_before(text, open) {
                span.start = start;
                name = Some(found);
            }
            if let Some(close) = text[span.end..].find(')') {
                if !text[span.end..span.end + close].contains('(') {
                    span.end += close + 1;
                }
            }
        }

        let resolution = self.dictionary.resolve_promulgation(&number).or_else(|| {
            name.as_deref()
                .and_then(|n| self.dictionary.resolve_with(n, self.min_substring_chars))
        });
        let mention = LawMention {
            name,
            promulgation: Some(number),
            resolution,
        };
        Some(law_candidate(text, span, PatternKind::Promulgation, Anchor::Law(mention)))
    }

    /// A dictionary name, else a guessed name, ending exactly at `end`.
    fn name_before(&self, text: &str, end: usize) -> Option<(usize, String)> {
        let known = self.dictionary.name_pattern().and_then(|pattern| {
            pattern
                .find_iter(&text[..end])
                .filter(|m| m.end() == end)
                .last()
                .map(|m| (m.start(), m.as_str().to_string()))
        });
        known.or_else(|| law_name::guess(&text[..end]))
    }

    /// Attach law mentions and relative prefixes to the locators they
    /// qualify.
    fn attach_prefixes(&self, text: &str, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = Vec::with_capacity(candidates.len());
        for mut candidate in candidates {
            let floor = out
                .iter()
                .map(|c| c.span.end)
                .max()
                .unwrap_or(0)
                .min(candidate.span.start);
            let prefix = &text[floor..candidate.span.start];

            let anchor = candidate.reference.anchor().cloned();
            match anchor {
                Some(Anchor::CurrentLaw) if candidate.pattern != PatternKind::RelativeStructure => {
                    let adjacent = out.last().is_some_and(|last| {
                        matches!(last.reference, Reference::Law { .. })
                            && last.span.end == candidate.span.start
                    });
                    if adjacent {
                        if let Some(mention) = out.pop() {
                            if let Some(anchor) = mention.reference.anchor().cloned() {
                                set_anchor(&mut candidate.reference, anchor);
                                candidate.extend_to(text, mention.span.start);
                            }
                        }
                    } else if let Some((offset, name)) = law_name::guess(prefix) {
                        let resolution =
                            self.dictionary.resolve_with(&name, self.min_substring_chars);
                        let mention = LawMention {
                            name: Some(name),
                            promulgation: None,
                            resolution,
                        };
                        set_anchor(&mut candidate.reference, Anchor::Law(mention));
                        candidate.extend_to(text, floor + offset);
                    }
                }
                Some(Anchor::CurrentArticle) => {
                    if let Some(caps) = RELATIVE_ARTICLE_SUFFIX.captures(prefix) {
                        let relative = relative(&caps["rel"]);
                        set_anchor(&mut candidate.reference, Anchor::Article(relative));
                        candidate.extend_to(text, floor + caps.get(0).map_or(0, |m| m.start()));
                    }
                }
                Some(Anchor::CurrentParagraph) => {
                    if let Some(caps) = RELATIVE_PARAGRAPH_SUFFIX.captures(prefix) {
                        if let Some(relative) = relative_paragraph(&caps["rel"], None) {
                            set_anchor(&mut candidate.reference, Anchor::Paragraph(relative));
                            candidate.extend_to(text, floor + caps.get(0).map_or(0, |m| m.start()));
                        }
                    }
                }
                _ => {}
            }
            out.push(candidate);
        }
        out
    }
}

fn set_anchor(reference: &mut Reference, anchor: Anchor) {
    if let Some(slot) = reference.anchor_mut() {
        *slot = anchor;
    }
}

fn law_candidate(text: &str, span: Span, pattern: PatternKind, anchor: Anchor) -> Candidate {
    Candidate::new(text, span, pattern, Reference::Law { anchor })
}

/// Occurrences of alias terms, each counted only from its byte offset on.
fn alias_mentions<'a>(
    text: &str,
    terms: impl Iterator<Item = (&'a String, usize)>,
) -> Vec<Candidate> {
    let mut found = Vec::new();
    for (term, from) in terms {
        if term.is_empty() {
            continue;
        }
        for (start, _) in text.match_indices(term.as_str()) {
            let end = start + term.len();
            if start < from || !stands_alone(text, start, end, term) {
                continue;
            }
            found.push(law_candidate(
                text,
                Span::new(start, end),
                PatternKind::AliasTerm,
                Anchor::Alias(term.clone()),
            ));
        }
    }
    found
}

/// Kanji (including 々) or katakana.
fn is_word_char(ch: char) -> bool {
    matches!(ch, '\u{4E00}'..='\u{9FFF}' | '々' | '\u{30A0}'..='\u{30FF}')
}

/// One-character alias terms (法, 令) must not be part of a longer word.
fn stands_alone(text: &str, start: usize, end: usize, term: &str) -> bool {
    if term.chars().count() > 1 {
        return true;
    }
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(|c| is_word_char(c) && c != '第')
}

fn find_definitions(text: &str) -> Vec<(String, Span)> {
    DEFINITION
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((caps["term"].to_string(), Span::new(whole.start(), whole.end())))
        })
        .collect()
}

/// The candidate directly before the parenthesis opening a definition.
fn definition_referent(text: &str, definition: Span, candidates: &[Candidate]) -> Option<usize> {
    let open = text[..definition.start].rfind('(')?;
    if text[open..definition.start].contains(')') {
        return None;
    }
    candidates
        .iter()
        .position(|c| c.span.end == open || c.span.contains(open))
}

/// Keep the longest match among overlapping candidates of one family,
/// breaking ties by pattern precedence, then by position.
fn suppress_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.span
            .len()
            .cmp(&a.span.len())
            .then(a.pattern.cmp(&b.pattern))
            .then(a.span.start.cmp(&b.span.start))
    });
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let family = candidate.pattern.family();
        if kept
            .iter()
            .any(|k| k.pattern.family() == family && k.span.overlaps(&candidate.span))
        {
            continue;
        }
        kept.push(candidate);
    }
    kept.sort_by_key(|c| (c.span.start, c.pattern));
    kept
}

fn number(caps: &Captures<'_>, group: &str) -> Option<u32> {
    caps.name(group).and_then(|m| numeral::try_parse(m.as_str()))
}

fn provision(caps: &Captures<'_>, base: &str, branches: &str) -> Option<ProvisionNumber> {
    let base = number(caps, base)?;
    let branches = caps
        .name(branches)
        .map_or("", |m| m.as_str())
        .split('の')
        .filter(|part| !part.is_empty())
        .map(numeral::try_parse)
        .collect::<Option<Vec<_>>>()?;
    Some(ProvisionNumber { base, branches })
}

fn relative(word: &str) -> Relative {
    match word.chars().next() {
        Some('前') => Relative::Preceding,
        Some('次') => Relative::Following,
        _ => Relative::Same,
    }
}

fn relative_paragraph(word: &str, count: Option<&str>) -> Option<RelativeParagraph> {
    match word {
        "前各項" => Some(RelativeParagraph::AllPreceding),
        "前項" => Some(RelativeParagraph::Preceding(1)),
        "次項" => Some(RelativeParagraph::Following),
        "同項" => Some(RelativeParagraph::Same),
        _ => count
            .and_then(numeral::try_parse)
            .map(RelativeParagraph::Preceding),
    }
}

fn push(
    out: &mut Vec<Candidate>,
    text: &str,
    caps: &Captures<'_>,
    pattern: PatternKind,
    reference: Reference,
) {
    if let Some(whole) = caps.get(0) {
        out.push(Candidate::new(
            text,
            Span::new(whole.start(), whole.end()),
            pattern,
            reference,
        ));
    }
}

/// Article, paragraph and item locators, plain, relative and ranged.
fn locators(text: &str) -> Vec<Candidate> {
    let mut out = Vec::new();

    for caps in ARTICLE_RANGE.captures_iter(text) {
        let (Some(start), Some(end)) = (provision(&caps, "a1", "b1"), provision(&caps, "a2", "b2"))
        else {
            continue;
        };
        let reference = Reference::Range {
            anchor: Anchor::CurrentLaw,
            unit: RangeUnit::Article,
            start: Locator {
                article: Some(start),
                ..Locator::default()
            },
            end: Locator {
                article: Some(end),
                ..Locator::default()
            },
        };
        push(&mut out, text, &caps, PatternKind::ArticleRange, reference);
    }

    for caps in PARAGRAPH_RANGE.captures_iter(text) {
        let (Some(first), Some(last)) = (number(&caps, "p1"), number(&caps, "p2")) else {
            continue;
        };
        let article = provision(&caps, "a", "b");
        let anchor = if article.is_some() {
            Anchor::CurrentLaw
        } else {
            Anchor::CurrentArticle
        };
        let reference = Reference::Range {
            anchor,
            unit: RangeUnit::Paragraph,
            start: Locator {
                article: article.clone(),
                paragraph: Some(first),
                item: None,
            },
            end: Locator {
                article,
                paragraph: Some(last),
                item: None,
            },
        };
        push(&mut out, text, &caps, PatternKind::ParagraphRange, reference);
    }

    for caps in ITEM_RANGE.captures_iter(text) {
        let (Some(first), Some(last)) = (number(&caps, "i1"), number(&caps, "i2")) else {
            continue;
        };
        let article = provision(&caps, "a", "b");
        let paragraph = number(&caps, "p");
        let anchor = match (&article, paragraph) {
            (Some(_), _) => Anchor::CurrentLaw,
            (None, Some(_)) => Anchor::CurrentArticle,
            (None, None) => Anchor::CurrentParagraph,
        };
        let reference = Reference::Range {
            anchor,
            unit: RangeUnit::Item,
            start: Locator {
                article: article.clone(),
                paragraph,
                item: Some(first),
            },
            end: Locator {
                article,
                paragraph,
                item: Some(last),
            },
        };
        push(&mut out, text, &caps, PatternKind::ItemRange, reference);
    }

    for caps in RELATIVE_ARTICLE.captures_iter(text) {
        let reference = Reference::Provision {
            anchor: Anchor::Article(relative(&caps["rel"])),
            locator: Locator {
                article: None,
                paragraph: number(&caps, "p"),
                item: number(&caps, "i"),
            },
        };
        push(&mut out, text, &caps, PatternKind::RelativeArticle, reference);
    }

    for caps in RELATIVE_PARAGRAPH.captures_iter(text) {
        let count = caps.name("n").map(|m| m.as_str());
        let Some(form) = relative_paragraph(&caps["rel"], count) else {
            continue;
        };
        let reference = Reference::Provision {
            anchor: Anchor::Paragraph(form),
            locator: Locator {
                item: number(&caps, "i"),
                ..Locator::default()
            },
        };
        push(&mut out, text, &caps, PatternKind::RelativeParagraph, reference);
    }

    for caps in RELATIVE_ITEM.captures_iter(text) {
        let reference = Reference::Provision {
            anchor: Anchor::Item(relative(&caps["rel"])),
            locator: Locator::default(),
        };
        push(&mut out, text, &caps, PatternKind::RelativeItem, reference);
    }

    for caps in ARTICLE.captures_iter(text) {
        let Some(article) = provision(&caps, "a", "b") else {
            continue;
        };
        let reference = Reference::Provision {
            anchor: Anchor::CurrentLaw,
            locator: Locator {
                article: Some(article),
                paragraph: number(&caps, "p"),
                item: number(&caps, "i"),
            },
        };
        push(&mut out, text, &caps, PatternKind::Article, reference);
    }

    for caps in PARAGRAPH.captures_iter(text) {
        let Some(paragraph) = number(&caps, "p") else {
            continue;
        };
        let reference = Reference::Provision {
            anchor: Anchor::CurrentArticle,
            locator: Locator {
                article: None,
                paragraph: Some(paragraph),
                item: number(&caps, "i"),
            },
        };
        push(&mut out, text, &caps, PatternKind::Paragraph, reference);
    }

    for caps in ITEM.captures_iter(text) {
        let Some(item) = number(&caps, "i") else {
            continue;
        };
        let reference = Reference::Provision {
            anchor: Anchor::CurrentParagraph,
            locator: Locator {
                item: Some(item),
                ..Locator::default()
            },
        };
        push(&mut out, text, &caps, PatternKind::Item, reference);
    }

    out
}

/// Numbered (第一章第二節) and relative (前章, 本節) structure references.
fn structures(text: &str) -> Vec<Candidate> {
    let mut out = Vec::new();

    for m in STRUCTURE.find_iter(text) {
        let parts = STRUCTURE_PART
            .captures_iter(m.as_str())
            .map(|caps| {
                let level = StructureLevel::from_counter(&caps["level"])?;
                Some((level, provision(&caps, "n", "b")?))
            })
            .collect::<Option<Vec<_>>>();
        let Some(parts) = parts.filter(|p| !p.is_empty()) else {
            continue;
        };
        out.push(Candidate::new(
            text,
            Span::new(m.start(), m.end()),
            PatternKind::Structure,
            Reference::Structure {
                anchor: Anchor::CurrentLaw,
                target: StructureTarget::Numbered(parts),
            },
        ));
    }

    for caps in RELATIVE_STRUCTURE.captures_iter(text) {
        let Some(level) = StructureLevel::from_counter(&caps["level"]) else {
            continue;
        };
        let reference = Reference::Structure {
            anchor: Anchor::CurrentLaw,
            target: StructureTarget::Relative(level, relative(&caps["rel"])),
        };
        push(&mut out, text, &caps, PatternKind::RelativeStructure, reference);
    }

    out
}

fn indirect(text: &str) -> Vec<Candidate> {
    let mut out = Vec::new();
    for caps in INDIRECT.captures_iter(text) {
        let kind = if caps.name("other").is_some() {
            Indirect::OtherLaws
        } else if caps.name("separate").is_some() {
            Indirect::SeparateAct
        } else if caps.name("cabinet").is_some() {
            Indirect::CabinetOrder
        } else {
            Indirect::MinisterialOrdinance
        };
        push(&mut out, text, &caps, PatternKind::Indirect, Reference::Indirect(kind));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{LawIdentity, MatchVia};
    use crate::types::{CitationRole, LawId};
    use pretty_assertions::assert_eq;

    fn matcher() -> PatternMatcher {
        let dictionary = LawDictionary::new(vec![
            LawIdentity::new("129AC0000000089", "民法")
                .with_promulgation("明治二十九年法律第八十九号"),
            LawIdentity::new("322AC0000000067", "地方自治法")
                .with_aliases(["自治法"])
                .with_promulgation("昭和二十二年法律第六十七号"),
        ])
        .unwrap();
        PatternMatcher::new(Arc::new(dictionary))
    }

    fn scan(text: &str) -> ScanOutput {
        matcher().scan(text, &MatchContext::default())
    }

    fn texts(output: &ScanOutput) -> Vec<&str> {
        output.candidates.iter().map(|c| c.text.as_str()).collect()
    }

    fn law_id(candidate: &Candidate) -> Option<LawId> {
        match candidate.reference.anchor() {
            Some(Anchor::Law(mention)) => mention.resolution.as_ref().map(|r| r.law_id.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_plain_article() {
        let output = scan("第九十条の規定を適用する。");
        assert_eq!(texts(&output), vec!["第九十条"]);
        assert_eq!(
            output.candidates[0].reference,
            Reference::Provision {
                anchor: Anchor::CurrentLaw,
                locator: Locator {
                    article: Some(ProvisionNumber::new(90)),
                    paragraph: None,
                    item: None,
                },
            }
        );
    }

    #[test]
    fn test_longest_match_wins() {
        let output = scan("第三十二条の五第二項第一号");
        assert_eq!(texts(&output), vec!["第三十二条の五第二項第一号"]);
        assert_eq!(output.candidates[0].pattern, PatternKind::Article);
    }

    #[test]
    fn test_law_name_attaches_to_article() {
        let output = scan("民法第九十条の規定");
        assert_eq!(texts(&output), vec!["民法第九十条"]);
        assert_eq!(law_id(&output.candidates[0]), Some(LawId::new("129AC0000000089")));
    }

    #[test]
    fn test_alias_resolves_through_dictionary() {
        let output = scan("自治法第二条");
        let Some(Anchor::Law(mention)) = output.candidates[0].reference.anchor() else {
            panic!("expected law anchor");
        };
        assert_eq!(mention.resolution.as_ref().unwrap().via, MatchVia::Alias);
    }

    #[test]
    fn test_enforcement_act_is_not_the_base_law() {
        let output = scan("民法施行法第一条");
        assert_eq!(output.candidates.len(), 1);
        let Some(Anchor::Law(mention)) = output.candidates[0].reference.anchor() else {
            panic!("expected law anchor");
        };
        assert_eq!(mention.name.as_deref(), Some("民法施行法"));
    }

    #[test]
    fn test_unknown_law_name() {
        let output = scan("前項の規定は架空法第三条について適用する。");
        let article = output
            .candidates
            .iter()
            .find(|c| c.pattern == PatternKind::Article)
            .unwrap();
        assert_eq!(article.text, "架空法第三条");
        let Some(Anchor::Law(mention)) = article.reference.anchor() else {
            panic!("expected law anchor");
        };
        assert_eq!(mention.name.as_deref(), Some("架空法"));
        assert!(mention.resolution.is_none());
    }

    #[test]
    fn test_promulgation_with_name() {
        let output = scan("地方自治法(昭和二十二年法律第六十七号)第二百五十二条の十九");
        assert_eq!(output.candidates.len(), 1);
        let candidate = &output.candidates[0];
        assert_eq!(
            candidate.text,
            "地方自治法(昭和二十二年法律第六十七号)第二百五十二条の十九"
        );
        let Some(Anchor::Law(mention)) = candidate.reference.anchor() else {
            panic!("expected law anchor");
        };
        assert_eq!(mention.resolution.as_ref().unwrap().via, MatchVia::PromulgationNumber);
    }

    #[test]
    fn test_bare_promulgation_is_law_level() {
        let output = scan("平成五年法律第八十八号の施行の日");
        assert_eq!(output.candidates.len(), 1);
        assert!(matches!(output.candidates[0].reference, Reference::Law { .. }));
        assert_eq!(output.candidates[0].pattern, PatternKind::Promulgation);
    }

    #[test]
    fn test_relative_forms() {
        let output = scan("前条第二項、前項及び前二項並びに前各項");
        let anchors: Vec<_> = output
            .candidates
            .iter()
            .map(|c| c.reference.anchor().cloned())
            .collect();
        assert_eq!(
            anchors,
            vec![
                Some(Anchor::Article(Relative::Preceding)),
                Some(Anchor::Paragraph(RelativeParagraph::Preceding(1))),
                Some(Anchor::Paragraph(RelativeParagraph::Preceding(2))),
                Some(Anchor::Paragraph(RelativeParagraph::AllPreceding)),
            ]
        );
    }

    #[test]
    fn test_article_range() {
        let output = scan("第三十二条から第三十五条までの規定");
        assert_eq!(texts(&output), vec!["第三十二条から第三十五条まで"]);
        assert_eq!(output.candidates[0].pattern, PatternKind::ArticleRange);
    }

    #[test]
    fn test_relative_prefix_on_item_range() {
        let output = scan("前項第一号から第三号までに掲げる者");
        assert_eq!(texts(&output), vec!["前項第一号から第三号まで"]);
        let Reference::Range { anchor, unit, .. } = &output.candidates[0].reference else {
            panic!("expected range");
        };
        assert_eq!(*anchor, Anchor::Paragraph(RelativeParagraph::Preceding(1)));
        assert_eq!(*unit, RangeUnit::Item);
    }

    #[test]
    fn test_said_law() {
        let output = scan("民法第一条及び同法第二条");
        assert_eq!(texts(&output), vec!["民法第一条", "同法第二条"]);
        assert_eq!(output.candidates[1].reference.anchor(), Some(&Anchor::SaidLaw));
    }

    #[test]
    fn test_compound_inherits_law() {
        let output = scan("民法第一条及び第二条");
        assert_eq!(output.compound_groups, 1);
        assert_eq!(law_id(&output.candidates[1]), Some(LawId::new("129AC0000000089")));
        assert_eq!(output.candidates[1].compound, Some(0));
    }

    #[test]
    fn test_structure_and_indirect() {
        let output = scan("第一章第二節及び前章の規定は、政令で定める場合に準用する。");
        let patterns: Vec<_> = output.candidates.iter().map(|c| c.pattern).collect();
        assert_eq!(
            patterns,
            vec![
                PatternKind::Structure,
                PatternKind::RelativeStructure,
                PatternKind::Indirect
            ]
        );
        assert_eq!(output.candidates[0].role, CitationRole::MutatisMutandis);
    }

    #[test]
    fn test_promulgation_number_is_not_an_item() {
        let output = scan("民法(明治二十九年法律第八十九号)");
        assert_eq!(output.candidates.len(), 1);
        assert_eq!(output.candidates[0].pattern, PatternKind::Promulgation);
    }

    #[test]
    fn test_definition_referent_and_local_alias() {
        let text = "民法(明治二十九年法律第八十九号。以下「法」という。)及び法第三条";
        let output = scan(text);
        assert_eq!(output.definitions.len(), 1);
        assert_eq!(output.definitions[0].term, "法");
        assert_eq!(output.definitions[0].referent, DefinitionReferent::Candidate(0));
        let last = output.candidates.last().unwrap();
        assert_eq!(last.text, "法第三条");
        assert_eq!(last.reference.anchor(), Some(&Anchor::Alias("法".to_string())));
    }

    #[test]
    fn test_definition_of_plain_term() {
        let output = scan("事業を行う者(以下「事業者」という。)");
        assert_eq!(
            output.definitions[0].referent,
            DefinitionReferent::Term("事業者".to_string())
        );
    }

    #[test]
    fn test_plain_term_is_not_a_citation() {
        let output = scan("事業を行う者(以下「事業者」という。)は、事業者の名簿を備える。");
        assert_eq!(output.definitions.len(), 1);
        assert!(output.candidates.is_empty());
    }

    #[test]
    fn test_context_alias_needs_word_boundary() {
        let context = MatchContext {
            alias_terms: vec!["法".to_string()],
        };
        let output = matcher().scan("この法律及び法第五条", &context);
        assert_eq!(texts(&output), vec!["法第五条"]);
    }
}
