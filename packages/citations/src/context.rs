//! Context resolution: turns relative and contextual references into
//! concrete targets using the reading position and earlier text.
//!
//! One [`ContextTracker`] is owned by each document extraction and is
//! advanced strictly in document order.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use crate::config::DEFAULT_MAX_RANGE_SPAN;
use crate::dictionary::MatchVia;
use crate::matcher::{Anchor, LawMention, Locator, Reference, StructureTarget};
use crate::range;
use crate::scoring::Grade;
use crate::types::{
    CitationKind, Contextual, Division, LawId, ProvisionNumber, RangeUnit, Relative,
    RelativeParagraph, StructureLevel, StructureRef, Target,
};

/// Where the reader currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsePosition {
    pub law_id: LawId,
    pub division: Division,
    /// Enclosing structural units, outermost first.
    pub ancestry: Vec<StructureRef>,
    pub article: Option<ProvisionNumber>,
    pub paragraph: u32,
    pub item: Option<u32>,
}

impl ParsePosition {
    #[must_use]
    pub fn new(law_id: LawId) -> Self {
        Self {
            law_id,
            division: Division::MainBody,
            ancestry: Vec::new(),
            article: None,
            paragraph: 1,
            item: None,
        }
    }
}

/// A law mentioned earlier in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LawMemoryEntry {
    pub name: String,
    /// `None` when the mention could not be resolved.
    pub law_id: Option<LawId>,
    /// Global offset of the mention.
    pub offset: usize,
}

/// Bounded memory of recently mentioned laws, for 同法.
#[derive(Debug, Clone)]
pub struct RecentLawMemory {
    capacity: usize,
    entries: VecDeque<LawMemoryEntry>,
}

impl RecentLawMemory {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Record a mention, evicting the oldest one when full.
    pub fn remember(&mut self, entry: LawMemoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Most recent mention strictly before `offset`.
    #[must_use]
    pub fn lookup(&self, offset: usize) -> Option<&LawMemoryEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.offset < offset)
            .max_by_key(|entry| entry.offset)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a defined term stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasReferent {
    /// A law; `None` when the law itself could not be identified.
    Law { law_id: Option<LawId> },
    /// A provision or structural unit.
    Provision(Target),
    /// An ordinary defined term that names no provision.
    Term,
}

/// A term introduced by 以下「…」という.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDefinition {
    pub term: String,
    /// Text the term was defined from.
    pub referent_text: String,
    pub referent: AliasReferent,
    /// Global offset of the definition.
    pub offset: usize,
}

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub kind: CitationKind,
    pub target: Target,
    pub grade: Grade,
}

impl Resolved {
    fn new(kind: CitationKind, target: Target, grade: Grade) -> Self {
        Self {
            kind,
            target,
            grade,
        }
    }

    fn unresolved(kind: CitationKind, locator: &Locator, grade: Grade) -> Self {
        Self::new(kind, unresolved_target(locator), grade)
    }
}

fn unresolved_target(locator: &Locator) -> Target {
    Target::Unresolved {
        article: locator.article.clone(),
        paragraph: locator.paragraph,
        item: locator.item,
    }
}

/// Sequential resolution state for one document.
#[derive(Debug, Clone)]
pub struct ContextTracker {
    position: ParsePosition,
    outlines: HashMap<Division, Vec<ProvisionNumber>>,
    /// Previously visited article of the current division and its last
    /// paragraph.
    previous_article: Option<(ProvisionNumber, u32)>,
    last_paragraph: u32,
    memory: RecentLawMemory,
    aliases: HashMap<String, Vec<AliasDefinition>>,
    cursor: usize,
    max_range_span: usize,
}

impl ContextTracker {
    #[must_use]
    pub fn new(law_id: LawId, memory_capacity: usize) -> Self {
        Self {
            position: ParsePosition::new(law_id),
            outlines: HashMap::new(),
            previous_article: None,
            last_paragraph: 1,
            memory: RecentLawMemory::new(memory_capacity),
            aliases: HashMap::new(),
            cursor: 0,
            max_range_span: DEFAULT_MAX_RANGE_SPAN,
        }
    }

    /// Ranges wider than `span` provisions resolve as malformed.
    #[must_use]
    pub fn with_max_range_span(mut self, span: usize) -> Self {
        self.max_range_span = span;
        self
    }

    /// Article numbers of a division in document order, used for 次条.
    pub fn set_outline(&mut self, division: Division, outline: Vec<ProvisionNumber>) {
        self.outlines.insert(division, outline);
    }

    #[must_use]
    pub fn position(&self) -> &ParsePosition {
        &self.position
    }

    #[must_use]
    pub fn memory(&self) -> &RecentLawMemory {
        &self.memory
    }

    /// Global offset of the start of the current text unit.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn enter_division(&mut self, division: Division) {
        self.position.division = division;
        self.position.ancestry.clear();
        self.position.article = None;
        self.position.paragraph = 1;
        self.position.item = None;
        self.previous_article = None;
        self.last_paragraph = 1;
    }

    /// Enter a structural unit, leaving any unit at the same or a deeper
    /// level.
    pub fn enter_structure(&mut self, level: StructureLevel, number: ProvisionNumber) {
        self.leave_structure(level);
        self.position.ancestry.push(StructureRef::new(level, number));
    }

    /// Leave the unit at `level` and everything below it.
    pub fn leave_structure(&mut self, level: StructureLevel) {
        self.position.ancestry.retain(|entry| entry.level < level);
    }

    /// Enter an article whose highest paragraph number is `last_paragraph`.
    pub fn enter_article(&mut self, number: ProvisionNumber, last_paragraph: u32) {
        if let Some(current) = self.position.article.take() {
            self.previous_article = Some((current, self.last_paragraph));
        }
        self.position.article = Some(number);
        self.position.paragraph = 1;
        self.position.item = None;
        self.last_paragraph = last_paragraph.max(1);
    }

    pub fn enter_paragraph(&mut self, number: u32) {
        self.position.paragraph = number;
        self.position.item = None;
    }

    pub fn enter_item(&mut self, number: u32) {
        self.position.item = Some(number);
    }

    pub fn leave_item(&mut self) {
        self.position.item = None;
    }

    /// Move the cursor past a text unit of `len` bytes.
    pub fn advance(&mut self, len: usize) {
        self.cursor += len + 1;
    }

    /// Record a law mention at `offset` within the current text unit.
    pub fn observe(&mut self, mention: &LawMention, offset: usize) {
        let entry = LawMemoryEntry {
            name: mention.display_name(),
            law_id: mention.resolution.as_ref().map(|r| r.law_id.clone()),
            offset: self.cursor + offset,
        };
        tracing::trace!(name = %entry.name, offset = entry.offset, "remembered law mention");
        self.memory.remember(entry);
    }

    /// Register a definition made at `offset` within the current text unit.
    /// Earlier definitions of the same term are kept.
    pub fn define(
        &mut self,
        term: impl Into<String>,
        referent_text: impl Into<String>,
        referent: AliasReferent,
        offset: usize,
    ) {
        let definition = AliasDefinition {
            term: term.into(),
            referent_text: referent_text.into(),
            referent,
            offset: self.cursor + offset,
        };
        tracing::debug!(term = %definition.term, offset = definition.offset, "alias defined");
        self.aliases
            .entry(definition.term.clone())
            .or_default()
            .push(definition);
    }

    /// Nearest definition of `term` strictly before the global `offset`.
    #[must_use]
    pub fn alias(&self, term: &str, offset: usize) -> Option<&AliasDefinition> {
        self.aliases
            .get(term)?
            .iter()
            .filter(|d| d.offset < offset)
            .max_by_key(|d| d.offset)
    }

    /// Terms that refer to a law or provision, for the matcher.
    #[must_use]
    pub fn alias_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self
            .aliases
            .iter()
            .filter(|(_, defs)| defs.iter().any(|d| d.referent != AliasReferent::Term))
            .map(|(term, _)| term.clone())
            .collect();
        terms.sort();
        terms
    }

    /// Resolve a candidate reference found at `offset` within the current
    /// text unit. Ranges resolve to one result per expanded provision.
    #[must_use]
    pub fn resolve(&self, reference: &Reference, offset: usize) -> Vec<Resolved> {
        match reference {
            Reference::Provision { anchor, locator } => self.resolve_locator(anchor, locator, offset),
            Reference::Law { anchor } => self.resolve_locator(anchor, &Locator::default(), offset),
            Reference::Range {
                anchor,
                unit,
                start,
                end,
            } => self.resolve_range(anchor, *unit, start, end, offset),
            Reference::Structure { anchor, target } => {
                vec![self.resolve_structure(anchor, target, offset)]
            }
            Reference::Indirect(indirect) => vec![Resolved::new(
                CitationKind::Indirect {
                    indirect: *indirect,
                },
                Target::unknown(),
                Grade::Unspecifiable,
            )],
        }
    }

    fn resolve_range(
        &self,
        anchor: &Anchor,
        unit: RangeUnit,
        start: &Locator,
        end: &Locator,
        offset: usize,
    ) -> Vec<Resolved> {
        let kind = CitationKind::Range { unit };
        let Some(locators) = range::expand(unit, start, end, self.max_range_span) else {
            tracing::debug!(?unit, "malformed range");
            return vec![Resolved::unresolved(kind, start, Grade::Malformed)];
        };
        locators
            .iter()
            .flat_map(|locator| self.resolve_locator(anchor, locator, offset))
            .map(|mut resolved| {
                resolved.kind = kind.clone();
                if resolved.grade.is_resolved() {
                    resolved.grade = Grade::Range;
                }
                resolved
            })
            .collect()
    }

    /// Resolve one locator against its anchor.
    #[must_use]
    pub fn resolve_locator(&self, anchor: &Anchor, locator: &Locator, offset: usize) -> Vec<Resolved> {
        let global = self.cursor + offset;
        match anchor {
            Anchor::CurrentLaw => vec![self.internal(locator.article.clone(), locator, Grade::Direct)],
            Anchor::CurrentArticle => {
                vec![self.internal(self.position.article.clone(), locator, Grade::Certain)]
            }
            Anchor::CurrentParagraph => {
                let locator = Locator {
                    paragraph: Some(self.position.paragraph),
                    ..locator.clone()
                };
                vec![self.internal(self.position.article.clone(), &locator, Grade::Certain)]
            }
            Anchor::Law(mention) => vec![external(mention, locator)],
            Anchor::SaidLaw => {
                let kind = CitationKind::Contextual {
                    context: Contextual::SaidLaw,
                };
                let law_id = self.memory.lookup(global).and_then(|e| e.law_id.clone());
                vec![match law_id {
                    Some(law_id) => Resolved::new(kind, in_law(law_id, locator), Grade::Memory),
                    None => Resolved::unresolved(kind, locator, Grade::NoContext),
                }]
            }
            Anchor::Alias(term) => vec![self.resolve_alias(term, locator, global)],
            Anchor::Article(relative) => vec![self.relative_article(*relative, locator)],
            Anchor::Paragraph(relative) => self.relative_paragraph(*relative, locator),
            Anchor::Item(relative) => vec![self.relative_item(*relative, locator)],
        }
    }

    fn internal(&self, article: Option<ProvisionNumber>, locator: &Locator, grade: Grade) -> Resolved {
        match article {
            Some(article) => Resolved::new(
                CitationKind::Internal,
                Target::Provision {
                    law_id: self.position.law_id.clone(),
                    article,
                    paragraph: locator.paragraph,
                    item: locator.item,
                },
                grade,
            ),
            None => Resolved::unresolved(CitationKind::Internal, locator, Grade::NoContext),
        }
    }

    fn resolve_alias(&self, term: &str, locator: &Locator, global: usize) -> Resolved {
        let kind = CitationKind::Contextual {
            context: Contextual::Alias {
                term: term.to_string(),
            },
        };
        match self.alias(term, global).map(|d| &d.referent) {
            Some(AliasReferent::Law {
                law_id: Some(law_id),
            }) => Resolved::new(kind, in_law(law_id.clone(), locator), Grade::Memory),
            Some(AliasReferent::Provision(target)) if *locator == Locator::default() => {
                Resolved::new(kind, target.clone(), Grade::Memory)
            }
            _ => Resolved::unresolved(kind, locator, Grade::NoContext),
        }
    }

    fn relative_article(&self, relative: Relative, locator: &Locator) -> Resolved {
        let kind = CitationKind::RelativeArticle { relative };
        let Some(current) = &self.position.article else {
            return Resolved::unresolved(kind, locator, Grade::NoContext);
        };

        let resolved = match relative {
            Relative::Same => Some((current.clone(), Grade::Certain)),
            Relative::Preceding => match &self.previous_article {
                Some((previous, _)) => Some((previous.clone(), Grade::Certain)),
                None => current
                    .arithmetic_predecessor()
                    .map(|number| (number, Grade::Memory)),
            },
            Relative::Following => self
                .following_article(current)
                .map(|number| (number, Grade::Memory)),
        };

        match resolved {
            Some((article, grade)) => {
                tracing::trace!(%article, ?relative, "resolved relative article");
                Resolved::new(
                    kind,
                    Target::Provision {
                        law_id: self.position.law_id.clone(),
                        article,
                        paragraph: locator.paragraph,
                        item: locator.item,
                    },
                    grade,
                )
            }
            None => Resolved::unresolved(kind, locator, Grade::NoContext),
        }
    }

    fn following_article(&self, current: &ProvisionNumber) -> Option<ProvisionNumber> {
        self.outlines
            .get(&self.position.division)
            .and_then(|outline| {
                let index = outline.iter().position(|n| n == current)?;
                outline.get(index + 1).cloned()
            })
            .or_else(|| current.base.checked_add(1).map(ProvisionNumber::new))
    }

    fn relative_paragraph(&self, relative: RelativeParagraph, locator: &Locator) -> Vec<Resolved> {
        let kind = CitationKind::RelativeParagraph { relative };
        let Some(article) = self.position.article.clone() else {
            return vec![Resolved::unresolved(kind, locator, Grade::NoContext)];
        };
        let current = self.position.paragraph;
        let law_id = &self.position.law_id;
        let provision = |article: &ProvisionNumber, paragraph: u32, grade: Grade| {
            Resolved::new(
                kind.clone(),
                Target::Provision {
                    law_id: law_id.clone(),
                    article: article.clone(),
                    paragraph: Some(paragraph),
                    item: locator.item,
                },
                grade,
            )
        };

        match relative {
            RelativeParagraph::Same => vec![provision(&article, current, Grade::Certain)],
            RelativeParagraph::Following => {
                vec![provision(&article, current.saturating_add(1), Grade::Memory)]
            }
            RelativeParagraph::AllPreceding if current > 1 => vec![Resolved::new(
                kind.clone(),
                Target::PrecedingParagraphs {
                    law_id: law_id.clone(),
                    article,
                    before: current,
                },
                Grade::Symbolic,
            )],
            RelativeParagraph::AllPreceding => {
                vec![Resolved::unresolved(kind.clone(), locator, Grade::NoContext)]
            }
            RelativeParagraph::Preceding(count) if current > count => (current - count..current)
                .map(|paragraph| provision(&article, paragraph, Grade::Certain))
                .collect(),
            RelativeParagraph::Preceding(count) => {
                // Spills over into the end of the previous article.
                let Some((previous, last)) = &self.previous_article else {
                    tracing::debug!(%article, count, "preceding paragraph before the first article");
                    return vec![Resolved::unresolved(kind.clone(), locator, Grade::NoContext)];
                };
                let missing = count.saturating_sub(current.saturating_sub(1));
                let first = last.saturating_sub(missing.saturating_sub(1)).max(1);
                let mut out: Vec<Resolved> = (first..=*last)
                    .map(|paragraph| provision(previous, paragraph, Grade::Degraded))
                    .collect();
                out.extend((1..current).map(|paragraph| provision(&article, paragraph, Grade::Degraded)));
                out
            }
        }
    }

    fn relative_item(&self, relative: Relative, locator: &Locator) -> Resolved {
        let kind = CitationKind::RelativeItem { relative };
        let (Some(article), Some(item)) = (self.position.article.clone(), self.position.item) else {
            return Resolved::unresolved(kind, locator, Grade::NoContext);
        };
        let (item, grade) = match relative {
            Relative::Same => (item, Grade::Certain),
            Relative::Preceding if item > 1 => (item - 1, Grade::Certain),
            Relative::Preceding => return Resolved::unresolved(kind, locator, Grade::NoContext),
            Relative::Following => (item.saturating_add(1), Grade::Memory),
        };
        Resolved::new(
            kind,
            Target::Provision {
                law_id: self.position.law_id.clone(),
                article,
                paragraph: Some(self.position.paragraph),
                item: Some(item),
            },
            grade,
        )
    }

    fn resolve_structure(&self, anchor: &Anchor, target: &StructureTarget, offset: usize) -> Resolved {
        let level = match target {
            StructureTarget::Numbered(parts) => parts
                .last()
                .map_or(StructureLevel::Chapter, |(level, _)| *level),
            StructureTarget::Relative(level, _) => *level,
        };
        let kind = CitationKind::Structural { level };
        let unresolved = |grade| Resolved::new(kind.clone(), Target::unknown(), grade);

        let (law_id, internal, grade) = match anchor {
            Anchor::CurrentLaw => (self.position.law_id.clone(), true, Grade::Direct),
            Anchor::Law(mention) => match &mention.resolution {
                Some(resolution) => (resolution.law_id.clone(), false, Grade::Direct),
                None => return unresolved(Grade::IdentityMiss),
            },
            Anchor::SaidLaw => match self
                .memory
                .lookup(self.cursor + offset)
                .and_then(|e| e.law_id.clone())
            {
                Some(law_id) => (law_id, false, Grade::Memory),
                None => return unresolved(Grade::NoContext),
            },
            _ => return unresolved(Grade::NoContext),
        };

        let path = match target {
            StructureTarget::Numbered(parts) => {
                let top = parts.first().map_or(level, |(level, _)| *level);
                let mut path: Vec<StructureRef> = if internal {
                    self.position
                        .ancestry
                        .iter()
                        .filter(|entry| entry.level < top)
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                };
                path.extend(
                    parts
                        .iter()
                        .map(|(level, number)| StructureRef::new(*level, number.clone())),
                );
                path
            }
            StructureTarget::Relative(level, relative) => {
                let Some(current) = self.position.ancestry.iter().find(|e| e.level == *level) else {
                    return unresolved(Grade::NoContext);
                };
                let number = match relative {
                    Relative::Same => Some(current.number.clone()),
                    Relative::Preceding => current.number.arithmetic_predecessor(),
                    Relative::Following => {
                        current.number.base.checked_add(1).map(ProvisionNumber::new)
                    }
                };
                let Some(number) = number else {
                    return unresolved(Grade::NoContext);
                };
                let mut path: Vec<StructureRef> = self
                    .position
                    .ancestry
                    .iter()
                    .filter(|entry| entry.level < *level)
                    .cloned()
                    .collect();
                path.push(StructureRef::new(*level, number));
                return Resolved::new(kind, Target::Structure { law_id, path }, Grade::Memory);
            }
        };
        Resolved::new(kind, Target::Structure { law_id, path }, grade)
    }
}

/// Resolution against a named law.
fn external(mention: &LawMention, locator: &Locator) -> Resolved {
    let law_name = mention.name.clone();
    let promulgation = mention.promulgation.as_ref().map(ToString::to_string);
    match &mention.resolution {
        Some(resolution) => {
            let exact = matches!(
                resolution.via,
                MatchVia::PrimaryName | MatchVia::PromulgationNumber
            );
            let grade = if exact && locator.article.is_some() {
                Grade::Direct
            } else {
                Grade::Dictionary
            };
            Resolved::new(
                CitationKind::External {
                    law_name,
                    promulgation,
                },
                in_law(resolution.law_id.clone(), locator),
                grade,
            )
        }
        None => Resolved::unresolved(
            CitationKind::ExternalUnresolved {
                law_name,
                promulgation,
            },
            locator,
            Grade::IdentityMiss,
        ),
    }
}

/// A provision of `law_id`, or the law itself when no article is given.
fn in_law(law_id: LawId, locator: &Locator) -> Target {
    match &locator.article {
        Some(article) => Target::Provision {
            law_id,
            article: article.clone(),
            paragraph: locator.paragraph,
            item: locator.item,
        },
        None => Target::Law { law_id },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Resolution;
    use pretty_assertions::assert_eq;

    fn tracker() -> ContextTracker {
        ContextTracker::new(LawId::new("L1"), 10)
    }

    fn provision(article: u32, paragraph: Option<u32>) -> Target {
        Target::Provision {
            law_id: LawId::new("L1"),
            article: ProvisionNumber::new(article),
            paragraph,
            item: None,
        }
    }

    fn single(resolved: Vec<Resolved>) -> Resolved {
        assert_eq!(resolved.len(), 1);
        resolved.into_iter().next().unwrap()
    }

    fn mention(name: &str, law_id: Option<&str>) -> LawMention {
        LawMention {
            name: Some(name.to_string()),
            promulgation: None,
            resolution: law_id.map(|id| Resolution {
                law_id: LawId::new(id),
                name: name.to_string(),
                via: MatchVia::PrimaryName,
            }),
        }
    }

    #[test]
    fn test_memory_capacity_and_lookup() {
        let mut memory = RecentLawMemory::new(2);
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            memory.remember(LawMemoryEntry {
                name: (*name).to_string(),
                law_id: None,
                offset: i * 10,
            });
        }
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.lookup(15).map(|e| e.name.as_str()), Some("B"));
        assert_eq!(memory.lookup(20).map(|e| e.name.as_str()), Some("B"));
        assert_eq!(memory.lookup(21).map(|e| e.name.as_str()), Some("C"));
        assert!(memory.lookup(10).is_none());
    }

    #[test]
    fn test_preceding_paragraph_from_paragraph_zero_degrades() {
        let mut tracker = tracker();
        tracker.enter_article(ProvisionNumber::new(1), 2);
        tracker.enter_article(ProvisionNumber::new(2), 1);
        tracker.enter_paragraph(0);
        let resolved = tracker.resolve_locator(
            &Anchor::Paragraph(RelativeParagraph::Preceding(1)),
            &Locator::default(),
            0,
        );
        let targets: Vec<Target> = resolved.iter().map(|r| r.target.clone()).collect();
        assert_eq!(targets, vec![provision(1, Some(2))]);
        assert!(resolved.iter().all(|r| r.grade == Grade::Degraded));
    }

    #[test]
    fn test_following_past_the_largest_number_is_unresolved() {
        let mut tracker = tracker();
        tracker.enter_structure(StructureLevel::Chapter, ProvisionNumber::new(u32::MAX));
        tracker.enter_article(ProvisionNumber::new(u32::MAX), 1);

        let article = single(tracker.resolve_locator(
            &Anchor::Article(Relative::Following),
            &Locator::default(),
            0,
        ));
        assert!(!article.grade.is_resolved());

        let chapter = tracker.resolve_structure(
            &Anchor::CurrentLaw,
            &StructureTarget::Relative(StructureLevel::Chapter, Relative::Following),
            0,
        );
        assert!(!chapter.grade.is_resolved());
    }

    #[test]
    fn test_preceding_article_uses_visited_article() {
        let mut tracker = tracker();
        for n in [1, 2, 3] {
            tracker.enter_article(ProvisionNumber::new(n), 1);
        }
        let resolved = single(tracker.resolve_locator(
            &Anchor::Article(Relative::Preceding),
            &Locator::default(),
            0,
        ));
        assert_eq!(resolved.target, provision(2, None));
        assert_eq!(resolved.grade, Grade::Certain);

        let mut gapped = ContextTracker::new(LawId::new("L1"), 10);
        gapped.enter_article(ProvisionNumber::new(3), 1);
        gapped.enter_article(ProvisionNumber::with_branches(3, [2]), 1);
        gapped.enter_article(ProvisionNumber::new(5), 1);
        let resolved = single(gapped.resolve_locator(
            &Anchor::Article(Relative::Preceding),
            &Locator::default(),
            0,
        ));
        assert_eq!(
            resolved.target.clone(),
            Target::Provision {
                law_id: LawId::new("L1"),
                article: ProvisionNumber::with_branches(3, [2]),
                paragraph: None,
                item: None,
            }
        );
    }

    #[test]
    fn test_preceding_of_first_article_is_unresolved() {
        let mut tracker = tracker();
        tracker.enter_article(ProvisionNumber::new(1), 1);
        let resolved = single(tracker.resolve_locator(
            &Anchor::Article(Relative::Preceding),
            &Locator::default(),
            0,
        ));
        assert_eq!(resolved.grade, Grade::NoContext);
        assert_eq!(resolved.target.law_id(), None);
    }

    #[test]
    fn test_following_article_uses_outline() {
        let mut tracker = tracker();
        tracker.set_outline(
            Division::MainBody,
            vec![
                ProvisionNumber::new(32),
                ProvisionNumber::with_branches(32, [2]),
                ProvisionNumber::new(33),
            ],
        );
        tracker.enter_article(ProvisionNumber::new(32), 1);
        let resolved = single(tracker.resolve_locator(
            &Anchor::Article(Relative::Following),
            &Locator::default(),
            0,
        ));
        assert_eq!(
            resolved.target,
            Target::Provision {
                law_id: LawId::new("L1"),
                article: ProvisionNumber::with_branches(32, [2]),
                paragraph: None,
                item: None,
            }
        );
    }

    #[test]
    fn test_preceding_paragraphs() {
        let mut tracker = tracker();
        tracker.enter_article(ProvisionNumber::new(5), 4);
        tracker.enter_paragraph(4);
        let targets: Vec<Target> = tracker
            .resolve_locator(
                &Anchor::Paragraph(RelativeParagraph::Preceding(2)),
                &Locator::default(),
                0,
            )
            .into_iter()
            .map(|r| r.target)
            .collect();
        assert_eq!(targets, vec![provision(5, Some(2)), provision(5, Some(3))]);
    }

    #[test]
    fn test_preceding_paragraph_spills_into_previous_article() {
        let mut tracker = tracker();
        tracker.enter_article(ProvisionNumber::new(4), 3);
        tracker.enter_article(ProvisionNumber::new(5), 2);
        let resolved = single(tracker.resolve_locator(
            &Anchor::Paragraph(RelativeParagraph::Preceding(1)),
            &Locator::default(),
            0,
        ));
        assert_eq!(resolved.target, provision(4, Some(3)));
        assert_eq!(resolved.grade, Grade::Degraded);
    }

    #[test]
    fn test_all_preceding_paragraphs_stays_symbolic() {
        let mut tracker = tracker();
        tracker.enter_article(ProvisionNumber::new(7), 3);
        tracker.enter_paragraph(3);
        let resolved = single(tracker.resolve_locator(
            &Anchor::Paragraph(RelativeParagraph::AllPreceding),
            &Locator::default(),
            0,
        ));
        assert_eq!(
            resolved.target,
            Target::PrecedingParagraphs {
                law_id: LawId::new("L1"),
                article: ProvisionNumber::new(7),
                before: 3,
            }
        );
        assert_eq!(resolved.grade, Grade::Symbolic);
    }

    #[test]
    fn test_relative_item_needs_item_position() {
        let mut tracker = tracker();
        tracker.enter_article(ProvisionNumber::new(2), 1);
        let anchor = Anchor::Item(Relative::Preceding);
        assert_eq!(
            single(tracker.resolve_locator(&anchor, &Locator::default(), 0)).grade,
            Grade::NoContext
        );
        tracker.enter_item(3);
        let resolved = single(tracker.resolve_locator(&anchor, &Locator::default(), 0));
        assert_eq!(
            resolved.target,
            Target::Provision {
                law_id: LawId::new("L1"),
                article: ProvisionNumber::new(2),
                paragraph: Some(1),
                item: Some(2),
            }
        );
    }

    #[test]
    fn test_said_law_uses_strictly_earlier_mention() {
        let mut tracker = tracker();
        tracker.enter_article(ProvisionNumber::new(1), 1);
        tracker.observe(&mention("民法", Some("129AC0000000089")), 0);
        tracker.advance(20);
        tracker.observe(&mention("架空法", None), 4);

        let at = |offset| single(tracker.resolve_locator(&Anchor::SaidLaw, &Locator::default(), offset));
        assert_eq!(
            at(2).target,
            Target::Law {
                law_id: LawId::new("129AC0000000089")
            }
        );
        assert_eq!(at(10).grade, Grade::NoContext);
    }

    #[test]
    fn test_alias_definitions_are_scoped_by_offset() {
        let mut tracker = tracker();
        tracker.enter_article(ProvisionNumber::new(1), 1);
        tracker.define(
            "法",
            "民法",
            AliasReferent::Law {
                law_id: Some(LawId::new("A")),
            },
            5,
        );
        tracker.define(
            "法",
            "商法",
            AliasReferent::Law {
                law_id: Some(LawId::new("B")),
            },
            50,
        );
        tracker.define("事業者", "事業を行う者", AliasReferent::Term, 60);
        assert_eq!(tracker.alias_terms(), vec!["法".to_string()]);

        let locator = Locator {
            article: Some(ProvisionNumber::new(3)),
            ..Locator::default()
        };
        let law_of = |offset| {
            single(tracker.resolve_locator(&Anchor::Alias("法".into()), &locator, offset))
                .target
                .law_id()
                .cloned()
        };
        assert_eq!(law_of(3), None);
        assert_eq!(law_of(20), Some(LawId::new("A")));
        assert_eq!(law_of(51), Some(LawId::new("B")));
    }

    #[test]
    fn test_structure_resolution() {
        let mut tracker = tracker();
        tracker.enter_structure(StructureLevel::Part, ProvisionNumber::new(2));
        tracker.enter_structure(StructureLevel::Chapter, ProvisionNumber::new(3));
        tracker.enter_structure(StructureLevel::Section, ProvisionNumber::new(1));

        let numbered = StructureTarget::Numbered(vec![(StructureLevel::Section, ProvisionNumber::new(4))]);
        let resolved = tracker.resolve_structure(&Anchor::CurrentLaw, &numbered, 0);
        let Target::Structure { path, .. } = resolved.target else {
            panic!("expected structure target");
        };
        let rendered: Vec<String> = path
            .iter()
            .map(|r| format!("{}{}", r.number, r.level.counter()))
            .collect();
        assert_eq!(rendered, vec!["2編", "3章", "4節"]);

        let previous = StructureTarget::Relative(StructureLevel::Chapter, Relative::Preceding);
        let resolved = tracker.resolve_structure(&Anchor::CurrentLaw, &previous, 0);
        let Target::Structure { path, .. } = resolved.target else {
            panic!("expected structure target");
        };
        assert_eq!(path.last().map(|r| r.number.base), Some(2));
        assert_eq!(path.len(), 2);
        assert_eq!(resolved.grade, Grade::Memory);
    }

    #[test]
    fn test_leave_structure_drops_deeper_levels() {
        let mut tracker = tracker();
        tracker.enter_structure(StructureLevel::Chapter, ProvisionNumber::new(1));
        tracker.enter_structure(StructureLevel::Section, ProvisionNumber::new(2));
        tracker.enter_structure(StructureLevel::Chapter, ProvisionNumber::new(2));
        assert_eq!(tracker.position().ancestry.len(), 1);
        tracker.leave_structure(StructureLevel::Chapter);
        assert!(tracker.position().ancestry.is_empty());
    }

    #[test]
    fn test_external_grades() {
        let locator = Locator {
            article: Some(ProvisionNumber::new(90)),
            ..Locator::default()
        };
        assert_eq!(external(&mention("民法", Some("X")), &locator).grade, Grade::Direct);
        assert_eq!(
            external(&mention("民法", Some("X")), &Locator::default()).grade,
            Grade::Dictionary
        );
        let missing = external(&mention("架空法", None), &locator);
        assert_eq!(missing.grade, Grade::IdentityMiss);
        assert!(matches!(missing.kind, CitationKind::ExternalUnresolved { .. }));
    }

    #[test]
    fn test_malformed_range() {
        let mut tracker = tracker();
        tracker.enter_article(ProvisionNumber::new(1), 1);
        let at = |n| Locator {
            article: Some(ProvisionNumber::new(n)),
            ..Locator::default()
        };
        let resolved = tracker.resolve(
            &Reference::Range {
                anchor: Anchor::CurrentLaw,
                unit: RangeUnit::Article,
                start: at(9),
                end: at(3),
            },
            0,
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].grade, Grade::Malformed);
    }
}
