//! Compound citations and application roles.
//!
//! Citations listed together (第三条及び第五条, 前項第一号又は第二号) share a
//! compound group; a later member inherits the law, article and paragraph
//! it does not spell out. Each group then gets one role from the keywords
//! that follow it.

use crate::types::CitationRole;

use super::candidate::{Anchor, Candidate, Reference};

/// Connectives allowed between group members once 、 is stripped.
const CONNECTIVES: &[&str] = &["", "及び", "並びに", "又は", "若しくは"];

/// Sentence-level keywords, strongest first.
const SENTENCE_ROLES: &[(&str, CitationRole)] = &[
    ("準用", CitationRole::MutatisMutandis),
    ("読み替", CitationRole::ReadAs),
    ("読替", CitationRole::ReadAs),
    ("みなす", CitationRole::Deemed),
    ("みなされ", CitationRole::Deemed),
];

/// Keywords that must follow the group before the next citation.
const LOCAL_ROLES: &[(&str, CitationRole)] = &[
    ("に基づ", CitationRole::BasedOn),
    ("による", CitationRole::AccordingTo),
    ("により", CitationRole::AccordingTo),
    ("によって", CitationRole::AccordingTo),
];

/// Assign local compound ids to adjacent candidates joined by a connective.
///
/// `candidates` must be sorted by start offset. Returns the number of
/// groups created.
pub(crate) fn group_compounds(text: &str, candidates: &mut [Candidate]) -> u32 {
    let mut groups = 0;
    for i in 1..candidates.len() {
        let (head, tail) = candidates.split_at_mut(i);
        let prev = &mut head[i - 1];
        let cur = &mut tail[0];

        if matches!(prev.reference, Reference::Indirect(_))
            || matches!(cur.reference, Reference::Indirect(_))
            || !joined(text, prev.span.end, cur.span.start)
        {
            continue;
        }

        let id = *prev.compound.get_or_insert_with(|| {
            groups += 1;
            groups - 1
        });
        cur.compound = Some(id);
        inherit(&prev.reference, &mut cur.reference);
    }
    groups
}

fn joined(text: &str, end: usize, start: usize) -> bool {
    if end >= start {
        return false;
    }
    let gap = text[end..start].replace('、', "");
    CONNECTIVES.contains(&gap.as_str())
}

/// Fill in what `cur` leaves implicit from its predecessor in the group.
fn inherit(prev: &Reference, cur: &mut Reference) {
    let (Some(prev_anchor), Some(cur_anchor)) = (prev.anchor().cloned(), cur.anchor().cloned())
    else {
        return;
    };
    let prev_locator = prev.trailing_locator().cloned().unwrap_or_default();

    match cur_anchor {
        Anchor::CurrentLaw if prev_anchor.is_law_scope() => set_anchor(cur, prev_anchor),
        Anchor::CurrentArticle if prev_locator.article.is_some() => {
            set_anchor(cur, prev_anchor);
            for locator in cur.locators_mut() {
                locator.article.clone_from(&prev_locator.article);
            }
        }
        Anchor::CurrentArticle if matches!(prev_anchor, Anchor::Article(_)) => {
            set_anchor(cur, prev_anchor);
        }
        Anchor::CurrentParagraph if prev_locator.paragraph.is_some() => {
            set_anchor(cur, prev_anchor);
            for locator in cur.locators_mut() {
                locator.article.clone_from(&prev_locator.article);
                locator.paragraph = prev_locator.paragraph;
            }
        }
        Anchor::CurrentParagraph if matches!(prev_anchor, Anchor::Paragraph(_)) => {
            set_anchor(cur, prev_anchor);
        }
        _ => {}
    }
}

fn set_anchor(reference: &mut Reference, anchor: Anchor) {
    if let Some(slot) = reference.anchor_mut() {
        *slot = anchor;
    }
}

/// Give every group (or lone candidate) its application role.
pub(crate) fn assign_roles(text: &str, candidates: &mut [Candidate]) {
    let mut i = 0;
    while i < candidates.len() {
        let mut j = i + 1;
        if let Some(id) = candidates[i].compound {
            while j < candidates.len() && candidates[j].compound == Some(id) {
                j += 1;
            }
        }

        let end = candidates[j - 1].span.end;
        let sentence_end = text[end..].find('。').map_or(text.len(), |p| end + p);
        let local_end = candidates
            .get(j)
            .map_or(sentence_end, |next| next.span.start.min(sentence_end))
            .max(end);

        let role = find_role(&text[end..sentence_end], SENTENCE_ROLES)
            .or_else(|| find_role(&text[end..local_end], LOCAL_ROLES))
            .unwrap_or_default();
        for candidate in &mut candidates[i..j] {
            candidate.role = role;
        }
        i = j;
    }
}

fn find_role(window: &str, table: &[(&str, CitationRole)]) -> Option<CitationRole> {
    table
        .iter()
        .find(|(keyword, _)| window.contains(keyword))
        .map(|&(_, role)| role)
}
