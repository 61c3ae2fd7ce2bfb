//! Confidence scoring and cross-family deduplication.

use crate::config::confidence;
use crate::types::{Citation, ResolutionMethod, Span};

/// How well a reference was resolved, before it becomes a method and a
/// confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    /// Explicit article of the current law, or of a law named exactly.
    Direct,
    /// Law found through an alias or substring, or a law-level mention.
    Dictionary,
    /// One element of an expanded range.
    Range,
    /// Self reference, or a neighbour backed by tracked state.
    Certain,
    /// Memory, alias table, arithmetic or outline lookup.
    Memory,
    /// Symbolic target (前各項).
    Symbolic,
    /// Relative paragraph that spilled over into the previous article.
    Degraded,
    /// Law named but not in the dictionary.
    IdentityMiss,
    /// Relative or contextual reference with nothing to resolve against.
    NoContext,
    /// Range whose start lies after its end.
    Malformed,
    /// Reference that names no specific law.
    Unspecifiable,
}

impl Grade {
    #[must_use]
    pub fn method(self) -> ResolutionMethod {
        match self {
            Self::Direct => ResolutionMethod::DirectPattern,
            Self::Dictionary => ResolutionMethod::Dictionary,
            Self::Range => ResolutionMethod::RangeExpansion,
            Self::Certain | Self::Memory | Self::Symbolic | Self::Degraded => {
                ResolutionMethod::Context
            }
            Self::IdentityMiss | Self::NoContext | Self::Malformed | Self::Unspecifiable => {
                ResolutionMethod::Unresolved
            }
        }
    }

    #[must_use]
    pub fn confidence(self) -> f64 {
        match self {
            Self::Direct => confidence::DIRECT_PATTERN,
            Self::Dictionary => confidence::DICTIONARY,
            Self::Range => confidence::RANGE_EXPANSION,
            Self::Certain => confidence::CONTEXT_CERTAIN,
            Self::Memory => confidence::CONTEXT_MEMORY,
            Self::Symbolic => confidence::CONTEXT_SYMBOLIC,
            Self::Degraded => confidence::CONTEXT_DEGRADED,
            Self::IdentityMiss => confidence::UNRESOLVED_IDENTITY,
            Self::NoContext => confidence::UNRESOLVED_CONTEXT,
            Self::Malformed => confidence::UNRESOLVED_MALFORMED,
            Self::Unspecifiable => confidence::UNSPECIFIABLE,
        }
    }

    #[must_use]
    pub fn is_resolved(self) -> bool {
        self.method() != ResolutionMethod::Unresolved
    }
}

/// Keep one citation group per overlapping region.
///
/// Each inner vector holds the citations produced from one candidate (a
/// range yields several) and shares that candidate's span. Among groups
/// whose spans overlap the longest span wins, then the higher method
/// precedence, then the earlier start. The result is sorted by span start;
/// citations with equal starts keep their relative order.
#[must_use]
pub fn deduplicate(groups: Vec<Vec<Citation>>) -> Vec<Citation> {
    let mut groups: Vec<(Span, u8, Vec<Citation>)> = groups
        .into_iter()
        .filter_map(|group| {
            let first = group.first()?;
            let precedence = group
                .iter()
                .map(|c| c.method.precedence())
                .max()
                .unwrap_or_default();
            Some((first.span, precedence, group))
        })
        .collect();

    groups.sort_by(|(a, pa, _), (b, pb, _)| {
        b.len()
            .cmp(&a.len())
            .then(pb.cmp(pa))
            .then(a.start.cmp(&b.start))
    });

    let mut kept: Vec<(Span, Vec<Citation>)> = Vec::with_capacity(groups.len());
    for (span, _, group) in groups {
        if kept.iter().any(|(other, _)| other.overlaps(&span)) {
            continue;
        }
        kept.push((span, group));
    }

    kept.sort_by_key(|(span, _)| span.start);
    kept.into_iter().flat_map(|(_, group)| group).collect()
}
