//! Expansion of range references into their individual provisions.

use crate::matcher::Locator;
use crate::types::{ProvisionNumber, RangeUnit};

/// Expand an inclusive range into one locator per provision.
///
/// Article ranges enumerate base numbers; a branch-numbered end
/// (第三十二条から第三十二条の五まで) yields the base article followed by
/// branches 2 through the end branch, starting from the start's own branch
/// when both share a base. Endpoints with more than one branch level are
/// not enumerated; only the two endpoints are returned.
///
/// Returns `None` for a malformed range: start after end, a missing
/// endpoint, or more than `limit` provisions.
///
/// # Examples
/// ```
/// use hourei_citations::matcher::Locator;
/// use hourei_citations::range::expand;
/// use hourei_citations::types::{ProvisionNumber, RangeUnit};
///
/// let at = |n: ProvisionNumber| Locator { article: Some(n), ..Locator::default() };
/// let expanded = expand(
///     RangeUnit::Article,
///     &at(ProvisionNumber::new(32)),
///     &at(ProvisionNumber::with_branches(32, [5])),
///     100,
/// )
/// .unwrap();
/// let labels: Vec<String> = expanded
///     .iter()
///     .filter_map(|l| l.article.as_ref().map(ToString::to_string))
///     .collect();
/// assert_eq!(labels, ["32", "32-2", "32-3", "32-4", "32-5"]);
/// ```
#[must_use]
pub fn expand(
    unit: RangeUnit,
    start: &Locator,
    end: &Locator,
    limit: usize,
) -> Option<Vec<Locator>> {
    match unit {
        RangeUnit::Article => {
            let (first, last) = (start.article.as_ref()?, end.article.as_ref()?);
            if article_span(first, last) > limit as u64 {
                tracing::debug!(start = %first, end = %last, limit, "article range too wide");
                return None;
            }
            let articles = expand_articles(first, last)?;
            Some(
                articles
                    .into_iter()
                    .map(|article| Locator {
                        article: Some(article),
                        paragraph: None,
                        item: None,
                    })
                    .collect(),
            )
        }
        RangeUnit::Paragraph => {
            let (first, last) = (start.paragraph?, end.paragraph?);
            if first > last || numeric_span(first, last) > limit as u64 {
                return None;
            }
            Some(
                (first..=last)
                    .map(|paragraph| Locator {
                        article: start.article.clone(),
                        paragraph: Some(paragraph),
                        item: None,
                    })
                    .collect(),
            )
        }
        RangeUnit::Item => {
            let (first, last) = (start.item?, end.item?);
            if first > last || numeric_span(first, last) > limit as u64 {
                return None;
            }
            Some(
                (first..=last)
                    .map(|item| Locator {
                        article: start.article.clone(),
                        paragraph: start.paragraph,
                        item: Some(item),
                    })
                    .collect(),
            )
        }
    }
}

fn numeric_span(first: u32, last: u32) -> u64 {
    u64::from(last.saturating_sub(first)) + 1
}

/// Upper bound on the number of articles an article range expands to.
fn article_span(start: &ProvisionNumber, end: &ProvisionNumber) -> u64 {
    let branches = end.branches.first().copied().map_or(0, u64::from);
    numeric_span(start.base, end.base) + branches
}

fn expand_articles(start: &ProvisionNumber, end: &ProvisionNumber) -> Option<Vec<ProvisionNumber>> {
    if start > end {
        return None;
    }
    if start == end {
        return Some(vec![start.clone()]);
    }
    if start.branches.len() > 1 || end.branches.len() > 1 {
        return Some(vec![start.clone(), end.clone()]);
    }

    let mut out = vec![start.clone()];
    out.extend((start.base + 1..=end.base).map(ProvisionNumber::new));

    if let Some(&last_branch) = end.branches.first() {
        let first_branch = match start.branches.first() {
            Some(&branch) if start.base == end.base => branch + 1,
            _ => 2,
        };
        out.extend(
            (first_branch..=last_branch).map(|branch| ProvisionNumber::with_branches(end.base, [branch])),
        );
    }
    Some(out)
}
