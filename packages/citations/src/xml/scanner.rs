//! Depth-tracked scanner over raw law markup.
//!
//! Statute XML routinely quotes whole articles inside amendment provisions,
//! so an `<Article>` may contain another `<Article>`. The scanner pairs every
//! open marker with its close marker by counting same-named elements, and it
//! never needs the whole document to be well-formed: an element that is
//! never closed is reported as incomplete and extends to the end of its
//! parent, so everything closed before the break is still reachable.

use std::ops::Range;

use regex::Regex;
use std::sync::LazyLock;

use super::utils::collect_text;

/// Any open, close or self-closing tag marker.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(?P<close>/)?(?P<name>[A-Za-z_][A-Za-z0-9_.\-]*)(?P<attrs>(?:\s+[^<>]*?)?)\s*(?P<empty>/)?>"#)
        .expect("valid regex")
});

/// One `name="value"` attribute pair.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<name>[A-Za-z_:][A-Za-z0-9_:.\-]*)\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#)
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

struct Marker<'a> {
    name: &'a str,
    attrs: Range<usize>,
    span: Range<usize>,
    closing: bool,
    empty: bool,
}

fn next_marker(source: &str, from: usize, limit: usize) -> Option<Marker<'_>> {
    let haystack = source.get(..limit)?;
    let caps = TAG.captures_at(haystack, from)?;
    let whole = caps.get(0)?;
    let name = caps.name("name")?;
    let attrs = caps.name("attrs").map_or(whole.end()..whole.end(), |m| m.range());
    Some(Marker {
        name: &source[name.range()],
        attrs,
        span: whole.range(),
        closing: caps.name("close").is_some(),
        empty: caps.name("empty").is_some(),
    })
}

/// An element located in the raw markup by byte offsets.
#[derive(Debug, Clone, Copy)]
pub struct RawElement<'a> {
    source: &'a str,
    /// Tag name of the element.
    pub name: &'a str,
    attrs: (usize, usize),
    /// Offset of the opening `<`.
    pub start: usize,
    inner: (usize, usize),
    /// Offset just past the closing marker, or the parent's end if incomplete.
    pub end: usize,
    /// `false` when no matching close marker was found.
    pub complete: bool,
}

impl<'a> RawElement<'a> {
    /// Markup of the whole element including its own tags.
    #[must_use]
    pub fn outer(&self) -> &'a str {
        &self.source[self.start..self.end]
    }

    /// Markup between the open and close markers.
    #[must_use]
    pub fn inner(&self) -> &'a str {
        &self.source[self.inner.0..self.inner.1]
    }

    /// Value of an attribute on the open marker, with the predefined XML
    /// entities expanded.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        let attrs = &self.source[self.attrs.0..self.attrs.1];
        ATTRIBUTE
            .captures_iter(attrs)
            .find(|caps| &caps["name"] == name)
            .and_then(|caps| caps.name("dq").or_else(|| caps.name("sq")))
            .map(|value| unescape(value.as_str()))
    }

    /// Direct child elements in document order.
    #[must_use]
    pub fn children(&self) -> Vec<RawElement<'a>> {
        scan(self.source, self.inner.0..self.inner.1)
    }

    /// First direct child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<RawElement<'a>> {
        self.children().into_iter().find(|child| child.name == name)
    }

    /// Parse this element into a DOM.
    pub fn parse(&self) -> Result<roxmltree::Document<'a>, roxmltree::Error> {
        roxmltree::Document::parse(self.outer())
    }

    /// Text content without markup or ruby readings.
    ///
    /// Falls back to stripping markup when the element is not well-formed.
    #[must_use]
    pub fn text(&self) -> String {
        match self.parse() {
            Ok(doc) => collect_text(doc.root_element()),
            Err(_) => unescape(&MARKUP.replace_all(self.inner(), "")),
        }
    }
}

/// Scan the direct child elements of `range` within `source`.
///
/// Stray close markers are ignored. Scanning stops after the first
/// incomplete element, which then extends to `range.end`.
///
/// # Examples
/// ```
/// use hourei_citations::xml::scanner::scan;
///
/// let xml = "<A><B/><C><C></C></C></A>";
/// let top = scan(xml, 0..xml.len());
/// assert_eq!(top.len(), 1);
/// let names: Vec<_> = top[0].children().iter().map(|e| e.name).collect();
/// assert_eq!(names, vec!["B", "C"]);
/// ```
#[must_use]
pub fn scan(source: &str, range: Range<usize>) -> Vec<RawElement<'_>> {
    let mut elements = Vec::new();
    let mut pos = range.start;

    while let Some(open) = next_marker(source, pos, range.end) {
        if open.closing {
            pos = open.span.end;
            continue;
        }
        if open.empty {
            elements.push(RawElement {
                source,
                name: open.name,
                attrs: (open.attrs.start, open.attrs.end),
                start: open.span.start,
                inner: (open.span.end, open.span.end),
                end: open.span.end,
                complete: true,
            });
            pos = open.span.end;
            continue;
        }

        let mut depth = 1usize;
        let mut cursor = open.span.end;
        let mut close = None;
        while let Some(marker) = next_marker(source, cursor, range.end) {
            cursor = marker.span.end;
            if marker.name != open.name || marker.empty {
                continue;
            }
            if marker.closing {
                depth -= 1;
                if depth == 0 {
                    close = Some(marker.span);
                    break;
                }
            } else {
                depth += 1;
            }
        }

        match close {
            Some(close) => {
                elements.push(RawElement {
                    source,
                    name: open.name,
                    attrs: (open.attrs.start, open.attrs.end),
                    start: open.span.start,
                    inner: (open.span.end, close.start),
                    end: close.end,
                    complete: true,
                });
                pos = close.end;
            }
            None => {
                elements.push(RawElement {
                    source,
                    name: open.name,
                    attrs: (open.attrs.start, open.attrs.end),
                    start: open.span.start,
                    inner: (open.span.end, range.end),
                    end: range.end,
                    complete: false,
                });
                break;
            }
        }
    }

    elements
}

/// Expand the five predefined XML entities and numeric character references.
fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => out.push(ch),
            None => out.push_str(&tail[..=semi]),
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    out
}
