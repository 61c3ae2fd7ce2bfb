//! Document Structure Parser for e-Gov law XML.

use std::collections::HashSet;

use roxmltree::Node;

use super::hierarchy::{create_egov_hierarchy, HierarchyRegistry};
use super::text::normalize_text;
use super::types::{
    Article, Document, DocumentNode, DivisionBlock, Item, LawMetadata, LawType, Numeral,
    Paragraph, StructureNode,
};
use crate::dictionary::{Era, PromulgationNumber};
use crate::error::{CitationError, ParseWarning, Result};
use crate::numeral;
use crate::types::{Division, ProvisionNumber, StructureLevel};
use crate::xml::{
    attribute_is_true, child_text, collect_text, find_child, find_children, get_tag_name, scan,
    RawElement,
};

/// Parse an e-Gov law XML document.
///
/// Only input without any `MainProvision` or `SupplProvision` is an error.
/// Unterminated elements, malformed articles and unreadable numerals are
/// reported in [`Document::warnings`] and parsing continues.
///
/// # Examples
/// ```
/// use hourei_citations::document::parse_document;
///
/// let xml = r#"<Law><LawBody><MainProvision>
///   <Article Num="1"><ArticleTitle>第一条</ArticleTitle>
///     <Paragraph Num="1"><ParagraphSentence><Sentence>本文</Sentence></ParagraphSentence></Paragraph>
///   </Article>
/// </MainProvision></LawBody></Law>"#;
/// let document = parse_document(xml).unwrap();
/// assert_eq!(document.articles().len(), 1);
/// assert!(document.warnings.is_empty());
/// ```
pub fn parse_document(xml: &str) -> Result<Document> {
    DocumentParser::new().parse(xml)
}

struct DocumentParser {
    registry: HierarchyRegistry,
    warnings: Vec<ParseWarning>,
    seen_articles: HashSet<(Division, ProvisionNumber)>,
}

impl DocumentParser {
    fn new() -> Self {
        Self {
            registry: create_egov_hierarchy(),
            warnings: Vec::new(),
            seen_articles: HashSet::new(),
        }
    }

    fn parse(mut self, xml: &str) -> Result<Document> {
        let top = self.elements(scan(xml, 0..xml.len()));
        let law = top.iter().find(|el| el.name == "Law").copied();
        let body = match law {
            Some(law) => self.elements(law.children()).into_iter().find(|el| el.name == "LawBody"),
            None => top.iter().find(|el| el.name == "LawBody").copied(),
        };
        let sections = match body {
            Some(body) => self.elements(body.children()),
            None => top,
        };

        let mut metadata = law.map(|law| self.law_metadata(law)).unwrap_or_default();
        if let Some(title) = sections.iter().find(|el| el.name == "LawTitle") {
            metadata.title = Some(normalize_text(&title.text())).filter(|t| !t.is_empty());
            metadata.title_kana = title.attribute("Kana");
            metadata.abbreviations = title
                .attribute("Abbrev")
                .map(|abbrev| {
                    abbrev
                        .split([',', '、'])
                        .map(normalize_text)
                        .filter(|a| !a.is_empty())
                        .collect()
                })
                .unwrap_or_default();
        }

        let main: Vec<RawElement<'_>> = sections
            .iter()
            .filter(|el| el.name == "MainProvision")
            .copied()
            .collect();
        let supplementary: Vec<RawElement<'_>> = sections
            .iter()
            .filter(|el| el.name == "SupplProvision")
            .copied()
            .collect();
        if main.is_empty() && supplementary.is_empty() {
            return Err(CitationError::MissingElement {
                element: "MainProvision".to_string(),
                context: body.map_or("document", |_| "LawBody").to_string(),
            });
        }

        let mut divisions = Vec::new();
        for element in main {
            divisions.push(self.division_block(element, Division::MainBody));
        }
        let numbered = supplementary.len() > 1;
        for (index, element) in supplementary.into_iter().enumerate() {
            let division = Division::Supplementary {
                index: numbered.then_some(index),
            };
            divisions.push(self.division_block(element, division));
        }

        tracing::debug!(
            divisions = divisions.len(),
            warnings = self.warnings.len(),
            "parsed law document"
        );

        Ok(Document {
            metadata,
            divisions,
            warnings: self.warnings,
        })
    }

    /// Record a structural warning for an unterminated element, if any.
    fn elements<'a>(&mut self, elements: Vec<RawElement<'a>>) -> Vec<RawElement<'a>> {
        for element in elements.iter().filter(|el| !el.complete) {
            let warning = ParseWarning::Structural {
                element: element.name.to_string(),
                offset: element.start,
            };
            tracing::warn!(element = element.name, offset = element.start, "unterminated element");
            self.warnings.push(warning);
        }
        elements
    }

    fn law_metadata(&mut self, law: RawElement<'_>) -> LawMetadata {
        let law_num = law
            .child("LawNum")
            .map(|el| normalize_text(&el.text()))
            .filter(|text| !text.is_empty());
        let law_type = law.attribute("LawType").map(|t| LawType::from_attribute(&t));
        let era = law.attribute("Era").and_then(|era| Era::parse(&era));
        let year = law.attribute("Year").and_then(|y| y.trim().parse::<u32>().ok());

        let promulgation = law_num
            .as_deref()
            .and_then(PromulgationNumber::parse)
            .or_else(|| {
                let kind = law_type?.promulgation_kind()?;
                let number = law.attribute("Num")?.trim().parse::<u32>().ok()?;
                Some(PromulgationNumber {
                    era: era?,
                    year: year?,
                    kind: kind.to_string(),
                    number,
                })
            });

        let month = law.attribute("PromulgateMonth").and_then(|m| m.trim().parse().ok());
        let day = law.attribute("PromulgateDay").and_then(|d| d.trim().parse().ok());
        let promulgation_date = match (era, year, month, day) {
            (Some(era), Some(year), Some(month), Some(day)) => era.date(year, month, day),
            _ => None,
        };

        LawMetadata {
            law_num,
            law_type,
            era,
            year,
            promulgation,
            promulgation_date,
            ..LawMetadata::default()
        }
    }

    fn division_block(&mut self, element: RawElement<'_>, division: Division) -> DivisionBlock {
        let amend_law_num = element
            .attribute("AmendLawNum")
            .map(|num| normalize_text(&num))
            .filter(|num| !num.is_empty());
        let extract = element.attribute("Extract").is_some_and(|e| e == "true");
        let nodes = self.nodes(element, division);
        DivisionBlock {
            division,
            amend_law_num,
            extract,
            nodes,
        }
    }

    /// Walk the structural children of a container in document order.
    fn nodes(&mut self, parent: RawElement<'_>, division: Division) -> Vec<DocumentNode> {
        let Some(spec) = self.registry.get_spec(parent.name).cloned() else {
            return Vec::new();
        };

        let mut nodes = Vec::new();
        let mut bare_paragraphs: Vec<Paragraph> = Vec::new();
        let mut bare_position = None;

        for child in self.elements(parent.children()) {
            if !spec.accepts(child.name) {
                continue;
            }
            match child.name {
                "Article" => {
                    if !child.complete {
                        continue;
                    }
                    if let Some(article) = self.article(child, division) {
                        nodes.push(DocumentNode::Article(article));
                    }
                }
                "Paragraph" => {
                    if !child.complete {
                        continue;
                    }
                    match child.parse() {
                        Ok(doc) => {
                            let index = bare_paragraphs.len();
                            bare_paragraphs.push(self.paragraph(doc.root_element(), index));
                            bare_position.get_or_insert(nodes.len());
                        }
                        Err(err) => self.malformed(child, &err),
                    }
                }
                tag => {
                    if let Some(level) = self.registry.get_spec(tag).and_then(|s| s.level) {
                        let structure = self.structure(child, level, division);
                        nodes.push(DocumentNode::Structure(structure));
                    }
                }
            }
        }

        if let Some(position) = bare_position {
            let article = Article {
                numeral: Numeral::new("", ProvisionNumber::new(0)),
                caption: None,
                title: None,
                paragraphs: bare_paragraphs,
                deleted: false,
                division,
            };
            self.register_article(&article);
            nodes.insert(position, DocumentNode::Article(article));
        }

        nodes
    }

    fn structure(
        &mut self,
        element: RawElement<'_>,
        level: StructureLevel,
        division: Division,
    ) -> StructureNode {
        let title = self
            .registry
            .get_spec(element.name)
            .and_then(|spec| spec.title_tag.as_deref())
            .and_then(|tag| element.child(tag))
            .map(|el| normalize_text(&el.text()))
            .filter(|t| !t.is_empty());
        let label = title
            .as_deref()
            .and_then(|t| t.split(' ').next())
            .unwrap_or_default()
            .to_string();
        let num = element.attribute("Num");
        let number = numeral::parse_provision(&label)
            .or_else(|| num.as_deref().and_then(numeral::parse_provision))
            .unwrap_or_else(|| {
                self.numeral_fallback(level.tag(), num.as_deref().unwrap_or(&label));
                ProvisionNumber::new(0)
            });
        let raw = if label.is_empty() {
            num.unwrap_or_default()
        } else {
            label
        };

        StructureNode {
            level,
            numeral: Numeral::new(raw, number),
            title,
            division,
            children: self.nodes(element, division),
        }
    }

    fn article(&mut self, element: RawElement<'_>, division: Division) -> Option<Article> {
        let doc = match element.parse() {
            Ok(doc) => doc,
            Err(err) => {
                self.malformed(element, &err);
                return None;
            }
        };
        let root = doc.root_element();

        let title = child_text(root, "ArticleTitle").map(|t| normalize_text(&t));
        let caption = child_text(root, "ArticleCaption").map(|c| normalize_text(&c));
        let num = root.attribute("Num");
        let number = title
            .as_deref()
            .and_then(numeral::parse_provision)
            .or_else(|| num.and_then(numeral::parse_provision));
        let number = match number {
            Some(number) => number,
            None => {
                let raw = title.clone().or(num.map(str::to_string)).unwrap_or_default();
                self.numeral_fallback("Article", &raw);
                ProvisionNumber::new(0)
            }
        };
        let raw = title.clone().or(num.map(str::to_string)).unwrap_or_default();

        let mut paragraphs: Vec<Paragraph> = find_children(root, "Paragraph")
            .enumerate()
            .map(|(index, node)| self.paragraph(node, index))
            .collect();
        if paragraphs.is_empty() {
            let body = normalize_text(&direct_text(root));
            let text = if body.is_empty() {
                caption.clone().unwrap_or_default()
            } else {
                body
            };
            paragraphs.push(Paragraph {
                number: 1,
                implicit: true,
                text,
                items: Vec::new(),
            });
        }
        let deleted = attribute_is_true(root, "Delete")
            || (paragraphs.len() == 1 && paragraphs[0].text == "削除");

        let article = Article {
            numeral: Numeral::new(raw, number),
            caption,
            title,
            paragraphs,
            deleted,
            division,
        };
        self.register_article(&article);
        Some(article)
    }

    fn paragraph(&mut self, node: Node<'_, '_>, index: usize) -> Paragraph {
        let positional = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let number = match node.attribute("Num") {
            Some(num) => numeral::try_parse(num)
                .filter(|&n| n > 0)
                .unwrap_or_else(|| {
                    self.numeral_fallback("Paragraph", num);
                    positional
                }),
            None => child_text(node, "ParagraphNum")
                .and_then(|label| numeral::try_parse(&label))
                .filter(|&n| n > 0)
                .unwrap_or(positional),
        };

        let text = find_child(node, "ParagraphSentence")
            .map(sentence_text)
            .unwrap_or_default();
        let items = find_children(node, "Item").map(|item| self.item(item)).collect();

        Paragraph {
            number,
            implicit: false,
            text,
            items,
        }
    }

    /// Parse an `Item` or `SubitemN` element and its nested sub-items.
    fn item(&mut self, node: Node<'_, '_>) -> Item {
        let tag = get_tag_name(node);
        let (title_tag, sentence_tag, child_tag) = item_tags(tag);

        let label = child_text(node, &title_tag)
            .map(|t| normalize_text(&t))
            .unwrap_or_default();
        let number = node
            .attribute("Num")
            .and_then(|num| num.split('_').next())
            .and_then(numeral::try_parse)
            .or_else(|| numeral::try_parse(&label));
        let text = find_child(node, &sentence_tag)
            .map(sentence_text)
            .unwrap_or_default();
        let children = node
            .children()
            .filter(|child| child.is_element() && get_tag_name(*child) == child_tag)
            .map(|child| self.item(child))
            .collect();

        Item {
            label,
            number,
            text,
            children,
        }
    }

    fn register_article(&mut self, article: &Article) {
        let key = (article.division, article.number().clone());
        if !self.seen_articles.insert(key) {
            tracing::warn!(
                division = %article.division,
                article = %article.number(),
                "duplicate article numeral"
            );
            self.warnings.push(ParseWarning::DuplicateArticle {
                division: article.division.to_string(),
                article: article.number().to_string(),
            });
        }
    }

    fn malformed(&mut self, element: RawElement<'_>, err: &roxmltree::Error) {
        tracing::warn!(error = %err, element = element.name, offset = element.start, "skipping malformed element");
        self.warnings.push(ParseWarning::MalformedArticle {
            offset: element.start,
            message: err.to_string(),
        });
    }

    fn numeral_fallback(&mut self, element: &str, raw: &str) {
        tracing::warn!(element, raw, "unparseable numeral, using 0");
        self.warnings.push(ParseWarning::NumeralFallback {
            element: element.to_string(),
            raw: raw.to_string(),
        });
    }
}

/// Title, sentence and child tags for `Item` and `SubitemN`.
fn item_tags(tag: &str) -> (String, String, String) {
    let depth = if tag == "Item" {
        0
    } else {
        tag.trim_start_matches("Subitem").parse::<u32>().unwrap_or(0)
    };
    (
        format!("{tag}Title"),
        format!("{tag}Sentence"),
        format!("Subitem{}", depth + 1),
    )
}

/// Body text of an article without paragraphs, excluding its headings.
fn direct_text(node: Node<'_, '_>) -> String {
    let mut out = String::new();
    for child in node.children() {
        if child.is_text() {
            out.push_str(child.text().unwrap_or_default());
        } else if child.is_element()
            && !matches!(get_tag_name(child), "ArticleCaption" | "ArticleTitle")
        {
            out.push_str(&collect_text(child));
        }
    }
    out
}

/// Normalized sentence text; table-like `Column` parts are joined by spaces.
fn sentence_text(node: Node<'_, '_>) -> String {
    let columns: Vec<String> = find_children(node, "Column").map(collect_text).collect();
    if columns.is_empty() {
        normalize_text(&collect_text(node))
    } else {
        normalize_text(&columns.join(" "))
    }
}
