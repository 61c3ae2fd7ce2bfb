//! Helpers for navigating roxmltree DOM trees of e-Gov law XML.

use roxmltree::Node;

/// Elements whose text is a reading aid rather than statute text.
pub const SKIPPED_TEXT_TAGS: &[&str] = &["Rt"];

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use hourei_citations::xml::get_tag_name;
///
/// let xml = r#"<Article><ArticleTitle>第一条</ArticleTitle></Article>"#;
/// let doc = Document::parse(xml).unwrap();
/// let title = doc.root_element().first_element_child().unwrap();
/// assert_eq!(get_tag_name(title), "ArticleTitle");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Find the first child element with the given tag name.
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && get_tag_name(*child) == tag)
}

/// Find all child elements with the given tag name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use hourei_citations::xml::find_children;
///
/// let xml = r#"<Article><Paragraph/><Paragraph/><ArticleTitle/></Article>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(find_children(doc.root_element(), "Paragraph").count(), 2);
/// ```
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && get_tag_name(*child) == tag)
}

/// Concatenate all descendant text, skipping ruby readings and the other
/// [`SKIPPED_TEXT_TAGS`].
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use hourei_citations::xml::collect_text;
///
/// let xml = r#"<Sentence>第一条の<Ruby>規定<Rt>きてい</Rt></Ruby>による</Sentence>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(collect_text(doc.root_element()), "第一条の規定による");
/// ```
pub fn collect_text(node: Node<'_, '_>) -> String {
    let mut out = String::new();
    push_text(node, &mut out);
    out
}

fn push_text(node: Node<'_, '_>, out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            if let Some(text) = child.text() {
                out.push_str(text);
            }
        } else if child.is_element() && !SKIPPED_TEXT_TAGS.contains(&get_tag_name(child)) {
            push_text(child, out);
        }
    }
}

/// Text of the first child with the given tag, if present and non-empty.
pub fn child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    find_child(node, tag)
        .map(collect_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Whether an attribute is set to the XML boolean `true`.
pub fn attribute_is_true(node: Node<'_, '_>, name: &str) -> bool {
    node.attribute(name).is_some_and(|value| value == "true")
}
