//! Declarative description of the e-Gov law hierarchy.

use std::collections::HashMap;

use crate::types::StructureLevel;

/// Specification of one container element in the hierarchy.
#[derive(Debug, Clone)]
pub struct ElementSpec {
    /// XML tag name.
    pub tag: String,

    /// Child tags that contribute to structure.
    pub children: Vec<String>,

    /// Child tag holding the heading, e.g. `ChapterTitle`.
    pub title_tag: Option<String>,

    /// Structural level, for elements that appear in citations (章, 節, ...).
    pub level: Option<StructureLevel>,
}

impl ElementSpec {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            children: Vec::new(),
            title_tag: None,
            level: None,
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_title_tag(mut self, tag: impl Into<String>) -> Self {
        self.title_tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: StructureLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Whether `tag` is a structural child of this element.
    #[must_use]
    pub fn accepts(&self, tag: &str) -> bool {
        self.children.iter().any(|child| child == tag)
    }
}

/// Registry of container specifications keyed by tag.
#[derive(Debug, Default)]
pub struct HierarchyRegistry {
    specs: HashMap<String, ElementSpec>,
}

impl HierarchyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: ElementSpec) {
        self.specs.insert(spec.tag.clone(), spec);
    }

    #[must_use]
    pub fn get_spec(&self, tag: &str) -> Option<&ElementSpec> {
        self.specs.get(tag)
    }
}

/// Create the hierarchy registry for e-Gov law XML.
///
/// ```text
/// MainProvision / SupplProvision
/// ├── Part (編)
/// │   └── Chapter (章)
/// │       └── Section (節)
/// │           └── Subsection (款)
/// │               └── Division (目)
/// │                   └── Article
/// ├── Article
/// └── Paragraph (bare, e.g. in supplementary provisions)
/// ```
///
/// Any container may skip levels and hold articles directly.
#[must_use]
pub fn create_egov_hierarchy() -> HierarchyRegistry {
    let mut registry = HierarchyRegistry::new();

    registry.register(ElementSpec::new("MainProvision").with_children([
        "Part",
        "Chapter",
        "Section",
        "Subsection",
        "Division",
        "Article",
        "Paragraph",
    ]));

    registry.register(
        ElementSpec::new("SupplProvision")
            .with_children(["Chapter", "Article", "Paragraph"])
            .with_title_tag("SupplProvisionLabel"),
    );

    let levels = [
        (StructureLevel::Part, vec!["Chapter", "Article"]),
        (StructureLevel::Chapter, vec!["Section", "Article"]),
        (StructureLevel::Section, vec!["Subsection", "Division", "Article"]),
        (StructureLevel::Subsection, vec!["Division", "Article"]),
        (StructureLevel::Subdivision, vec!["Article"]),
    ];
    for (level, children) in levels {
        let tag = level.tag();
        registry.register(
            ElementSpec::new(tag)
                .with_children(children)
                .with_title_tag(format!("{tag}Title"))
                .with_level(level),
        );
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_egov_hierarchy() {
        let registry = create_egov_hierarchy();

        let main = registry.get_spec("MainProvision").unwrap();
        assert!(main.accepts("Chapter"));
        assert!(main.accepts("Paragraph"));
        assert!(main.level.is_none());

        let chapter = registry.get_spec("Chapter").unwrap();
        assert_eq!(chapter.level, Some(StructureLevel::Chapter));
        assert_eq!(chapter.title_tag.as_deref(), Some("ChapterTitle"));
        assert!(chapter.accepts("Section"));
        assert!(!chapter.accepts("Part"));

        let subdivision = registry.get_spec("Division").unwrap();
        assert_eq!(subdivision.level, Some(StructureLevel::Subdivision));
        assert_eq!(subdivision.title_tag.as_deref(), Some("DivisionTitle"));
    }

    #[test]
    fn test_unknown_tag_has_no_spec() {
        let registry = create_egov_hierarchy();
        assert!(registry.get_spec("Sentence").is_none());
    }
}
