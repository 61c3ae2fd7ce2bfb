//! Citation graph emission.
//!
//! Every citation becomes exactly one edge from the citing article to the
//! cited provision, law or structural unit. Emission is a pure mapping;
//! persisting edges is the job of an [`EdgeSink`].

use std::convert::Infallible;

use serde::Serialize;

use crate::types::{
    Citation, CitationRole, Division, LawId, ProvisionNumber, ResolutionMethod, StructureRef,
    Target,
};

/// A node of the citation graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "node", rename_all = "kebab-case")]
pub enum GraphNode {
    Article {
        law_id: LawId,
        article: ProvisionNumber,
    },
    Law {
        law_id: LawId,
    },
    Structure {
        law_id: LawId,
        path: Vec<StructureRef>,
    },
    /// Target that could not be resolved, keyed by the citing text.
    Unresolved {
        text: String,
    },
}

/// Qualifiers carried on an edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeAttributes {
    pub kind: &'static str,
    pub confidence: f64,
    pub method: ResolutionMethod,
    pub text: String,
    pub role: CitationRole,
    pub source_division: Division,
    pub source_paragraph: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_item: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_paragraph: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_item: Option<u32>,
    /// Set for 前各項: every paragraph below this number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_before_paragraph: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compound: Option<u32>,
    pub verified: bool,
}

/// One directed edge of the citation graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: GraphNode,
    pub target: GraphNode,
    pub attributes: EdgeAttributes,
}

impl From<&Citation> for GraphEdge {
    fn from(citation: &Citation) -> Self {
        let source = GraphNode::Article {
            law_id: citation.source.law_id.clone(),
            article: citation.source.article.clone(),
        };

        let (target, target_paragraph, target_item, target_before_paragraph) =
            match &citation.target {
                Target::Provision {
                    law_id,
                    article,
                    paragraph,
                    item,
                } => (
                    GraphNode::Article {
                        law_id: law_id.clone(),
                        article: article.clone(),
                    },
                    *paragraph,
                    *item,
                    None,
                ),
                Target::PrecedingParagraphs {
                    law_id,
                    article,
                    before,
                } => (
                    GraphNode::Article {
                        law_id: law_id.clone(),
                        article: article.clone(),
                    },
                    None,
                    None,
                    Some(*before),
                ),
                Target::Law { law_id } => (
                    GraphNode::Law {
                        law_id: law_id.clone(),
                    },
                    None,
                    None,
                    None,
                ),
                Target::Structure { law_id, path } => (
                    GraphNode::Structure {
                        law_id: law_id.clone(),
                        path: path.clone(),
                    },
                    None,
                    None,
                    None,
                ),
                Target::Unresolved {
                    paragraph, item, ..
                } => (
                    GraphNode::Unresolved {
                        text: citation.text.clone(),
                    },
                    *paragraph,
                    *item,
                    None,
                ),
            };

        Self {
            source,
            target,
            attributes: EdgeAttributes {
                kind: citation.kind.label(),
                confidence: citation.confidence,
                method: citation.method,
                text: citation.text.clone(),
                role: citation.role,
                source_division: citation.source.division,
                source_paragraph: citation.source.paragraph,
                source_item: citation.source.item,
                target_paragraph,
                target_item,
                target_before_paragraph,
                compound: citation.compound,
                verified: citation.verified,
            },
        }
    }
}

/// Receiver of emitted edges, e.g. a graph store writer.
pub trait EdgeSink {
    type Error;

    fn accept(&mut self, edge: GraphEdge) -> Result<(), Self::Error>;
}

impl EdgeSink for Vec<GraphEdge> {
    type Error = Infallible;

    fn accept(&mut self, edge: GraphEdge) -> Result<(), Self::Error> {
        self.push(edge);
        Ok(())
    }
}

/// One edge per citation, in citation order.
#[must_use]
pub fn emit(citations: &[Citation]) -> Vec<GraphEdge> {
    citations.iter().map(GraphEdge::from).collect()
}

/// Hand every edge to `sink`, stopping at the first sink error.
///
/// Returns the number of edges accepted.
pub fn emit_into<S: EdgeSink>(citations: &[Citation], sink: &mut S) -> Result<usize, S::Error> {
    for (count, citation) in citations.iter().enumerate() {
        if let Err(err) = sink.accept(GraphEdge::from(citation)) {
            tracing::warn!(accepted = count, "edge sink rejected an edge");
            return Err(err);
        }
    }
    Ok(citations.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CitationKind, SourceLocation, Span};
    use pretty_assertions::assert_eq;

    fn citation(target: Target, text: &str) -> Citation {
        Citation {
            source: SourceLocation {
                law_id: LawId::new("L1"),
                division: Division::MainBody,
                article: ProvisionNumber::new(5),
                paragraph: 2,
                item: None,
            },
            text: text.to_string(),
            span: Span::new(0, text.len()),
            kind: CitationKind::Internal,
            target,
            confidence: 0.95,
            method: ResolutionMethod::DirectPattern,
            role: CitationRole::Reference,
            compound: None,
            verified: false,
        }
    }

    #[test]
    fn test_provision_edge() {
        let edges = emit(&[citation(
            Target::Provision {
                law_id: LawId::new("L1"),
                article: ProvisionNumber::new(90),
                paragraph: Some(1),
                item: None,
            },
            "第九十条第一項",
        )]);
        assert_eq!(edges.len(), 1);
        assert_eq!(
            edges[0].source,
            GraphNode::Article {
                law_id: LawId::new("L1"),
                article: ProvisionNumber::new(5),
            }
        );
        assert_eq!(
            edges[0].target,
            GraphNode::Article {
                law_id: LawId::new("L1"),
                article: ProvisionNumber::new(90),
            }
        );
        assert_eq!(edges[0].attributes.target_paragraph, Some(1));
        assert_eq!(edges[0].attributes.source_paragraph, 2);
        assert_eq!(edges[0].attributes.kind, "internal");
    }

    #[test]
    fn test_unresolved_edge_keeps_text() {
        let edges = emit(&[citation(Target::unknown(), "他の法令")]);
        assert_eq!(
            edges[0].target,
            GraphNode::Unresolved {
                text: "他の法令".to_string()
            }
        );
    }

    #[test]
    fn test_law_level_edge() {
        let edges = emit(&[citation(
            Target::Law {
                law_id: LawId::new("L2"),
            },
            "民法",
        )]);
        assert_eq!(
            edges[0].target,
            GraphNode::Law {
                law_id: LawId::new("L2")
            }
        );
    }

    #[test]
    fn test_edge_serialization() {
        let edge = GraphEdge::from(&citation(
            Target::Provision {
                law_id: LawId::new("L1"),
                article: ProvisionNumber::with_branches(32, [5]),
                paragraph: None,
                item: None,
            },
            "第三十二条の五",
        ));
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["target"]["node"], "article");
        assert_eq!(json["target"]["article"], "32-5");
        assert_eq!(json["attributes"]["method"], "direct-pattern");
        assert!(json["attributes"].get("target_paragraph").is_none());
    }

    struct FailingSink {
        capacity: usize,
        edges: Vec<GraphEdge>,
    }

    impl EdgeSink for FailingSink {
        type Error = String;

        fn accept(&mut self, edge: GraphEdge) -> Result<(), String> {
            if self.edges.len() == self.capacity {
                return Err("sink full".to_string());
            }
            self.edges.push(edge);
            Ok(())
        }
    }

    #[test]
    fn test_emit_into_stops_at_sink_error() {
        let citations = vec![citation(Target::unknown(), "a"); 3];
        let mut sink = FailingSink {
            capacity: 2,
            edges: Vec::new(),
        };
        assert_eq!(emit_into(&citations, &mut sink), Err("sink full".to_string()));
        assert_eq!(sink.edges.len(), 2);

        let mut edges: Vec<GraphEdge> = Vec::new();
        assert_eq!(emit_into(&citations, &mut edges), Ok(3));
    }
}
