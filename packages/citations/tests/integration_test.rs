//! End-to-end integration tests for the citation pipeline.
//!
//! Runs the engine over a small statute fixture (試験手続法) that exercises
//! structure, items, supplementary provisions, aliases and an amendment
//! block with a nested article.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;

use hourei_citations::config::EngineConfig;
use hourei_citations::dictionary::MatchVia;
use hourei_citations::types::{
    CitationRole, Contextual, Division, Indirect, RelativeParagraph, ResolutionMethod,
    StructureLevel,
};
use hourei_citations::verifier::VerifierError;
use hourei_citations::{
    parse_document, Citation, CitationEngine, CitationKind, Extraction, GraphNode, LawDictionary,
    LawId, ParseWarning, ProvisionNumber, Target, Verifier,
};

const MINPO: &str = "129AC0000000089";
const JICHI: &str = "322AC0000000067";

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn dictionary() -> Arc<LawDictionary> {
    Arc::new(
        LawDictionary::from_yaml_str(&load_fixture("dictionary.yaml"))
            .expect("Failed to load dictionary"),
    )
}

fn law_id() -> LawId {
    LawId::new("503AC0000000012")
}

fn run_pipeline(engine: &CitationEngine) -> Extraction {
    engine
        .extract_xml(&law_id(), &load_fixture("shiken/law.xml"))
        .expect("Failed to extract fixture")
}

fn provision(law: &str, article: ProvisionNumber, paragraph: Option<u32>, item: Option<u32>) -> Target {
    Target::Provision {
        law_id: LawId::new(law),
        article,
        paragraph,
        item,
    }
}

fn art(n: u32) -> ProvisionNumber {
    ProvisionNumber::new(n)
}

/// Citations made by one article of the main body.
fn from_article<'a>(extraction: &'a Extraction, article: ProvisionNumber) -> Vec<&'a Citation> {
    extraction
        .citations
        .iter()
        .filter(|c| c.source.division == Division::MainBody && c.source.article == article)
        .collect()
}

// =============================================================================
// Document structure
// =============================================================================

#[test]
fn test_fixture_structure() {
    let document = parse_document(&load_fixture("shiken/law.xml")).unwrap();
    let numbers: Vec<String> = document
        .articles()
        .iter()
        .map(|a| a.number().to_string())
        .collect();
    assert_eq!(numbers, vec!["1", "2", "3", "3-2", "4", "5", "6", "7", "0"]);
    assert!(document.warnings.is_empty());
    assert_eq!(document.metadata.title.as_deref(), Some("試験手続法"));
    assert_eq!(document.metadata.abbreviations, vec!["試験法".to_string()]);
    assert!(document.articles()[4].deleted);
}

#[test]
fn test_identify_fixture() {
    let engine = CitationEngine::new(dictionary());
    let document = parse_document(&load_fixture("shiken/law.xml")).unwrap();
    assert_eq!(engine.identify(&document), Some(law_id()));
}

// =============================================================================
// Citations
// =============================================================================

#[test]
fn test_alias_definition_and_use() {
    let extraction = run_pipeline(&CitationEngine::new(dictionary()));

    let first = from_article(&extraction, art(1));
    assert_eq!(first.len(), 1);
    assert_eq!(
        first[0].target,
        Target::Law {
            law_id: LawId::new(JICHI)
        }
    );
    assert_eq!(first[0].method, ResolutionMethod::Dictionary);

    let alias: Vec<&Citation> = from_article(&extraction, art(3))
        .into_iter()
        .filter(|c| matches!(c.kind, CitationKind::Contextual { .. }))
        .collect();
    assert_eq!(alias.len(), 1);
    assert_eq!(alias[0].text, "自治法第二条第三項");
    assert_eq!(alias[0].target, provision(JICHI, art(2), Some(3), None));
    assert_eq!(
        alias[0].kind,
        CitationKind::Contextual {
            context: Contextual::Alias {
                term: "自治法".to_string()
            }
        }
    );
}

#[test]
fn test_compound_inherits_law_and_role() {
    let extraction = run_pipeline(&CitationEngine::new(dictionary()));
    let paragraph: Vec<&Citation> = from_article(&extraction, art(2))
        .into_iter()
        .filter(|c| c.source.paragraph == 1 && c.source.item.is_none())
        .collect();

    assert_eq!(paragraph.len(), 2);
    assert_eq!(paragraph[0].target, provision(MINPO, art(90), None, None));
    assert_eq!(paragraph[1].target, provision(MINPO, art(91), None, None));
    assert!(paragraph[0].compound.is_some());
    assert_eq!(paragraph[0].compound, paragraph[1].compound);
    assert!(paragraph
        .iter()
        .all(|c| c.role == CitationRole::MutatisMutandis));
    assert!(paragraph
        .iter()
        .all(|c| c.method == ResolutionMethod::DirectPattern));
}

#[test]
fn test_items_and_said_law() {
    let extraction = run_pipeline(&CitationEngine::new(dictionary()));
    let items: Vec<&Citation> = from_article(&extraction, art(2))
        .into_iter()
        .filter(|c| c.source.item.is_some())
        .collect();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].source.item, Some(1));
    assert_eq!(items[0].target, provision(MINPO, art(3), Some(1), None));
    assert_eq!(items[0].method, ResolutionMethod::Context);

    assert_eq!(items[1].source.item, Some(2));
    assert_eq!(items[1].target, provision(law_id().as_str(), art(2), Some(1), Some(1)));

    assert_eq!(
        items[2].kind,
        CitationKind::Indirect {
            indirect: Indirect::CabinetOrder
        }
    );
    assert_eq!(items[2].confidence, 0.0);
}

#[test]
fn test_unknown_law_reports_warning() {
    let extraction = run_pipeline(&CitationEngine::new(dictionary()));
    let second: Vec<&Citation> = from_article(&extraction, art(2))
        .into_iter()
        .filter(|c| c.source.paragraph == 2)
        .collect();

    assert_eq!(second.len(), 2);
    assert_eq!(second[0].target, provision(law_id().as_str(), art(2), Some(1), None));
    assert!(matches!(
        &second[1].kind,
        CitationKind::ExternalUnresolved { law_name: Some(name), .. } if name == "架空取引防止法"
    ));
    assert!(second[1].confidence <= 0.3);
    assert_eq!(second[1].target.law_id(), None);

    assert_eq!(
        extraction.warnings,
        vec![ParseWarning::IdentityResolutionMiss {
            name: "架空取引防止法".to_string()
        }]
    );
}

#[test]
fn test_range_and_relative_articles() {
    let extraction = run_pipeline(&CitationEngine::new(dictionary()));

    let range: Vec<Target> = from_article(&extraction, art(3))
        .into_iter()
        .filter(|c| c.method == ResolutionMethod::RangeExpansion)
        .map(|c| c.target.clone())
        .collect();
    assert_eq!(
        range,
        (5..=7)
            .map(|n| provision(law_id().as_str(), art(n), None, None))
            .collect::<Vec<_>>()
    );

    let preceding = from_article(&extraction, ProvisionNumber::with_branches(3, [2]));
    assert_eq!(preceding.len(), 1);
    assert_eq!(preceding[0].target, provision(law_id().as_str(), art(3), None, None));
    assert_eq!(preceding[0].role, CitationRole::AccordingTo);

    let following = from_article(&extraction, art(6));
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].target, provision(law_id().as_str(), art(7), None, None));
    assert_eq!(following[0].role, CitationRole::ReadAs);
}

#[test]
fn test_preceding_paragraphs_and_structure() {
    let extraction = run_pipeline(&CitationEngine::new(dictionary()));
    let fifth = from_article(&extraction, art(5));

    assert_eq!(fifth.len(), 3);
    assert_eq!(
        fifth[0].kind,
        CitationKind::RelativeParagraph {
            relative: RelativeParagraph::Preceding(2)
        }
    );
    assert_eq!(fifth[0].target, provision(law_id().as_str(), art(5), Some(1), None));
    assert_eq!(fifth[1].target, provision(law_id().as_str(), art(5), Some(2), None));
    assert_eq!(
        fifth[2].kind,
        CitationKind::Structural {
            level: StructureLevel::Chapter
        }
    );
    let Target::Structure { path, .. } = &fifth[2].target else {
        panic!("expected a structure target, got {:?}", fifth[2].target);
    };
    assert_eq!(path.len(), 1);
    assert_eq!(path[0].number, art(1));
}

#[test]
fn test_deleted_and_amendment_articles() {
    let extraction = run_pipeline(&CitationEngine::new(dictionary()));
    assert!(from_article(&extraction, art(4)).is_empty());

    let seventh = from_article(&extraction, art(7));
    assert_eq!(seventh.len(), 1);
    assert_eq!(seventh[0].target, provision(law_id().as_str(), art(1), None, None));
    assert!(!extraction
        .citations
        .iter()
        .any(|c| c.target == provision(MINPO, art(1), None, None)));
}

#[test]
fn test_supplementary_provision() {
    let extraction = run_pipeline(&CitationEngine::new(dictionary()));
    let supplementary: Vec<&Citation> = extraction
        .citations
        .iter()
        .filter(|c| matches!(c.source.division, Division::Supplementary { .. }))
        .collect();
    assert_eq!(supplementary.len(), 1);
    assert_eq!(supplementary[0].source.article, art(0));
    assert_eq!(
        supplementary[0].target,
        provision(law_id().as_str(), art(3), None, None)
    );
}

#[test]
fn test_citation_invariants() {
    let extraction = run_pipeline(&CitationEngine::new(dictionary()));
    assert_eq!(extraction.edges.len(), extraction.citations.len());

    for citation in &extraction.citations {
        assert!((0.0..=1.0).contains(&citation.confidence));
        assert!(!citation.text.is_empty());
        if citation.is_unresolved() {
            assert!(citation.confidence <= 0.3, "{citation:?}");
        }
    }
    for edge in &extraction.edges {
        assert!(matches!(edge.source, GraphNode::Article { .. }));
    }

    let json = serde_json::to_value(&extraction).unwrap();
    assert_eq!(
        json["citations"].as_array().map(Vec::len),
        Some(extraction.citations.len())
    );
}

// =============================================================================
// Robustness
// =============================================================================

#[test]
fn test_truncated_document_keeps_earlier_articles() {
    let xml = r#"<Law><LawBody><LawTitle>試験手続法</LawTitle><MainProvision><Article Num="1"><ArticleTitle>第一条</ArticleTitle><Paragraph Num="1"><ParagraphSentence><Sentence>第九条の規定による。</Sentence></ParagraphSentence></Paragraph></Article><Article Num="2"><ArticleTitle>第二条</ArticleTitle><Paragraph Num="1"><ParagraphSentence><Sentence>第十条"#;
    let extraction = CitationEngine::new(dictionary())
        .extract_xml(&law_id(), xml)
        .unwrap();

    assert_eq!(extraction.citations.len(), 1);
    assert_eq!(
        extraction.citations[0].target,
        provision(law_id().as_str(), art(9), None, None)
    );
    assert!(extraction
        .warnings
        .iter()
        .any(|w| matches!(w, ParseWarning::Structural { element, .. } if element == "Article")));
}

#[test]
fn test_documents_share_one_engine_across_threads() {
    let engine = Arc::new(CitationEngine::new(dictionary()));
    let expected = run_pipeline(&engine);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || run_pipeline(&engine))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_dictionary_substring_order() {
    let dictionary = dictionary();
    let resolution = dictionary.resolve("自治法").unwrap();
    assert_eq!(resolution.law_id, LawId::new(JICHI));
    assert_eq!(resolution.via, MatchVia::Substring);

    let exact = dictionary.resolve("地方自治法施行令").unwrap();
    assert_eq!(exact.via, MatchVia::PrimaryName);
    assert_eq!(
        dictionary.resolve("試験法").map(|r| r.via),
        Some(MatchVia::Alias)
    );
    assert!(dictionary.resolve("法").is_none());
}

// =============================================================================
// Verifier
// =============================================================================

fn answer(confidence: f64) -> Citation {
    Citation {
        source: hourei_citations::types::SourceLocation {
            law_id: LawId::new("elsewhere"),
            division: Division::MainBody,
            article: art(1),
            paragraph: 1,
            item: None,
        },
        text: String::new(),
        span: hourei_citations::types::Span::new(0, 0),
        kind: CitationKind::External {
            law_name: Some("架空取引防止法".to_string()),
            promulgation: None,
        },
        target: provision("999AC0000000001", art(3), None, None),
        confidence,
        method: ResolutionMethod::Dictionary,
        role: CitationRole::Reference,
        compound: None,
        verified: false,
    }
}

fn engine_with<F>(verifier: F, timeout_ms: u64) -> CitationEngine
where
    F: Fn(&str, &str) -> Result<Option<Citation>, VerifierError> + Send + Sync + 'static,
{
    let config = EngineConfig {
        verifier_timeout_ms: timeout_ms,
        ..EngineConfig::default()
    };
    let verifier: Arc<dyn Verifier> = Arc::new(verifier);
    CitationEngine::new(dictionary())
        .with_config(config)
        .unwrap()
        .with_verifier(verifier)
}

fn unknown_law_citation(extraction: &Extraction) -> &Citation {
    extraction
        .citations
        .iter()
        .find(|c| c.text.starts_with("架空取引防止法"))
        .expect("unknown law citation")
}

#[test]
fn test_verifier_improves_unknown_law() {
    let engine = engine_with(
        |text, context| {
            if text.starts_with("架空取引防止法") && context.contains(text) {
                Ok(Some(answer(0.9)))
            } else {
                Ok(None)
            }
        },
        1_000,
    );
    let extraction = run_pipeline(&engine);
    let citation = unknown_law_citation(&extraction);
    assert!(citation.verified);
    assert_eq!(citation.target.law_id(), Some(&LawId::new("999AC0000000001")));
    assert_eq!(citation.source.article, art(2));
    assert_eq!(citation.text, "架空取引防止法第三条");
}

#[test]
fn test_verifier_timeout_keeps_original() {
    let engine = engine_with(
        |_, _| {
            thread::sleep(Duration::from_millis(200));
            Ok(Some(answer(0.9)))
        },
        10,
    );
    let extraction = run_pipeline(&engine);
    let citation = unknown_law_citation(&extraction);
    assert!(!citation.verified);
    assert_eq!(citation.method, ResolutionMethod::Unresolved);
}

#[test]
fn test_verifier_panic_keeps_original() {
    let engine = engine_with(|_, _| panic!("verifier crashed"), 1_000);
    let plain = run_pipeline(&CitationEngine::new(dictionary()));
    assert_eq!(run_pipeline(&engine), plain);
}
