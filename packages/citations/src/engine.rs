//! Citation extraction service that ties all components together.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{EngineConfig, VERIFIER_CONTEXT_CHARS};
use crate::context::{AliasReferent, ContextTracker};
use crate::dictionary::{LawDictionary, MatchVia};
use crate::document::{normalize_text, parse_document, Article, Document, DocumentNode, Item};
use crate::error::{ParseWarning, Result};
use crate::graph::{self, GraphEdge};
use crate::matcher::{
    Anchor, Candidate, DefinitionReferent, MatchContext, PatternMatcher, Reference, ScanOutput,
};
use crate::scoring;
use crate::types::{Citation, CitationKind, LawId, ProvisionNumber, SourceLocation};
use crate::verifier::{self, Verifier, VerifierSession};

/// Everything extracted from one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    /// Citations in document order.
    pub citations: Vec<Citation>,
    /// One edge per citation.
    pub edges: Vec<GraphEdge>,
    /// Parser warnings followed by resolution warnings.
    pub warnings: Vec<ParseWarning>,
}

/// Extracts citation graphs from statutes.
///
/// The engine holds no per-document state: every call builds its own
/// [`ContextTracker`], so one engine (and its dictionary) can serve many
/// threads at once.
pub struct CitationEngine {
    dictionary: Arc<LawDictionary>,
    matcher: PatternMatcher,
    config: EngineConfig,
    verifier: Option<Arc<dyn Verifier>>,
}

impl fmt::Debug for CitationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CitationEngine")
            .field("laws", &self.dictionary.len())
            .field("config", &self.config)
            .field("verifier", &self.verifier.is_some())
            .finish()
    }
}

impl CitationEngine {
    /// Create an engine with the default configuration and no verifier.
    #[must_use]
    pub fn new(dictionary: Arc<LawDictionary>) -> Self {
        let config = EngineConfig::default();
        Self {
            matcher: PatternMatcher::new(Arc::clone(&dictionary))
                .with_min_substring_chars(config.min_substring_chars),
            dictionary,
            config,
            verifier: None,
        }
    }

    /// Replace the configuration after validating it.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        self.matcher = PatternMatcher::new(Arc::clone(&self.dictionary))
            .with_min_substring_chars(config.min_substring_chars);
        self.config = config;
        Ok(self)
    }

    /// Consult `verifier` for unresolved and low-confidence citations.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn dictionary(&self) -> &Arc<LawDictionary> {
        &self.dictionary
    }

    /// Parse a law XML document and extract its citations.
    ///
    /// # Arguments
    /// * `law_id` - Identifier of the law being parsed
    /// * `xml` - The e-Gov law XML
    ///
    /// # Returns
    /// An `Extraction` with citations, edges and every warning encountered.
    /// Only a document without any provisions is an error.
    pub fn extract_xml(&self, law_id: &LawId, xml: &str) -> Result<Extraction> {
        let document = parse_document(xml)?;
        Ok(self.extract_document(law_id, &document))
    }

    /// Extract citations from an already parsed document.
    #[must_use]
    pub fn extract_document(&self, law_id: &LawId, document: &Document) -> Extraction {
        tracing::debug!(%law_id, divisions = document.divisions.len(), "extracting citations");

        let mut run = Run::new(self, law_id.clone());
        run.warnings.extend(document.warnings.iter().cloned());
        for block in &document.divisions {
            run.tracker.enter_division(block.division);
            run.tracker.set_outline(block.division, block.outline());
            run.nodes(&block.nodes);
        }

        let edges = graph::emit(&run.citations);
        tracing::debug!(
            %law_id,
            citations = run.citations.len(),
            warnings = run.warnings.len(),
            "extraction finished"
        );
        Extraction {
            citations: run.citations,
            edges,
            warnings: run.warnings,
        }
    }

    /// Extract citations from a standalone text, read as paragraph 1 of
    /// article 1 of `law_id`.
    #[must_use]
    pub fn extract_text(&self, law_id: &LawId, text: &str) -> Vec<Citation> {
        let mut run = Run::new(self, law_id.clone());
        run.tracker.enter_article(ProvisionNumber::new(1), 1);
        run.text(text);
        run.citations
    }

    /// Identify the law a document contains, by its law number or title.
    #[must_use]
    pub fn identify(&self, document: &Document) -> Option<LawId> {
        let metadata = &document.metadata;
        metadata
            .promulgation
            .as_ref()
            .and_then(|number| self.dictionary.resolve_promulgation(number))
            .or_else(|| {
                let title = metadata.title.as_deref()?;
                self.dictionary
                    .resolve(title)
                    .filter(|r| matches!(r.via, MatchVia::PrimaryName | MatchVia::Alias))
            })
            .map(|resolution| resolution.law_id)
    }
}

/// State of one extraction call.
struct Run<'a> {
    engine: &'a CitationEngine,
    tracker: ContextTracker,
    citations: Vec<Citation>,
    warnings: Vec<ParseWarning>,
    missed_names: HashSet<String>,
    next_group: u32,
    verifier: Option<VerifierSession>,
}

impl<'a> Run<'a> {
    fn new(engine: &'a CitationEngine, law_id: LawId) -> Self {
        Self {
            tracker: ContextTracker::new(law_id, engine.config.recent_law_capacity)
                .with_max_range_span(engine.config.max_range_span),
            engine,
            citations: Vec::new(),
            warnings: Vec::new(),
            missed_names: HashSet::new(),
            next_group: 0,
            verifier: engine
                .verifier
                .as_ref()
                .map(|v| VerifierSession::new(Arc::clone(v), engine.config.verifier_timeout())),
        }
    }

    fn nodes(&mut self, nodes: &[DocumentNode]) {
        for node in nodes {
            match node {
                DocumentNode::Structure(structure) => {
                    self.tracker
                        .enter_structure(structure.level, structure.numeral.number.clone());
                    self.nodes(&structure.children);
                    self.tracker.leave_structure(structure.level);
                }
                DocumentNode::Article(article) => self.article(article),
            }
        }
    }

    fn article(&mut self, article: &Article) {
        self.tracker
            .enter_article(article.number().clone(), article.last_paragraph());
        if article.deleted {
            tracing::trace!(article = %article.number(), "skipping deleted article");
            return;
        }
        tracing::debug!(
            article = %article.number(),
            division = %article.division,
            paragraphs = article.paragraphs.len(),
            "extracting article"
        );

        for paragraph in &article.paragraphs {
            self.tracker.enter_paragraph(paragraph.number);
            self.text(&paragraph.text);
            self.items(&paragraph.items);
        }
    }

    /// Items (号) move the tracked item number; their sub-items do not.
    fn items(&mut self, items: &[Item]) {
        for item in items {
            match item.number {
                Some(number) => self.tracker.enter_item(number),
                None => self.tracker.leave_item(),
            }
            self.text(&item.text);
            self.subitems(&item.children);
        }
        self.tracker.leave_item();
    }

    fn subitems(&mut self, items: &[Item]) {
        for item in items {
            self.text(&item.text);
            self.subitems(&item.children);
        }
    }

    /// Match, resolve, deduplicate and verify one text unit.
    fn text(&mut self, raw: &str) {
        let text = normalize_text(raw);
        if !text.is_empty() {
            let context = MatchContext {
                alias_terms: self.tracker.alias_terms(),
            };
            let scan = self.engine.matcher.scan(&text, &context);
            self.observe(&scan);
            self.define(&scan);

            let groups: Vec<Vec<Citation>> = scan
                .candidates
                .iter()
                .map(|candidate| self.citations_for(candidate))
                .collect();
            self.next_group += scan.compound_groups;

            let citations = scoring::deduplicate(groups);
            let threshold = self.engine.config.verify_threshold;
            let citations: Vec<Citation> = match self.verifier.as_mut() {
                Some(session) => citations
                    .into_iter()
                    .map(|citation| verify(session, threshold, citation, &text))
                    .collect(),
                None => citations,
            };
            self.citations.extend(citations);
        }
        self.tracker.advance(text.len());
    }

    fn observe(&mut self, scan: &ScanOutput) {
        for candidate in &scan.candidates {
            if let Some(Anchor::Law(mention)) = candidate.reference.anchor() {
                self.tracker.observe(mention, candidate.span.start);
            }
        }
    }

    /// Register every 以下「…」という definition of the text unit.
    fn define(&mut self, scan: &ScanOutput) {
        for definition in &scan.definitions {
            let (referent_text, referent) = match &definition.referent {
                DefinitionReferent::Candidate(index) => match scan.candidates.get(*index) {
                    Some(candidate) => (candidate.text.clone(), self.alias_referent(candidate)),
                    None => (definition.term.clone(), AliasReferent::Term),
                },
                DefinitionReferent::Term(term) => (term.clone(), AliasReferent::Term),
            };
            self.tracker.define(
                definition.term.clone(),
                referent_text,
                referent,
                definition.span.start,
            );
        }
    }

    fn alias_referent(&self, candidate: &Candidate) -> AliasReferent {
        let resolved = self
            .tracker
            .resolve(&candidate.reference, candidate.span.start)
            .into_iter()
            .next();
        let law_scope = candidate
            .reference
            .anchor()
            .is_some_and(Anchor::is_law_scope);

        match (&candidate.reference, resolved) {
            (Reference::Law { .. }, resolved) => AliasReferent::Law {
                law_id: resolved.and_then(|r| r.target.law_id().cloned()),
            },
            (Reference::Range { .. }, _) => AliasReferent::Term,
            (_, Some(resolved)) if resolved.target.law_id().is_some() => {
                AliasReferent::Provision(resolved.target)
            }
            _ if law_scope => AliasReferent::Law { law_id: None },
            _ => AliasReferent::Term,
        }
    }

    fn citations_for(&mut self, candidate: &Candidate) -> Vec<Citation> {
        let position = self.tracker.position();
        let source = SourceLocation {
            law_id: position.law_id.clone(),
            division: position.division,
            article: position
                .article
                .clone()
                .unwrap_or_else(|| ProvisionNumber::new(0)),
            paragraph: position.paragraph,
            item: position.item,
        };
        let compound = candidate.compound.map(|local| self.next_group + local);

        let citations: Vec<Citation> = self
            .tracker
            .resolve(&candidate.reference, candidate.span.start)
            .into_iter()
            .map(|resolved| Citation {
                source: source.clone(),
                text: candidate.text.clone(),
                span: candidate.span,
                kind: resolved.kind,
                target: resolved.target,
                confidence: resolved.grade.confidence(),
                method: resolved.grade.method(),
                role: candidate.role,
                compound,
                verified: false,
            })
            .collect();

        for citation in &citations {
            if let CitationKind::ExternalUnresolved {
                law_name,
                promulgation,
            } = &citation.kind
            {
                let name = law_name
                    .clone()
                    .or_else(|| promulgation.clone())
                    .unwrap_or_else(|| citation.text.clone());
                if self.missed_names.insert(name.clone()) {
                    tracing::warn!(name = %name, article = %source.article, "unknown law");
                    self.warnings
                        .push(ParseWarning::IdentityResolutionMiss { name });
                }
            }
        }
        citations
    }
}

/// Offer unresolved and low-confidence citations to the verifier.
fn verify(
    session: &mut VerifierSession,
    threshold: f64,
    citation: Citation,
    text: &str,
) -> Citation {
    if !citation.is_unresolved() && citation.confidence >= threshold {
        return citation;
    }
    let context = verifier::surrounding(text, citation.span, VERIFIER_CONTEXT_CHARS);
    session.review(citation, context)
}
