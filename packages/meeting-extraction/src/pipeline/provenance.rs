//! Provenance resolution: which source segments support a candidate.
//!
//! Segment embeddings are computed once per run in [`ProvenanceResolver::set_source`]
//! and only read afterwards.

use tracing::{debug, warn};

use crate::pipeline::text::{jaccard, token_set};
use crate::traits::collaborators::Collaborators;
use crate::traits::embedder::cosine_similarity;
use crate::types::candidate::CandidateItem;
use crate::types::provenance::{ProvenanceMethod, ProvenanceRecord, ProvenanceSummary};
use crate::types::segment::Segment;
use crate::types::validation::MIN_SOURCE_SUPPORT;

/// Cosine similarity a segment must exceed to be kept.
pub const SEMANTIC_THRESHOLD: f32 = 0.3;

/// Jaccard overlap a segment must exceed to be kept.
pub const KEYWORD_THRESHOLD: f32 = 0.1;

#[derive(Debug, Clone, Default)]
pub struct ProvenanceResolver {
    segments: Vec<Segment>,
    segment_embeddings: Option<Vec<Vec<f32>>>,
}

impl ProvenanceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the run's source segments, embedding them once if possible.
    pub async fn set_source(&mut self, segments: &[Segment], collaborators: &Collaborators) {
        self.segments = segments.to_vec();
        self.segment_embeddings = None;

        if !collaborators.has_embedder() || segments.is_empty() {
            return;
        }

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        match collaborators.embed(&texts).await {
            Ok(vectors) => {
                debug!(segments = vectors.len(), "Cached segment embeddings");
                self.segment_embeddings = Some(vectors);
            }
            Err(e) => {
                warn!(error = %e, "Segment embedding failed, provenance will use keyword overlap");
            }
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Cached segment embeddings, if the collaborator produced them.
    pub fn segment_embeddings(&self) -> Option<&[Vec<f32>]> {
        self.segment_embeddings.as_deref()
    }

    /// Resolve provenance for a text, embedding it if possible.
    pub async fn resolve(&self, text: &str, collaborators: &Collaborators) -> ProvenanceRecord {
        if self.segment_embeddings.is_none() {
            return self.resolve_keyword(text);
        }

        match collaborators.embed_one(text).await {
            Ok(embedding) => self.resolve_with_embedding(text, Some(&embedding)),
            Err(e) => {
                warn!(error = %e, "Item embedding failed, provenance will use keyword overlap");
                self.resolve_keyword(text)
            }
        }
    }

    /// Resolve provenance given an already-computed item embedding.
    ///
    /// Uses semantic similarity when both the item and segment embeddings
    /// exist, keyword overlap otherwise.
    pub fn resolve_with_embedding(&self, text: &str, embedding: Option<&[f32]>) -> ProvenanceRecord {
        match (embedding, self.segment_embeddings()) {
            (Some(embedding), Some(segment_embeddings)) => {
                let matches = self
                    .segments
                    .iter()
                    .zip(segment_embeddings)
                    .map(|(s, e)| (s.index, s.text.clone(), cosine_similarity(embedding, e)))
                    .filter(|(_, _, sim)| *sim > SEMANTIC_THRESHOLD)
                    .collect();
                ProvenanceRecord::from_matches(matches, ProvenanceMethod::Semantic)
            }
            _ => self.resolve_keyword(text),
        }
    }

    /// Jaccard word overlap over lower-cased tokens.
    pub fn resolve_keyword(&self, text: &str) -> ProvenanceRecord {
        let tokens = token_set(text);
        let matches = self
            .segments
            .iter()
            .map(|s| (s.index, s.text.clone(), jaccard(&tokens, &token_set(&s.text))))
            .filter(|(_, _, sim)| *sim > KEYWORD_THRESHOLD)
            .collect();
        ProvenanceRecord::from_matches(matches, ProvenanceMethod::Keyword)
    }
}

/// Provenance statistics over a run's items.
pub fn summarize(items: &[&CandidateItem]) -> ProvenanceSummary {
    let total_items = items.len();
    if total_items == 0 {
        return ProvenanceSummary::default();
    }

    let best: Vec<f32> = items
        .iter()
        .map(|i| i.provenance.as_ref().map(|p| p.confidence()).unwrap_or(0.0))
        .collect();
    let items_with_provenance = items
        .iter()
        .filter(|i| i.provenance.as_ref().is_some_and(|p| !p.is_empty()))
        .count();
    let potential_hallucinations = best.iter().filter(|s| **s < MIN_SOURCE_SUPPORT).count();

    ProvenanceSummary {
        total_items,
        items_with_provenance,
        coverage: items_with_provenance as f32 / total_items as f32,
        average_similarity: best.iter().sum::<f32>() / total_items as f32,
        potential_hallucinations,
        hallucination_rate: potential_hallucinations as f32 / total_items as f32,
    }
}
