//! End-to-end extraction over one transcript.
//!
//! classify → extract → dedup → provenance → validate → calibrate → filter.
//! A run is sequential; the only shared state is the per-run embedding
//! caches, written once before any item is scored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::pipeline::action::ActionExtractor;
use crate::pipeline::calibration::ConfidenceCalibrator;
use crate::pipeline::decision::DecisionExtractor;
use crate::pipeline::dedup::deduplicate;
use crate::pipeline::extractor::{CandidateExtractor, ExtractionPath};
use crate::pipeline::intent::IntentClassifier;
use crate::pipeline::prompts::templates_hash;
use crate::pipeline::provenance::{summarize, ProvenanceResolver};
use crate::pipeline::risk::RiskExtractor;
use crate::pipeline::validator::Validator;
use crate::traits::collaborators::Collaborators;
use crate::types::candidate::{CandidateItem, ItemKind};
use crate::types::config::ExtractionConfig;
use crate::types::provenance::ProvenanceSummary;
use crate::types::segment::{IntentTag, Segment};

/// What a run did, for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Distinct speakers in order of first appearance
    pub speakers: Vec<String>,
    pub segment_count: usize,

    /// Path taken by each extractor, keyed by component name
    pub paths: BTreeMap<String, ExtractionPath>,

    /// Whether segment embeddings were available for this run
    pub semantic: bool,

    /// Candidates removed by the confidence/validity filter
    pub filtered: usize,

    /// Hash of the prompt templates in use
    pub templates_hash: String,

    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Trusted output of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub decisions: Vec<CandidateItem>,
    pub action_items: Vec<CandidateItem>,
    pub risks: Vec<CandidateItem>,
    pub intent_tags: Vec<IntentTag>,
    pub provenance_summary: ProvenanceSummary,
    pub metadata: RunMetadata,
}

impl ExtractionReport {
    pub fn items(&self, kind: ItemKind) -> &[CandidateItem] {
        match kind {
            ItemKind::Decision => &self.decisions,
            ItemKind::Action => &self.action_items,
            ItemKind::Risk => &self.risks,
        }
    }

    /// Every item, decisions first.
    pub fn all_items(&self) -> impl Iterator<Item = &CandidateItem> {
        self.decisions
            .iter()
            .chain(&self.action_items)
            .chain(&self.risks)
    }

    pub fn total_items(&self) -> usize {
        self.decisions.len() + self.action_items.len() + self.risks.len()
    }
}

/// The extraction pipeline with its collaborators resolved once.
pub struct TranscriptPipeline {
    config: ExtractionConfig,
    collaborators: Collaborators,
    extractors: Vec<Box<dyn CandidateExtractor>>,
}

impl TranscriptPipeline {
    /// Build a pipeline. Collaborator calls are bounded by the config's
    /// timeouts.
    pub fn new(config: ExtractionConfig, collaborators: Collaborators) -> Self {
        let collaborators =
            collaborators.with_timeouts(config.embedding_timeout(), config.generation_timeout());
        let extractors: Vec<Box<dyn CandidateExtractor>> = vec![
            Box::new(DecisionExtractor::new(config.clone())),
            Box::new(ActionExtractor::new(config.clone())),
            Box::new(RiskExtractor::new(config.clone())),
        ];

        Self {
            config,
            collaborators,
            extractors,
        }
    }

    /// Pattern-only pipeline with default config.
    pub fn pattern_only() -> Self {
        Self::new(ExtractionConfig::default(), Collaborators::none())
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub async fn run(&self, segments: &[Segment]) -> ExtractionReport {
        let started = Instant::now();
        let collaborators = &self.collaborators;

        let classifier = IntentClassifier::build(collaborators).await;
        let intent_tags = classifier.classify(segments, collaborators).await;

        let mut paths = BTreeMap::new();
        let mut items: Vec<CandidateItem> = Vec::new();
        for extractor in &self.extractors {
            let run = extractor
                .extract_traced(&intent_tags, segments, collaborators)
                .await;
            paths.insert(run.kind.component().to_string(), run.path);
            items.extend(deduplicate(run.items, self.config.dedup_strategy));
        }
        debug!(candidates = items.len(), "Extraction finished");

        let mut resolver = ProvenanceResolver::new();
        resolver.set_source(segments, collaborators).await;
        let item_embeddings = self.embed_items(&resolver, &items).await;

        let validator =
            Validator::new(segments).with_segment_embeddings(resolver.segment_embeddings());

        let mut calibrator = ConfidenceCalibrator::new();
        if item_embeddings.is_some() {
            calibrator
                .set_summary(&transcript_text(segments), collaborators)
                .await;
        }

        for (i, item) in items.iter_mut().enumerate() {
            let embedding = item_embeddings
                .as_ref()
                .and_then(|e| e.get(i))
                .map(Vec::as_slice);

            item.provenance = Some(resolver.resolve_with_embedding(&item.text, embedding));
            item.validation = Some(validator.validate_item(item, embedding));
            calibrator.calibrate(item, embedding);
        }

        let before = items.len();
        items.retain(|item| {
            item.confidence >= self.config.min_confidence
                && (!self.config.drop_invalid || item.is_valid())
        });
        let filtered = before - items.len();

        let mut decisions = Vec::new();
        let mut action_items = Vec::new();
        let mut risks = Vec::new();
        for item in items {
            match item.kind() {
                ItemKind::Decision => decisions.push(item),
                ItemKind::Action => action_items.push(item),
                ItemKind::Risk => risks.push(item),
            }
        }

        let provenance_summary = {
            let all: Vec<&CandidateItem> =
                decisions.iter().chain(&action_items).chain(&risks).collect();
            summarize(&all)
        };

        let metadata = RunMetadata {
            speakers: speakers(segments),
            segment_count: segments.len(),
            paths,
            semantic: resolver.segment_embeddings().is_some(),
            filtered,
            templates_hash: templates_hash(),
            generated_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            segments = metadata.segment_count,
            decisions = decisions.len(),
            actions = action_items.len(),
            risks = risks.len(),
            filtered,
            hallucination_rate = provenance_summary.hallucination_rate,
            "Transcript extraction complete"
        );

        ExtractionReport {
            decisions,
            action_items,
            risks,
            intent_tags,
            provenance_summary,
            metadata,
        }
    }

    /// One batched embedding call for every candidate, only when segment
    /// embeddings exist to compare against.
    async fn embed_items(
        &self,
        resolver: &ProvenanceResolver,
        items: &[CandidateItem],
    ) -> Option<Vec<Vec<f32>>> {
        if resolver.segment_embeddings().is_none() || items.is_empty() {
            return None;
        }

        let texts: Vec<String> = items.iter().map(|i| i.text.clone()).collect();
        match self.collaborators.embed(&texts).await {
            Ok(vectors) => Some(vectors),
            Err(e) => {
                warn!(items = texts.len(), error = %e, "Candidate embedding failed, scoring with keywords");
                None
            }
        }
    }
}

fn transcript_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn speakers(segments: &[Segment]) -> Vec<String> {
    let mut speakers: Vec<String> = Vec::new();
    for speaker in segments.iter().filter_map(|s| s.speaker.as_ref()) {
        if !speakers.contains(speaker) {
            speakers.push(speaker.clone());
        }
    }
    speakers
}
