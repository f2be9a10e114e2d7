//! Shared contract of the decision, action and risk extractors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::pipeline::context::ContextWindow;
use crate::pipeline::generation::{generate_candidates, GenerationOutcome};
use crate::pipeline::prompts::format_extraction_prompt;
use crate::traits::collaborators::Collaborators;
use crate::types::candidate::{CandidateItem, ItemKind};
use crate::types::config::ExtractionConfig;
use crate::types::segment::{IntentTag, Segment};

/// Which path produced an extractor's candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum ExtractionPath {
    Generated,
    Pattern {
        /// Why generation was not used
        reason: String,
    },
}

impl ExtractionPath {
    pub fn is_generated(&self) -> bool {
        matches!(self, ExtractionPath::Generated)
    }
}

/// Candidates from one extractor plus the path taken.
#[derive(Debug, Clone)]
pub struct ExtractorRun {
    pub kind: ItemKind,
    pub items: Vec<CandidateItem>,
    pub path: ExtractionPath,
}

/// segments + intents → candidate items.
///
/// The generative path is tried first when a generator is configured.
/// Any failure there (collaborator error, timeout, malformed output)
/// falls through to the deterministic pattern path and is never returned
/// to the caller.
#[async_trait]
pub trait CandidateExtractor: Send + Sync {
    fn kind(&self) -> ItemKind;

    fn config(&self) -> &ExtractionConfig;

    /// Deterministic pattern rules over the segments.
    fn extract_patterns(&self, segments: &[Segment]) -> Vec<CandidateItem>;

    /// Extract candidates, reporting which path produced them.
    async fn extract_traced(
        &self,
        tags: &[IntentTag],
        segments: &[Segment],
        collaborators: &Collaborators,
    ) -> ExtractorRun {
        let kind = self.kind();

        let outcome = if collaborators.has_generator() {
            let config = self.config();
            let window = ContextWindow::build(segments, config.token_budget, config.tokens_per_word);
            if window.is_truncated(segments.len()) {
                debug!(
                    kind = %kind,
                    included = window.segments_included,
                    total = segments.len(),
                    "Context window truncated at token budget"
                );
            }

            let prompt = format_extraction_prompt(kind, &window.text, tags);
            generate_candidates(kind, &prompt, collaborators).await
        } else {
            GenerationOutcome::Unavailable
        };

        let reason = match outcome {
            GenerationOutcome::Parsed(items) => {
                debug!(kind = %kind, items = items.len(), "Generated candidates");
                return ExtractorRun {
                    kind,
                    items,
                    path: ExtractionPath::Generated,
                };
            }
            GenerationOutcome::Unavailable => {
                debug!(kind = %kind, "No generator configured, using pattern rules");
                "no generation collaborator".to_string()
            }
            GenerationOutcome::Failed(reason) | GenerationOutcome::Malformed(reason) => {
                warn!(kind = %kind, error = %reason, "Generation failed, falling back to pattern rules");
                reason
            }
        };

        let items = self.extract_patterns(segments);
        debug!(kind = %kind, items = items.len(), "Pattern candidates");
        ExtractorRun {
            kind,
            items,
            path: ExtractionPath::Pattern { reason },
        }
    }

    /// Extract candidates.
    async fn extract(
        &self,
        tags: &[IntentTag],
        segments: &[Segment],
        collaborators: &Collaborators,
    ) -> Vec<CandidateItem> {
        self.extract_traced(tags, segments, collaborators).await.items
    }
}
