//! Confidence calibration.
//!
//! Raw extractor confidence is replaced by a bounded score derived from
//! how close the item sits to the meeting as a whole (or, without an
//! embedder, how decisive its wording is), plus small boosts for concrete
//! dates, metrics and before/after comparisons.

use tracing::{debug, warn};

use crate::pipeline::quantitative::{has_comparison, has_date_or_number, has_metric};
use crate::pipeline::text::contains_any;
use crate::traits::collaborators::Collaborators;
use crate::traits::embedder::cosine_similarity;
use crate::types::candidate::CandidateItem;

/// Calibrated confidence never exceeds this.
pub const MAX_CONFIDENCE: f32 = 0.95;

const DATE_OR_NUMBER_BOOST: f32 = 0.1;
const METRIC_BOOST: f32 = 0.1;
const COMPARISON_BOOST: f32 = 0.05;

const DECISIVE: &[&str] = &["decided", "agreed", "approved"];
const SUGGESTIVE: &[&str] = &["should", "need to", "will"];

/// Map a similarity to the meeting summary onto a base confidence.
pub fn similarity_step(similarity: f32) -> f32 {
    if similarity > 0.7 {
        0.9
    } else if similarity > 0.5 {
        0.7
    } else if similarity > 0.3 {
        0.5
    } else {
        0.4
    }
}

/// Base confidence from wording alone.
pub fn keyword_step(text: &str) -> f32 {
    let lower = text.to_lowercase();
    if contains_any(&lower, DECISIVE) {
        0.9
    } else if contains_any(&lower, SUGGESTIVE) {
        0.7
    } else {
        0.5
    }
}

/// Additive boost for concrete details in the text.
pub fn detail_boost(text: &str) -> f32 {
    let mut boost = 0.0;
    if has_date_or_number(text) {
        boost += DATE_OR_NUMBER_BOOST;
    }
    if has_metric(text) {
        boost += METRIC_BOOST;
    }
    if has_comparison(text) {
        boost += COMPARISON_BOOST;
    }
    boost
}

#[derive(Debug, Clone, Default)]
pub struct ConfidenceCalibrator {
    summary_embedding: Option<Vec<f32>>,
}

impl ConfidenceCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed the meeting summary once for the run.
    ///
    /// On failure the calibrator stays in keyword mode.
    pub async fn set_summary(&mut self, summary: &str, collaborators: &Collaborators) {
        self.summary_embedding = None;
        if !collaborators.has_embedder() || summary.trim().is_empty() {
            return;
        }

        match collaborators.embed_one(summary).await {
            Ok(embedding) => {
                debug!(dim = embedding.len(), "Cached summary embedding");
                self.summary_embedding = Some(embedding);
            }
            Err(e) => {
                warn!(error = %e, "Summary embedding failed, calibration will use keywords");
            }
        }
    }

    pub fn has_summary(&self) -> bool {
        self.summary_embedding.is_some()
    }

    /// Calibrated confidence for a text.
    ///
    /// The similarity path is used only when both the summary and the item
    /// have embeddings.
    pub fn confidence(&self, text: &str, item_embedding: Option<&[f32]>) -> f32 {
        let base = match (&self.summary_embedding, item_embedding) {
            (Some(summary), Some(item)) => similarity_step(cosine_similarity(summary, item)),
            _ => keyword_step(text),
        };

        (base + detail_boost(text)).min(MAX_CONFIDENCE)
    }

    /// Replace an item's confidence with its calibrated value.
    pub fn calibrate(&self, item: &mut CandidateItem, item_embedding: Option<&[f32]>) {
        item.confidence = self.confidence(&item.text, item_embedding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEmbedder;
    use crate::types::candidate::{ExtractionMethod, RiskCategory};
    use std::sync::Arc;

    #[test]
    fn test_similarity_steps() {
        assert_eq!(similarity_step(0.95), 0.9);
        assert_eq!(similarity_step(0.6), 0.7);
        assert_eq!(similarity_step(0.4), 0.5);
        assert_eq!(similarity_step(0.3), 0.4);
        assert_eq!(similarity_step(-1.0), 0.4);
    }

    #[test]
    fn test_keyword_steps() {
        assert_eq!(keyword_step("We agreed on the vendor"), 0.9);
        assert_eq!(keyword_step("Ben will send the deck"), 0.7);
        assert_eq!(keyword_step("the vendor is slow"), 0.5);
    }

    #[test]
    fn test_boosts_stack_and_cap() {
        let calibrator = ConfidenceCalibrator::new();

        assert_eq!(calibrator.confidence("the vendor is slow", None), 0.5);
        assert!((calibrator.confidence("the vendor needs 3 weeks", None) - 0.7).abs() < 1e-6);
        assert_eq!(
            calibrator.confidence("We decided to move launch from October 15th to October 29th", None),
            MAX_CONFIDENCE
        );
    }

    #[tokio::test]
    async fn test_summary_similarity_path() {
        let collaborators = Collaborators::none().with_embedder(Arc::new(MockEmbedder::new()));
        let mut calibrator = ConfidenceCalibrator::new();
        calibrator.set_summary("vendor contract renewal", &collaborators).await;
        assert!(calibrator.has_summary());

        let same = collaborators.embed_one("vendor contract renewal").await.unwrap();
        assert_eq!(calibrator.confidence("vendor contract renewal", Some(&same)), 0.9);

        let other = collaborators.embed_one("lunch menu").await.unwrap();
        assert_eq!(calibrator.confidence("lunch menu", Some(&other)), 0.4);
    }

    #[tokio::test]
    async fn test_failed_summary_falls_back_to_keywords() {
        let collaborators = Collaborators::none().with_embedder(Arc::new(MockEmbedder::failing()));
        let mut calibrator = ConfidenceCalibrator::new();
        calibrator.set_summary("anything", &collaborators).await;
        assert!(!calibrator.has_summary());

        let mut item = CandidateItem::risk(
            "the vendor is slow",
            RiskCategory::Other,
            None,
            0.85,
            ExtractionMethod::Pattern,
        );
        calibrator.calibrate(&mut item, None);
        assert_eq!(item.confidence, 0.5);
        assert_eq!(item.extractor_confidence, 0.85);
    }
}
