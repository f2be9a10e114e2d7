//! Configuration types for extraction and evaluation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ExtractionError;
use crate::types::evaluation::EvaluationSource;

/// How near-duplicate candidates of the same kind are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Every candidate is kept.
    #[default]
    None,

    /// Merge candidates whose token Jaccard similarity reaches `threshold`.
    SimilarityMerge { threshold: f32 },
}

impl DedupStrategy {
    pub const DEFAULT_MERGE_THRESHOLD: f32 = 0.8;

    pub fn similarity_merge() -> Self {
        DedupStrategy::SimilarityMerge {
            threshold: Self::DEFAULT_MERGE_THRESHOLD,
        }
    }
}

impl FromStr for DedupStrategy {
    type Err = ExtractionError;

    /// Accepts `none`, `similarity_merge` or `similarity_merge:<threshold>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let (name, threshold) = match s.split_once(':') {
            Some((name, t)) => (name.to_string(), Some(t.to_string())),
            None => (s.clone(), None),
        };

        match (name.as_str(), threshold) {
            ("none", None) => Ok(DedupStrategy::None),
            ("similarity_merge", None) => Ok(DedupStrategy::similarity_merge()),
            ("similarity_merge", Some(t)) => {
                let threshold: f32 = t.parse().map_err(|_| ExtractionError::Config {
                    reason: format!("invalid merge threshold: {}", t),
                })?;
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(ExtractionError::Config {
                        reason: format!("merge threshold out of range: {}", threshold),
                    });
                }
                Ok(DedupStrategy::SimilarityMerge { threshold })
            }
            _ => Err(ExtractionError::Config {
                reason: format!("unknown dedup strategy: {}", s),
            }),
        }
    }
}

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Token budget for the speaker-attributed context window.
    ///
    /// Default: 2500.
    pub token_budget: usize,

    /// Estimated tokens per word when sizing the context window.
    ///
    /// Default: 1.3.
    pub tokens_per_word: f32,

    /// Confidence assigned to every pattern-path candidate.
    ///
    /// Fixed regardless of how specific the match was. Default: 0.85.
    pub pattern_confidence: f32,

    /// Candidates below this calibrated confidence are dropped.
    ///
    /// Default: 0.4.
    pub min_confidence: f32,

    #[serde(default)]
    pub dedup_strategy: DedupStrategy,

    /// Also drop candidates whose validation verdict is invalid.
    ///
    /// When false, invalid items are kept and carry their verdict so
    /// reviewers can see why. Default: false.
    pub drop_invalid: bool,

    /// Bound on a single generation call, in seconds. Default: 60.
    pub generation_timeout_secs: u64,

    /// Bound on a single embedding call, in seconds. Default: 10.
    pub embedding_timeout_secs: u64,

    /// Maximum participants attached to a pattern-path decision.
    pub max_participants: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            token_budget: 2500,
            tokens_per_word: 1.3,
            pattern_confidence: 0.85,
            min_confidence: 0.4,
            dedup_strategy: DedupStrategy::None,
            drop_invalid: false,
            generation_timeout_secs: 60,
            embedding_timeout_secs: 10,
            max_participants: 5,
        }
    }
}

impl ExtractionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token_budget(mut self, budget: usize) -> Self {
        self.token_budget = budget;
        self
    }

    pub fn with_pattern_confidence(mut self, confidence: f32) -> Self {
        self.pattern_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.min_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_dedup(mut self, strategy: DedupStrategy) -> Self {
        self.dedup_strategy = strategy;
        self
    }

    /// Drop candidates that fail validation.
    pub fn dropping_invalid(mut self) -> Self {
        self.drop_invalid = true;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_embedding_timeout(mut self, timeout: Duration) -> Self {
        self.embedding_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding_timeout_secs)
    }
}

/// Per-source weights used by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceWeights {
    pub llm: f64,
    pub human: f64,
    pub metrics: f64,
}

impl SourceWeights {
    pub fn new(llm: f64, human: f64, metrics: f64) -> Self {
        Self { llm, human, metrics }
    }

    pub fn get(&self, source: EvaluationSource) -> f64 {
        match source {
            EvaluationSource::Llm => self.llm,
            EvaluationSource::Human => self.human,
            EvaluationSource::Metrics => self.metrics,
        }
    }
}

/// Source weighting defaults for the aggregator.
///
/// Neither set is derived from anything; both are configured defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Used when no human evaluation is present.
    pub default_weights: SourceWeights,

    /// Used once a human evaluation exists.
    pub human_weights: SourceWeights,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            default_weights: SourceWeights::new(0.5, 0.0, 0.2),
            human_weights: SourceWeights::new(0.4, 0.4, 0.2),
        }
    }
}

impl AggregationConfig {
    /// Pick the weight set for the given inputs.
    pub fn weights_for(&self, has_human: bool) -> SourceWeights {
        if has_human {
            self.human_weights
        } else {
            self.default_weights
        }
    }
}

/// Criteria and weights for one evaluated component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentRubric {
    pub criteria: Vec<String>,

    /// criterion → weight; expected to sum to 1
    pub weights: BTreeMap<String, f64>,

    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
}

impl ComponentRubric {
    fn from_table(table: &[(&str, f64, &str)]) -> Self {
        let mut rubric = Self::default();
        for (criterion, weight, description) in table {
            rubric.criteria.push(criterion.to_string());
            rubric.weights.insert(criterion.to_string(), *weight);
            rubric
                .descriptions
                .insert(criterion.to_string(), description.to_string());
        }
        rubric
    }

    /// Weight for a criterion (0 when the rubric does not name it).
    pub fn weight(&self, criterion: &str) -> f64 {
        self.weights.get(criterion).copied().unwrap_or(0.0)
    }
}

/// Quality tier label for a range of aggregate scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityTier {
    /// Inclusive lower bound
    pub min: f64,
    pub label: String,
}

/// Cutoffs on the 0–10 scale consumed by gating and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringThresholds {
    pub pass: f64,
    pub warning: f64,

    /// Sorted by ascending `min`
    #[serde(default = "default_tiers")]
    pub tiers: Vec<QualityTier>,
}

fn default_tiers() -> Vec<QualityTier> {
    [(0.0, "Poor"), (4.0, "Fair"), (6.0, "Good"), (8.0, "Excellent")]
        .into_iter()
        .map(|(min, label)| QualityTier {
            min,
            label: label.to_string(),
        })
        .collect()
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            pass: 7.0,
            warning: 5.0,
            tiers: default_tiers(),
        }
    }
}

impl ScoringThresholds {
    pub fn new(pass: f64, warning: f64) -> Self {
        Self {
            pass,
            warning,
            ..Default::default()
        }
    }

    /// Tier label for a score (highest tier whose lower bound it reaches).
    pub fn tier(&self, score: f64) -> &str {
        self.tiers
            .iter()
            .rev()
            .find(|t| score >= t.min)
            .map(|t| t.label.as_str())
            .unwrap_or("Unrated")
    }
}

/// Injected, read-only evaluation rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRubric {
    pub components: BTreeMap<String, ComponentRubric>,

    #[serde(default)]
    pub thresholds: ScoringThresholds,
}

impl Default for EvaluationRubric {
    fn default() -> Self {
        let mut components = BTreeMap::new();
        components.insert(
            "summary".to_string(),
            ComponentRubric::from_table(&[
                ("coverage", 0.4, "Captures all key discussion points"),
                ("factuality", 0.4, "Every statement is supported by the transcript"),
                ("clarity", 0.2, "Concise and well structured"),
            ]),
        );
        components.insert(
            "decisions".to_string(),
            ComponentRubric::from_table(&[
                ("specificity", 0.35, "Decisions are concrete and unambiguous"),
                ("completeness", 0.35, "All decisions made in the meeting are captured"),
                ("accuracy", 0.3, "Decisions match what was actually agreed"),
            ]),
        );
        components.insert(
            "action_items".to_string(),
            ComponentRubric::from_table(&[
                ("owner", 0.3, "Each action has a clear owner"),
                ("timeline", 0.2, "Each action has a deadline where one was given"),
                ("specificity", 0.2, "Actions describe a concrete task"),
                ("completeness", 0.3, "All assigned actions are captured"),
            ]),
        );
        components.insert(
            "risks".to_string(),
            ComponentRubric::from_table(&[
                ("impact", 0.3, "Potential impact is described"),
                ("likelihood", 0.2, "Likelihood is assessed"),
                ("specificity", 0.2, "Risks are concrete"),
                ("completeness", 0.3, "All raised risks are captured"),
            ]),
        );

        Self {
            components,
            thresholds: ScoringThresholds::default(),
        }
    }
}

impl EvaluationRubric {
    pub fn component(&self, name: &str) -> Option<&ComponentRubric> {
        self.components.get(name)
    }

    /// Rubric weight for a criterion of a component (0 when unknown).
    pub fn weight(&self, component: &str, criterion: &str) -> f64 {
        self.component(component)
            .map(|c| c.weight(criterion))
            .unwrap_or(0.0)
    }

    pub fn with_thresholds(mut self, thresholds: ScoringThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rubric_weights_sum_to_one() {
        let rubric = EvaluationRubric::default();
        for (name, component) in &rubric.components {
            let sum: f64 = component.weights.values().sum();
            assert!((sum - 1.0).abs() < 1e-9, "{} weights sum to {}", name, sum);
            assert_eq!(component.criteria.len(), component.weights.len());
        }
    }

    #[test]
    fn test_dedup_strategy_parsing() {
        assert_eq!("none".parse::<DedupStrategy>().unwrap(), DedupStrategy::None);
        assert_eq!(
            "similarity_merge".parse::<DedupStrategy>().unwrap(),
            DedupStrategy::SimilarityMerge { threshold: 0.8 }
        );
        assert_eq!(
            "similarity_merge:0.6".parse::<DedupStrategy>().unwrap(),
            DedupStrategy::SimilarityMerge { threshold: 0.6 }
        );
        assert!("similarity_merge:1.5".parse::<DedupStrategy>().is_err());
        assert!("fuzzy".parse::<DedupStrategy>().is_err());
    }

    #[test]
    fn test_dedup_strategy_serde_tag() {
        let json = serde_json::to_value(DedupStrategy::similarity_merge()).unwrap();
        assert_eq!(json["strategy"], "similarity_merge");

        let parsed: DedupStrategy = serde_json::from_str(r#"{"strategy":"none"}"#).unwrap();
        assert_eq!(parsed, DedupStrategy::None);
    }

    #[test]
    fn test_weights_switch_when_human_present() {
        let config = AggregationConfig::default();
        assert_eq!(config.weights_for(false).human, 0.0);
        assert_eq!(config.weights_for(true).human, 0.4);
    }

    #[test]
    fn test_tier_lookup() {
        let thresholds = ScoringThresholds::default();
        assert_eq!(thresholds.tier(9.1), "Excellent");
        assert_eq!(thresholds.tier(6.0), "Good");
        assert_eq!(thresholds.tier(1.0), "Poor");
    }

    #[test]
    fn test_extraction_config_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.token_budget, 2500);
        assert_eq!(config.pattern_confidence, 0.85);
        assert_eq!(config.min_confidence, 0.4);
        assert_eq!(config.generation_timeout(), Duration::from_secs(60));
    }
}
