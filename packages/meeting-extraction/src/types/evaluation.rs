//! Evaluation records from the judge, human reviewers and metrics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::config::SourceWeights;

/// Where an evaluation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationSource {
    Llm,
    Human,
    Metrics,
}

impl EvaluationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationSource::Llm => "llm",
            EvaluationSource::Human => "human",
            EvaluationSource::Metrics => "metrics",
        }
    }
}

impl fmt::Display for EvaluationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source's scores for one component (e.g. "decisions").
///
/// Scores are on the 0–10 scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,

    #[serde(default)]
    pub overall_score: f64,

    #[serde(default)]
    pub explanations: BTreeMap<String, String>,

    /// Unscaled statistics (item counts, lengths). Never aggregated.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stats: BTreeMap<String, f64>,
}

impl EvaluationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a criterion score (clamped to 0–10).
    pub fn with_score(mut self, criterion: impl Into<String>, score: f64) -> Self {
        self.scores.insert(criterion.into(), score.clamp(0.0, 10.0));
        self
    }

    pub fn with_overall(mut self, overall: f64) -> Self {
        self.overall_score = overall.clamp(0.0, 10.0);
        self
    }

    pub fn with_explanation(mut self, criterion: impl Into<String>, text: impl Into<String>) -> Self {
        self.explanations.insert(criterion.into(), text.into());
        self
    }

    pub fn with_stat(mut self, name: impl Into<String>, value: f64) -> Self {
        self.stats.insert(name.into(), value);
        self
    }
}

/// All component records from a single source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceEvaluation {
    #[serde(default)]
    pub components: BTreeMap<String, EvaluationRecord>,
}

impl SourceEvaluation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: impl Into<String>, record: EvaluationRecord) -> Self {
        self.components.insert(component.into(), record);
        self
    }

    pub fn component(&self, name: &str) -> Option<&EvaluationRecord> {
        self.components.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Cross-source agreement between judge and human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementLevel {
    Low,
    Medium,
    High,
}

impl AgreementLevel {
    /// Map an average agreement in [0, 1] to a label.
    pub fn from_agreement(agreement: f64) -> Self {
        if agreement >= 0.8 {
            AgreementLevel::High
        } else if agreement >= 0.6 {
            AgreementLevel::Medium
        } else {
            AgreementLevel::Low
        }
    }
}

/// Aggregated scores for one component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentAggregate {
    /// Final weighted score per criterion
    pub scores: BTreeMap<String, f64>,

    /// Rubric-weighted sum of `scores`
    pub overall_score: f64,

    /// source → criterion → reported score
    pub raw_scores: BTreeMap<EvaluationSource, BTreeMap<String, f64>>,

    /// source → criterion → explanation
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub explanations: BTreeMap<EvaluationSource, BTreeMap<String, String>>,
}

/// The single quality verdict built from every available source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEvaluation {
    pub components: BTreeMap<String, ComponentAggregate>,
    pub aggregate_score: f64,
    pub confidence: AgreementLevel,
    pub sources: Vec<EvaluationSource>,
    /// Weights actually applied
    pub weights: SourceWeights,
}

impl AggregatedEvaluation {
    /// True when no source contributed.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
