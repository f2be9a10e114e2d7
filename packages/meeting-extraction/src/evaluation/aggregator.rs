//! Combines judge, human and metrics evaluations into one verdict.
//!
//! Aggregation is a pure function of its inputs: every call recomputes
//! from the full set of sources, so repeating it never drifts.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::types::config::{AggregationConfig, EvaluationRubric, SourceWeights};
use crate::types::evaluation::{
    AgreementLevel, AggregatedEvaluation, ComponentAggregate, EvaluationSource, SourceEvaluation,
};
use crate::types::job::EvaluationJob;

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Average judge/human agreement over the components both scored.
///
/// `None` when either source is missing or they share no component.
pub fn agreement(llm: Option<&SourceEvaluation>, human: Option<&SourceEvaluation>) -> Option<f64> {
    let (llm, human) = (llm?, human?);
    let scores: Vec<f64> = llm
        .components
        .iter()
        .filter_map(|(name, l)| {
            human
                .component(name)
                .map(|h| 1.0 - (l.overall_score - h.overall_score).abs() / 10.0)
        })
        .collect();

    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

fn present(eval: Option<&SourceEvaluation>) -> Option<&SourceEvaluation> {
    eval.filter(|e| !e.is_empty())
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationAggregator {
    config: AggregationConfig,
    rubric: EvaluationRubric,
}

impl EvaluationAggregator {
    pub fn new(config: AggregationConfig, rubric: EvaluationRubric) -> Self {
        Self { config, rubric }
    }

    pub fn with_rubric(mut self, rubric: EvaluationRubric) -> Self {
        self.rubric = rubric;
        self
    }

    pub fn rubric(&self) -> &EvaluationRubric {
        &self.rubric
    }

    /// Aggregate whichever sources are present.
    ///
    /// Explicit `weights` are used as given. Otherwise the configured
    /// default set applies, switching to the human set once a human
    /// evaluation exists. Empty evaluations count as absent; with no
    /// source at all the result is an empty, low-confidence verdict.
    pub fn aggregate(
        &self,
        llm: Option<&SourceEvaluation>,
        human: Option<&SourceEvaluation>,
        metrics: Option<&SourceEvaluation>,
        weights: Option<SourceWeights>,
    ) -> AggregatedEvaluation {
        let inputs: Vec<(EvaluationSource, &SourceEvaluation)> = [
            (EvaluationSource::Llm, present(llm)),
            (EvaluationSource::Human, present(human)),
            (EvaluationSource::Metrics, present(metrics)),
        ]
        .into_iter()
        .filter_map(|(source, eval)| eval.map(|e| (source, e)))
        .collect();

        if inputs.is_empty() {
            warn!("No evaluation sources supplied, returning empty aggregate");
        }

        let has_human = inputs.iter().any(|(s, _)| *s == EvaluationSource::Human);
        let weights = weights.unwrap_or_else(|| self.config.weights_for(has_human));

        let component_names: BTreeSet<&String> = inputs
            .iter()
            .flat_map(|(_, eval)| eval.components.keys())
            .collect();

        let mut components = BTreeMap::new();
        for name in component_names {
            let aggregate = self.aggregate_component(name, &inputs, &weights);
            if !aggregate.scores.is_empty() || !aggregate.raw_scores.is_empty() {
                components.insert(name.clone(), aggregate);
            }
        }

        let aggregate_score = if components.is_empty() {
            0.0
        } else {
            round2(
                components.values().map(|c| c.overall_score).sum::<f64>() / components.len() as f64,
            )
        };

        let confidence = agreement(present(llm), present(human))
            .map(AgreementLevel::from_agreement)
            .unwrap_or(AgreementLevel::Low);

        let sources: Vec<EvaluationSource> = inputs.iter().map(|(s, _)| *s).collect();

        debug!(
            components = components.len(),
            aggregate_score,
            confidence = ?confidence,
            sources = sources.len(),
            "Aggregated evaluations"
        );

        AggregatedEvaluation {
            components,
            aggregate_score,
            confidence,
            sources,
            weights,
        }
    }

    /// Aggregate a stored job's inputs.
    pub fn aggregate_job(&self, job: &EvaluationJob) -> AggregatedEvaluation {
        self.aggregate(
            job.llm.as_ref(),
            job.human.as_ref(),
            job.metrics.as_ref(),
            job.weights,
        )
    }

    fn aggregate_component(
        &self,
        name: &str,
        inputs: &[(EvaluationSource, &SourceEvaluation)],
        weights: &SourceWeights,
    ) -> ComponentAggregate {
        let mut aggregate = ComponentAggregate::default();
        // criterion → (weighted sum, weight sum)
        let mut sums: BTreeMap<&str, (f64, f64)> = BTreeMap::new();

        for (source, eval) in inputs {
            let Some(record) = eval.component(name) else {
                continue;
            };
            let weight = weights.get(*source);

            for (criterion, score) in &record.scores {
                let entry = sums.entry(criterion.as_str()).or_insert((0.0, 0.0));
                entry.0 += score * weight;
                entry.1 += weight;
            }

            aggregate.raw_scores.insert(*source, record.scores.clone());
            if !record.explanations.is_empty() {
                aggregate
                    .explanations
                    .insert(*source, record.explanations.clone());
            }
        }

        aggregate.scores = sums
            .into_iter()
            .filter(|(_, (_, weight_sum))| *weight_sum > 0.0)
            .map(|(criterion, (weighted, weight_sum))| {
                (criterion.to_string(), round2(weighted / weight_sum))
            })
            .collect();

        aggregate.overall_score = round2(
            aggregate
                .scores
                .iter()
                .map(|(criterion, score)| score * self.rubric.weight(name, criterion))
                .sum(),
        );

        aggregate
    }
}
