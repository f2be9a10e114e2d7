//! Turns an aggregated evaluation into actionable feedback.

use serde::{Deserialize, Serialize};

use crate::types::config::ScoringThresholds;
use crate::types::evaluation::{AggregatedEvaluation, ComponentAggregate, EvaluationSource};

/// How many recommendations make the priority list.
pub const MAX_PRIORITY_IMPROVEMENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentFinding {
    pub component: String,
    pub score: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub component: String,
    pub criterion: String,
    pub score: f64,
    pub recommendation: String,
    /// Judge or human explanation for the low score, if any
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,
    /// Higher for lower scores: `(10 - score) * 0.1`
    pub impact_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementReport {
    pub summary: String,
    pub strengths: Vec<ComponentFinding>,
    pub weaknesses: Vec<ComponentFinding>,
    pub recommendations: Vec<Recommendation>,
    pub priority_improvements: Vec<Recommendation>,
}

fn recommendation_text(component: &str, criterion: &str) -> String {
    let text = match (component, criterion) {
        ("summary", "coverage") => "Ensure summary captures all key discussion points",
        ("summary", "factuality") => "Verify summary accuracy against transcript",
        ("summary", "clarity") => "Simplify language and improve structure",
        ("decisions", "specificity") => "Make decisions more concrete and actionable",
        ("decisions", "completeness") => "Capture all decisions made in the meeting",
        ("action_items", "owner") => "Assign clear ownership to each action item",
        ("action_items", "timeline") => "Add specific deadlines to action items",
        ("risks", "impact") => "Describe potential impact of each risk clearly",
        ("risks", "likelihood") => "Assess likelihood/probability of risks",
        _ => return format!("Improve {} for {}", criterion, component),
    };
    text.to_string()
}

fn display_name(component: &str) -> String {
    let mut chars = component.replace('_', " ").chars().collect::<Vec<_>>();
    if let Some(first) = chars.first_mut() {
        *first = first.to_ascii_uppercase();
    }
    chars.into_iter().collect()
}

fn explanation_for(aggregate: &ComponentAggregate, criterion: &str) -> String {
    [EvaluationSource::Llm, EvaluationSource::Human]
        .iter()
        .find_map(|source| {
            aggregate
                .explanations
                .get(source)
                .and_then(|e| e.get(criterion))
                .filter(|e| !e.is_empty())
                .cloned()
        })
        .unwrap_or_default()
}

/// Strengths, weaknesses and ranked recommendations for an evaluation.
///
/// Components at or above `pass` are strengths. For the rest, every
/// criterion below `warning` gets a recommendation.
pub fn improvement_report(aggregated: &AggregatedEvaluation, thresholds: &ScoringThresholds) -> ImprovementReport {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut recommendations = Vec::new();

    for (component, aggregate) in &aggregated.components {
        let score = aggregate.overall_score;
        if score >= thresholds.pass {
            strengths.push(ComponentFinding {
                component: component.clone(),
                score,
                description: format!("{} extraction is performing well", display_name(component)),
            });
            continue;
        }

        weaknesses.push(ComponentFinding {
            component: component.clone(),
            score,
            description: format!("{} extraction needs improvement", display_name(component)),
        });

        for (criterion, &score) in &aggregate.scores {
            if score < thresholds.warning {
                recommendations.push(Recommendation {
                    component: component.clone(),
                    criterion: criterion.clone(),
                    score,
                    recommendation: recommendation_text(component, criterion),
                    details: explanation_for(aggregate, criterion),
                    impact_score: (10.0 - score) * 0.1,
                });
            }
        }
    }

    let mut priority_improvements = recommendations.clone();
    priority_improvements.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score));
    priority_improvements.truncate(MAX_PRIORITY_IMPROVEMENTS);

    let summary = summary_sentence(
        aggregated.aggregate_score,
        thresholds,
        strengths.len(),
        weaknesses.len(),
    );

    ImprovementReport {
        summary,
        strengths,
        weaknesses,
        recommendations,
        priority_improvements,
    }
}

fn summary_sentence(score: f64, thresholds: &ScoringThresholds, strengths: usize, weaknesses: usize) -> String {
    let outlook = if score >= thresholds.pass {
        "The system is performing well overall."
    } else if score >= thresholds.warning {
        "The system shows acceptable performance with room for improvement."
    } else {
        "Significant improvements are needed for production readiness."
    };

    format!(
        "Overall extraction quality: {} ({}/10). Found {} strong areas and {} areas for improvement. {}",
        thresholds.tier(score),
        score,
        strengths,
        weaknesses,
        outlook
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::evaluation::AgreementLevel;
    use crate::types::config::SourceWeights;
    use std::collections::BTreeMap;

    fn component(overall: f64, scores: &[(&str, f64)]) -> ComponentAggregate {
        ComponentAggregate {
            scores: scores.iter().map(|(c, s)| (c.to_string(), *s)).collect(),
            overall_score: overall,
            ..Default::default()
        }
    }

    fn aggregated(components: Vec<(&str, ComponentAggregate)>, score: f64) -> AggregatedEvaluation {
        AggregatedEvaluation {
            components: components
                .into_iter()
                .map(|(n, c)| (n.to_string(), c))
                .collect::<BTreeMap<_, _>>(),
            aggregate_score: score,
            confidence: AgreementLevel::Low,
            sources: vec![EvaluationSource::Llm],
            weights: SourceWeights::new(0.5, 0.0, 0.2),
        }
    }

    #[test]
    fn test_strengths_weaknesses_and_recommendations() {
        let mut actions = component(4.0, &[("owner", 3.0), ("timeline", 6.0), ("clarity", 2.0)]);
        actions.explanations.insert(
            EvaluationSource::Human,
            [("owner".to_string(), "half the items say Unclear".to_string())]
                .into_iter()
                .collect(),
        );
        let eval = aggregated(
            vec![
                ("decisions", component(8.0, &[("specificity", 4.0)])),
                ("action_items", actions),
            ],
            6.0,
        );

        let report = improvement_report(&eval, &ScoringThresholds::default());

        assert_eq!(report.strengths.len(), 1);
        assert_eq!(report.strengths[0].description, "Decisions extraction is performing well");
        assert_eq!(report.weaknesses[0].description, "Action items extraction needs improvement");

        // strong components get no recommendations, timeline is above warning
        assert_eq!(report.recommendations.len(), 2);
        let owner = report
            .recommendations
            .iter()
            .find(|r| r.criterion == "owner")
            .unwrap();
        assert_eq!(owner.recommendation, "Assign clear ownership to each action item");
        assert_eq!(owner.details, "half the items say Unclear");
        assert!((owner.impact_score - 0.7).abs() < 1e-9);

        assert_eq!(report.priority_improvements[0].criterion, "clarity");
        assert_eq!(
            report.priority_improvements[0].recommendation,
            "Improve clarity for action_items"
        );
        assert_eq!(
            report.summary,
            "Overall extraction quality: Good (6/10). Found 1 strong areas and 1 areas for improvement. \
             The system shows acceptable performance with room for improvement."
        );
    }

    #[test]
    fn test_priority_list_is_capped() {
        let scores: Vec<(String, f64)> = (0..8).map(|i| (format!("c{}", i), i as f64 * 0.5)).collect();
        let refs: Vec<(&str, f64)> = scores.iter().map(|(c, s)| (c.as_str(), *s)).collect();
        let eval = aggregated(vec![("risks", component(1.0, &refs))], 1.0);

        let report = improvement_report(&eval, &ScoringThresholds::default());
        assert_eq!(report.recommendations.len(), 8);
        assert_eq!(report.priority_improvements.len(), MAX_PRIORITY_IMPROVEMENTS);
        assert_eq!(report.priority_improvements[0].score, 0.0);
        assert!(report.summary.contains("Poor"));
        assert!(report.summary.ends_with("Significant improvements are needed for production readiness."));
    }
}
