//! Rubric grading through the generation collaborator.

use futures::future::join_all;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::EvaluationResult;
use crate::pipeline::prompts::format_judge_prompt;
use crate::pipeline::run::ExtractionReport;
use crate::traits::collaborators::Collaborators;
use crate::types::candidate::{CandidateItem, ItemKind};
use crate::types::config::{ComponentRubric, EvaluationRubric};
use crate::types::evaluation::{EvaluationRecord, SourceEvaluation};
use crate::types::segment::Segment;

/// Score given to every criterion when the judge's answer is unreadable.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Grades extracted components against the injected rubric.
#[derive(Debug, Clone, Default)]
pub struct LlmJudge {
    rubric: EvaluationRubric,
}

impl LlmJudge {
    pub fn new(rubric: EvaluationRubric) -> Self {
        Self { rubric }
    }

    /// Grade every rubric component the report has items for.
    ///
    /// Components whose call fails are left out; `None` when none could be
    /// graded at all.
    pub async fn evaluate(
        &self,
        segments: &[Segment],
        report: &ExtractionReport,
        collaborators: &Collaborators,
    ) -> Option<SourceEvaluation> {
        if !collaborators.has_generator() {
            debug!("No generator configured, skipping judge");
            return None;
        }

        let transcript = segments
            .iter()
            .map(Segment::attributed)
            .collect::<Vec<_>>()
            .join("\n");

        let tasks = [ItemKind::Decision, ItemKind::Action, ItemKind::Risk]
            .into_iter()
            .filter_map(|kind| {
                let component = kind.component();
                let rubric = self.rubric.component(component)?;
                let extracted = render_items(report.items(kind));
                let prompt = format_judge_prompt(component, rubric, &transcript, &extracted);
                Some(async move {
                    let record = match self.grade(rubric, &prompt, collaborators).await {
                        Ok(record) => Some(record),
                        Err(e) => {
                            warn!(component = %component, error = %e, "Judge call failed, omitting component");
                            None
                        }
                    };
                    (component, record)
                })
            });

        let evaluation = join_all(tasks)
            .await
            .into_iter()
            .fold(SourceEvaluation::new(), |eval, (component, record)| match record {
                Some(record) => eval.with_component(component, record),
                None => eval,
            });

        if evaluation.is_empty() {
            None
        } else {
            Some(evaluation)
        }
    }

    /// Grade one component from a rendered judge prompt.
    pub async fn grade(
        &self,
        rubric: &ComponentRubric,
        prompt: &str,
        collaborators: &Collaborators,
    ) -> EvaluationResult<EvaluationRecord> {
        let value = collaborators.generate(prompt).await?;
        Ok(parse_judgement(rubric, &value))
    }
}

fn render_items(items: &[CandidateItem]) -> String {
    let rendered: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "text": item.text,
                "people": item.people(),
                "category": item.category(),
                "due_date": item.due_date(),
            })
        })
        .collect();
    serde_json::to_string_pretty(&rendered).unwrap_or_else(|_| "[]".to_string())
}

/// Turn a judge answer into a record, scoring only rubric criteria.
///
/// Anything unreadable yields a neutral score for every criterion.
pub fn parse_judgement(rubric: &ComponentRubric, value: &Value) -> EvaluationRecord {
    let parsed;
    let value = match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(v) => {
                parsed = v;
                &parsed
            }
            Err(_) => return neutral(rubric),
        },
        other => other,
    };

    let Some(scores) = value.get("scores").and_then(Value::as_object) else {
        return neutral(rubric);
    };
    let explanations = value.get("explanations").and_then(Value::as_object);

    let mut record = EvaluationRecord::new();
    for criterion in &rubric.criteria {
        let Some(score) = scores.get(criterion).and_then(Value::as_f64) else {
            continue;
        };
        record = record.with_score(criterion, score);
        if let Some(text) = explanations
            .and_then(|e| e.get(criterion))
            .and_then(Value::as_str)
        {
            record = record.with_explanation(criterion, text);
        }
    }

    if record.scores.is_empty() {
        return neutral(rubric);
    }
    with_rubric_overall(record, rubric)
}

fn neutral(rubric: &ComponentRubric) -> EvaluationRecord {
    let record = rubric.criteria.iter().fold(EvaluationRecord::new(), |r, c| {
        r.with_score(c, NEUTRAL_SCORE)
            .with_explanation(c, "Judge response could not be parsed")
    });
    with_rubric_overall(record, rubric)
}

fn with_rubric_overall(record: EvaluationRecord, rubric: &ComponentRubric) -> EvaluationRecord {
    let overall = record
        .scores
        .iter()
        .map(|(criterion, score)| score * rubric.weight(criterion))
        .sum();
    record.with_overall(overall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::run::TranscriptPipeline;
    use crate::testing::MockGenerator;
    use crate::types::segment::segments_from_pairs;
    use std::sync::Arc;

    fn rubric() -> ComponentRubric {
        EvaluationRubric::default()
            .component("decisions")
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_parse_scores_and_explanations() {
        let value = json!({
            "scores": {"specificity": 8.0, "completeness": 6.0, "accuracy": 7.0, "bogus": 1.0},
            "explanations": {"specificity": "dates are explicit"}
        });
        let record = parse_judgement(&rubric(), &value);

        assert_eq!(record.scores.len(), 3);
        assert_eq!(record.explanations["specificity"], "dates are explicit");
        // 8*0.35 + 6*0.35 + 7*0.3
        assert!((record.overall_score - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_answer_is_neutral() {
        for value in [json!("not json"), json!({"grade": "A"}), json!({"scores": {}})] {
            let record = parse_judgement(&rubric(), &value);
            assert!(record.scores.values().all(|s| *s == NEUTRAL_SCORE));
            assert_eq!(record.scores.len(), 3);
            assert!((record.overall_score - NEUTRAL_SCORE).abs() < 1e-9);
        }
    }

    #[test]
    fn test_answer_as_json_string() {
        let value = json!(r#"{"scores": {"accuracy": 9}}"#);
        let record = parse_judgement(&rubric(), &value);
        assert_eq!(record.scores["accuracy"], 9.0);
    }

    #[tokio::test]
    async fn test_failed_components_are_omitted() {
        let segments = segments_from_pairs([(
            "David",
            "We decided to push the launch date from October 15th to October 29th.",
        )]);
        let report = TranscriptPipeline::pattern_only().run(&segments).await;

        let generator = MockGenerator::new()
            .with_rule(
                "Component under review: decisions",
                json!({"scores": {"accuracy": 9.0}}),
            )
            .with_failing_rule("Component under review: risks", "model offline");
        let collaborators = Collaborators::none().with_generator(Arc::new(generator));

        let eval = LlmJudge::default()
            .evaluate(&segments, &report, &collaborators)
            .await
            .unwrap();

        assert_eq!(eval.component("decisions").unwrap().scores["accuracy"], 9.0);
        assert!(eval.component("risks").is_none());
        assert!(eval.component("action_items").is_none());
    }

    #[tokio::test]
    async fn test_grade_surfaces_collaborator_error() {
        let collaborators = Collaborators::none()
            .with_generator(Arc::new(MockGenerator::new().with_failing_rule("grade", "offline")));
        let err = LlmJudge::default()
            .grade(&rubric(), "grade this", &collaborators)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::EvaluationError::Judge(_)));
    }

    #[tokio::test]
    async fn test_no_generator_means_no_judge() {
        let report = TranscriptPipeline::pattern_only().run(&[]).await;
        assert!(LlmJudge::default()
            .evaluate(&[], &report, &Collaborators::none())
            .await
            .is_none());
    }
}
