//! Deterministic quality metrics over an extraction report.
//!
//! Field completeness, item count and diversity are always computed;
//! precision/recall/F1 only when reference items are supplied. Scores are
//! reported on the 0–10 scale so they can be aggregated alongside judge and
//! human scores; counts and lengths ride along as unscaled stats.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::pipeline::generation::UNCLEAR_OWNER;
use crate::pipeline::run::ExtractionReport;
use crate::types::candidate::{CandidateItem, ItemDetails, ItemKind, RiskCategory};
use crate::types::evaluation::{EvaluationRecord, SourceEvaluation};

/// Criterion name under which completeness is reported.
pub const COMPLETENESS: &str = "completeness";

/// Criterion name under which the unique-text ratio is reported.
pub const DIVERSITY: &str = "diversity";

/// Hand-labelled items to compare against, by component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceItems {
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
}

impl ReferenceItems {
    pub fn for_kind(&self, kind: ItemKind) -> &[String] {
        match kind {
            ItemKind::Decision => &self.decisions,
            ItemKind::Action => &self.action_items,
            ItemKind::Risk => &self.risks,
        }
    }
}

/// Fraction of items carrying each expected field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completeness {
    /// field → coverage in [0, 1]
    pub fields: BTreeMap<String, f64>,
    /// Mean of the field coverages (0 when there are no items)
    pub overall: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecall {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub matches: usize,
}

/// How varied a component's items are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Diversity {
    /// Distinct texts over total items
    pub unique_ratio: f64,
    /// Mean text length in characters
    pub avg_length: f64,
    pub total_items: usize,
}

type FieldCheck = (&'static str, fn(&CandidateItem) -> bool);

fn long_description(item: &CandidateItem) -> bool {
    item.text.chars().count() > 20
}

fn has_rationale(item: &CandidateItem) -> bool {
    item.rationale().is_some_and(|r| !r.is_empty())
}

fn has_people(item: &CandidateItem) -> bool {
    !item.people().is_empty()
}

fn has_owner(item: &CandidateItem) -> bool {
    item.owner()
        .is_some_and(|o| !o.is_empty() && o != UNCLEAR_OWNER)
}

fn has_due_date(item: &CandidateItem) -> bool {
    item.due_date().is_some()
}

fn has_description(item: &CandidateItem) -> bool {
    item.text.chars().count() > 10
}

fn has_text(item: &CandidateItem) -> bool {
    !item.text.trim().is_empty()
}

fn has_category(item: &CandidateItem) -> bool {
    !matches!(
        item.details,
        ItemDetails::Risk {
            category: RiskCategory::Other,
            ..
        }
    )
}

const DECISION_FIELDS: &[FieldCheck] = &[
    ("description", long_description),
    ("rationale", has_rationale),
    ("participants", has_people),
];

const ACTION_FIELDS: &[FieldCheck] = &[
    ("owner", has_owner),
    ("due_date", has_due_date),
    ("description", has_description),
];

const RISK_FIELDS: &[FieldCheck] = &[
    ("description", has_text),
    ("category", has_category),
    ("mentioned_by", has_people),
];

fn field_checks(kind: ItemKind) -> &'static [FieldCheck] {
    match kind {
        ItemKind::Decision => DECISION_FIELDS,
        ItemKind::Action => ACTION_FIELDS,
        ItemKind::Risk => RISK_FIELDS,
    }
}

/// Field completeness for one component's items.
pub fn completeness(kind: ItemKind, items: &[CandidateItem]) -> Completeness {
    let checks = field_checks(kind);
    if items.is_empty() {
        return Completeness::default();
    }

    let total = items.len() as f64;
    let fields: BTreeMap<String, f64> = checks
        .iter()
        .map(|(name, check)| {
            let present = items.iter().filter(|&i| check(i)).count() as f64;
            (name.to_string(), present / total)
        })
        .collect();
    let overall = fields.values().sum::<f64>() / checks.len() as f64;

    Completeness { fields, overall }
}

/// Distinct-text ratio and mean length (all zero when there are no items).
pub fn diversity(items: &[CandidateItem]) -> Diversity {
    if items.is_empty() {
        return Diversity::default();
    }

    let total = items.len() as f64;
    let unique: HashSet<&str> = items.iter().map(|i| i.text.as_str()).collect();
    let length: usize = items.iter().map(|i| i.text.chars().count()).sum();

    Diversity {
        unique_ratio: unique.len() as f64 / total,
        avg_length: length as f64 / total,
        total_items: items.len(),
    }
}

/// Case-insensitive substring matching in either direction; each
/// predicted item matches at most one reference.
pub fn precision_recall(predicted: &[&str], reference: &[String]) -> PrecisionRecall {
    let references: Vec<String> = reference.iter().map(|r| r.to_lowercase()).collect();

    let matches = predicted
        .iter()
        .map(|p| p.to_lowercase())
        .filter(|p| {
            !p.is_empty()
                && references
                    .iter()
                    .any(|r| !r.is_empty() && (r.contains(p.as_str()) || p.contains(r.as_str())))
        })
        .count();

    let ratio = |n: usize, d: usize| if d == 0 { 0.0 } else { n as f64 / d as f64 };
    let precision = ratio(matches, predicted.len());
    let recall = ratio(matches, reference.len());
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    PrecisionRecall {
        precision,
        recall,
        f1,
        matches,
    }
}

fn component_record(kind: ItemKind, items: &[CandidateItem], reference: Option<&[String]>) -> EvaluationRecord {
    let complete = completeness(kind, items);
    let explanation = if items.is_empty() {
        "no items extracted".to_string()
    } else {
        complete
            .fields
            .iter()
            .map(|(field, coverage)| format!("{} {:.0}%", field, coverage * 100.0))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let spread = diversity(items);
    let mut record = EvaluationRecord::new()
        .with_score(COMPLETENESS, complete.overall * 10.0)
        .with_explanation(COMPLETENESS, explanation)
        .with_stat("count", items.len() as f64)
        .with_stat("unique_ratio", spread.unique_ratio)
        .with_stat("avg_length", spread.avg_length);

    if !items.is_empty() {
        record = record
            .with_score(DIVERSITY, spread.unique_ratio * 10.0)
            .with_explanation(
                DIVERSITY,
                format!(
                    "{} of {} items distinct, avg {:.0} chars",
                    (spread.unique_ratio * spread.total_items as f64).round(),
                    spread.total_items,
                    spread.avg_length
                ),
            );
    }

    if let Some(reference) = reference.filter(|r| !r.is_empty()) {
        let predicted: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
        let prf = precision_recall(&predicted, reference);
        record = record
            .with_score("precision", prf.precision * 10.0)
            .with_score("recall", prf.recall * 10.0)
            .with_score("f1", prf.f1 * 10.0)
            .with_explanation(
                "f1",
                format!("{} of {} reference items matched", prf.matches, reference.len()),
            );
    }

    let overall = record.scores.values().sum::<f64>() / record.scores.len() as f64;
    record.with_overall(overall)
}

/// Metrics evaluation of a whole report.
pub fn evaluate_extraction(report: &ExtractionReport, reference: Option<&ReferenceItems>) -> SourceEvaluation {
    [ItemKind::Decision, ItemKind::Action, ItemKind::Risk]
        .into_iter()
        .fold(SourceEvaluation::new(), |eval, kind| {
            let record = component_record(
                kind,
                report.items(kind),
                reference.map(|r| r.for_kind(kind)),
            );
            eval.with_component(kind.component(), record)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::candidate::{DecisionCategory, ExtractionMethod, Priority};

    fn action(text: &str, owner: &str, due: Option<&str>) -> CandidateItem {
        CandidateItem::action(
            text,
            owner,
            due.map(str::to_string),
            Priority::Medium,
            0.85,
            ExtractionMethod::Pattern,
        )
    }

    #[test]
    fn test_action_completeness() {
        let items = vec![
            action("send the revised budget", "Sarah", Some("Friday")),
            action("call", UNCLEAR_OWNER, None),
        ];
        let complete = completeness(ItemKind::Action, &items);

        assert_eq!(complete.fields["owner"], 0.5);
        assert_eq!(complete.fields["due_date"], 0.5);
        assert_eq!(complete.fields["description"], 0.5);
        assert_eq!(complete.overall, 0.5);
    }

    #[test]
    fn test_decision_and_risk_completeness() {
        let decision = CandidateItem::decision(
            "move the launch to October 29th",
            Some("vendor delay".to_string()),
            vec![],
            DecisionCategory::Timeline,
            0.85,
            ExtractionMethod::Pattern,
        );
        let complete = completeness(ItemKind::Decision, &[decision]);
        assert_eq!(complete.fields["participants"], 0.0);
        assert!((complete.overall - 2.0 / 3.0).abs() < 1e-9);

        let risk = CandidateItem::risk(
            "vendor may go quiet",
            RiskCategory::Other,
            Some("Ana".to_string()),
            0.85,
            ExtractionMethod::Pattern,
        );
        assert_eq!(completeness(ItemKind::Risk, &[risk]).fields["category"], 0.0);
        assert_eq!(completeness(ItemKind::Risk, &[]).overall, 0.0);
    }

    #[test]
    fn test_precision_recall() {
        let reference = vec![
            "Sarah to contact the Salesforce manager".to_string(),
            "Update the roadmap".to_string(),
        ];
        let prf = precision_recall(
            &["contact the salesforce manager", "order lunch", "update the roadmap"],
            &reference,
        );

        assert_eq!(prf.matches, 2);
        assert!((prf.precision - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(prf.recall, 1.0);
        assert!((prf.f1 - 0.8).abs() < 1e-9);

        let none = precision_recall(&[], &reference);
        assert_eq!(none.f1, 0.0);
    }

    #[test]
    fn test_component_record_scales_to_ten() {
        let items = vec![action("send the revised budget", "Sarah", Some("Friday"))];
        let reference = vec!["send the revised budget".to_string()];
        let record = component_record(ItemKind::Action, &items, Some(&reference));

        assert_eq!(record.scores[COMPLETENESS], 10.0);
        assert_eq!(record.scores["f1"], 10.0);
        assert_eq!(record.overall_score, 10.0);
        assert_eq!(record.explanations["f1"], "1 of 1 reference items matched");
        assert_eq!(record.stats["count"], 1.0);
    }

    #[test]
    fn test_diversity_counts_repeated_items() {
        let items = vec![
            action("send the deck", "Ben", None),
            action("send the deck", "Ben", None),
            action("book a bigger room", "Cal", None),
            action("order lunch", "Ana", None),
        ];
        let spread = diversity(&items);

        assert_eq!(spread.total_items, 4);
        assert_eq!(spread.unique_ratio, 0.75);
        // (13 + 13 + 18 + 11) / 4
        assert_eq!(spread.avg_length, 13.75);
        assert_eq!(diversity(&[]), Diversity::default());

        let record = component_record(ItemKind::Action, &items, None);
        assert_eq!(record.scores[DIVERSITY], 7.5);
        assert_eq!(record.stats["count"], 4.0);
        assert_eq!(record.stats["unique_ratio"], 0.75);
        assert_eq!(record.stats["avg_length"], 13.75);
        assert_eq!(record.explanations[DIVERSITY], "3 of 4 items distinct, avg 14 chars");
    }

    #[test]
    fn test_empty_component_reports_zero_count() {
        let record = component_record(ItemKind::Risk, &[], None);
        assert_eq!(record.stats["count"], 0.0);
        assert!(!record.scores.contains_key(DIVERSITY));
        assert_eq!(record.overall_score, 0.0);
    }
}
