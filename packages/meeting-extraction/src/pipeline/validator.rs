//! Hallucination and sanity checks for candidate items.
//!
//! Support is measured two ways: verbatim 2-4 word phrases found in the
//! concatenated source, and (when embeddings were cached for the run) the
//! best cosine similarity to any segment. Logical, type and completeness
//! checks add issues; only high-severity issues invalidate an item.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::pipeline::decision::GROUP_PARTICIPANTS;
use crate::pipeline::text::{char_ratio, token_set};
use crate::traits::embedder::cosine_similarity;
use crate::types::candidate::{CandidateItem, ItemKind, QuantitativeData};
use crate::types::segment::Segment;
use crate::types::validation::{
    IssueKind, NameCheck, QuantityCheck, Severity, ValidationDetails, ValidationIssue,
    ValidationVerdict,
};

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

const ACTION_VERBS: &[&str] = &[
    "send",
    "create",
    "update",
    "review",
    "complete",
    "finish",
    "schedule",
    "organize",
    "prepare",
    "develop",
    "implement",
    "follow",
    "contact",
    "coordinate",
    "analyze",
    "test",
];

const DECISION_WORDS: &[&str] = &[
    "decided",
    "decision",
    "agreed",
    "approved",
    "chosen",
    "concluded",
    "determined",
    "resolved",
    "settled",
    "finalized",
];

/// Fuzzy name matches must beat this ratio.
pub const CLOSE_MATCH_RATIO: f32 = 0.7;

/// Paired opposites; either order counts.
static CONTRADICTIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)\byes\b.*\bno\b",
        r"(?is)\bno\b.*\byes\b",
        r"(?is)\bwill\b.*\bwon't\b",
        r"(?is)\bwon't\b.*\bwill\b",
        r"(?is)\bcan\b.*\bcan't\b",
        r"(?is)\bcan't\b.*\bcan\b",
        r"(?is)\bagree\b.*\bdisagree\b",
        r"(?is)\bdisagree\b.*\bagree\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?\b").unwrap());

static OWNER_PRONOUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:I|we|he|she|they)\b").unwrap());

static DUE_DATE_FORMATS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\d{4}-\d{2}-\d{2}",
        r"\d{1,2}/\d{1,2}/\d{4}",
        r"(?i)\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
        r"(?i)\b(?:next|this|last)\s+(?:week|month|quarter)\b",
        r"(?i)\b(?:today|tomorrow|end of day|eod)\b",
        r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2}",
        r"(?i)\b\d+\s+(?:days?|weeks?)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Validates items against one run's source segments.
pub struct Validator<'a> {
    segments: &'a [Segment],
    source_text: String,
    source_tokens: HashSet<String>,
    speakers: Vec<&'a str>,
    segment_embeddings: Option<&'a [Vec<f32>]>,
}

impl<'a> Validator<'a> {
    pub fn new(segments: &'a [Segment]) -> Self {
        let source_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let mut speakers: Vec<&str> = Vec::new();
        for speaker in segments.iter().filter_map(|s| s.speaker.as_deref()) {
            if !speakers.contains(&speaker) {
                speakers.push(speaker);
            }
        }

        Self {
            segments,
            source_tokens: token_set(&source_text),
            source_text,
            speakers,
            segment_embeddings: None,
        }
    }

    /// Enable semantic support using embeddings cached for this run.
    pub fn with_segment_embeddings(mut self, embeddings: Option<&'a [Vec<f32>]>) -> Self {
        self.segment_embeddings = embeddings;
        self
    }

    /// Validate bare text of the given kind.
    pub fn validate(&self, text: &str, kind: ItemKind, item_embedding: Option<&[f32]>) -> ValidationVerdict {
        if text.trim().is_empty() || self.segments.is_empty() {
            return ValidationVerdict::new(0.0, 0.0, self.issues(text, kind));
        }

        let phrase = phrase_support(text, &self.source_text);
        let semantic = match (item_embedding, self.segment_embeddings) {
            (Some(item), Some(segments)) => semantic_support(item, segments),
            _ => 0.0,
        };

        ValidationVerdict::new(
            phrase.max(semantic),
            self.word_overlap(text),
            self.issues(text, kind),
        )
    }

    /// Validate a candidate, adding the per-kind name and date checks and
    /// the check of its dates and numbers against the source.
    pub fn validate_item(&self, item: &CandidateItem, item_embedding: Option<&[f32]>) -> ValidationVerdict {
        let mut verdict = self.validate(&item.text, item.kind(), item_embedding);

        let mut details = match item.kind() {
            ItemKind::Decision => ValidationDetails {
                participants: item
                    .people()
                    .into_iter()
                    .filter(|p| *p != GROUP_PARTICIPANTS)
                    .map(|p| self.check_name(p))
                    .collect(),
                ..Default::default()
            },
            ItemKind::Action => ValidationDetails {
                owner: item.owner().map(|o| self.check_name(o)),
                due_date_recognized: item.due_date().map(is_recognized_due_date),
                ..Default::default()
            },
            ItemKind::Risk => ValidationDetails::default(),
        };

        if !item.quantitative.is_empty() {
            let check = self.check_quantities(&item.quantitative);
            if !check.is_supported() {
                verdict.issues.push(ValidationIssue::new(
                    IssueKind::UnsupportedQuantity,
                    Severity::Medium,
                    format!("Not found in source: {}", check.unsupported.join(", ")),
                ));
            }
            details.quantities = Some(check);
        }

        verdict.with_details(details)
    }

    fn check_quantities(&self, data: &QuantitativeData) -> QuantityCheck {
        let mut check = QuantityCheck::default();
        for value in data.dates.iter().chain(&data.numbers) {
            if self.source_text.contains(&value.to_lowercase()) {
                check.validated.push(value.clone());
            } else {
                check.unsupported.push(value.clone());
            }
        }
        check
    }

    fn word_overlap(&self, text: &str) -> f32 {
        let tokens = token_set(text);
        if tokens.is_empty() {
            return 0.0;
        }
        tokens.intersection(&self.source_tokens).count() as f32 / tokens.len() as f32
    }

    fn issues(&self, text: &str, kind: ItemKind) -> Vec<ValidationIssue> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        let mut issues = Vec::new();

        if CONTRADICTIONS.iter().any(|re| re.is_match(&lower)) {
            issues.push(ValidationIssue::new(
                IssueKind::Contradiction,
                Severity::High,
                "Text contains contradictory statements",
            ));
        }

        match kind {
            ItemKind::Action if !words.iter().any(|w| ACTION_VERBS.contains(w)) => {
                issues.push(ValidationIssue::new(
                    IssueKind::UnclearAction,
                    Severity::Medium,
                    "Action lacks a clear verb",
                ));
            }
            ItemKind::Decision if !words.iter().any(|w| DECISION_WORDS.contains(w)) => {
                issues.push(ValidationIssue::new(
                    IssueKind::UnclearDecision,
                    Severity::Medium,
                    "Decision lacks decisive language",
                ));
            }
            _ => {}
        }

        if words.len() < 3 {
            issues.push(ValidationIssue::new(
                IssueKind::TooShort,
                Severity::Medium,
                "Text is very short and may be incomplete",
            ));
        }

        if text.ends_with("...") || text.ends_with(" and") {
            issues.push(ValidationIssue::new(
                IssueKind::Truncated,
                Severity::Medium,
                "Text appears to be truncated",
            ));
        }

        if kind == ItemKind::Action && lower.contains("will") && !has_owner(text) {
            issues.push(ValidationIssue::new(
                IssueKind::MissingOwner,
                Severity::Low,
                "Action may be missing a clear owner",
            ));
        }

        issues
    }

    fn check_name(&self, name: &str) -> NameCheck {
        let found_as_speaker = self.speakers.contains(&name);
        let mentioned_in_text = self.source_text.contains(&name.to_lowercase());

        let close_match = if found_as_speaker {
            None
        } else {
            let target = name.to_lowercase();
            let mut best: Option<(&str, f32)> = None;
            for speaker in &self.speakers {
                let ratio = char_ratio(&target, &speaker.to_lowercase());
                if ratio > best.map(|(_, r)| r).unwrap_or(CLOSE_MATCH_RATIO) {
                    best = Some((speaker, ratio));
                }
            }
            best.map(|(speaker, _)| speaker.to_string())
        };

        NameCheck {
            name: name.to_string(),
            found_as_speaker,
            mentioned_in_text,
            close_match,
        }
    }
}

/// Validate text against source segments without embeddings.
pub fn validate(text: &str, segments: &[Segment], kind: ItemKind) -> ValidationVerdict {
    Validator::new(segments).validate(text, kind, None)
}

/// 2-4 word windows with at least half non-stopwords.
pub fn key_phrases(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    let mut phrases = Vec::new();

    for start in 0..words.len() {
        for len in 2..=4 {
            let Some(window) = words.get(start..start + len) else {
                break;
            };
            let meaningful = window.iter().filter(|w| !STOPWORDS.contains(w)).count();
            if meaningful * 2 >= window.len() {
                phrases.push(window.join(" "));
            }
        }
    }

    phrases
}

/// Fraction of key phrases found verbatim in the (lower-cased) source.
pub fn phrase_support(text: &str, source_lower: &str) -> f32 {
    let phrases = key_phrases(text);
    if phrases.is_empty() {
        return 0.0;
    }
    let found = phrases.iter().filter(|p| source_lower.contains(p.as_str())).count();
    found as f32 / phrases.len() as f32
}

fn semantic_support(item: &[f32], segments: &[Vec<f32>]) -> f32 {
    segments
        .iter()
        .map(|s| cosine_similarity(item, s))
        .fold(0.0, f32::max)
}

fn has_owner(text: &str) -> bool {
    NAME.is_match(text) || OWNER_PRONOUN.is_match(text)
}

pub fn is_recognized_due_date(due_date: &str) -> bool {
    DUE_DATE_FORMATS.iter().any(|re| re.is_match(due_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::candidate::{DecisionCategory, ExtractionMethod, Priority};
    use crate::types::segment::segments_from_pairs;

    fn source() -> Vec<Segment> {
        segments_from_pairs([
            ("Sarah", "We decided to move the launch to October 29th."),
            ("Marcus", "I will send the revised schedule to the vendor."),
        ])
    }

    #[test]
    fn test_unsupported_text_is_invalid() {
        let segments = segments_from_pairs([
            ("Ana", "Budget review is pending approval."),
            ("Ben", "Quarterly numbers look fine."),
        ]);
        let verdict = validate("We will launch on Mars next year", &segments, ItemKind::Decision);

        assert_eq!(verdict.source_support, 0.0);
        assert!(!verdict.is_valid);
        assert!(verdict.is_potential_hallucination());
    }

    #[test]
    fn test_supported_decision_is_valid() {
        let segments = source();
        let verdict = validate("decided to move the launch", &segments, ItemKind::Decision);

        assert_eq!(verdict.source_support, 1.0);
        assert_eq!(verdict.word_overlap, 1.0);
        assert!(verdict.is_valid);
        assert!(verdict.issues.is_empty());
    }

    #[test]
    fn test_contradiction_is_high_severity() {
        let segments = segments_from_pairs([("Ana", "we will ship but we won't ship the beta")]);
        let verdict = validate("we will ship but we won't ship the beta", &segments, ItemKind::Risk);

        assert!(verdict.source_support > 0.3);
        assert!(verdict.has_issue(IssueKind::Contradiction));
        assert!(!verdict.is_valid);
    }

    #[test]
    fn test_type_and_completeness_issues() {
        let segments = source();
        let verdict = validate("launch moved and", &segments, ItemKind::Decision);
        assert!(verdict.has_issue(IssueKind::UnclearDecision));
        assert!(verdict.has_issue(IssueKind::Truncated));

        let verdict = validate("vendor stuff", &segments, ItemKind::Action);
        assert!(verdict.has_issue(IssueKind::UnclearAction));
        assert!(verdict.has_issue(IssueKind::TooShort));

        let verdict = validate("will send the schedule", &segments, ItemKind::Action);
        assert!(verdict.has_issue(IssueKind::MissingOwner));
        let missing = verdict
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::MissingOwner)
            .unwrap();
        assert_eq!(missing.severity, Severity::Low);
    }

    #[test]
    fn test_semantic_support_uses_best_segment() {
        let segments = source();
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let validator = Validator::new(&segments).with_segment_embeddings(Some(embeddings.as_slice()));

        let verdict = validator.validate("entirely new words here", ItemKind::Risk, Some(&[0.0, 1.0][..]));
        assert!((verdict.source_support - 1.0).abs() < 1e-6);
        assert!(verdict.is_valid);
    }

    #[test]
    fn test_key_phrases_skip_stopword_runs() {
        let phrases = key_phrases("to the launch");
        assert!(!phrases.contains(&"to the".to_string()));
        assert!(phrases.contains(&"the launch".to_string()));
        assert!(!phrases.contains(&"to the launch".to_string()));
    }

    #[test]
    fn test_item_details() {
        let segments = source();
        let validator = Validator::new(&segments);

        let decision = CandidateItem::decision(
            "decided to move the launch",
            None,
            vec!["Sara".to_string(), "Marcus".to_string(), "Zed".to_string()],
            DecisionCategory::Timeline,
            0.85,
            ExtractionMethod::Pattern,
        );
        let verdict = validator.validate_item(&decision, None);
        let checks = &verdict.details.participants;
        assert_eq!(checks.len(), 3);
        assert_eq!(checks[0].close_match.as_deref(), Some("Sarah"));
        assert!(checks[1].found_as_speaker);
        assert!(!checks[2].is_found());
        assert_eq!(checks[2].close_match, None);

        let action = CandidateItem::action(
            "send the revised schedule",
            "Marcus".to_string(),
            Some("next week".to_string()),
            Priority::Medium,
            0.85,
            ExtractionMethod::Pattern,
        );
        let verdict = validator.validate_item(&action, None);
        assert!(verdict.details.owner.as_ref().unwrap().found_as_speaker);
        assert_eq!(verdict.details.due_date_recognized, Some(true));
        assert!(verdict.is_valid);
    }

    #[test]
    fn test_quantities_missing_from_source_are_flagged() {
        let segments = source();
        let validator = Validator::new(&segments);

        let decision = CandidateItem::decision(
            "decided to move the launch to October 29th",
            None,
            vec!["Sarah".to_string()],
            DecisionCategory::Timeline,
            0.85,
            ExtractionMethod::Generated,
        )
        .with_quantitative(QuantitativeData {
            dates: vec!["October 29th".to_string()],
            numbers: vec!["40".to_string()],
            changes: vec![],
        });

        let verdict = validator.validate_item(&decision, None);
        let check = verdict.details.quantities.as_ref().unwrap();
        assert_eq!(check.validated, vec!["October 29th"]);
        assert_eq!(check.unsupported, vec!["40"]);
        assert!(verdict.has_issue(IssueKind::UnsupportedQuantity));
        assert!(verdict.is_valid);
    }

    #[test]
    fn test_quantities_found_in_source_raise_no_issue() {
        let segments = source();
        let decision = CandidateItem::decision(
            "decided to move the launch to October 29th",
            None,
            vec![],
            DecisionCategory::Timeline,
            0.85,
            ExtractionMethod::Pattern,
        )
        .with_quantitative(QuantitativeData {
            dates: vec!["October 29th".to_string()],
            ..Default::default()
        });

        let verdict = Validator::new(&segments).validate_item(&decision, None);
        assert!(verdict.details.quantities.as_ref().unwrap().is_supported());
        assert!(!verdict.has_issue(IssueKind::UnsupportedQuantity));
    }

    #[test]
    fn test_group_placeholder_is_not_name_checked() {
        let segments = source();
        let decision = CandidateItem::decision(
            "decided to move the launch",
            None,
            vec![GROUP_PARTICIPANTS.to_string()],
            DecisionCategory::Timeline,
            0.85,
            ExtractionMethod::Pattern,
        );
        let verdict = Validator::new(&segments).validate_item(&decision, None);
        assert!(verdict.details.participants.is_empty());
    }

    #[test]
    fn test_due_date_formats() {
        assert!(is_recognized_due_date("2024-10-29"));
        assert!(is_recognized_due_date("Friday"));
        assert!(is_recognized_due_date("end of day tomorrow"));
        assert!(is_recognized_due_date("Oct 29"));
        assert!(!is_recognized_due_date("someday"));
    }
}
