//! Dates, numbers and before/after changes mentioned in item text.

use regex::Regex;
use std::sync::LazyLock;

use crate::pipeline::text::contains_any;
use crate::types::candidate::{DecisionCategory, QuantitativeData};

static MONTH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}(?:st|nd|rd|th)?(?:,?\s+\d{4})?\b",
    )
    .unwrap()
});
static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\d{4}-\d{2}-\d{2}|\d{1,2}[-/]\d{1,2}[-/]\d{2,4})\b").unwrap());
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").unwrap());
static CHANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfrom\s+(.+?)\s+to\s+([^,.\n]+)").unwrap());
static ANY_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());
static METRIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\d+\s*(?:%|percent|users|features|weeks|days|hours|million|k\b)|\$\s*\d)").unwrap()
});

const CATEGORY_KEYWORDS: &[(DecisionCategory, &[&str])] = &[
    (DecisionCategory::Timeline, &["date", "deadline", "schedule", "delay", "postpone", "timeline"]),
    (DecisionCategory::Features, &["feature", "scope", "functionality", "requirement", "cut", "add"]),
    (DecisionCategory::Budget, &["budget", "cost", "money", "allocation", "$", "funding"]),
    (DecisionCategory::Security, &["security", "audit", "compliance", "risk"]),
    (DecisionCategory::Communication, &["meeting", "checkpoint", "report", "update", "standup"]),
    (DecisionCategory::Resources, &["team", "assign", "resource", "staff", "hire"]),
    (DecisionCategory::Process, &["process", "workflow", "procedure", "methodology"]),
];

/// Extract dates, numbers and "from X to Y" changes.
pub fn extract_quantitative(text: &str) -> QuantitativeData {
    let mut dates: Vec<String> = MONTH_DATE.find_iter(text).map(|m| m.as_str().to_string()).collect();
    dates.extend(NUMERIC_DATE.find_iter(text).map(|m| m.as_str().to_string()));

    let numbers = NUMBER.find_iter(text).map(|m| m.as_str().to_string()).collect();

    let changes = CHANGE
        .captures(text)
        .map(|caps| {
            vec![format!(
                "{} → {}",
                caps[1].trim(),
                caps[2].trim()
            )]
        })
        .unwrap_or_default();

    QuantitativeData {
        dates,
        numbers,
        changes,
    }
}

/// A date or any number appears in the text.
pub fn has_date_or_number(text: &str) -> bool {
    MONTH_DATE.is_match(text) || ANY_DIGIT.is_match(text)
}

/// A count or metric appears ("20%", "3 weeks", "$40k").
pub fn has_metric(text: &str) -> bool {
    METRIC.is_match(text)
}

/// An explicit before/after comparison ("from X to Y").
pub fn has_comparison(text: &str) -> bool {
    CHANGE.is_match(text)
}

/// Thematic category of a decision (first matching keyword set wins).
pub fn categorize_decision(text: &str) -> DecisionCategory {
    let lower = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(category, _)| *category)
        .unwrap_or_default()
}
