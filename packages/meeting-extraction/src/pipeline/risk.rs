//! Risk extraction.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::pipeline::extractor::CandidateExtractor;
use crate::pipeline::quantitative::extract_quantitative;
use crate::pipeline::text::contains_any;
use crate::types::candidate::{CandidateItem, ExtractionMethod, ItemKind, RiskCategory};
use crate::types::config::ExtractionConfig;
use crate::types::segment::Segment;

/// A description must be longer than this to count.
pub const MIN_DESCRIPTION_CHARS: usize = 15;

const TRIGGERS: &[&str] = &[
    "risk",
    "concern",
    "worried",
    "issue",
    "problem",
    "blocker",
    "blocking",
    "challenge",
    "threat",
    "delay",
    "might not",
    "could fail",
    "won't have",
    "if we don't",
    "if we can't",
    "dependency",
    "constraint",
    "bottleneck",
    "vulnerability",
    "exposure",
    "gap",
    "shortfall",
    "deficit",
];

/// Words that make a whole segment usable as its own description.
const WHOLE_SEGMENT_WORDS: &[&str] = &["risk", "concern", "blocker", "issue"];

/// Ordered description patterns. Multi-group matches are joined.
static DESCRIPTIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:risk|concern|worried)\s+(?:is\s+)?(?:that\s+)?([^.!?]+)",
        r"(?i)(?:issue|problem|blocker)\s+(?:is\s+)?(?:with\s+)?([^.!?]+)",
        r"(?i)if\s+(?:we\s+)?(?:don't|can't)\s+([^,]+),\s*([^.!?]+)",
        r"(?i)(?:might|could)\s+(?:not\s+)?([^.!?]+)",
        r"(?i)(?:delay|constraint|bottleneck)\s+(?:in|with|on)\s+([^.!?]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SPEAKER_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\w+:\s*").unwrap());

static LEADING_CONNECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:that|is|with)\s+").unwrap());

const CATEGORY_KEYWORDS: &[(RiskCategory, &[&str])] = &[
    (
        RiskCategory::Timeline,
        &["delay", "deadline", "schedule", "timeline", "launch", "date", "week", "month"],
    ),
    (
        RiskCategory::Technical,
        &["integration", "performance", "bug", "system", "api", "technical", "data", "security"],
    ),
    (
        RiskCategory::Resource,
        &["budget", "staff", "person", "capacity", "resource", "team", "engineer", "support"],
    ),
    (
        RiskCategory::Regulatory,
        &["compliance", "legal", "audit", "regulation", "gdpr", "ccpa", "privacy"],
    ),
    (
        RiskCategory::Business,
        &["customer", "market", "competitor", "stakeholder", "revenue", "adoption"],
    ),
];

/// Category by keyword membership, checked in a fixed order.
pub fn categorize_risk(description: &str) -> RiskCategory {
    let lower = description.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(category, _)| *category)
        .unwrap_or_default()
}

fn clean(description: &str) -> String {
    LEADING_CONNECTIVE
        .replace(description.trim(), "")
        .trim()
        .trim_end_matches(['.', ','])
        .trim()
        .to_string()
}

/// Pull a risk description out of a segment's text.
pub fn extract_description(text: &str) -> Option<String> {
    for re in DESCRIPTIONS.iter() {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let joined = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().trim())
            .collect::<Vec<_>>()
            .join(" ");

        let description = clean(&joined);
        if description.chars().count() > MIN_DESCRIPTION_CHARS {
            return Some(description);
        }
    }

    if contains_any(&text.to_lowercase(), WHOLE_SEGMENT_WORDS) {
        let unprefixed = SPEAKER_PREFIX.replace(text, "");
        let whole = unprefixed.trim().trim_end_matches(['.', ',']).trim();
        let len = whole.chars().count();
        if len > 20 && len < 200 {
            return Some(whole.to_string());
        }
    }

    None
}

pub struct RiskExtractor {
    config: ExtractionConfig,
}

impl RiskExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }
}

impl CandidateExtractor for RiskExtractor {
    fn kind(&self) -> ItemKind {
        ItemKind::Risk
    }

    fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn extract_patterns(&self, segments: &[Segment]) -> Vec<CandidateItem> {
        let mut seen = HashSet::new();

        segments
            .iter()
            .filter(|s| contains_any(&s.text.to_lowercase(), TRIGGERS))
            .filter_map(|segment| {
                let description = extract_description(&segment.text)?;
                if !seen.insert(description.to_lowercase()) {
                    return None;
                }

                Some(
                    CandidateItem::risk(
                        &description,
                        categorize_risk(&description),
                        segment.speaker.clone(),
                        self.config.pattern_confidence,
                        ExtractionMethod::Pattern,
                    )
                    .with_segment(segment.index)
                    .with_quantitative(extract_quantitative(&description)),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::segment::segments_from_pairs;

    fn extract(pairs: &[(&str, &str)]) -> Vec<CandidateItem> {
        let segments = segments_from_pairs(pairs.iter().copied());
        RiskExtractor::new(ExtractionConfig::default()).extract_patterns(&segments)
    }

    #[test]
    fn test_risk_is_that_pattern() {
        let items = extract(&[(
            "Emily",
            "The risk is that the integration won't be ready before launch.",
        )]);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "the integration won't be ready before launch");
        assert_eq!(items[0].category(), "Timeline");
        assert_eq!(items[0].people(), vec!["Emily"]);
        assert_eq!(items[0].confidence, 0.85);
    }

    #[test]
    fn test_conditional_risk_joins_groups() {
        let description =
            extract_description("If we don't get legal sign-off, we miss the GDPR window.").unwrap();
        assert_eq!(description, "get legal sign-off we miss the GDPR window");
        assert_eq!(categorize_risk(&description), RiskCategory::Regulatory);
    }

    #[test]
    fn test_short_description_falls_back_to_whole_segment() {
        let description = extract_description("Budget is my main concern here.").unwrap();
        assert_eq!(description, "Budget is my main concern here");
    }

    #[test]
    fn test_whole_segment_fallback_drops_speaker_prefix() {
        let description = extract_description("Priya: Budget is my main concern here.").unwrap();
        assert_eq!(description, "Budget is my main concern here");
    }

    #[test]
    fn test_duplicates_and_non_risks_are_skipped() {
        let items = extract(&[
            ("Ana", "My concern is that the vendor contract expires soon."),
            ("Ben", "My concern is that the vendor contract expires soon."),
            ("Cal", "Lunch was great."),
        ]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category(), "Other");
    }

    #[test]
    fn test_categories() {
        assert_eq!(categorize_risk("api performance"), RiskCategory::Technical);
        assert_eq!(categorize_risk("not enough engineers"), RiskCategory::Resource);
        assert_eq!(categorize_risk("customers may churn"), RiskCategory::Business);
        assert_eq!(categorize_risk("weather"), RiskCategory::Other);
    }
}
