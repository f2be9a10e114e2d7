//! Decision extraction.

use regex::Regex;
use std::sync::LazyLock;

use crate::pipeline::extractor::CandidateExtractor;
use crate::pipeline::quantitative::{categorize_decision, extract_quantitative};
use crate::pipeline::text::contains_any;
use crate::types::candidate::{CandidateItem, ExtractionMethod, ItemKind};
use crate::types::config::ExtractionConfig;
use crate::types::segment::Segment;

/// Segments either side of a trigger included in its window.
pub const WINDOW_RADIUS: usize = 2;

/// Participant recorded when no speaker can be named.
pub const GROUP_PARTICIPANTS: &str = "Meeting participants";

const TRIGGERS: &[&str] = &[
    "decided",
    "decision",
    "agreed",
    "approved",
    "concluded",
    "finalized",
    "settled",
    "voted",
    "unanimously",
    "let's make",
    "we will",
    "we're going with",
    "push the",
    "change the",
    "move to",
];

/// Ordered clause patterns; the first match (whole match) is the decision.
static CLAUSES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:decided|agreed|approved|concluded|finalized|settled)\s+(?:to|that|on)\s+([^.!?]+)",
        r"(?i)(?:we|the team|everyone)\s+(?:will|are going to)\s+([^.!?]+)",
        r"(?i)(?:let's|we're)\s+(?:make|go with|going with|push|change|move)\s+([^.!?]+)",
        r"(?i)(?:push|change|move)\s+(?:the|our)\s+([^.!?]+)\s+(?:to|from)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static RATIONALE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:because|since|due to|given that|to provide|to ensure|to give)\s+([^.!?]+)").unwrap()
});

static GROUP_LANGUAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:we|team|everyone|unanimously|all)\b").unwrap());

pub struct DecisionExtractor {
    config: ExtractionConfig,
}

impl DecisionExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Trigger segment plus following segments by the same speaker.
    fn decision_text(trigger: &Segment, window: &[Segment]) -> String {
        let mut text = trigger.text.trim().to_string();
        for next in window.iter().filter(|s| s.index > trigger.index) {
            if trigger.speaker.is_none() || next.speaker != trigger.speaker {
                break;
            }
            text.push(' ');
            text.push_str(next.text.trim());
        }
        text
    }

    fn core_clause(text: &str) -> String {
        CLAUSES
            .iter()
            .find_map(|re| re.find(text))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| text.trim().to_string())
    }

    fn participants(&self, trigger: &Segment, window: &[Segment], text: &str) -> Vec<String> {
        let mut participants: Vec<String> = trigger.speaker.iter().cloned().collect();

        if GROUP_LANGUAGE.is_match(text) {
            for speaker in window.iter().filter_map(|s| s.speaker.as_ref()) {
                if !participants.contains(speaker) {
                    participants.push(speaker.clone());
                }
            }
        }

        participants.truncate(self.config.max_participants);
        if participants.is_empty() {
            participants.push(GROUP_PARTICIPANTS.to_string());
        }
        participants
    }

    fn decision_at(&self, segments: &[Segment], position: usize) -> Option<CandidateItem> {
        let trigger = &segments[position];
        let start = position.saturating_sub(WINDOW_RADIUS);
        let end = (position + WINDOW_RADIUS + 1).min(segments.len());
        let window = &segments[start..end];

        let text = Self::decision_text(trigger, window);
        let clause = Self::core_clause(&text);
        if clause.is_empty() {
            return None;
        }

        let rationale = RATIONALE
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|r| !r.is_empty());

        Some(
            CandidateItem::decision(
                &clause,
                rationale,
                self.participants(trigger, window, &text),
                categorize_decision(&clause),
                self.config.pattern_confidence,
                ExtractionMethod::Pattern,
            )
            .with_segment(trigger.index)
            .with_quantitative(extract_quantitative(&clause)),
        )
    }
}

impl CandidateExtractor for DecisionExtractor {
    fn kind(&self) -> ItemKind {
        ItemKind::Decision
    }

    fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn extract_patterns(&self, segments: &[Segment]) -> Vec<CandidateItem> {
        segments
            .iter()
            .enumerate()
            .filter(|(_, s)| contains_any(&s.text.to_lowercase(), TRIGGERS))
            .filter_map(|(position, _)| self.decision_at(segments, position))
            .collect()
    }
}
