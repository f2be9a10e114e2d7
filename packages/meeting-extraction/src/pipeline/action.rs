//! Action item extraction.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::pipeline::extractor::CandidateExtractor;
use crate::pipeline::generation::UNCLEAR_OWNER;
use crate::pipeline::quantitative::extract_quantitative;
use crate::pipeline::text::{clean_person_name, contains_any, is_pronoun};
use crate::types::candidate::{CandidateItem, ExtractionMethod, ItemKind, Priority};
use crate::types::config::ExtractionConfig;
use crate::types::segment::Segment;

/// Shortest action text accepted from a pattern match.
pub const MIN_ACTION_CHARS: usize = 10;

/// Shape of the sentence an action was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTemplate {
    /// "Sarah, can you ..."
    DirectRequest,
    /// "Marcus will ..."
    Will,
    /// "I'll ..."
    FirstPerson,
    /// "let's have Priya ..."
    Delegation,
    /// "Priya - ..."
    Dash,
    /// "assigned to Priya: ..."
    AssignedTo,
}

/// Ordered templates; the first valid match in a segment wins.
static TEMPLATES: LazyLock<Vec<(ActionTemplate, Regex)>> = LazyLock::new(|| {
    [
        (
            ActionTemplate::DirectRequest,
            r"(?i)([A-Za-z]+),?\s+(?:can you|could you|please|will you)\s+([^.!?]+)",
        ),
        (
            ActionTemplate::Will,
            r"(?i)([A-Za-z]+)\s+(?:will|is going to|needs to|should|must)\s+([^.!?]+)",
        ),
        (ActionTemplate::FirstPerson, r"(?i)(?:I'll|I will|I'm going to)\s+([^.!?]+)"),
        (
            ActionTemplate::Delegation,
            r"(?i)(?:let's have|ask|get)\s+([A-Za-z]+)\s+(?:to\s+)?([^.!?]+)",
        ),
        (ActionTemplate::Dash, r"(?i)([A-Za-z]+)\s*[-–]\s*([^.!?]+)"),
        (ActionTemplate::AssignedTo, r"(?i)assigned to\s+([A-Za-z]+):\s*([^.!?]+)"),
    ]
    .into_iter()
    .map(|(template, p)| (template, Regex::new(p).unwrap()))
    .collect()
});

/// Ordered due-date patterns. A fixed label replaces the capture when set.
static DUE_DATES: LazyLock<Vec<(Regex, Option<&'static str>)>> = LazyLock::new(|| {
    [
        (r"(?i)by\s+(end of day|EOD)\s+tomorrow", Some("end of day tomorrow")),
        (r"(?i)by\s+([A-Za-z]+day)\b", None),
        (r"(?i)by\s+(next week|this week|tomorrow|today)", None),
        (r"(?i)by\s+([A-Za-z]+\s+\d{1,2}(?:st|nd|rd|th)?)", None),
        (r"(?i)(?:within|in)\s+(\d+\s+(?:days?|weeks?))", None),
        (r"(?i)(?:deadline|due):\s*([^.!?,]+)", None),
    ]
    .into_iter()
    .map(|(p, label)| (Regex::new(p).unwrap(), label))
    .collect()
});

const HIGH_PRIORITY: &[&str] = &[
    "urgent",
    "critical",
    "asap",
    "immediately",
    "priority",
    "important",
    "blocker",
    "blocking",
    "must",
];
const LOW_PRIORITY: &[&str] = &["when possible", "nice to have", "optional", "low priority"];

const FIRST_PERSON: &[&str] = &["i", "i'll", "i'm", "i've", "me", "myself"];

/// Words the owner capture picks up that never name a person.
const NON_PERSON: &[&str] = &[
    "it", "that", "this", "there", "what", "which", "who", "everything", "nothing", "and", "but",
    "so", "then", "also",
];

/// First due-date expression in the text.
pub fn extract_due_date(text: &str) -> Option<String> {
    DUE_DATES.iter().find_map(|(re, label)| {
        re.captures(text).map(|caps| match label {
            Some(label) => label.to_string(),
            None => caps[1].trim().to_string(),
        })
    })
}

/// Priority from urgency vocabulary (default medium).
///
/// Any urgency keyword wins over low-priority phrasing.
pub fn determine_priority(text: &str) -> Priority {
    let lower = text.to_lowercase();
    if contains_any(&lower, HIGH_PRIORITY) {
        Priority::High
    } else if contains_any(&lower, LOW_PRIORITY) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

/// Resolve a captured owner against the segment speaker.
///
/// First-person pronouns become the speaker; other pronouns are unclear.
pub fn resolve_owner(owner: Option<&str>, speaker: Option<&str>) -> String {
    let speaker_name = || {
        speaker
            .and_then(clean_person_name)
            .unwrap_or_else(|| UNCLEAR_OWNER.to_string())
    };

    match owner.map(str::trim).filter(|o| !o.is_empty()) {
        None => speaker_name(),
        Some(o) if FIRST_PERSON.contains(&o.to_lowercase().as_str()) => speaker_name(),
        Some(o) if is_pronoun(o) => UNCLEAR_OWNER.to_string(),
        Some(o) => clean_person_name(o).unwrap_or_else(|| UNCLEAR_OWNER.to_string()),
    }
}

pub struct ActionExtractor {
    config: ExtractionConfig,
}

impl ActionExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// `(owner capture, action text)` for the first valid template match.
    fn first_match<'t>(text: &'t str, seen: &HashSet<String>) -> Option<(Option<&'t str>, String)> {
        for (template, re) in TEMPLATES.iter() {
            for caps in re.captures_iter(text) {
                let (owner, action) = match template {
                    ActionTemplate::FirstPerson => (None, caps.get(1)),
                    _ => (caps.get(1).map(|m| m.as_str()), caps.get(2)),
                };

                if owner.is_some_and(|o| NON_PERSON.contains(&o.to_lowercase().as_str())) {
                    continue;
                }

                let Some(action) = action else { continue };
                let action = action
                    .as_str()
                    .trim()
                    .trim_end_matches(['.', ','])
                    .trim()
                    .to_string();

                if action.chars().count() < MIN_ACTION_CHARS || seen.contains(&action.to_lowercase()) {
                    continue;
                }
                return Some((owner, action));
            }
        }
        None
    }
}

impl CandidateExtractor for ActionExtractor {
    fn kind(&self) -> ItemKind {
        ItemKind::Action
    }

    fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn extract_patterns(&self, segments: &[Segment]) -> Vec<CandidateItem> {
        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for segment in segments {
            let Some((owner, action)) = Self::first_match(&segment.text, &seen) else {
                continue;
            };
            seen.insert(action.to_lowercase());

            let owner = resolve_owner(owner, segment.speaker.as_deref());
            let item = CandidateItem::action(
                &action,
                owner,
                extract_due_date(&segment.text),
                determine_priority(&segment.text),
                self.config.pattern_confidence,
                ExtractionMethod::Pattern,
            )
            .with_segment(segment.index)
            .with_quantitative(extract_quantitative(&action));
            items.push(item);
        }

        items
    }
}
