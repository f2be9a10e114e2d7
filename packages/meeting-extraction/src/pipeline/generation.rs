//! The generative extraction path and its tagged outcome.
//!
//! A generation call never raises past the extractor: its result is
//! classified into a [`GenerationOutcome`] and the extractor branches on it.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{CollaboratorError, ExtractionError, Result};
use crate::pipeline::quantitative::{categorize_decision, extract_quantitative};
use crate::pipeline::text::clean_person_name;
use crate::traits::collaborators::Collaborators;
use crate::types::candidate::{CandidateItem, ExtractionMethod, ItemKind, Priority, RiskCategory};

/// Confidence assumed when the generator omits one.
pub const DEFAULT_GENERATED_CONFIDENCE: f32 = 0.8;

/// Owner recorded when no owner can be identified.
pub const UNCLEAR_OWNER: &str = "Unclear";

/// Result of one structured-generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome<T> {
    /// The response parsed against the schema
    Parsed(T),
    /// No generation collaborator is configured
    Unavailable,
    /// The collaborator errored or timed out
    Failed(String),
    /// The response did not match the schema
    Malformed(String),
}

impl<T> GenerationOutcome<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, GenerationOutcome::Parsed(_))
    }

    /// Short label for logs and run metadata.
    pub fn label(&self) -> &'static str {
        match self {
            GenerationOutcome::Parsed(_) => "parsed",
            GenerationOutcome::Unavailable => "unavailable",
            GenerationOutcome::Failed(_) => "failed",
            GenerationOutcome::Malformed(_) => "malformed",
        }
    }

    /// Why the generative path was not usable, if it was not.
    pub fn reason(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Failed(r) | GenerationOutcome::Malformed(r) => Some(r),
            GenerationOutcome::Unavailable => Some("no generation collaborator"),
            GenerationOutcome::Parsed(_) => None,
        }
    }
}

/// Call the generator with `prompt` and parse the response for `kind`.
pub async fn generate_candidates(
    kind: ItemKind,
    prompt: &str,
    collaborators: &Collaborators,
) -> GenerationOutcome<Vec<CandidateItem>> {
    if !collaborators.has_generator() {
        return GenerationOutcome::Unavailable;
    }

    let value = match collaborators.generate(prompt).await {
        Ok(v) => v,
        Err(CollaboratorError::Unavailable { .. }) => return GenerationOutcome::Unavailable,
        Err(e) => return GenerationOutcome::Failed(e.to_string()),
    };

    match parse_generated(kind, &value) {
        Ok(items) => GenerationOutcome::Parsed(items),
        Err(e) => GenerationOutcome::Malformed(e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedDecision {
    decision: Option<String>,
    rationale: Option<String>,
    #[serde(default)]
    participants: Vec<String>,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GeneratedAction {
    action: Option<String>,
    owner: Option<String>,
    due_date: Option<String>,
    priority: Option<String>,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GeneratedRisk {
    risk: Option<String>,
    category: Option<String>,
    mentioned_by: Option<String>,
    confidence: Option<f32>,
}

/// Parse a generator response for `kind`.
///
/// The response must be an object (or a string holding one) with the
/// kind's top-level array. Individual items that don't fit the schema or
/// lack their text are skipped.
pub fn parse_generated(kind: ItemKind, value: &Value) -> Result<Vec<CandidateItem>> {
    let owned;
    let value = match value {
        Value::String(s) => {
            owned = serde_json::from_str::<Value>(s.trim())?;
            &owned
        }
        other => other,
    };

    let key = kind.component();
    let items = value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractionError::MalformedResponse {
            kind,
            reason: format!("missing `{}` array", key),
        })?;

    let mut candidates = Vec::with_capacity(items.len());
    for item in items {
        let candidate = match kind {
            ItemKind::Decision => serde_json::from_value::<GeneratedDecision>(item.clone())
                .ok()
                .and_then(sanitize_decision),
            ItemKind::Action => serde_json::from_value::<GeneratedAction>(item.clone())
                .ok()
                .and_then(sanitize_action),
            ItemKind::Risk => serde_json::from_value::<GeneratedRisk>(item.clone())
                .ok()
                .and_then(sanitize_risk),
        };
        match candidate {
            Some(c) => candidates.push(c),
            None => debug!(kind = %kind, "Skipping generated item that does not fit the schema"),
        }
    }

    Ok(candidates)
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| {
        !t.is_empty() && !matches!(t.to_lowercase().as_str(), "null" | "none" | "n/a")
    })
}

fn confidence(value: Option<f32>) -> f32 {
    value
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_GENERATED_CONFIDENCE)
        .clamp(0.0, 1.0)
}

fn sanitize_decision(raw: GeneratedDecision) -> Option<CandidateItem> {
    let text = non_empty(raw.decision)?;
    let mut participants: Vec<String> = Vec::new();
    for name in raw.participants.iter().filter_map(|p| clean_person_name(p)) {
        if !participants.contains(&name) {
            participants.push(name);
        }
    }

    Some(
        CandidateItem::decision(
            &text,
            non_empty(raw.rationale),
            participants,
            categorize_decision(&text),
            confidence(raw.confidence),
            ExtractionMethod::Generated,
        )
        .with_quantitative(extract_quantitative(&text)),
    )
}

fn sanitize_action(raw: GeneratedAction) -> Option<CandidateItem> {
    let text = non_empty(raw.action)?;
    let owner = raw
        .owner
        .as_deref()
        .and_then(clean_person_name)
        .unwrap_or_else(|| UNCLEAR_OWNER.to_string());
    let priority = raw
        .priority
        .as_deref()
        .map(Priority::parse_lenient)
        .unwrap_or_default();

    Some(
        CandidateItem::action(
            &text,
            owner,
            non_empty(raw.due_date),
            priority,
            confidence(raw.confidence),
            ExtractionMethod::Generated,
        )
        .with_quantitative(extract_quantitative(&text)),
    )
}

fn sanitize_risk(raw: GeneratedRisk) -> Option<CandidateItem> {
    let text = non_empty(raw.risk)?;
    let category = raw
        .category
        .as_deref()
        .map(RiskCategory::parse_lenient)
        .unwrap_or_default();

    Some(
        CandidateItem::risk(
            &text,
            category,
            raw.mentioned_by.as_deref().and_then(clean_person_name),
            confidence(raw.confidence),
            ExtractionMethod::Generated,
        )
        .with_quantitative(extract_quantitative(&text)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGenerator;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_parse_decisions_with_defaults() {
        let value = json!({"decisions": [
            {"decision": "Move the launch to October 29th", "participants": ["dr. david", "I"], "rationale": "null"},
            {"rationale": "no text, dropped"},
            {"decision": "Cut custom branding", "confidence": 1.4}
        ]});

        let items = parse_generated(ItemKind::Decision, &value).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].confidence, DEFAULT_GENERATED_CONFIDENCE);
        assert_eq!(items[0].people(), vec!["David"]);
        assert_eq!(items[0].rationale(), None);
        assert_eq!(items[0].quantitative.dates, vec!["October 29th"]);
        assert_eq!(items[1].confidence, 1.0);
        assert!(items.iter().all(|i| i.method == ExtractionMethod::Generated));
    }

    #[test]
    fn test_parse_actions_normalizes_owner_and_priority() {
        let value = json!({"action_items": [
            {"action": "Send the deck", "owner": "I", "priority": "URGENT"},
            {"action": "Review the API", "owner": "marcus", "priority": "high", "due_date": "Friday"}
        ]});

        let items = parse_generated(ItemKind::Action, &value).unwrap();
        assert_eq!(items[0].owner(), Some(UNCLEAR_OWNER));
        assert_eq!(items[0].category(), "medium");
        assert_eq!(items[1].owner(), Some("Marcus"));
        assert_eq!(items[1].category(), "high");
        assert_eq!(items[1].due_date(), Some("Friday"));
    }

    #[test]
    fn test_parse_accepts_json_string() {
        let value = Value::String(r#"{"risks": [{"risk": "Vendor may slip", "category": "business"}]}"#.into());
        let items = parse_generated(ItemKind::Risk, &value).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category(), "Business");
    }

    #[test]
    fn test_missing_top_level_key_is_malformed() {
        let err = parse_generated(ItemKind::Risk, &json!({"decisions": []})).unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse { kind: ItemKind::Risk, .. }));

        let err = parse_generated(ItemKind::Risk, &Value::String("not json".into())).unwrap_err();
        assert!(matches!(err, ExtractionError::JsonParse(_)));
    }

    #[tokio::test]
    async fn test_outcomes() {
        let outcome = generate_candidates(ItemKind::Decision, "prompt", &Collaborators::none()).await;
        assert_eq!(outcome, GenerationOutcome::Unavailable);

        let generator = MockGenerator::new()
            .with_rule("good", json!({"decisions": [{"decision": "Ship it"}]}))
            .with_rule("bad", json!({"unexpected": true}));
        let collaborators = Collaborators::none().with_generator(Arc::new(generator));

        let outcome = generate_candidates(ItemKind::Decision, "good", &collaborators).await;
        assert!(outcome.is_parsed());

        let outcome = generate_candidates(ItemKind::Decision, "bad", &collaborators).await;
        assert_eq!(outcome.label(), "malformed");

        let outcome = generate_candidates(ItemKind::Decision, "unscripted", &collaborators).await;
        assert_eq!(outcome.label(), "failed");
        assert!(outcome.reason().is_some());
    }
}
