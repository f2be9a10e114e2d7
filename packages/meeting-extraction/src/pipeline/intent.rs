//! Sentence-level intent classification.
//!
//! With an embedding collaborator, each sentence is compared against one
//! centroid per intent (the mean embedding of a small curated example
//! set). Without one, or when a sentence's embedding call fails, a fixed
//! keyword rule decides.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::pipeline::text::contains_any;
use crate::traits::collaborators::Collaborators;
use crate::traits::embedder::{cosine_similarity, mean_vector};
use crate::types::segment::{Intent, IntentTag, Segment};

/// Sentences shorter than this (in characters) are not classified.
pub const MIN_SENTENCE_CHARS: usize = 10;

/// Centroid similarity an intent must exceed to be attached.
pub const CENTROID_THRESHOLD: f32 = 0.6;

/// Confidence of a keyword-rule hit.
pub const KEYWORD_CONFIDENCE: f32 = 0.6;

/// Confidence of the `{discussion}` default.
pub const DEFAULT_CONFIDENCE: f32 = 0.4;

static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+\s+").unwrap());

const DECISION_KEYWORDS: &[&str] = &["decided", "agreed", "approved", "concluded", "finalized", "settled"];
const ACTION_KEYWORDS: &[&str] = &["will", "should", "need to", "assigned", "responsible", "handle", "complete"];
const RISK_KEYWORDS: &[&str] = &["risk", "concern", "issue", "problem", "blocker", "challenge", "threat"];

fn examples(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Decision => &[
            "we decided to go ahead with the plan",
            "everyone agreed to move forward",
            "the proposal was approved by the team",
            "we concluded that this is the right call",
            "it has been decided that",
            "we finalized the approach",
            "we settled on the second option",
        ],
        Intent::Action => &[
            "maria will handle the deployment",
            "i will send the report by friday",
            "we need to finish the review",
            "tom is responsible for the dashboard",
            "the team will follow up next week",
            "i'll take care of the documentation",
        ],
        Intent::Risk => &[
            "there is a risk the release slips",
            "we are concerned about the timeline",
            "this could turn into a blocker",
            "there is an issue with the data feed",
            "we have a problem with the integration",
            "this is going to be a challenge",
            "this might block us",
        ],
        Intent::Discussion => &[
            "what do you think about this",
            "let's talk through the options",
            "i have a question about the budget",
            "maybe we should consider another vendor",
            "what are your thoughts",
            "how about we try something else",
        ],
    }
}

/// Split text into sentences on terminal punctuation followed by space.
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Keyword rule: first matching vocabulary wins (decision > action > risk).
pub fn keyword_intent(sentence: &str) -> Option<Intent> {
    let lower = sentence.to_lowercase();
    if contains_any(&lower, DECISION_KEYWORDS) {
        Some(Intent::Decision)
    } else if contains_any(&lower, ACTION_KEYWORDS) {
        Some(Intent::Action)
    } else if contains_any(&lower, RISK_KEYWORDS) {
        Some(Intent::Risk)
    } else {
        None
    }
}

/// Labels sentences with decision/action/risk/discussion intents.
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    centroids: Option<Vec<(Intent, Vec<f32>)>>,
}

impl IntentClassifier {
    /// A classifier that only uses the keyword rule.
    pub fn keyword_only() -> Self {
        Self { centroids: None }
    }

    /// Build the classifier, precomputing intent centroids when an
    /// embedding collaborator is available.
    ///
    /// If the centroids cannot be computed the classifier falls back to
    /// keyword-only mode for its whole lifetime.
    pub async fn build(collaborators: &Collaborators) -> Self {
        if !collaborators.has_embedder() {
            return Self::keyword_only();
        }

        let mut centroids = Vec::with_capacity(Intent::ALL.len());
        for intent in Intent::ALL {
            let texts: Vec<String> = examples(intent).iter().map(|s| s.to_string()).collect();
            let centroid = match collaborators.embed(&texts).await {
                Ok(vectors) => mean_vector(&vectors),
                Err(e) => {
                    warn!(intent = %intent, error = %e, "Failed to build intent centroid, using keyword rule");
                    return Self::keyword_only();
                }
            };
            match centroid {
                Some(c) => centroids.push((intent, c)),
                None => {
                    warn!(intent = %intent, "Inconsistent example embeddings, using keyword rule");
                    return Self::keyword_only();
                }
            }
        }

        debug!(centroids = centroids.len(), "Built intent centroids");
        Self {
            centroids: Some(centroids),
        }
    }

    /// Whether centroids are available.
    pub fn is_semantic(&self) -> bool {
        self.centroids.is_some()
    }

    /// Tag every sentence of every segment, in transcript order.
    pub async fn classify(&self, segments: &[Segment], collaborators: &Collaborators) -> Vec<IntentTag> {
        let mut tags = Vec::new();

        for segment in segments {
            for sentence in split_sentences(&segment.text) {
                if sentence.chars().count() < MIN_SENTENCE_CHARS {
                    continue;
                }

                let tag = match &self.centroids {
                    Some(centroids) => {
                        self.classify_semantic(sentence, segment, centroids, collaborators)
                            .await
                    }
                    None => Self::classify_keyword(sentence, segment),
                };
                tags.push(tag);
            }
        }

        debug!(
            segments = segments.len(),
            sentences = tags.len(),
            semantic = self.is_semantic(),
            "Classified sentence intents"
        );
        tags
    }

    fn classify_keyword(sentence: &str, segment: &Segment) -> IntentTag {
        match keyword_intent(sentence) {
            Some(intent) => IntentTag::new(sentence, segment, [intent], KEYWORD_CONFIDENCE),
            None => IntentTag::new(sentence, segment, [Intent::Discussion], DEFAULT_CONFIDENCE),
        }
    }

    async fn classify_semantic(
        &self,
        sentence: &str,
        segment: &Segment,
        centroids: &[(Intent, Vec<f32>)],
        collaborators: &Collaborators,
    ) -> IntentTag {
        let embedding = match collaborators.embed_one(sentence).await {
            Ok(e) => e,
            Err(e) => {
                warn!(
                    segment = segment.index,
                    error = %e,
                    "Sentence embedding failed, using keyword rule"
                );
                return Self::classify_keyword(sentence, segment);
            }
        };

        let scores: Vec<(Intent, f32)> = centroids
            .iter()
            .map(|(intent, centroid)| (*intent, cosine_similarity(&embedding, centroid)))
            .collect();
        let best = scores.iter().map(|(_, sim)| *sim).fold(f32::MIN, f32::max);

        let mut intents: Vec<Intent> = scores
            .iter()
            .filter(|(_, sim)| *sim > CENTROID_THRESHOLD)
            .map(|(intent, _)| *intent)
            .collect();
        if intents.is_empty() {
            intents.extend(keyword_intent(sentence));
        }

        // Best similarity over every centroid, unless only discussion remains.
        let confidence = if intents.iter().all(|i| *i == Intent::Discussion) {
            DEFAULT_CONFIDENCE
        } else {
            best
        };
        IntentTag::new(sentence, segment, intents, confidence)
    }
}
