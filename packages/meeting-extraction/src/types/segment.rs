//! Source utterances and the intent tags derived from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A single utterance from the transcript.
///
/// Segments are immutable once created and their order is significant:
/// `index` is the position in the transcript and is what provenance
/// records point back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the transcript (0-based)
    pub index: usize,

    /// What was said
    pub text: String,

    /// Who said it, if diarization or the transcript format provides it
    #[serde(default)]
    pub speaker: Option<String>,

    /// Timestamp as it appeared in the source (e.g. "00:12:31")
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl Segment {
    /// Create a new segment.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            speaker: None,
            timestamp: None,
        }
    }

    /// Set the speaker.
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    /// Set the timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Speaker-attributed rendering used in prompts ("Speaker: text").
    pub fn attributed(&self) -> String {
        format!("{}: {}", self.speaker.as_deref().unwrap_or("Speaker"), self.text)
    }
}

/// Build an ordered segment list from `(speaker, text)` pairs.
pub fn segments_from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<Segment> {
    pairs
        .into_iter()
        .enumerate()
        .map(|(i, (speaker, text))| Segment::new(i, text).with_speaker(speaker))
        .collect()
}

/// Semantic intent of a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Decision,
    Action,
    Risk,
    Discussion,
}

impl Intent {
    /// All intents, in classifier precedence order.
    pub const ALL: [Intent; 4] = [
        Intent::Decision,
        Intent::Action,
        Intent::Risk,
        Intent::Discussion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Decision => "decision",
            Intent::Action => "action",
            Intent::Risk => "risk",
            Intent::Discussion => "discussion",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intent labels for one sentence of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentTag {
    /// The sentence text
    pub sentence: String,

    /// Index of the segment the sentence came from
    pub segment_index: usize,

    pub speaker: Option<String>,

    pub timestamp: Option<String>,

    /// Never empty; defaults to `{Discussion}`
    pub intents: BTreeSet<Intent>,

    /// Classification confidence (0.0 to 1.0)
    pub confidence: f32,
}

impl IntentTag {
    /// Create a tag for a sentence of `segment`.
    ///
    /// An empty intent set is replaced with `{Discussion}`.
    pub fn new(
        sentence: impl Into<String>,
        segment: &Segment,
        intents: impl IntoIterator<Item = Intent>,
        confidence: f32,
    ) -> Self {
        let mut intents: BTreeSet<Intent> = intents.into_iter().collect();
        if intents.is_empty() {
            intents.insert(Intent::Discussion);
        }

        Self {
            sentence: sentence.into(),
            segment_index: segment.index,
            speaker: segment.speaker.clone(),
            timestamp: segment.timestamp.clone(),
            intents,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Whether this sentence carries the given intent.
    pub fn has(&self, intent: Intent) -> bool {
        self.intents.contains(&intent)
    }
}
