//! Bounded, speaker-attributed context window for generation prompts.

use serde::{Deserialize, Serialize};

use crate::types::segment::Segment;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextWindow {
    /// "Speaker: text" lines joined by blank lines
    pub text: String,

    /// Leading segments that fit in the budget
    pub segments_included: usize,

    pub estimated_tokens: f32,
}

impl ContextWindow {
    /// Build the window from the start of the transcript.
    ///
    /// Segments are added in order until the next one would push the
    /// estimate (`words × tokens_per_word`) over `token_budget`; nothing
    /// after that point is included.
    pub fn build(segments: &[Segment], token_budget: usize, tokens_per_word: f32) -> Self {
        let budget = token_budget as f32;
        let mut parts = Vec::new();
        let mut tokens = 0.0f32;

        for segment in segments {
            let line = segment.attributed();
            let line_tokens = line.split_whitespace().count() as f32 * tokens_per_word;
            if tokens + line_tokens > budget {
                break;
            }
            tokens += line_tokens;
            parts.push(line);
        }

        Self {
            segments_included: parts.len(),
            text: parts.join("\n\n"),
            estimated_tokens: tokens,
        }
    }

    /// Whether some segments were cut off.
    pub fn is_truncated(&self, total_segments: usize) -> bool {
        self.segments_included < total_segments
    }
}
