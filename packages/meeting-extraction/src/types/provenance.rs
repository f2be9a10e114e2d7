//! Provenance records linking candidates back to source segments.

use serde::{Deserialize, Serialize};

/// Maximum number of supporting segments kept per record.
pub const MAX_PROVENANCE_ENTRIES: usize = 3;

/// How supporting segments were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvenanceMethod {
    /// Cosine similarity over collaborator embeddings
    Semantic,
    /// Jaccard overlap over lower-cased tokens
    Keyword,
}

/// Source segments supporting an extracted item.
///
/// `source_segment_indices`, `source_text` and `similarity_scores` are
/// parallel arrays of at most [`MAX_PROVENANCE_ENTRIES`] entries, sorted by
/// descending similarity. Construct through [`ProvenanceRecord::from_matches`]
/// to keep that invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub source_segment_indices: Vec<usize>,
    pub source_text: Vec<String>,
    pub similarity_scores: Vec<f32>,
    pub method: ProvenanceMethod,
}

impl ProvenanceRecord {
    /// An empty record (no supporting segments found).
    pub fn empty(method: ProvenanceMethod) -> Self {
        Self {
            source_segment_indices: Vec::new(),
            source_text: Vec::new(),
            similarity_scores: Vec::new(),
            method,
        }
    }

    /// Build a record from unsorted `(index, text, similarity)` matches.
    ///
    /// Sorts descending (ties by segment order), truncates to the entry
    /// limit and clamps scores to [0, 1].
    pub fn from_matches(mut matches: Vec<(usize, String, f32)>, method: ProvenanceMethod) -> Self {
        matches.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        matches.truncate(MAX_PROVENANCE_ENTRIES);

        let mut record = Self::empty(method);
        for (index, text, score) in matches {
            record.source_segment_indices.push(index);
            record.source_text.push(text);
            record.similarity_scores.push(score.clamp(0.0, 1.0));
        }
        record
    }

    /// Best similarity found (0.0 when nothing matched).
    pub fn confidence(&self) -> f32 {
        self.similarity_scores.first().copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.source_segment_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_segment_indices.is_empty()
    }
}

/// Provenance statistics over all items of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceSummary {
    pub total_items: usize,
    pub items_with_provenance: usize,
    pub coverage: f32,
    pub average_similarity: f32,
    /// Items whose best similarity is below 0.3
    pub potential_hallucinations: usize,
    pub hallucination_rate: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_matches_sorts_and_truncates() {
        let record = ProvenanceRecord::from_matches(
            vec![
                (0, "a".into(), 0.2),
                (1, "b".into(), 0.9),
                (2, "c".into(), 0.5),
                (3, "d".into(), 0.7),
            ],
            ProvenanceMethod::Keyword,
        );

        assert_eq!(record.len(), 3);
        assert_eq!(record.source_segment_indices, vec![1, 3, 2]);
        assert_eq!(record.source_text, vec!["b", "d", "c"]);
        assert!((record.confidence() - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_record_has_zero_confidence() {
        let record = ProvenanceRecord::empty(ProvenanceMethod::Semantic);
        assert!(record.is_empty());
        assert_eq!(record.confidence(), 0.0);
    }
}
