//! Near-duplicate handling across a run's candidates.

use tracing::debug;

use crate::pipeline::text::{jaccard, token_set};
use crate::types::candidate::{CandidateItem, ItemDetails};
use crate::types::config::DedupStrategy;

/// Apply the configured strategy to one extractor's candidates.
pub fn deduplicate(items: Vec<CandidateItem>, strategy: DedupStrategy) -> Vec<CandidateItem> {
    match strategy {
        DedupStrategy::None => items,
        DedupStrategy::SimilarityMerge { threshold } => similarity_merge(items, threshold),
    }
}

/// Merge same-kind items whose token Jaccard similarity reaches `threshold`.
///
/// The merged item keeps the text and fields of whichever side has the
/// higher confidence and the union of both sides' people. Order of first
/// appearance is preserved.
fn similarity_merge(items: Vec<CandidateItem>, threshold: f32) -> Vec<CandidateItem> {
    let before = items.len();
    let mut kept: Vec<CandidateItem> = Vec::with_capacity(items.len());

    for item in items {
        let tokens = token_set(&item.text);
        let duplicate = kept.iter_mut().find(|k| {
            k.kind() == item.kind() && jaccard(&token_set(&k.text), &tokens) >= threshold
        });

        match duplicate {
            Some(existing) => merge_into(existing, item),
            None => kept.push(item),
        }
    }

    debug!(before, after = kept.len(), threshold, "Merged near-duplicate candidates");
    kept
}

fn merge_into(existing: &mut CandidateItem, other: CandidateItem) {
    let mut people: Vec<String> = existing.people().into_iter().map(str::to_string).collect();
    for person in other.people() {
        if !people.iter().any(|p| p == person) {
            people.push(person.to_string());
        }
    }

    if other.confidence > existing.confidence {
        *existing = other;
    }

    match &mut existing.details {
        ItemDetails::Decision { participants, .. } => *participants = people,
        // Actions and risks have a single person; the winner's is kept.
        ItemDetails::Action { .. } | ItemDetails::Risk { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::candidate::{DecisionCategory, ExtractionMethod, RiskCategory};

    fn decision(text: &str, people: &[&str], confidence: f32) -> CandidateItem {
        CandidateItem::decision(
            text,
            None,
            people.iter().map(|p| p.to_string()).collect(),
            DecisionCategory::Other,
            confidence,
            ExtractionMethod::Pattern,
        )
    }

    #[test]
    fn test_none_keeps_everything() {
        let items = vec![
            decision("ship on friday", &["Ana"], 0.8),
            decision("ship on friday", &["Ben"], 0.8),
        ];
        assert_eq!(deduplicate(items, DedupStrategy::None).len(), 2);
    }

    #[test]
    fn test_merge_keeps_higher_confidence_text_and_unions_people() {
        let items = vec![
            decision("we will ship on friday", &["Ana"], 0.7),
            decision("We will ship on Friday", &["Ben", "Ana"], 0.9),
            decision("cut the branding feature", &["Cal"], 0.8),
        ];

        let merged = deduplicate(items, DedupStrategy::similarity_merge());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "We will ship on Friday");
        assert_eq!(merged[0].confidence, 0.9);
        assert_eq!(merged[0].people(), vec!["Ana", "Ben"]);
    }

    #[test]
    fn test_merge_never_crosses_kinds() {
        let risk = CandidateItem::risk(
            "we will ship on friday",
            RiskCategory::Other,
            None,
            0.9,
            ExtractionMethod::Pattern,
        );
        let items = vec![decision("we will ship on friday", &[], 0.8), risk];
        assert_eq!(deduplicate(items, DedupStrategy::similarity_merge()).len(), 2);
    }
}
