//! Integration tests for the transcript extraction pipeline.
//!
//! These tests drive the public API end to end:
//! 1. Pattern extraction with no collaborators
//! 2. Provenance and validation against the source segments
//! 3. Calibration bounds
//! 4. Fallback when the generator misbehaves

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use proptest::prelude::*;
use serde_json::json;

use meeting_extraction::{
    error::CollaboratorResult,
    pipeline::{provenance::ProvenanceResolver, validator::validate},
    testing::{MockEmbedder, MockGenerator},
    CandidateExtractor, Collaborators, CollaboratorError, ConfidenceCalibrator, DecisionExtractor,
    ExtractionConfig, ExtractionPath, Generator, ItemKind, Segment, TranscriptPipeline,
    segments_from_pairs,
};
use meeting_extraction::types::provenance::ProvenanceMethod;

mock! {
    pub Llm {}

    #[async_trait]
    impl Generator for Llm {
        async fn generate_structured(&self, prompt: &str) -> CollaboratorResult<serde_json::Value>;
    }
}

/// Helper to build the standup transcript used across tests.
fn standup() -> Vec<Segment> {
    segments_from_pairs([
        ("David", "We decided to push the launch date from October 15th to October 29th."),
        ("Marcus", "Sarah, can you contact the Salesforce manager by end of day tomorrow?"),
        ("Sarah", "Sure. My concern is that the data migration might slip past the deadline."),
    ])
}

#[tokio::test]
async fn test_pattern_decision_from_single_segment() {
    let segments = segments_from_pairs([(
        "David",
        "We decided to push the launch date from October 15th to October 29th.",
    )]);

    let items = DecisionExtractor::new(ExtractionConfig::default())
        .extract(&[], &segments, &Collaborators::none())
        .await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].people(), vec!["David"]);
    assert_eq!(items[0].confidence, 0.85);
}

#[tokio::test]
async fn test_action_owner_and_due_date_through_pipeline() {
    let report = TranscriptPipeline::pattern_only().run(&standup()).await;

    let action = report
        .action_items
        .iter()
        .find(|a| a.text.contains("contact the Salesforce manager"))
        .expect("action extracted");
    assert_eq!(action.owner(), Some("Sarah"));
    assert_eq!(action.due_date(), Some("end of day tomorrow"));
    assert_eq!(action.extractor_confidence, 0.85);
}

#[test]
fn test_unsupported_statement_is_invalid() {
    let segments = segments_from_pairs([
        ("Ana", "Budget review moved to Thursday."),
        ("Ben", "Okay, sounds good."),
    ]);

    let verdict = validate("We will launch on Mars next year", &segments, ItemKind::Decision);
    assert_eq!(verdict.source_support, 0.0);
    assert!(!verdict.is_valid);
    assert!(verdict.is_potential_hallucination());
}

#[test]
fn test_keyword_provenance_without_embedder() {
    let segments = segments_from_pairs([
        ("Ana", "alpha beta gamma omega"),
        ("Ben", "nothing in common here"),
    ]);
    let mut resolver = ProvenanceResolver::new();
    tokio_test::block_on(resolver.set_source(&segments, &Collaborators::none()));

    let record = resolver.resolve_keyword("alpha beta gamma delta epsilon zeta");
    assert_eq!(record.method, ProvenanceMethod::Keyword);
    assert_eq!(record.source_segment_indices, vec![0]);
    assert!((record.similarity_scores[0] - 3.0 / 7.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_failing_generator_falls_back_to_patterns() {
    let mut llm = MockLlm::new();
    llm.expect_generate_structured()
        .times(3)
        .returning(|_| Err(CollaboratorError::failed("model offline")));

    let pipeline = TranscriptPipeline::new(
        ExtractionConfig::default(),
        Collaborators::none().with_generator(Arc::new(llm)),
    );
    let report = pipeline.run(&standup()).await;

    assert_eq!(report.decisions.len(), 1);
    assert_eq!(report.action_items.len(), 1);
    for path in report.metadata.paths.values() {
        match path {
            ExtractionPath::Pattern { reason } => assert!(reason.contains("model offline")),
            ExtractionPath::Generated => panic!("generation should have failed"),
        }
    }
}

#[tokio::test]
async fn test_malformed_generation_falls_back_per_kind() {
    let generator = MockGenerator::new()
        .with_response(ItemKind::Decision, json!({"unexpected": true}))
        .with_response(
            ItemKind::Action,
            json!({"action_items": [{"action": "Contact the Salesforce manager", "owner": "Sarah", "due_date": "tomorrow"}]}),
        )
        .with_failure(ItemKind::Risk, "rate limited");

    let pipeline = TranscriptPipeline::new(
        ExtractionConfig::default(),
        Collaborators::none().with_generator(Arc::new(generator)),
    );
    let report = pipeline.run(&standup()).await;

    assert!(matches!(
        report.metadata.paths["decisions"],
        ExtractionPath::Pattern { .. }
    ));
    assert!(report.metadata.paths["action_items"].is_generated());
    assert!(matches!(
        report.metadata.paths["risks"],
        ExtractionPath::Pattern { .. }
    ));
    assert_eq!(report.action_items[0].owner(), Some("Sarah"));
}

#[tokio::test]
async fn test_failing_embedder_degrades_to_keywords() {
    let pipeline = TranscriptPipeline::new(
        ExtractionConfig::default(),
        Collaborators::none().with_embedder(Arc::new(MockEmbedder::failing())),
    );
    let report = pipeline.run(&standup()).await;

    assert!(!report.metadata.semantic);
    assert!(report.total_items() > 0);
    for item in report.all_items() {
        assert_eq!(
            item.provenance.as_ref().unwrap().method,
            ProvenanceMethod::Keyword
        );
    }
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let report = TranscriptPipeline::pattern_only().run(&standup()).await;
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["decisions"][0]["kind"], "decision");
    assert!(value["metadata"]["templates_hash"].is_string());
    assert_eq!(value["provenance_summary"]["total_items"], report.total_items());
}

fn segments_strategy() -> impl Strategy<Value = Vec<Segment>> {
    prop::collection::vec("[a-z]{1,6}( [a-z]{1,6}){0,8}", 0..6).prop_map(|texts| {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, t)| Segment::new(i, t))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_keyword_confidence_is_bounded(text in "[ -~]{0,80}") {
        let confidence = ConfidenceCalibrator::new().confidence(&text, None);
        prop_assert!((0.4..=0.95).contains(&confidence));
    }

    #[test]
    fn prop_details_never_lower_confidence(text in "[a-z ]{0,60}") {
        let calibrator = ConfidenceCalibrator::new();
        let plain = calibrator.confidence(&text, None);
        let detailed = calibrator.confidence(&format!("{} in 2025", text), None);
        prop_assert!(detailed >= plain);
    }

    #[test]
    fn prop_provenance_is_sorted_and_bounded(
        segments in segments_strategy(),
        text in "[a-z]{1,6}( [a-z]{1,6}){0,6}",
    ) {
        let mut resolver = ProvenanceResolver::new();
        tokio_test::block_on(resolver.set_source(&segments, &Collaborators::none()));
        let record = resolver.resolve_keyword(&text);

        prop_assert!(record.len() <= 3);
        prop_assert_eq!(record.source_text.len(), record.len());
        prop_assert_eq!(record.similarity_scores.len(), record.len());
        prop_assert!(record.similarity_scores.windows(2).all(|w| w[0] >= w[1]));
        prop_assert!(record.similarity_scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn prop_valid_verdicts_have_support(
        segments in segments_strategy(),
        text in "[a-z]{1,6}( [a-z]{1,6}){0,6}",
    ) {
        let verdict = validate(&text, &segments, ItemKind::Risk);
        prop_assert!((0.0..=1.0).contains(&verdict.source_support));
        if verdict.is_valid {
            prop_assert!(verdict.source_support > 0.3);
        }
    }
}
