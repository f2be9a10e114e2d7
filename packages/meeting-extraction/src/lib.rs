//! Meeting Transcript Extraction Library
//!
//! Turns speaker-attributed transcript segments into decisions, action
//! items and risks, and attaches trust signals to every item: where in the
//! transcript it came from, whether the transcript supports it, and how
//! confident the pipeline is in it. A separate evaluation layer grades the
//! output and combines judge, human and metrics scores.
//!
//! # Design Philosophy
//!
//! - Collaborators are optional: every stage has a pattern or keyword path
//! - Collaborator failures degrade, they never abort a run
//! - No process-wide state; everything is passed by handle
//!
//! # Usage
//!
//! ```rust,ignore
//! use meeting_extraction::{Collaborators, ExtractionConfig, TranscriptPipeline};
//! use meeting_extraction::testing::{MockEmbedder, MockGenerator};
//!
//! let collaborators = Collaborators::none()
//!     .with_embedder(Arc::new(MockEmbedder::new()))
//!     .with_generator(Arc::new(MockGenerator::new()));
//! let pipeline = TranscriptPipeline::new(ExtractionConfig::default(), collaborators);
//!
//! let report = pipeline.run(&segments).await;
//! for decision in &report.decisions {
//!     println!("{} ({:.2})", decision.text, decision.confidence);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator seams (Embedder, Generator, JobStore)
//! - [`types`] - Segments, candidates, verdicts, evaluations and config
//! - [`pipeline`] - Extraction, provenance, validation and calibration
//! - [`evaluation`] - Judge, metrics, aggregation and reporting
//! - [`stores`] - Job store implementations
//! - [`testing`] - Mock collaborators for testing

pub mod error;
pub mod evaluation;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{CollaboratorError, EvaluationError, ExtractionError};
pub use traits::{
    collaborators::Collaborators, embedder::Embedder, generator::Generator, store::JobStore,
};
pub use types::{
    candidate::{
        CandidateItem, DecisionCategory, ExtractionMethod, ItemDetails, ItemKind, Priority,
        QuantitativeData, RiskCategory,
    },
    config::{
        AggregationConfig, ComponentRubric, DedupStrategy, EvaluationRubric, ExtractionConfig,
        ScoringThresholds, SourceWeights,
    },
    evaluation::{
        AgreementLevel, AggregatedEvaluation, ComponentAggregate, EvaluationRecord,
        EvaluationSource, SourceEvaluation,
    },
    job::{EvaluationJob, JobId, JobRecord, JobStatus},
    provenance::{ProvenanceRecord, ProvenanceSummary},
    segment::{segments_from_pairs, Intent, IntentTag, Segment},
    validation::{IssueKind, QuantityCheck, Severity, ValidationIssue, ValidationVerdict},
};

// Re-export pipeline components
pub use pipeline::{
    ActionExtractor, CandidateExtractor, ConfidenceCalibrator, DecisionExtractor, ExtractionPath,
    ExtractionReport, IntentClassifier, ProvenanceResolver, RiskExtractor, TranscriptPipeline,
    Validator,
};

// Re-export evaluation
pub use evaluation::{
    evaluate_extraction, improvement_report, BatchEvaluator, BatchReport, EvaluationAggregator,
    ImprovementReport, JobOutcome, LlmJudge, ReferenceItems,
};

// Re-export stores
pub use stores::MemoryJobStore;

// Re-export testing utilities
pub use testing::{MockEmbedder, MockGenerator};
