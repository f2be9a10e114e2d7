//! Transcript extraction pipeline.
//!
//! Each stage lives in its own module; [`run::TranscriptPipeline`] wires
//! them together.

pub mod action;
pub mod calibration;
pub mod context;
pub mod decision;
pub mod dedup;
pub mod extractor;
pub mod generation;
pub mod intent;
pub mod prompts;
pub mod provenance;
pub mod quantitative;
pub mod risk;
pub mod run;
pub mod text;
pub mod validator;

pub use action::ActionExtractor;
pub use calibration::ConfidenceCalibrator;
pub use decision::DecisionExtractor;
pub use extractor::{CandidateExtractor, ExtractionPath, ExtractorRun};
pub use generation::GenerationOutcome;
pub use intent::IntentClassifier;
pub use provenance::ProvenanceResolver;
pub use risk::RiskExtractor;
pub use run::{ExtractionReport, RunMetadata, TranscriptPipeline};
pub use validator::Validator;
