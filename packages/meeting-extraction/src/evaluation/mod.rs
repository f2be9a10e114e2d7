//! Extraction quality evaluation.
//!
//! Three independent sources feed the aggregator: the rubric judge, human
//! reviewers and deterministic metrics.

pub mod aggregator;
pub mod batch;
pub mod judge;
pub mod metrics;
pub mod report;

pub use aggregator::EvaluationAggregator;
pub use batch::{BatchEvaluator, BatchReport, JobOutcome};
pub use judge::LlmJudge;
pub use metrics::{evaluate_extraction, Diversity, ReferenceItems};
pub use report::{improvement_report, ImprovementReport, Recommendation};
