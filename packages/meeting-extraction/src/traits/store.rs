//! Storage trait for evaluation jobs.
//!
//! A store is passed by handle to whatever needs it; there is no
//! process-wide job registry. Lifecycle: `create` → `put_evaluation` or
//! `mark_failed` → `get` any number of times → `evict`.

use async_trait::async_trait;

use crate::error::EvaluationResult;
use crate::types::evaluation::AggregatedEvaluation;
use crate::types::job::{EvaluationJob, JobId, JobRecord};

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Register a job in the pending state and return its id.
    async fn create(&self, job: EvaluationJob) -> EvaluationResult<JobId>;

    /// Get a job by id.
    async fn get(&self, id: &JobId) -> EvaluationResult<Option<JobRecord>>;

    /// Attach the aggregated evaluation and mark the job completed.
    ///
    /// Replaces any previous evaluation; the aggregate is always rebuilt
    /// from the job's full input set, never patched.
    async fn put_evaluation(&self, id: &JobId, evaluation: AggregatedEvaluation)
        -> EvaluationResult<()>;

    /// Mark the job failed with a reason.
    async fn mark_failed(&self, id: &JobId, reason: &str) -> EvaluationResult<()>;

    /// Remove a job. Returns whether it existed.
    async fn evict(&self, id: &JobId) -> EvaluationResult<bool>;

    /// All job ids, oldest first.
    async fn list(&self) -> EvaluationResult<Vec<JobId>>;
}
