//! In-memory job store for testing, development and the CLI.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{EvaluationError, EvaluationResult};
use crate::traits::store::JobStore;
use crate::types::evaluation::AggregatedEvaluation;
use crate::types::job::{EvaluationJob, JobId, JobRecord, JobStatus};

/// In-memory storage for evaluation jobs.
///
/// Not suitable for production as data is lost on restart.
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of stored jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Clear all stored jobs.
    pub async fn clear(&self) {
        self.jobs.write().await.clear();
    }

    async fn update(
        &self,
        id: &JobId,
        apply: impl FnOnce(&mut JobRecord) + Send,
    ) -> EvaluationResult<()> {
        let mut jobs = self.jobs.write().await;
        let record = jobs.get_mut(id).ok_or_else(|| EvaluationError::JobNotFound {
            job_id: id.to_string(),
        })?;
        apply(record);
        record.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: EvaluationJob) -> EvaluationResult<JobId> {
        let id = JobId::new();
        self.jobs.write().await.insert(id, JobRecord::new(id, job));
        Ok(id)
    }

    async fn get(&self, id: &JobId) -> EvaluationResult<Option<JobRecord>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn put_evaluation(
        &self,
        id: &JobId,
        evaluation: AggregatedEvaluation,
    ) -> EvaluationResult<()> {
        self.update(id, |record| {
            record.evaluation = Some(evaluation);
            record.status = JobStatus::Completed;
        })
        .await
    }

    async fn mark_failed(&self, id: &JobId, reason: &str) -> EvaluationResult<()> {
        let reason = reason.to_string();
        self.update(id, |record| {
            record.evaluation = None;
            record.status = JobStatus::Failed { reason };
        })
        .await
    }

    async fn evict(&self, id: &JobId) -> EvaluationResult<bool> {
        Ok(self.jobs.write().await.remove(id).is_some())
    }

    async fn list(&self) -> EvaluationResult<Vec<JobId>> {
        let jobs = self.jobs.read().await;
        let mut records: Vec<&JobRecord> = jobs.values().collect();
        records.sort_by_key(|r| (r.created_at, r.id));
        Ok(records.into_iter().map(|r| r.id).collect())
    }
}
