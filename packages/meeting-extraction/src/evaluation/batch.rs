//! Concurrent evaluation of many jobs.
//!
//! Every job runs on the blocking pool with its own inputs. A job that
//! panics or times out becomes a failed outcome; the rest of the batch is
//! unaffected.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{EvaluationError, EvaluationResult};
use crate::evaluation::aggregator::EvaluationAggregator;
use crate::traits::store::JobStore;
use crate::types::evaluation::AggregatedEvaluation;
use crate::types::job::{EvaluationJob, JobId};

/// Default per-job time limit.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum JobOutcome {
    Completed {
        job_id: JobId,
        evaluation: AggregatedEvaluation,
    },
    Failed {
        job_id: JobId,
        reason: String,
    },
}

impl JobOutcome {
    pub fn job_id(&self) -> JobId {
        match self {
            JobOutcome::Completed { job_id, .. } | JobOutcome::Failed { job_id, .. } => *job_id,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }

    pub fn into_result(self) -> EvaluationResult<AggregatedEvaluation> {
        match self {
            JobOutcome::Completed { evaluation, .. } => Ok(evaluation),
            JobOutcome::Failed { job_id, reason } => Err(EvaluationError::JobFailed {
                job_id: job_id.to_string(),
                reason,
            }),
        }
    }
}

/// Outcomes in submission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.completed()
    }
}

pub struct BatchEvaluator {
    aggregator: Arc<EvaluationAggregator>,
    store: Option<Arc<dyn JobStore>>,
    job_timeout: Duration,
}

impl BatchEvaluator {
    pub fn new(aggregator: EvaluationAggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            store: None,
            job_timeout: DEFAULT_JOB_TIMEOUT,
        }
    }

    /// Record every job and its outcome in `store`.
    pub fn with_store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    async fn register(&self, job: &EvaluationJob) -> JobId {
        let Some(store) = &self.store else {
            return JobId::new();
        };
        match store.create(job.clone()).await {
            Ok(id) => id,
            Err(e) => {
                warn!(job = %job.name, error = %e, "Failed to register job, continuing unstored");
                JobId::new()
            }
        }
    }

    pub async fn evaluate_batch(&self, jobs: Vec<EvaluationJob>) -> BatchReport {
        let aggregator = Arc::clone(&self.aggregator);
        self.run_jobs(jobs, move |job| aggregator.aggregate_job(&job))
            .await
    }

    /// Run `evaluate` once per job on the blocking pool, each bounded by
    /// the job timeout.
    async fn run_jobs<F>(&self, jobs: Vec<EvaluationJob>, evaluate: F) -> BatchReport
    where
        F: Fn(EvaluationJob) -> AggregatedEvaluation + Send + Sync + 'static,
    {
        let mut ids = Vec::with_capacity(jobs.len());
        for job in &jobs {
            ids.push(self.register(job).await);
        }

        let evaluate = Arc::new(evaluate);
        let handles = jobs.into_iter().map(|job| {
            let evaluate = Arc::clone(&evaluate);
            let task = tokio::task::spawn_blocking(move || evaluate(job));
            tokio::time::timeout(self.job_timeout, task)
        });

        let results = join_all(handles).await;

        let mut outcomes = Vec::with_capacity(results.len());
        for (job_id, result) in ids.into_iter().zip(results) {
            let outcome = match result {
                Ok(Ok(evaluation)) => JobOutcome::Completed { job_id, evaluation },
                Ok(Err(e)) => JobOutcome::Failed {
                    job_id,
                    reason: format!("task failed: {}", e),
                },
                Err(_) => JobOutcome::Failed {
                    job_id,
                    reason: format!("timed out after {:?}", self.job_timeout),
                },
            };
            self.record(&outcome).await;
            outcomes.push(outcome);
        }

        let report = BatchReport { outcomes };
        info!(
            completed = report.completed(),
            failed = report.failed(),
            "Batch evaluation finished"
        );
        report
    }

    async fn record(&self, outcome: &JobOutcome) {
        let Some(store) = &self.store else {
            return;
        };
        let result = match outcome {
            JobOutcome::Completed { job_id, evaluation } => {
                store.put_evaluation(job_id, evaluation.clone()).await
            }
            JobOutcome::Failed { job_id, reason } => {
                warn!(job_id = %job_id, reason = %reason, "Evaluation job failed");
                store.mark_failed(job_id, reason).await
            }
        };
        if let Err(e) = result {
            warn!(job_id = %outcome.job_id(), error = %e, "Failed to record job outcome");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryJobStore;
    use crate::types::evaluation::{EvaluationRecord, SourceEvaluation};
    use crate::types::job::JobStatus;

    fn metrics(score: f64) -> SourceEvaluation {
        SourceEvaluation::new().with_component(
            "decisions",
            EvaluationRecord::new()
                .with_score("completeness", score)
                .with_overall(score),
        )
    }

    fn evaluator() -> BatchEvaluator {
        BatchEvaluator::new(EvaluationAggregator::default())
    }

    #[tokio::test]
    async fn test_job_without_sources_completes_empty() {
        let report = evaluator()
            .evaluate_batch(vec![
                EvaluationJob::new("good").with_metrics(metrics(8.0)),
                EvaluationJob::new("empty"),
            ])
            .await;

        assert_eq!(report.completed(), 2);
        let empty = report.outcomes[1].clone().into_result().unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.aggregate_score, 0.0);
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_affect_siblings() {
        let aggregator = EvaluationAggregator::default();
        let jobs = vec![
            EvaluationJob::new("good").with_metrics(metrics(8.0)),
            EvaluationJob::new("boom").with_metrics(metrics(1.0)),
            EvaluationJob::new("also good").with_metrics(metrics(4.0)),
        ];

        let report = evaluator()
            .run_jobs(jobs, move |job| {
                if job.name == "boom" {
                    panic!("aggregation blew up");
                }
                aggregator.aggregate_job(&job)
            })
            .await;

        assert_eq!(report.completed(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            &report.outcomes[1],
            JobOutcome::Failed { reason, .. } if reason.starts_with("task failed")
        ));
        assert_eq!(
            report.outcomes[2].clone().into_result().unwrap().aggregate_score,
            1.4
        );

        let failed = report.outcomes[1].clone().into_result().unwrap_err();
        assert!(matches!(failed, EvaluationError::JobFailed { .. }));
    }

    #[tokio::test]
    async fn test_slow_job_times_out() {
        let aggregator = EvaluationAggregator::default();
        let report = evaluator()
            .with_job_timeout(Duration::from_millis(20))
            .run_jobs(
                vec![
                    EvaluationJob::new("slow").with_metrics(metrics(8.0)),
                    EvaluationJob::new("fast").with_metrics(metrics(8.0)),
                ],
                move |job| {
                    if job.name == "slow" {
                        std::thread::sleep(Duration::from_millis(300));
                    }
                    aggregator.aggregate_job(&job)
                },
            )
            .await;

        assert!(matches!(
            &report.outcomes[0],
            JobOutcome::Failed { reason, .. } if reason.starts_with("timed out")
        ));
        assert!(report.outcomes[1].is_completed());
    }

    #[tokio::test]
    async fn test_outcomes_are_recorded_in_store() {
        let store = Arc::new(MemoryJobStore::new());
        let aggregator = EvaluationAggregator::default();
        let report = evaluator()
            .with_store(store.clone())
            .run_jobs(
                vec![
                    EvaluationJob::new("good").with_metrics(metrics(8.0)),
                    EvaluationJob::new("boom"),
                ],
                move |job| {
                    if job.name == "boom" {
                        panic!("aggregation blew up");
                    }
                    aggregator.aggregate_job(&job)
                },
            )
            .await;

        let good = store.get(&report.outcomes[0].job_id()).await.unwrap().unwrap();
        assert_eq!(good.status, JobStatus::Completed);
        assert!(good.evaluation.is_some());

        let boom = store.get(&report.outcomes[1].job_id()).await.unwrap().unwrap();
        assert!(matches!(boom.status, JobStatus::Failed { .. }));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = BatchEvaluator::new(EvaluationAggregator::default())
            .evaluate_batch(vec![])
            .await;
        assert!(report.outcomes.is_empty());
    }
}
