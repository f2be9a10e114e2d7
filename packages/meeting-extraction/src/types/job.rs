//! Evaluation jobs tracked by a [`JobStore`](crate::traits::store::JobStore).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::config::SourceWeights;
use crate::types::evaluation::{AggregatedEvaluation, SourceEvaluation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The inputs of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationJob {
    /// Free-form label (e.g. the meeting title)
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub llm: Option<SourceEvaluation>,

    #[serde(default)]
    pub human: Option<SourceEvaluation>,

    #[serde(default)]
    pub metrics: Option<SourceEvaluation>,

    /// Explicit weights; configured defaults apply when absent
    #[serde(default)]
    pub weights: Option<SourceWeights>,
}

impl EvaluationJob {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_llm(mut self, eval: SourceEvaluation) -> Self {
        self.llm = Some(eval);
        self
    }

    pub fn with_human(mut self, eval: SourceEvaluation) -> Self {
        self.human = Some(eval);
        self
    }

    pub fn with_metrics(mut self, eval: SourceEvaluation) -> Self {
        self.metrics = Some(eval);
        self
    }

    pub fn with_weights(mut self, weights: SourceWeights) -> Self {
        self.weights = Some(weights);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed { reason: String },
}

/// A stored job with its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub job: EvaluationJob,
    #[serde(flatten)]
    pub status: JobStatus,
    pub evaluation: Option<AggregatedEvaluation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(id: JobId, job: EvaluationJob) -> Self {
        let now = Utc::now();
        Self {
            id,
            job,
            status: JobStatus::Pending,
            evaluation: None,
            created_at: now,
            updated_at: now,
        }
    }
}
