//! Typed errors for the meeting extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Collaborator errors never
//! cross the extractor/validator/aggregator boundary: they are converted
//! at the point of use into the degraded branch of the algorithm.

use std::time::Duration;

use thiserror::Error;

use crate::types::candidate::ItemKind;

/// Errors raised by an external collaborator (embedding or generation).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// No collaborator is configured for this capability
    #[error("collaborator unavailable: {capability}")]
    Unavailable { capability: &'static str },

    /// The call exceeded its bounded timeout
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The collaborator returned an error
    #[error("collaborator failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Embedding batch came back with the wrong shape
    #[error("expected {expected} embeddings, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl CollaboratorError {
    /// Wrap an arbitrary error message as a collaborator failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into().into())
    }
}

/// Errors that can occur during extraction operations.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Embedding or generation collaborator failed
    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Generation output did not match the expected schema
    #[error("malformed {kind} response: {reason}")]
    MalformedResponse { kind: ItemKind, reason: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {reason}")]
    Config { reason: String },
}

/// Errors that can occur while evaluating extraction quality.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The LLM judge could not produce an evaluation
    #[error("judge error: {0}")]
    Judge(#[from] CollaboratorError),

    /// A batch job failed; siblings are unaffected
    #[error("job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    /// Job not found in the store
    #[error("job not found: {job_id}")]
    JobNotFound { job_id: String },

    /// Store operation failed
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for collaborator calls.
pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

/// Result type alias for evaluation operations.
pub type EvaluationResult<T> = std::result::Result<T, EvaluationError>;
