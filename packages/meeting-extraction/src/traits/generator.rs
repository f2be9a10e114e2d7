//! Generation collaborator trait.

use async_trait::async_trait;

use crate::error::CollaboratorResult;

/// Prompt → structured JSON generator.
///
/// The prompt is opaque to the implementation. The library owns every
/// template and is the sole parser of the returned JSON, so implementations
/// should return the raw value without reshaping it.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate_structured(&self, prompt: &str) -> CollaboratorResult<serde_json::Value>;
}
