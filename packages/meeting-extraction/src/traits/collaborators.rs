//! The capability set handed to the pipeline and the judge.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{CollaboratorError, CollaboratorResult};
use crate::traits::embedder::Embedder;
use crate::traits::generator::Generator;

/// Optional embedding and generation collaborators.
///
/// Resolved once at construction; callers check `has_*` instead of probing
/// the collaborator per call. Every call is bounded by a timeout.
#[derive(Clone)]
pub struct Collaborators {
    embedder: Option<Arc<dyn Embedder>>,
    generator: Option<Arc<dyn Generator>>,
    embedding_timeout: Duration,
    generation_timeout: Duration,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("embedder", &self.embedder.is_some())
            .field("generator", &self.generator.is_some())
            .field("embedding_timeout", &self.embedding_timeout)
            .field("generation_timeout", &self.generation_timeout)
            .finish()
    }
}

impl Collaborators {
    /// No collaborators: every stage takes its deterministic path.
    pub fn none() -> Self {
        Self {
            embedder: None,
            generator: None,
            embedding_timeout: Duration::from_secs(10),
            generation_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_timeouts(mut self, embedding: Duration, generation: Duration) -> Self {
        self.embedding_timeout = embedding;
        self.generation_timeout = generation;
        self
    }

    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Encode a batch of texts.
    ///
    /// Fails with `DimensionMismatch` unless exactly one vector comes back
    /// per input.
    pub async fn embed(&self, texts: &[String]) -> CollaboratorResult<Vec<Vec<f32>>> {
        let embedder = self.embedder.as_ref().ok_or(CollaboratorError::Unavailable {
            capability: "embedding",
        })?;

        debug!(texts = texts.len(), "Encoding texts");

        let vectors = tokio::time::timeout(self.embedding_timeout, embedder.encode(texts))
            .await
            .map_err(|_| CollaboratorError::Timeout {
                operation: "embedding",
                after: self.embedding_timeout,
            })??;

        if vectors.len() != texts.len() {
            return Err(CollaboratorError::DimensionMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }

        Ok(vectors)
    }

    /// Encode a single text.
    pub async fn embed_one(&self, text: &str) -> CollaboratorResult<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or(CollaboratorError::DimensionMismatch {
            expected: 1,
            actual: 0,
        })
    }

    /// Run one structured-generation call.
    pub async fn generate(&self, prompt: &str) -> CollaboratorResult<serde_json::Value> {
        let generator = self.generator.as_ref().ok_or(CollaboratorError::Unavailable {
            capability: "generation",
        })?;

        debug!(prompt_len = prompt.len(), "Calling generator");

        tokio::time::timeout(self.generation_timeout, generator.generate_structured(prompt))
            .await
            .map_err(|_| CollaboratorError::Timeout {
                operation: "generation",
                after: self.generation_timeout,
            })?
    }
}
