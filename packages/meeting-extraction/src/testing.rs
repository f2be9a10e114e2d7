//! Testing utilities including mock collaborators.
//!
//! These are useful for testing applications that use the extraction library
//! without loading an embedding model or calling a text generator.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::error::{CollaboratorError, CollaboratorResult};
use crate::traits::embedder::Embedder;
use crate::traits::generator::Generator;
use crate::types::candidate::ItemKind;

/// A deterministic bag-of-words embedder.
///
/// Each lower-cased alphanumeric token is hashed (SHA-256) into one of
/// `dim` buckets, so texts sharing words have positive cosine similarity
/// and texts with disjoint vocabularies score zero.
#[derive(Default)]
pub struct MockEmbedder {
    /// Predefined embeddings by exact text
    embeddings: Arc<RwLock<HashMap<String, Vec<f32>>>>,

    /// Any batch containing a text with one of these substrings fails
    fail_on: Arc<RwLock<Vec<String>>>,

    /// Fail every call
    always_fail: bool,

    dim: usize,

    /// Batch sizes of every call, for assertions
    calls: Arc<RwLock<Vec<usize>>>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            dim: 256,
            ..Default::default()
        }
    }

    /// An embedder whose every call fails.
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::new()
        }
    }

    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim.max(1);
        self
    }

    /// Add a predefined embedding for text.
    pub fn with_embedding(self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(text.into(), embedding);
        self
    }

    /// Fail any batch containing a text with this substring.
    pub fn fail_on(self, needle: impl Into<String>) -> Self {
        self.fail_on
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(needle.into());
        self
    }

    /// Batch sizes of all calls made to this mock.
    pub fn calls(&self) -> Vec<usize> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Hash each token into a bucket and count occurrences.
    fn bag_of_words(&self, text: &str) -> Vec<f32> {
        use sha2::{Digest, Sha256};

        let mut vector = vec![0.0f32; self.dim];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = Sha256::digest(token.as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&hash[..8]);
            let bucket = (u64::from_le_bytes(bytes) % self.dim as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn encode(&self, texts: &[String]) -> CollaboratorResult<Vec<Vec<f32>>> {
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(texts.len());

        if self.always_fail {
            return Err(CollaboratorError::failed("mock embedder configured to fail"));
        }

        let fail_on = self.fail_on.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(needle) = fail_on
            .iter()
            .find(|needle| texts.iter().any(|t| t.contains(needle.as_str())))
        {
            return Err(CollaboratorError::failed(format!(
                "mock embedder failure on {:?}",
                needle
            )));
        }

        let embeddings = self.embeddings.read().unwrap_or_else(PoisonError::into_inner);
        Ok(texts
            .iter()
            .map(|t| {
                embeddings
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| self.bag_of_words(t))
            })
            .collect())
    }
}

/// Scripted outcome for prompts containing a needle.
#[derive(Debug, Clone)]
enum Scripted {
    Respond(serde_json::Value),
    Fail(String),
}

/// A mock generator with scripted responses.
///
/// Rules are checked in insertion order; the first rule whose needle
/// appears in the prompt decides the outcome. Prompts matching no rule
/// fail, which exercises the pattern fallback.
#[derive(Default)]
pub struct MockGenerator {
    rules: Arc<RwLock<Vec<(String, Scripted)>>>,

    delay: Option<Duration>,

    /// Every prompt received, for assertions
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Needle identifying the extraction prompt for a kind.
    pub fn needle_for(kind: ItemKind) -> String {
        format!("{{\"{}\"", kind.component())
    }

    /// Respond to prompts containing `needle` with `value`.
    pub fn with_rule(self, needle: impl Into<String>, value: serde_json::Value) -> Self {
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((needle.into(), Scripted::Respond(value)));
        self
    }

    /// Fail prompts containing `needle`.
    pub fn with_failing_rule(self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((needle.into(), Scripted::Fail(message.into())));
        self
    }

    /// Respond to the extraction prompt for `kind`.
    pub fn with_response(self, kind: ItemKind, value: serde_json::Value) -> Self {
        self.with_rule(Self::needle_for(kind), value)
    }

    /// Fail the extraction prompt for `kind`.
    pub fn with_failure(self, kind: ItemKind, message: impl Into<String>) -> Self {
        self.with_failing_rule(Self::needle_for(kind), message)
    }

    /// Sleep before answering (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate_structured(&self, prompt: &str) -> CollaboratorResult<serde_json::Value> {
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, s)| s.clone());

        match scripted {
            Some(Scripted::Respond(value)) => Ok(value),
            Some(Scripted::Fail(message)) => Err(CollaboratorError::failed(message)),
            None => Err(CollaboratorError::failed("no scripted response for prompt")),
        }
    }
}
