//! Capability interfaces injected into the matching pipelines
//!
//! Backends are never hard-wired: the language model, the embedding model and
//! the matching strategy are all reached through these traits so tests can
//! substitute deterministic stubs.

use crate::types::{EmbeddingVector, MatchReport, StrategyKind};
use crate::{MatchError, Result};
use async_trait::async_trait;

/// Opaque prompt-in, text-out language model
#[async_trait]
pub trait TextCompletionService: Send + Sync {
    /// Backend identifier for logs
    fn name(&self) -> &str;

    /// Complete a prompt. Failures surface as `MatchError::Extraction`.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Sentence-embedding model
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Backend identifier for logs
    fn name(&self) -> &str;

    /// Output dimensionality, when known without a forward pass
    fn dimensions(&self) -> Option<usize> {
        None
    }

    /// One vector per input, in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>>;

    /// Embed a single text (delegates to a batch of one)
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| MatchError::encoding("Embedding backend returned no vectors"))
    }
}

/// A complete idea-to-shortlist pipeline
#[async_trait]
pub trait MatchStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn find_matches(&self, idea: &str) -> Result<MatchReport>;
}
