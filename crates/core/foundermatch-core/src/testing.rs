//! Deterministic service stubs for tests and offline runs

use crate::services::{EmbeddingService, TextCompletionService};
use crate::types::EmbeddingVector;
use crate::{MatchError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// Completion service that always answers with the same text and
/// remembers every prompt it was given
pub struct StaticCompletion {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl StaticCompletion {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextCompletionService for StaticCompletion {
    fn name(&self) -> &str {
        "static"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.response.clone())
    }
}

/// Completion service whose backend is always down
pub struct UnavailableCompletion;

#[async_trait]
impl TextCompletionService for UnavailableCompletion {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(MatchError::extraction("Completion backend is unreachable"))
    }
}

/// Bag-of-words embedding: every lowercase word is hashed (FNV-1a) into a
/// bucket, then the vector is L2-normalized. Same text, same vector.
pub struct HashEmbedding {
    dimension: usize,
}

impl HashEmbedding {
    /// # Panics
    ///
    /// Panics if `dimension` is zero.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "HashEmbedding dimension must be non-zero");
        Self { dimension }
    }

    fn bucket(&self, word: &str) -> usize {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in word.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        (hash % self.dimension as u64) as usize
    }

    /// Embed synchronously; shared by the trait impl and fixture builders
    pub fn vector_for(&self, text: &str) -> EmbeddingVector {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[self.bucket(&word.to_lowercase())] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingService for HashEmbedding {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimension)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Embedding service whose model is never available
pub struct UnavailableEmbedding;

#[async_trait]
impl EmbeddingService for UnavailableEmbedding {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        Err(MatchError::encoding("Embedding model is not loaded"))
    }
}
