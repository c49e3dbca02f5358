//! Query encoding

use foundermatch_core::{EmbeddingService, EmbeddingVector, MatchError, Result};
use std::sync::Arc;
use tracing::debug;

/// Turns free text into a dense query vector using an injected embedding model.
///
/// One text per call. The output is checked before it reaches the index so a
/// misbehaving backend shows up as an `Encoding` error rather than as garbage
/// distances.
pub struct EmbeddingEncoder {
    service: Arc<dyn EmbeddingService>,
}

impl EmbeddingEncoder {
    pub fn new(service: Arc<dyn EmbeddingService>) -> Self {
        Self { service }
    }

    /// Output size reported by the backend, if known up front
    pub fn dimensions(&self) -> Option<usize> {
        self.service.dimensions()
    }

    pub fn backend_name(&self) -> &str {
        self.service.name()
    }

    pub async fn encode(&self, text: &str) -> Result<EmbeddingVector> {
        if text.trim().is_empty() {
            return Err(MatchError::validation("Startup idea cannot be empty"));
        }

        let vector = self.service.embed(text).await.map_err(|e| match e {
            MatchError::Encoding(msg) => MatchError::Encoding(msg),
            other => MatchError::encoding(format!(
                "{} embedding backend failed: {}",
                self.service.name(),
                other
            )),
        })?;

        if vector.is_empty() {
            return Err(MatchError::encoding("Embedding backend returned an empty vector"));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(MatchError::encoding(
                "Embedding backend returned a non-finite value",
            ));
        }

        debug!(
            backend = self.service.name(),
            dimension = vector.len(),
            "Encoded query"
        );
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use foundermatch_core::testing::{HashEmbedding, UnavailableEmbedding};

    struct NanEmbedding;

    #[async_trait]
    impl EmbeddingService for NanEmbedding {
        fn name(&self) -> &str {
            "nan"
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
            Ok(texts.iter().map(|_| vec![0.5, f32::NAN]).collect())
        }
    }

    #[tokio::test]
    async fn test_encode_is_deterministic() {
        let encoder = EmbeddingEncoder::new(Arc::new(HashEmbedding::new(384)));
        let first = encoder.encode("AI tutoring for rural schools").await.unwrap();
        let second = encoder.encode("AI tutoring for rural schools").await.unwrap();

        assert_eq!(first.len(), 384);
        for (a, b) in first.iter().zip(&second) {
            assert!((a - b).abs() <= 1e-6);
        }
        assert_eq!(encoder.dimensions(), Some(384));
    }

    #[tokio::test]
    async fn test_unavailable_backend() {
        let encoder = EmbeddingEncoder::new(Arc::new(UnavailableEmbedding));
        let err = encoder.encode("anything").await.unwrap_err();
        assert!(matches!(err, MatchError::Encoding(_)));
    }

    #[tokio::test]
    async fn test_non_finite_output_rejected() {
        let encoder = EmbeddingEncoder::new(Arc::new(NanEmbedding));
        let err = encoder.encode("anything").await.unwrap_err();
        assert!(matches!(err, MatchError::Encoding(_)));
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let encoder = EmbeddingEncoder::new(Arc::new(HashEmbedding::new(8)));
        let err = encoder.encode("  \n").await.unwrap_err();
        assert!(matches!(err, MatchError::Validation(_)));
    }
}
