//! Sentence embeddings from locally served models
//!
//! Ollama exposes `/api/embeddings` (one text per request); LocalAI, llama.cpp
//! and vLLM expose the OpenAI-compatible `/v1/embeddings` route, which accepts
//! a batch. Failures are reported as `MatchError::Encoding`.

use async_trait::async_trait;
use foundermatch_core::{
    EmbeddingBackend, EmbeddingConfig, EmbeddingService, EmbeddingVector, MatchError, Result,
};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::{get_http_client, validate_model_name, validate_url};

/// Output size of well-known embedding models
pub fn known_dimensions(model: &str) -> Option<usize> {
    let base = model.split(':').next().unwrap_or(model);
    match base {
        "all-minilm" | "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => Some(384),
        "nomic-embed-text" => Some(768),
        "mxbai-embed-large" | "snowflake-arctic-embed" => Some(1024),
        _ => None,
    }
}

/// Embedding client for a local model server
pub struct LocalEmbeddingClient {
    client: Arc<Client>,
    backend: EmbeddingBackend,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl LocalEmbeddingClient {
    pub fn new(
        backend: EmbeddingBackend,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into();
        validate_url(&base_url)?;
        let model = model.into();
        validate_model_name(&model)?;

        Ok(Self {
            client: get_http_client(),
            backend,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::new(
            config.backend,
            config.base_url.clone(),
            config.model.clone(),
            config.timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post(&self, path: &str, payload: &Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MatchError::encoding(format!(
                        "Embedding request timed out after {:?}",
                        self.timeout
                    ))
                } else {
                    MatchError::encoding(format!(
                        "Embedding request failed: {}. Check if the server is running at {}",
                        e, self.base_url
                    ))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
            return Err(MatchError::encoding(format!(
                "Embedding API returned error status {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MatchError::encoding(format!("Failed to parse embedding response: {}", e)))
    }

    async fn embed_ollama(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        // No batch route; one request per text
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            let payload = json!({
                "model": self.model,
                "prompt": text,
            });
            let body = self.post("/api/embeddings", &payload).await?;
            results.push(parse_vector(&body["embedding"])?);
        }
        Ok(results)
    }

    async fn embed_openai(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        let payload = json!({
            "model": self.model,
            "input": texts,
        });
        let body = self.post("/v1/embeddings", &payload).await?;
        parse_openai_body(&body, texts.len())
    }
}

/// Convert a JSON number array into a vector, rejecting anything non-numeric
fn parse_vector(value: &Value) -> Result<EmbeddingVector> {
    let items = value.as_array().ok_or_else(|| {
        MatchError::encoding("Invalid response format: missing embedding array")
    })?;
    if items.is_empty() {
        return Err(MatchError::encoding("Backend returned an empty embedding"));
    }
    items
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| MatchError::encoding("Embedding contains a non-numeric value"))
        })
        .collect()
}

/// Parse `{"data": [{"index": i, "embedding": [...]}, ...]}` back into input order
fn parse_openai_body(body: &Value, expected: usize) -> Result<Vec<EmbeddingVector>> {
    let data = body["data"]
        .as_array()
        .ok_or_else(|| MatchError::encoding("Invalid response format: missing 'data' array"))?;

    if data.len() != expected {
        return Err(MatchError::encoding(format!(
            "Expected {} embeddings, backend returned {}",
            expected,
            data.len()
        )));
    }

    let mut indexed = data
        .iter()
        .enumerate()
        .map(|(pos, item)| {
            let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(pos);
            parse_vector(&item["embedding"]).map(|v| (index, v))
        })
        .collect::<Result<Vec<_>>>()?;
    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

#[async_trait]
impl EmbeddingService for LocalEmbeddingClient {
    fn name(&self) -> &str {
        match self.backend {
            EmbeddingBackend::Ollama => "ollama",
            EmbeddingBackend::OpenAiCompatible => "openai-compatible",
        }
    }

    fn dimensions(&self) -> Option<usize> {
        known_dimensions(&self.model)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = match self.backend {
            EmbeddingBackend::Ollama => self.embed_ollama(texts).await?,
            EmbeddingBackend::OpenAiCompatible => self.embed_openai(texts).await?,
        };
        tracing::debug!(
            backend = self.name(),
            count = vectors.len(),
            "Embedded {} text(s)",
            texts.len()
        );
        Ok(vectors)
    }
}
