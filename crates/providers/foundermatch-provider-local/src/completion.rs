//! Text completion against locally served language models
//!
//! Supports:
//! - Ollama (`/api/generate`, streamed NDJSON)
//! - llama.cpp HTTP server (`/completion`)
//! - LocalAI (`/v1/completions`, OpenAI-compatible)
//! - Text generation web UI (`/api/v1/generate`)
//!
//! Every transport or payload failure is reported as `MatchError::Extraction`,
//! since the only caller is tag extraction.

use async_trait::async_trait;
use foundermatch_core::{
    CompletionBackend, CompletionConfig, MatchError, Result, TextCompletionService,
    MAX_COMPLETION_TOKENS,
};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::{get_http_client, validate_model_name, validate_url};

/// Cap on assembled completion text
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Parameters for a single completion
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl GenerateParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Ollama API request
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<usize>,
}

/// One line of an Ollama streamed response
#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Local LLM client
pub struct LocalLLMClient {
    client: Arc<Client>,
    backend: CompletionBackend,
    base_url: String,
    default_model: String,
    timeout: Duration,
}

impl LocalLLMClient {
    /// Create a client; `base_url` defaults to the backend's standard port
    pub fn new(
        backend: CompletionBackend,
        base_url: Option<String>,
        default_model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.unwrap_or_else(|| backend.default_url().to_string());
        validate_url(&base_url)?;

        let default_model = default_model.into();
        validate_model_name(&default_model)?;

        Ok(Self {
            client: get_http_client(),
            backend,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model,
            timeout,
        })
    }

    /// Create a client from the completion section of the matcher config
    pub fn from_config(config: &CompletionConfig) -> Result<Self> {
        Self::new(
            config.backend,
            config.base_url.clone(),
            config.model.clone(),
            config.timeout,
        )
    }

    pub fn backend(&self) -> CompletionBackend {
        self.backend
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Generate text using the configured backend
    pub async fn generate(&self, params: GenerateParams) -> Result<String> {
        if params.prompt.is_empty() {
            return Err(MatchError::validation("Prompt cannot be empty"));
        }
        if params.prompt.len() > 1_000_000 {
            return Err(MatchError::validation("Prompt is too long (max 1MB)"));
        }
        if let Some(temp) = params.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(MatchError::validation(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    temp
                )));
            }
        }
        if let Some(max_tokens) = params.max_tokens {
            if max_tokens == 0 || max_tokens > MAX_COMPLETION_TOKENS {
                return Err(MatchError::validation(format!(
                    "max_tokens must be between 1 and {}, got {}",
                    MAX_COMPLETION_TOKENS, max_tokens
                )));
            }
        }

        let text = match self.backend {
            CompletionBackend::Ollama => self.generate_ollama(params).await?,
            CompletionBackend::LlamaCpp => self.generate_llama_cpp(params).await?,
            CompletionBackend::LocalAI => self.generate_local_ai(params).await?,
            CompletionBackend::TextGenWebUI => self.generate_text_gen_webui(params).await?,
        };

        if text.len() > MAX_RESPONSE_SIZE {
            return Err(MatchError::extraction(format!(
                "Response text too large: {} bytes (max {} bytes)",
                text.len(),
                MAX_RESPONSE_SIZE
            )));
        }
        Ok(text)
    }

    /// POST a JSON body and check the status
    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let backend = self.backend.as_str();

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MatchError::extraction(format!(
                        "{} request timed out after {:?}",
                        backend, self.timeout
                    ))
                } else {
                    MatchError::extraction(format!(
                        "{} API request failed: {}. Check if the server is running at {}",
                        backend, e, self.base_url
                    ))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
            return Err(MatchError::extraction(format!(
                "{} API returned error status {}: {}",
                backend, status, error_text
            )));
        }

        let content_length = response.content_length().unwrap_or(0) as usize;
        if content_length > MAX_RESPONSE_SIZE {
            return Err(MatchError::extraction(format!(
                "Response too large: {} bytes (max {} bytes)",
                content_length, MAX_RESPONSE_SIZE
            )));
        }

        Ok(response)
    }

    async fn read_json(&self, response: Response) -> Result<serde_json::Value> {
        response.json().await.map_err(|e| {
            MatchError::extraction(format!(
                "Failed to parse {} response: {}. Response may be malformed.",
                self.backend.as_str(),
                e
            ))
        })
    }

    /// Generate using Ollama
    async fn generate_ollama(&self, params: GenerateParams) -> Result<String> {
        let request = OllamaRequest {
            model: self.default_model.clone(),
            prompt: params.prompt,
            stream: true,
            options: Some(OllamaOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens,
            }),
        };

        let mut resp = self.post_json("/api/generate", &request).await?;

        let mut stream = OllamaStream::default();
        loop {
            let chunk = resp.chunk().await.map_err(|e| {
                MatchError::extraction(format!("Ollama stream interrupted: {}", e))
            })?;
            let Some(chunk) = chunk else { break };
            stream.push(&chunk)?;
            if stream.text.len() > MAX_RESPONSE_SIZE {
                return Err(MatchError::extraction(format!(
                    "Response text too large: {} bytes (max {} bytes)",
                    stream.text.len(),
                    MAX_RESPONSE_SIZE
                )));
            }
            if stream.done {
                break;
            }
        }

        stream.finish()
    }

    /// Generate using llama.cpp HTTP server
    async fn generate_llama_cpp(&self, params: GenerateParams) -> Result<String> {
        let request = serde_json::json!({
            "prompt": params.prompt,
            "n_predict": params.max_tokens.unwrap_or(512),
            "temperature": params.temperature.unwrap_or(0.7),
        });

        let response = self.post_json("/completion", &request).await?;
        let json = self.read_json(response).await?;
        parse_llama_cpp_body(&json)
    }

    /// Generate using LocalAI
    async fn generate_local_ai(&self, params: GenerateParams) -> Result<String> {
        let request = serde_json::json!({
            "model": self.default_model.clone(),
            "prompt": params.prompt,
            "max_tokens": params.max_tokens.unwrap_or(512),
            "temperature": params.temperature.unwrap_or(0.7),
        });

        let response = self.post_json("/v1/completions", &request).await?;
        let json = self.read_json(response).await?;
        parse_first_text(&json, "choices", "LocalAI")
    }

    /// Generate using Text generation web UI
    async fn generate_text_gen_webui(&self, params: GenerateParams) -> Result<String> {
        let request = serde_json::json!({
            "prompt": params.prompt,
            "max_new_tokens": params.max_tokens.unwrap_or(512),
            "temperature": params.temperature.unwrap_or(0.7),
        });

        let response = self.post_json("/api/v1/generate", &request).await?;
        let json = self.read_json(response).await?;
        parse_first_text(&json, "results", "Text generation web UI")
    }
}

/// Incremental assembler for Ollama's newline-delimited JSON stream
#[derive(Default)]
struct OllamaStream {
    /// Bytes of an unfinished line; may end inside a UTF-8 sequence
    buffer: Vec<u8>,
    text: String,
    done: bool,
}

impl OllamaStream {
    fn push(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.consume_line(&String::from_utf8_lossy(&line))?;
        }
        Ok(())
    }

    fn consume_line(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        match serde_json::from_str::<OllamaChunk>(line) {
            Ok(chunk) => {
                if let Some(error) = chunk.error {
                    return Err(MatchError::extraction(format!("Ollama error: {}", error)));
                }
                self.text.push_str(&chunk.response);
                self.done |= chunk.done;
            }
            Err(e) => tracing::debug!("Skipping unparseable Ollama stream line: {}", e),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<String> {
        let tail = std::mem::take(&mut self.buffer);
        self.consume_line(&String::from_utf8_lossy(&tail))?;
        Ok(self.text)
    }
}

fn describe(json: &serde_json::Value) -> String {
    serde_json::to_string(json).unwrap_or_else(|_| "invalid JSON".to_string())
}

fn parse_llama_cpp_body(json: &serde_json::Value) -> Result<String> {
    let content = json.get("content").ok_or_else(|| {
        MatchError::extraction(format!(
            "Invalid llama.cpp response: missing 'content' field. Response: {}",
            describe(json)
        ))
    })?;

    content.as_str().map(str::to_string).ok_or_else(|| {
        MatchError::extraction(format!(
            "Invalid llama.cpp response: 'content' field is not a string. Got: {:?}",
            content
        ))
    })
}

/// Pull `json[array_key][0].text`, the shape shared by LocalAI and text-generation-webui
fn parse_first_text(json: &serde_json::Value, array_key: &str, backend: &str) -> Result<String> {
    let items = json
        .get(array_key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            MatchError::extraction(format!(
                "Invalid {} response: missing or invalid '{}' array. Response: {}",
                backend,
                array_key,
                describe(json)
            ))
        })?;

    let first = items.first().ok_or_else(|| {
        MatchError::extraction(format!(
            "Invalid {} response: '{}' array is empty",
            backend, array_key
        ))
    })?;

    first
        .get("text")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            MatchError::extraction(format!(
                "Invalid {} response: 'text' field missing or not a string. Item: {:?}",
                backend, first
            ))
        })
}

/// `TextCompletionService` backed by a local model, using fixed sampling settings
pub struct LocalCompletionService {
    client: LocalLLMClient,
    temperature: f32,
    max_tokens: Option<usize>,
}

impl LocalCompletionService {
    pub fn new(client: LocalLLMClient, temperature: f32) -> Self {
        Self {
            client,
            temperature,
            max_tokens: None,
        }
    }

    /// Cap the number of generated tokens
    pub fn with_max_tokens(mut self, max_tokens: Option<usize>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn from_config(config: &CompletionConfig) -> Result<Self> {
        Ok(Self::new(LocalLLMClient::from_config(config)?, config.temperature)
            .with_max_tokens(config.max_tokens))
    }

    fn params(&self, prompt: &str) -> GenerateParams {
        GenerateParams {
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
            ..GenerateParams::new(prompt)
        }
    }
}

#[async_trait]
impl TextCompletionService for LocalCompletionService {
    fn name(&self) -> &str {
        self.client.backend.as_str()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let params = self.params(prompt);
        tracing::debug!(
            backend = self.name(),
            model = %self.client.default_model,
            "Requesting completion"
        );
        self.client.generate(params).await.map_err(|e| match e {
            MatchError::Validation(msg) => MatchError::extraction(msg),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_local_llm_backends() {
        for backend in [
            CompletionBackend::Ollama,
            CompletionBackend::LlamaCpp,
            CompletionBackend::LocalAI,
            CompletionBackend::TextGenWebUI,
        ] {
            let client = LocalLLMClient::new(backend, None, "gemma2", Duration::from_secs(5))
                .expect("Should create client");
            assert_eq!(client.base_url(), backend.default_url());
        }
    }

    #[test]
    fn test_invalid_construction_is_configuration_error() {
        let err = LocalLLMClient::new(
            CompletionBackend::Ollama,
            Some("ftp://example.com".to_string()),
            "gemma2",
            Duration::from_secs(5),
        )
        .err()
        .unwrap();
        assert!(matches!(err, MatchError::Configuration(_)));

        let err = LocalLLMClient::new(
            CompletionBackend::Ollama,
            None,
            "bad\nmodel",
            Duration::from_secs(5),
        )
        .err()
        .unwrap();
        assert!(matches!(err, MatchError::Configuration(_)));
    }

    #[test]
    fn test_configured_max_tokens_reach_requests() {
        let config = CompletionConfig {
            max_tokens: Some(128),
            ..CompletionConfig::default()
        };
        let service = LocalCompletionService::from_config(&config).unwrap();
        let params = service.params("Tag this idea");
        assert_eq!(params.max_tokens, Some(128));
        assert_eq!(params.temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_out_of_range_max_tokens_is_extraction_error() {
        let client = LocalLLMClient::new(
            CompletionBackend::LlamaCpp,
            Some("http://127.0.0.1:9".to_string()),
            "gemma2",
            Duration::from_secs(2),
        )
        .unwrap();
        let service = LocalCompletionService::new(client, 0.2).with_max_tokens(Some(0));
        let err = service.complete("Tag this idea").await.unwrap_err();
        assert!(matches!(err, MatchError::Extraction(_)));
        assert!(err.to_string().contains("max_tokens"));
    }

    #[test]
    fn test_ollama_stream_assembles_split_lines() {
        let mut stream = OllamaStream::default();
        stream.push(b"{\"response\":\"{\\\"dom\",\"done\":false}\n{\"resp").unwrap();
        stream.push(b"onse\":\"ain\\\"\",\"done\":false}\n").unwrap();
        stream.push(b"{\"response\":\"\",\"done\":true}").unwrap();
        assert!(!stream.done);
        assert_eq!(stream.finish().unwrap(), "{\"domain\"");
    }

    #[test]
    fn test_ollama_stream_keeps_split_utf8() {
        let line = "{\"response\":\"Café\",\"done\":true}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut stream = OllamaStream::default();
        stream.push(&line[..split]).unwrap();
        stream.push(&line[split..]).unwrap();
        assert!(stream.done);
        assert_eq!(stream.finish().unwrap(), "Café");
    }

    #[test]
    fn test_ollama_stream_surfaces_backend_error() {
        let mut stream = OllamaStream::default();
        let err = stream
            .push(b"{\"error\":\"model 'gemma2' not found\"}\n")
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_parse_llama_cpp_body() {
        assert_eq!(
            parse_llama_cpp_body(&json!({"content": "hello"})).unwrap(),
            "hello"
        );
        assert!(parse_llama_cpp_body(&json!({"text": "hello"})).is_err());
        assert!(parse_llama_cpp_body(&json!({"content": 3})).is_err());
    }

    #[test]
    fn test_parse_first_text() {
        let body = json!({"choices": [{"text": "a"}, {"text": "b"}]});
        assert_eq!(parse_first_text(&body, "choices", "LocalAI").unwrap(), "a");
        assert!(parse_first_text(&json!({"choices": []}), "choices", "LocalAI").is_err());
        assert!(parse_first_text(&json!({}), "results", "webui").is_err());
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_network() {
        let client = LocalLLMClient::new(
            CompletionBackend::Ollama,
            None,
            "gemma2",
            Duration::from_secs(5),
        )
        .unwrap();
        let err = client.generate(GenerateParams::new("")).await.unwrap_err();
        assert!(matches!(err, MatchError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_extraction_error() {
        let client = LocalLLMClient::new(
            CompletionBackend::Ollama,
            Some("http://127.0.0.1:9".to_string()),
            "gemma2",
            Duration::from_secs(2),
        )
        .unwrap();
        let service = LocalCompletionService::new(client, 0.2);
        let err = service.complete("extract tags").await.unwrap_err();
        assert!(matches!(err, MatchError::Extraction(_)));
    }
}
