//! Local model backends
//!
//! Text completion and sentence embeddings served by processes running next
//! to the matcher:
//! - Ollama (llama.cpp wrapper)
//! - llama.cpp HTTP server
//! - LocalAI
//! - Text generation web UI
//!
//! Both clients implement the capability traits from `foundermatch-core`, so
//! the matching pipelines never see HTTP.

#![warn(clippy::all)]

use foundermatch_core::{
    CompletionConfig, EmbeddingConfig, EmbeddingService, MatchError, Result,
    TextCompletionService,
};
use reqwest::Client;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub mod completion;
pub mod embedding;

pub use completion::{GenerateParams, LocalCompletionService, LocalLLMClient};
pub use embedding::{known_dimensions, LocalEmbeddingClient};

/// Shared HTTP client for connection pooling to local model servers
static HTTP_CLIENT: OnceLock<Arc<Client>> = OnceLock::new();

/// Get or initialize the shared HTTP client.
///
/// Per-request timeouts are applied by each client; the pool only carries
/// connection-level limits.
fn get_http_client() -> Arc<Client> {
    HTTP_CLIENT
        .get_or_init(|| {
            let client = Client::builder()
                .pool_max_idle_per_host(8)
                .pool_idle_timeout(Duration::from_secs(300))
                .tcp_keepalive(Duration::from_secs(60))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|e| {
                    tracing::warn!("Falling back to default HTTP client: {}", e);
                    Client::new()
                });
            Arc::new(client)
        })
        .clone()
}

/// Validate a backend base URL
pub fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(MatchError::configuration("Base URL cannot be empty"));
    }

    if url.len() > 2048 {
        return Err(MatchError::configuration(
            "URL is too long (max 2048 characters)",
        ));
    }

    let parsed = url::Url::parse(url).map_err(|e| {
        MatchError::configuration(format!("Invalid URL format: '{}': {}", url, e))
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(MatchError::configuration(format!(
            "Invalid URL format: '{}'. Must start with http:// or https://",
            url
        )));
    }

    Ok(())
}

/// Validate model name (basic sanitization)
pub fn validate_model_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MatchError::configuration("Model name cannot be empty"));
    }

    if name.len() > 256 {
        return Err(MatchError::configuration(
            "Model name is too long (max 256 characters)",
        ));
    }

    if name.contains('\0') || name.contains('\n') || name.contains('\r') {
        return Err(MatchError::configuration(
            "Model name contains invalid characters",
        ));
    }

    Ok(())
}

/// Build the completion service described by the config
pub fn completion_service(config: &CompletionConfig) -> Result<Arc<dyn TextCompletionService>> {
    let service = LocalCompletionService::from_config(config)?;
    tracing::info!(
        "Completion backend: {} (model {})",
        config.backend.as_str(),
        config.model
    );
    Ok(Arc::new(service))
}

/// Build the embedding service described by the config
pub fn embedding_service(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingService>> {
    let client = LocalEmbeddingClient::from_config(config)?;
    tracing::info!(
        "Embedding backend: {:?} (model {}, dimensions {:?})",
        config.backend,
        config.model,
        client.dimensions()
    );
    Ok(Arc::new(client))
}
