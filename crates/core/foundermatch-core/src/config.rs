//! Configuration management and environment variable loading

use crate::{MatchError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default number of investors returned by either strategy
pub const DEFAULT_TOP_K: usize = 5;

/// Load environment variables from a .env file in the current directory
/// or a parent directory. A missing file is not an error.
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(MatchError::configuration(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::debug!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(MatchError::configuration(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

/// Load environment variables from a specific file
pub fn load_env_from_path<P: AsRef<Path>>(path: P) -> Result<()> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(_) => {
            tracing::info!("Loaded environment from: {}", path.as_ref().display());
            Ok(())
        }
        Err(e) => Err(MatchError::configuration(format!(
            "Failed to load {} environment file: {}",
            path.as_ref().display(),
            e
        ))),
    }
}

/// Get optional environment variable with default
pub fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get environment variable as integer
pub fn get_env_int<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Get environment variable as float
pub fn get_env_float(key: &str, default: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(default)
}

/// Parse an enum-valued environment variable, failing on unknown values
fn get_env_parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr<Err = MatchError>,
{
    match env::var(key) {
        Ok(v) => v.parse(),
        Err(_) => Ok(default),
    }
}

/// Parse an optional numeric environment variable; a malformed value is an error
fn get_env_optional<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v.trim().parse().map(Some).map_err(|e| {
            MatchError::configuration(format!("Invalid value '{}' for {}: {}", v, key, e))
        }),
        Err(_) => Ok(None),
    }
}

/// Text-completion backend served locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionBackend {
    /// Ollama (https://ollama.ai)
    Ollama,
    /// llama.cpp HTTP server
    LlamaCpp,
    /// LocalAI (https://localai.io)
    LocalAI,
    /// Text generation web UI
    TextGenWebUI,
}

impl CompletionBackend {
    /// Default base URL for the backend
    pub fn default_url(&self) -> &'static str {
        match self {
            CompletionBackend::Ollama => "http://localhost:11434",
            CompletionBackend::LlamaCpp => "http://localhost:8080",
            CompletionBackend::LocalAI => "http://localhost:8080",
            CompletionBackend::TextGenWebUI => "http://localhost:5000",
        }
    }

    /// Short name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionBackend::Ollama => "ollama",
            CompletionBackend::LlamaCpp => "llama.cpp",
            CompletionBackend::LocalAI => "localai",
            CompletionBackend::TextGenWebUI => "textgenwebui",
        }
    }
}

impl FromStr for CompletionBackend {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(CompletionBackend::Ollama),
            "llamacpp" | "llama.cpp" | "llama-cpp" => Ok(CompletionBackend::LlamaCpp),
            "localai" => Ok(CompletionBackend::LocalAI),
            "textgen" | "textgenwebui" | "text-generation-webui" => {
                Ok(CompletionBackend::TextGenWebUI)
            }
            other => Err(MatchError::configuration(format!(
                "Unknown completion backend '{}'. Expected one of: ollama, llamacpp, localai, textgen",
                other
            ))),
        }
    }
}

/// Embedding backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Ollama `/api/embeddings`
    Ollama,
    /// Any server exposing an OpenAI-compatible `/v1/embeddings` route
    OpenAiCompatible,
}

impl FromStr for EmbeddingBackend {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(EmbeddingBackend::Ollama),
            "openai" | "openai-compatible" | "localai" => Ok(EmbeddingBackend::OpenAiCompatible),
            other => Err(MatchError::configuration(format!(
                "Unknown embedding backend '{}'. Expected one of: ollama, openai",
                other
            ))),
        }
    }
}

/// Nearest-neighbor search backend used by the vector index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// Brute-force scan over every row
    #[default]
    Exact,
    /// HNSW graph lookup, re-scored exactly
    Hnsw,
}

impl FromStr for SearchBackend {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "exact" | "flat" => Ok(SearchBackend::Exact),
            "hnsw" => Ok(SearchBackend::Hnsw),
            other => Err(MatchError::configuration(format!(
                "Unknown search backend '{}'. Expected one of: exact, hnsw",
                other
            ))),
        }
    }
}

/// Largest generation budget accepted for a completion
pub const MAX_COMPLETION_TOKENS: usize = 32768;

/// Settings for the language-model backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub backend: CompletionBackend,
    /// Base URL; `None` selects the backend's default port
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    /// Generation budget; `None` leaves the backend's own default
    pub max_tokens: Option<usize>,
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            backend: CompletionBackend::Ollama,
            base_url: None,
            model: "gemma2".to_string(),
            temperature: 0.2,
            max_tokens: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Settings for the embedding backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Process-wide matcher configuration, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Catalog CSV file
    pub catalog_path: PathBuf,
    /// Persisted vector index, one vector per catalog row
    pub index_path: PathBuf,
    pub completion: CompletionConfig,
    pub embedding: EmbeddingConfig,
    /// Result cap for both strategies
    pub top_k: usize,
    pub search_backend: SearchBackend,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("investor_data.csv"),
            index_path: PathBuf::from("investor_index.bin"),
            completion: CompletionConfig::default(),
            embedding: EmbeddingConfig::default(),
            top_k: DEFAULT_TOP_K,
            search_backend: SearchBackend::Exact,
        }
    }
}

impl MatcherConfig {
    /// Build the configuration from `FOUNDERMATCH_*` environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let timeout = Duration::from_secs(get_env_int("FOUNDERMATCH_TIMEOUT_SECS", 60u64));

        let config = Self {
            catalog_path: PathBuf::from(get_env_or(
                "FOUNDERMATCH_CATALOG_PATH",
                &defaults.catalog_path.to_string_lossy(),
            )),
            index_path: PathBuf::from(get_env_or(
                "FOUNDERMATCH_INDEX_PATH",
                &defaults.index_path.to_string_lossy(),
            )),
            completion: CompletionConfig {
                backend: get_env_parsed("FOUNDERMATCH_LLM_BACKEND", CompletionBackend::Ollama)?,
                base_url: env::var("FOUNDERMATCH_LLM_URL").ok(),
                model: get_env_or("FOUNDERMATCH_LLM_MODEL", &defaults.completion.model),
                temperature: get_env_float(
                    "FOUNDERMATCH_LLM_TEMPERATURE",
                    defaults.completion.temperature,
                ),
                max_tokens: get_env_optional("FOUNDERMATCH_LLM_MAX_TOKENS")?,
                timeout,
            },
            embedding: EmbeddingConfig {
                backend: get_env_parsed("FOUNDERMATCH_EMBED_BACKEND", EmbeddingBackend::Ollama)?,
                base_url: get_env_or("FOUNDERMATCH_EMBED_URL", &defaults.embedding.base_url),
                model: get_env_or("FOUNDERMATCH_EMBED_MODEL", &defaults.embedding.model),
                timeout,
            },
            top_k: get_env_int("FOUNDERMATCH_TOP_K", DEFAULT_TOP_K),
            search_backend: get_env_parsed("FOUNDERMATCH_SEARCH_BACKEND", SearchBackend::Exact)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the matcher cannot serve with
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(MatchError::configuration("top_k must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(MatchError::configuration(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.completion.temperature
            )));
        }
        if let Some(max_tokens) = self.completion.max_tokens {
            if max_tokens == 0 || max_tokens > MAX_COMPLETION_TOKENS {
                return Err(MatchError::configuration(format!(
                    "max_tokens must be between 1 and {}, got {}",
                    MAX_COMPLETION_TOKENS, max_tokens
                )));
            }
        }
        if self.completion.timeout.is_zero() || self.embedding.timeout.is_zero() {
            return Err(MatchError::configuration("Backend timeout must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_int() {
        env::set_var("FM_TEST_INT", "42");
        assert_eq!(get_env_int("FM_TEST_INT", 0), 42);
        assert_eq!(get_env_int("FM_NONEXISTENT", 99), 99);
        env::remove_var("FM_TEST_INT");
    }

    #[test]
    fn test_get_env_or() {
        env::set_var("FM_TEST_STRING", "hello");
        assert_eq!(get_env_or("FM_TEST_STRING", "default"), "hello");
        assert_eq!(get_env_or("FM_NONEXISTENT", "default"), "default");
        env::remove_var("FM_TEST_STRING");
    }

    #[test]
    fn test_load_env_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("matcher.env");
        std::fs::write(&path, "FM_TEST_FROM_FILE=loaded\n").unwrap();

        load_env_from_path(&path).unwrap();
        assert_eq!(get_env_or("FM_TEST_FROM_FILE", "missing"), "loaded");
        env::remove_var("FM_TEST_FROM_FILE");

        let err = load_env_from_path(dir.path().join("absent.env")).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!(
            "Ollama".parse::<CompletionBackend>().unwrap(),
            CompletionBackend::Ollama
        );
        assert_eq!(
            "llama.cpp".parse::<CompletionBackend>().unwrap(),
            CompletionBackend::LlamaCpp
        );
        assert_eq!(
            "openai".parse::<EmbeddingBackend>().unwrap(),
            EmbeddingBackend::OpenAiCompatible
        );
        assert_eq!("hnsw".parse::<SearchBackend>().unwrap(), SearchBackend::Hnsw);
        assert!("gpt".parse::<CompletionBackend>().is_err());
    }

    #[test]
    fn test_defaults_follow_reference_setup() {
        let config = MatcherConfig::default();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.completion.model, "gemma2");
        assert_eq!(config.completion.temperature, 0.2);
        assert_eq!(config.search_backend, SearchBackend::Exact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_k() {
        let config = MatcherConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MatchError::Configuration(_))
        ));
    }

    const MATCHER_VARS: [&str; 13] = [
        "FOUNDERMATCH_CATALOG_PATH",
        "FOUNDERMATCH_INDEX_PATH",
        "FOUNDERMATCH_LLM_BACKEND",
        "FOUNDERMATCH_LLM_URL",
        "FOUNDERMATCH_LLM_MODEL",
        "FOUNDERMATCH_LLM_TEMPERATURE",
        "FOUNDERMATCH_LLM_MAX_TOKENS",
        "FOUNDERMATCH_EMBED_BACKEND",
        "FOUNDERMATCH_EMBED_URL",
        "FOUNDERMATCH_EMBED_MODEL",
        "FOUNDERMATCH_TOP_K",
        "FOUNDERMATCH_TIMEOUT_SECS",
        "FOUNDERMATCH_SEARCH_BACKEND",
    ];

    fn clear_matcher_vars() {
        for key in MATCHER_VARS {
            env::remove_var(key);
        }
    }

    fn expect_configuration_error(key: &str, value: &str) {
        clear_matcher_vars();
        env::set_var(key, value);
        let err = MatcherConfig::from_env().unwrap_err();
        assert!(
            matches!(err, MatchError::Configuration(_)),
            "{}={} gave {:?}",
            key,
            value,
            err
        );
    }

    // One test owns every FOUNDERMATCH_* variable so parallel tests never race on them
    #[test]
    fn test_matcher_config_from_env() {
        clear_matcher_vars();
        let config = MatcherConfig::from_env().unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("investor_data.csv"));
        assert_eq!(config.index_path, PathBuf::from("investor_index.bin"));
        assert_eq!(config.completion.backend, CompletionBackend::Ollama);
        assert_eq!(config.completion.base_url, None);
        assert_eq!(config.completion.max_tokens, None);
        assert_eq!(config.embedding.model, "all-minilm");
        assert_eq!(config.top_k, DEFAULT_TOP_K);
        assert_eq!(config.search_backend, SearchBackend::Exact);
        assert_eq!(config.completion.timeout, Duration::from_secs(60));

        env::set_var("FOUNDERMATCH_CATALOG_PATH", "/data/investors.csv");
        env::set_var("FOUNDERMATCH_LLM_BACKEND", "llamacpp");
        env::set_var("FOUNDERMATCH_LLM_URL", "http://gpu-box:8080");
        env::set_var("FOUNDERMATCH_LLM_MAX_TOKENS", "256");
        env::set_var("FOUNDERMATCH_EMBED_BACKEND", "openai");
        env::set_var("FOUNDERMATCH_TOP_K", "3");
        env::set_var("FOUNDERMATCH_TIMEOUT_SECS", "15");
        env::set_var("FOUNDERMATCH_SEARCH_BACKEND", "hnsw");
        let config = MatcherConfig::from_env().unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("/data/investors.csv"));
        assert_eq!(config.completion.backend, CompletionBackend::LlamaCpp);
        assert_eq!(config.completion.base_url.as_deref(), Some("http://gpu-box:8080"));
        assert_eq!(config.completion.max_tokens, Some(256));
        assert_eq!(config.embedding.backend, EmbeddingBackend::OpenAiCompatible);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.embedding.timeout, Duration::from_secs(15));
        assert_eq!(config.search_backend, SearchBackend::Hnsw);

        expect_configuration_error("FOUNDERMATCH_LLM_BACKEND", "gpt-cloud");
        expect_configuration_error("FOUNDERMATCH_EMBED_BACKEND", "word2vec");
        expect_configuration_error("FOUNDERMATCH_SEARCH_BACKEND", "annoy");
        expect_configuration_error("FOUNDERMATCH_TOP_K", "0");
        expect_configuration_error("FOUNDERMATCH_LLM_TEMPERATURE", "3.5");
        expect_configuration_error("FOUNDERMATCH_LLM_MAX_TOKENS", "0");
        expect_configuration_error("FOUNDERMATCH_LLM_MAX_TOKENS", "lots");
        expect_configuration_error("FOUNDERMATCH_TIMEOUT_SECS", "0");

        clear_matcher_vars();
    }
}
