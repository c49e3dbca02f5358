//! Foundermatch Core
//!
//! Shared building blocks for matching a free-text startup description to a
//! shortlist of investors:
//!
//! - Investor, tag and match-result types
//! - The `MatchError` taxonomy
//! - Capability traits for the language model, the embedding model and
//!   matching strategies
//! - Environment-driven configuration and logging setup
//! - Prompt templates
//!
//! Catalog and index storage live in the `foundermatch-storage-*` crates; the
//! pipelines themselves live in `foundermatch-plugin-matching`.

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod services;
pub mod templates;
pub mod testing;
pub mod types;
pub mod utils;

pub use config::{
    get_env_float, get_env_int, get_env_or, load_env, load_env_from_path, CompletionBackend,
    CompletionConfig, EmbeddingBackend, EmbeddingConfig, MatcherConfig, SearchBackend,
    DEFAULT_TOP_K, MAX_COMPLETION_TOKENS,
};
pub use error::{MatchError, Result};
pub use services::{EmbeddingService, MatchStrategy, TextCompletionService};
pub use templates::{TemplateEngine, TAG_EXTRACTION_TEMPLATE};
pub use types::{
    EmbeddingVector, ExtractedTags, InvestorRecord, MatchEntry, MatchReport, MatchResult,
    StrategyKind,
};
pub use utils::{contains_ignore_case, init_logging};
