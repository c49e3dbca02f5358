//! Investor Matching
//!
//! Two independent pipelines from a free-text startup idea to a shortlist:
//!
//! - **Tags**: a language model extracts domain/stage/region, then catalog
//!   records are kept when their thesis, stage and countries contain those
//!   tags. Catalog order, capped at k, no distances.
//! - **Embedding**: the idea is embedded and the k nearest catalog rows are
//!   returned by ascending distance.
//!
//! [`MatchContext`] loads the catalog and index once at startup and hands out
//! either pipeline as a [`MatchStrategy`](foundermatch_core::MatchStrategy).

#![warn(clippy::all)]

pub mod context;
pub mod encoder;
pub mod extractor;
pub mod filter;
pub mod ranked;
pub mod strategy;

pub use context::MatchContext;
pub use encoder::EmbeddingEncoder;
pub use extractor::{parse_tags, TagExtractor};
pub use filter::{FilterMatcher, TagPredicate};
pub use ranked::RankedMatcher;
pub use strategy::{EmbeddingSearchStrategy, TagFilterStrategy};
