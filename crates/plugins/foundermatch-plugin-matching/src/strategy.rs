//! The two selectable matching pipelines
//!
//! Each pipeline is a `MatchStrategy`; callers pick one per query. A combined
//! pipeline would be a third implementation, not a change to these.

use async_trait::async_trait;
use foundermatch_core::{MatchReport, MatchStrategy, Result, StrategyKind};
use foundermatch_storage_catalog::InvestorCatalog;
use std::sync::Arc;
use tracing::info;

use crate::{FilterMatcher, RankedMatcher, TagExtractor};

/// LLM tag extraction followed by substring filtering
pub struct TagFilterStrategy {
    extractor: TagExtractor,
    matcher: FilterMatcher,
    catalog: Arc<InvestorCatalog>,
}

impl TagFilterStrategy {
    pub fn new(
        extractor: TagExtractor,
        matcher: FilterMatcher,
        catalog: Arc<InvestorCatalog>,
    ) -> Self {
        Self {
            extractor,
            matcher,
            catalog,
        }
    }
}

#[async_trait]
impl MatchStrategy for TagFilterStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Tags
    }

    async fn find_matches(&self, idea: &str) -> Result<MatchReport> {
        let tags = self.extractor.extract(idea).await?;
        let result = self.matcher.filter(&self.catalog, &tags)?;
        info!(strategy = %self.kind(), matches = result.len(), "Query finished");

        Ok(MatchReport {
            strategy: self.kind(),
            tags: Some(tags),
            result,
        })
    }
}

/// Sentence embedding followed by nearest-neighbor search
pub struct EmbeddingSearchStrategy {
    matcher: RankedMatcher,
}

impl EmbeddingSearchStrategy {
    pub fn new(matcher: RankedMatcher) -> Self {
        Self { matcher }
    }
}

#[async_trait]
impl MatchStrategy for EmbeddingSearchStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Embedding
    }

    async fn find_matches(&self, idea: &str) -> Result<MatchReport> {
        let result = self.matcher.find(idea).await?;
        info!(strategy = %self.kind(), matches = result.len(), "Query finished");

        Ok(MatchReport {
            strategy: self.kind(),
            tags: None,
            result,
        })
    }
}
