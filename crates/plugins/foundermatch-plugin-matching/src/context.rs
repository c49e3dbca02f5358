//! Startup wiring
//!
//! Catalog, index and model services are loaded once, checked against each
//! other and then shared read-only by every query.

use foundermatch_core::{
    EmbeddingService, MatchError, MatchStrategy, MatcherConfig, Result, StrategyKind,
    TextCompletionService, DEFAULT_TOP_K,
};
use foundermatch_storage_catalog::InvestorCatalog;
use foundermatch_storage_vector::VectorIndex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    EmbeddingEncoder, EmbeddingSearchStrategy, FilterMatcher, RankedMatcher, TagExtractor,
    TagFilterStrategy,
};

/// Shared, immutable state for serving queries
#[derive(Clone)]
pub struct MatchContext {
    catalog: Arc<InvestorCatalog>,
    index: Arc<VectorIndex>,
    completion: Arc<dyn TextCompletionService>,
    embedding: Arc<dyn EmbeddingService>,
    top_k: usize,
}

impl std::fmt::Debug for MatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchContext")
            .field("catalog_rows", &self.catalog.len())
            .field("index_rows", &self.index.len())
            .field("dimension", &self.index.dimension())
            .field("completion", &self.completion.name())
            .field("embedding", &self.embedding.name())
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl MatchContext {
    /// Load catalog and index from the configured paths.
    ///
    /// Any failure here is a `Configuration` error and the caller must not
    /// serve queries.
    pub fn load(
        config: &MatcherConfig,
        completion: Arc<dyn TextCompletionService>,
        embedding: Arc<dyn EmbeddingService>,
    ) -> Result<Self> {
        config.validate()?;
        let catalog = InvestorCatalog::load(&config.catalog_path)?;
        let index = VectorIndex::load(&config.index_path, config.search_backend)?;
        Self::from_parts(catalog, index, completion, embedding)?.with_top_k(config.top_k)
    }

    /// Assemble from already loaded parts, applying the same checks as `load`
    pub fn from_parts(
        catalog: InvestorCatalog,
        index: VectorIndex,
        completion: Arc<dyn TextCompletionService>,
        embedding: Arc<dyn EmbeddingService>,
    ) -> Result<Self> {
        index.ensure_row_count(catalog.len())?;

        if let Some(dimensions) = embedding.dimensions() {
            if dimensions != index.dimension() {
                return Err(MatchError::configuration(format!(
                    "Embedding backend '{}' produces {} dimensions but the index holds {}",
                    embedding.name(),
                    dimensions,
                    index.dimension()
                )));
            }
        }
        if index.model().is_none() {
            warn!("Vector index does not record its embedding model");
        }

        let stats = index.stats();
        info!(
            vectors = stats.total_vectors,
            dimension = stats.dimension,
            metric = ?stats.metric,
            model = stats.model.as_deref().unwrap_or("unrecorded"),
            index_type = %stats.index_type,
            "Vector index ready"
        );
        info!(
            "Match context ready: {} investors, completion '{}', embedding '{}'",
            catalog.len(),
            completion.name(),
            embedding.name()
        );

        Ok(Self {
            catalog: Arc::new(catalog),
            index: Arc::new(index),
            completion,
            embedding,
            top_k: DEFAULT_TOP_K,
        })
    }

    /// Override the result cap; zero is rejected
    pub fn with_top_k(mut self, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(MatchError::validation("k must be at least 1"));
        }
        self.top_k = top_k;
        Ok(self)
    }

    pub fn catalog(&self) -> &Arc<InvestorCatalog> {
        &self.catalog
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Build the pipeline for `kind`
    pub fn strategy(&self, kind: StrategyKind) -> Result<Arc<dyn MatchStrategy>> {
        let strategy: Arc<dyn MatchStrategy> = match kind {
            StrategyKind::Tags => Arc::new(TagFilterStrategy::new(
                TagExtractor::new(self.completion.clone())?,
                FilterMatcher::new(self.top_k),
                self.catalog.clone(),
            )),
            StrategyKind::Embedding => Arc::new(EmbeddingSearchStrategy::new(
                RankedMatcher::new(
                    EmbeddingEncoder::new(self.embedding.clone()),
                    self.index.clone(),
                    self.catalog.clone(),
                )
                .with_k(self.top_k),
            )),
        };
        Ok(strategy)
    }
}
