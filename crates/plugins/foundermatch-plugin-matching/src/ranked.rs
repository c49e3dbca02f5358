//! Embedding search over the investor index

use foundermatch_core::{MatchEntry, MatchError, MatchResult, Result, DEFAULT_TOP_K};
use foundermatch_storage_catalog::InvestorCatalog;
use foundermatch_storage_vector::VectorIndex;
use std::sync::Arc;
use tracing::debug;

use crate::EmbeddingEncoder;

/// Encodes an idea and returns the `k` closest investors with distances
pub struct RankedMatcher {
    encoder: EmbeddingEncoder,
    index: Arc<VectorIndex>,
    catalog: Arc<InvestorCatalog>,
    k: usize,
}

impl RankedMatcher {
    pub fn new(
        encoder: EmbeddingEncoder,
        index: Arc<VectorIndex>,
        catalog: Arc<InvestorCatalog>,
    ) -> Self {
        Self {
            encoder,
            index,
            catalog,
            k: DEFAULT_TOP_K,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Encode then search. Encoding and dimension errors pass through as-is.
    pub async fn find(&self, idea: &str) -> Result<MatchResult> {
        let query = self.encoder.encode(idea).await?;
        let neighbors = self.index.search(&query, self.k)?;

        let entries = neighbors
            .into_iter()
            .map(|neighbor| {
                let investor = self.catalog.get(neighbor.row_index).ok_or_else(|| {
                    MatchError::configuration(format!(
                        "Index row {} has no catalog record ({} rows loaded)",
                        neighbor.row_index,
                        self.catalog.len()
                    ))
                })?;
                Ok(MatchEntry {
                    row_index: neighbor.row_index,
                    investor: investor.clone(),
                    distance: Some(neighbor.distance),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Embedding search returned {} of {} investors (k {})",
            entries.len(),
            self.index.len(),
            self.k
        );
        Ok(MatchResult::new(entries))
    }
}
