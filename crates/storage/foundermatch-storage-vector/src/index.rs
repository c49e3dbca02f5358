//! Read-only vector index
//!
//! Vectors live in a row-major `ndarray` matrix. The exact backend scans every
//! row; the HNSW backend asks the graph for candidates and re-scores them
//! against the matrix, so both backends report identical distances.

use foundermatch_core::{MatchError, Result, SearchBackend};
use hnsw_rs::prelude::*;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, info};

use crate::{DistanceMetric, IndexFile, IndexStats};

/// HNSW M parameter (number of bi-directional links per node)
const HNSW_M: usize = 16;
/// HNSW layer cap
const HNSW_MAX_LAYERS: usize = 16;
/// HNSW ef_construction parameter (search depth during construction)
const HNSW_EF_CONSTRUCTION: usize = 200;
/// Minimum search depth at query time
const HNSW_EF_SEARCH: usize = 64;

/// One search hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Offset into the catalog
    pub row_index: usize,
    pub distance: f32,
}

enum Graph {
    L2(Hnsw<'static, f32, DistL2>),
    Cosine(Hnsw<'static, f32, DistCosine>),
}

impl Graph {
    fn build(matrix: &Array2<f32>, metric: DistanceMetric) -> Self {
        let rows = matrix.nrows().max(1);
        let mut graph = match metric {
            DistanceMetric::SquaredL2 => Graph::L2(Hnsw::new(
                HNSW_M,
                rows,
                HNSW_MAX_LAYERS,
                HNSW_EF_CONSTRUCTION,
                DistL2 {},
            )),
            DistanceMetric::Cosine => Graph::Cosine(Hnsw::new(
                HNSW_M,
                rows,
                HNSW_MAX_LAYERS,
                HNSW_EF_CONSTRUCTION,
                DistCosine {},
            )),
        };
        for (row, vector) in matrix.outer_iter().enumerate() {
            let data = vector.to_vec();
            match &mut graph {
                Graph::L2(h) => h.insert((&data[..], row)),
                Graph::Cosine(h) => h.insert((&data[..], row)),
            }
        }
        graph
    }

    fn candidates(&self, query: &[f32], k: usize) -> Vec<usize> {
        let ef = k.max(HNSW_EF_SEARCH);
        let found = match self {
            Graph::L2(h) => h.search(query, k, ef),
            Graph::Cosine(h) => h.search(query, k, ef),
        };
        found.into_iter().map(|n| n.d_id).collect()
    }
}

/// Read-only nearest-neighbor index over catalog embeddings
pub struct VectorIndex {
    dimension: usize,
    metric: DistanceMetric,
    model: Option<String>,
    /// Row `i` is the embedding of catalog row `i`
    matrix: Array2<f32>,
    backend: SearchBackend,
    graph: Option<Graph>,
}

impl VectorIndex {
    /// Load a persisted index
    pub fn load(path: impl AsRef<Path>, backend: SearchBackend) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading vector index from {:?}", path);
        let index = Self::from_file(IndexFile::load(path)?, backend)?;
        info!(
            "Vector index loaded ({} vectors, dimension {}, {:?}, {:?} search)",
            index.len(),
            index.dimension,
            index.metric,
            index.backend
        );
        Ok(index)
    }

    /// Build from a decoded index file
    pub fn from_file(file: IndexFile, backend: SearchBackend) -> Result<Self> {
        file.validate()?;
        let IndexFile {
            dimension,
            metric,
            model,
            vectors,
            ..
        } = file;
        Self::build(dimension, metric, model, vectors, backend)
    }

    /// Build directly from vectors; all must share one length
    pub fn from_vectors(
        vectors: Vec<Vec<f32>>,
        metric: DistanceMetric,
        backend: SearchBackend,
    ) -> Result<Self> {
        let dimension = vectors.first().map(Vec::len).ok_or_else(|| {
            MatchError::configuration("Cannot infer dimension from an empty vector list")
        })?;
        let file = IndexFile::new(dimension, metric, None, vectors)?;
        Self::from_file(file, backend)
    }

    fn build(
        dimension: usize,
        metric: DistanceMetric,
        model: Option<String>,
        vectors: Vec<Vec<f32>>,
        backend: SearchBackend,
    ) -> Result<Self> {
        let rows = vectors.len();
        let flat: Vec<f32> = vectors.into_iter().flatten().collect();
        let matrix = Array2::from_shape_vec((rows, dimension), flat).map_err(|e| {
            MatchError::configuration(format!("Index vectors do not form a matrix: {}", e))
        })?;

        let graph = match backend {
            SearchBackend::Hnsw if rows > 0 => Some(Graph::build(&matrix, metric)),
            _ => None,
        };

        Ok(Self {
            dimension,
            metric,
            model,
            matrix,
            backend,
            graph,
        })
    }

    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Embedding model recorded in the index file
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Fail unless the index has exactly `rows` vectors.
    ///
    /// Called once at startup against the catalog size.
    pub fn ensure_row_count(&self, rows: usize) -> Result<()> {
        if self.len() != rows {
            return Err(MatchError::configuration(format!(
                "Vector index has {} rows but the catalog has {}; refusing to serve",
                self.len(),
                rows
            )));
        }
        Ok(())
    }

    /// The `min(k, len)` rows closest to `query`, by ascending distance then
    /// ascending row index
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Err(MatchError::validation("k must be at least 1"));
        }
        if query.len() != self.dimension {
            return Err(MatchError::dimension_mismatch(self.dimension, query.len()));
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(MatchError::validation(
                "Query vector contains non-finite values",
            ));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let wanted = k.min(self.len());
        let mut hits = match &self.graph {
            Some(graph) => self.graph_search(graph, query, wanted),
            None => self.scan_all(query),
        };

        hits.sort_by(compare_neighbors);
        hits.dedup_by_key(|n| n.row_index);
        hits.truncate(wanted);
        Ok(hits)
    }

    /// Graph candidates re-scored exactly.
    ///
    /// One candidate beyond `wanted` is requested. Any tied distance among the
    /// candidates means rows outside the candidate set may tie too, and the
    /// graph does not visit rows in index order, so ties are settled by a full
    /// scan.
    fn graph_search(&self, graph: &Graph, query: &[f32], wanted: usize) -> Vec<Neighbor> {
        let probe = (wanted + 1).min(self.len());
        let mut candidates: Vec<Neighbor> = graph
            .candidates(query, probe)
            .into_iter()
            .filter(|&row| row < self.len())
            .map(|row| self.score(row, query))
            .collect();
        candidates.sort_by(compare_neighbors);
        candidates.dedup_by_key(|n| n.row_index);

        if candidates.len() < wanted {
            debug!(
                "HNSW returned {} of {} candidates, falling back to exact scan",
                candidates.len(),
                wanted
            );
            return self.scan_all(query);
        }
        if candidates
            .windows(2)
            .any(|w| w[0].distance == w[1].distance)
        {
            debug!("Tied distances among HNSW candidates, resolving with exact scan");
            return self.scan_all(query);
        }
        candidates
    }

    fn score(&self, row: usize, query: &[f32]) -> Neighbor {
        let vector = self.matrix.row(row);
        let distance = match vector.as_slice() {
            Some(slice) => self.metric.distance(slice, query),
            None => self.metric.distance(&vector.to_vec(), query),
        };
        Neighbor {
            row_index: row,
            distance,
        }
    }

    fn scan_all(&self, query: &[f32]) -> Vec<Neighbor> {
        (0..self.len()).map(|row| self.score(row, query)).collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_vectors: self.len(),
            dimension: self.dimension,
            metric: self.metric,
            model: self.model.clone(),
            index_type: match self.backend {
                SearchBackend::Exact => "Flat".to_string(),
                SearchBackend::Hnsw => "HNSW".to_string(),
            },
        }
    }
}

/// Ascending distance, ties broken by ascending row
fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.row_index.cmp(&b.row_index))
}
