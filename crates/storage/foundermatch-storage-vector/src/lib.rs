//! Investor Vector Index
//!
//! Holds one precomputed embedding per catalog row and answers k-nearest
//! neighbor queries. Row `i` of the index is row `i` of the catalog.
//!
//! # Features
//! - Exact brute-force search (default) or HNSW lookup with exact re-scoring
//! - Squared-L2 or cosine distance, pinned by the index file
//! - Deterministic ordering: ascending distance, ties by ascending row
//! - bincode persistence with dimension metadata

mod file;
mod index;

pub use file::{IndexFile, FORMAT_VERSION};
pub use index::{Neighbor, VectorIndex};

use serde::{Deserialize, Serialize};

/// Distance used to rank rows; lower is closer for every metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Sum of squared component differences
    #[default]
    SquaredL2,
    /// `1 - cosine similarity`, in `[0, 2]`
    Cosine,
}

impl DistanceMetric {
    /// Distance between two equal-length vectors
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::SquaredL2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = x - y;
                    d * d
                })
                .sum(),
            DistanceMetric::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (norm_a * norm_b)
                }
            }
        }
    }
}

/// Statistics about a loaded index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vectors: usize,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub model: Option<String>,
    pub index_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_l2() {
        let d = DistanceMetric::SquaredL2.distance(&[1.0, 2.0], &[4.0, 6.0]);
        assert_eq!(d, 25.0);
    }

    #[test]
    fn test_cosine() {
        let same = DistanceMetric::Cosine.distance(&[1.0, 0.0], &[2.0, 0.0]);
        let orthogonal = DistanceMetric::Cosine.distance(&[1.0, 0.0], &[0.0, 3.0]);
        let zero = DistanceMetric::Cosine.distance(&[0.0, 0.0], &[1.0, 0.0]);
        assert!(same.abs() < 1e-6);
        assert!((orthogonal - 1.0).abs() < 1e-6);
        assert_eq!(zero, 1.0);
    }
}
