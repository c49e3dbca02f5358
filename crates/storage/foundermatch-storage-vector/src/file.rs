//! Persisted index format
//!
//! A single bincode document: header fields followed by one vector per
//! catalog row, in catalog row order.

use foundermatch_core::{MatchError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::DistanceMetric;

/// Tag at the start of every index file
const MAGIC: u32 = 0x464D_4958;

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// On-disk representation of a vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexFile {
    magic: u32,
    pub format_version: u32,
    /// Length of every stored vector
    pub dimension: usize,
    /// Metric the vectors were built for
    pub metric: DistanceMetric,
    /// Embedding model that produced the vectors, if recorded
    pub model: Option<String>,
    /// One vector per catalog row
    pub vectors: Vec<Vec<f32>>,
}

impl IndexFile {
    /// Create an index file, checking every vector against `dimension`
    pub fn new(
        dimension: usize,
        metric: DistanceMetric,
        model: Option<String>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        let file = Self {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
            dimension,
            metric,
            model,
            vectors,
        };
        file.validate()?;
        Ok(file)
    }

    /// Number of stored rows
    pub fn rows(&self) -> usize {
        self.vectors.len()
    }

    /// Reject files the index cannot serve from
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(MatchError::configuration(
                "Not a foundermatch index file (bad magic number)",
            ));
        }
        if self.format_version != FORMAT_VERSION {
            return Err(MatchError::configuration(format!(
                "Unsupported index format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        if self.dimension == 0 {
            return Err(MatchError::configuration("Index dimension must be non-zero"));
        }
        for (row, vector) in self.vectors.iter().enumerate() {
            if vector.len() != self.dimension {
                return Err(MatchError::configuration(format!(
                    "Index row {} has {} dimensions, header declares {}",
                    row,
                    vector.len(),
                    self.dimension
                )));
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(MatchError::configuration(format!(
                    "Index row {} contains a non-finite value",
                    row
                )));
            }
        }
        Ok(())
    }

    /// Write the file to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = bincode::serialize(self).map_err(|e| {
            MatchError::configuration(format!("Failed to serialize index: {}", e))
        })?;
        fs::write(path, bytes)?;
        info!(
            "Vector index saved to {:?} ({} rows, {} dimensions)",
            path,
            self.rows(),
            self.dimension
        );
        Ok(())
    }

    /// Read and validate a file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            MatchError::configuration(format!(
                "Failed to read index file {}: {}",
                path.display(),
                e
            ))
        })?;
        let file: Self = bincode::deserialize(&bytes).map_err(|e| {
            MatchError::configuration(format!(
                "Failed to decode index file {}: {}",
                path.display(),
                e
            ))
        })?;
        file.validate()?;
        Ok(file)
    }
}
