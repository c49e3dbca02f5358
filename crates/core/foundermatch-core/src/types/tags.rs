//! Structured tags extracted from a startup idea

use crate::{MatchError, Result};
use serde::{Deserialize, Serialize};

/// Domain, stage and region tags for one query. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTags {
    /// Ordered; only the first entry drives filtering
    pub domain: Vec<String>,
    pub stage: String,
    pub region: String,
}

impl ExtractedTags {
    /// Build tags, enforcing the shape every consumer relies on
    pub fn new(
        domain: Vec<String>,
        stage: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self> {
        let tags = Self {
            domain,
            stage: stage.into(),
            region: region.into(),
        };
        tags.validate()?;
        Ok(tags)
    }

    /// Check that domain is non-empty and no tag is blank
    pub fn validate(&self) -> Result<()> {
        if self.domain.is_empty() {
            return Err(MatchError::extraction("'domain' must contain at least one tag"));
        }
        if self.domain.iter().any(|d| d.trim().is_empty()) {
            return Err(MatchError::extraction("'domain' contains an empty tag"));
        }
        if self.stage.trim().is_empty() {
            return Err(MatchError::extraction("'stage' must be a non-empty string"));
        }
        if self.region.trim().is_empty() {
            return Err(MatchError::extraction("'region' must be a non-empty string"));
        }
        Ok(())
    }

    /// The domain tag used for filtering
    pub fn primary_domain(&self) -> Result<&str> {
        self.domain
            .first()
            .map(String::as_str)
            .ok_or_else(|| MatchError::extraction("'domain' must contain at least one tag"))
    }
}
