//! Match results

use super::{ExtractedTags, InvestorRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One ranked investor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEntry {
    /// Offset into the catalog the record came from
    pub row_index: usize,
    pub investor: InvestorRecord,
    /// Present for similarity search, absent for tag filtering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

/// Ordered matches, capped at k
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub entries: Vec<MatchEntry>,
}

impl MatchResult {
    pub fn new(entries: Vec<MatchEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchEntry> {
        self.entries.iter()
    }

    /// Catalog rows in result order
    pub fn row_indices(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.row_index).collect()
    }
}

impl IntoIterator for MatchResult {
    type Item = MatchEntry;
    type IntoIter = std::vec::IntoIter<MatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Which pipeline produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// LLM tag extraction followed by substring filtering
    Tags,
    /// Sentence embedding followed by nearest-neighbor search
    Embedding,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Tags => write!(f, "tags"),
            StrategyKind::Embedding => write!(f, "embedding"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = crate::MatchError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tags" | "tag" | "filter" => Ok(StrategyKind::Tags),
            "embedding" | "embeddings" | "semantic" => Ok(StrategyKind::Embedding),
            other => Err(crate::MatchError::validation(format!(
                "Unknown strategy '{}'. Expected 'tags' or 'embedding'",
                other
            ))),
        }
    }
}

/// Everything a strategy hands back to the caller for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub strategy: StrategyKind,
    /// Set when the strategy extracted tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<ExtractedTags>,
    pub result: MatchResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_kind_round_trip() {
        for kind in [StrategyKind::Tags, StrategyKind::Embedding] {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
        }
        assert!("hybrid".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_distance_omitted_from_json_when_absent() {
        let entry = MatchEntry {
            row_index: 0,
            investor: InvestorRecord {
                name: "A".to_string(),
                investor_type: "Angel".to_string(),
                investment_thesis: None,
                stage_of_investment: None,
                countries_of_investment: None,
                cheque_min: None,
                cheque_max: None,
            },
            distance: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("distance").is_none());
    }
}
