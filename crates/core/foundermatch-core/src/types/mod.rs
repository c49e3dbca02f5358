//! Core data types shared by every foundermatch crate

pub mod investor;
pub mod matching;
pub mod tags;

pub use investor::InvestorRecord;
pub use matching::{MatchEntry, MatchReport, MatchResult, StrategyKind};
pub use tags::ExtractedTags;

/// Dense embedding produced by a sentence-embedding model
pub type EmbeddingVector = Vec<f32>;
