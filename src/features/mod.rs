//! Feature extraction and encoding
//!
//! Converts raw match records into model-ready features.

pub mod match_repr;
pub mod team_stats;
pub mod training_set;

pub use match_repr::MatchFeatures;
pub use team_stats::TeamStatVector;
pub use training_set::{TrainingSet, TrainingSetBuilder};
