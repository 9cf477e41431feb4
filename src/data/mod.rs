//! Data ingestion and batching
//!
//! CSV record loading and burn datasets for training.

pub mod dataset;
pub mod records;

pub use dataset::{OutcomeBatch, OutcomeBatcher, OutcomeDataset, OutcomeSample, TrainValSplit};
pub use records::RecordSet;
