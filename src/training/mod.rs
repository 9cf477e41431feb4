//! Model training
//!
//! Hyperparameter grid, single-trial training loop, parallel search and
//! metrics tracking.

pub mod grid;
pub mod metrics;
pub mod search;
pub mod trial;

pub use grid::{Activation, HyperparameterConfig, HyperparameterGrid};
pub use metrics::{Metrics, TrainingHistory};
pub use search::{select_best, SearchCoordinator, SearchOutcome, SearchReport, TrialOutcome, TrialSummary};
pub use trial::{TrialResult, TrialRunner, TrialWorker};
