//! Prediction and inference
//!
//! Score fixtures with the active model.

pub mod inference;

pub use inference::{format_prediction, ActiveModel, OutcomePredictor};
