//! Match outcome prediction
//!
//! Aggregates per-team statistics from historical match records, searches a
//! hyperparameter grid in parallel for the best feed-forward classifier and
//! predicts home win / draw / away win probabilities.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod session;
pub mod training;

pub use session::Session;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::training::grid::HyperparameterGrid;

/// Full-time result as recorded in a dataset row
///
/// Parsing is total: anything that is not one of the three known labels is
/// kept verbatim in `Other` and rejected later, when a training set is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultLabel {
    HomeWin,
    Draw,
    AwayWin,
    Other(String),
}

impl ResultLabel {
    /// Number of outcome classes the model predicts
    pub const CLASSES: usize = 3;

    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "HomeWin" => ResultLabel::HomeWin,
            "Draw" => ResultLabel::Draw,
            "AwayWin" => ResultLabel::AwayWin,
            other => ResultLabel::Other(other.to_string()),
        }
    }

    /// Derive the label from a final score
    pub fn from_goals(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => ResultLabel::HomeWin,
            std::cmp::Ordering::Less => ResultLabel::AwayWin,
            std::cmp::Ordering::Equal => ResultLabel::Draw,
        }
    }

    /// Class index used as training label (HomeWin=0, Draw=1, AwayWin=2)
    pub fn class_index(&self) -> Option<usize> {
        match self {
            ResultLabel::HomeWin => Some(0),
            ResultLabel::Draw => Some(1),
            ResultLabel::AwayWin => Some(2),
            ResultLabel::Other(_) => None,
        }
    }
}

impl fmt::Display for ResultLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultLabel::HomeWin => write!(f, "HomeWin"),
            ResultLabel::Draw => write!(f, "Draw"),
            ResultLabel::AwayWin => write!(f, "AwayWin"),
            ResultLabel::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// A single historical match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub league: String,
    pub season: Option<String>,
    pub date: Option<NaiveDate>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub result: ResultLabel,
}

/// Model prediction output, in percent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub home_team: String,
    pub away_team: String,
    pub home_win_pct: f32,
    pub draw_pct: f32,
    pub away_win_pct: f32,
}

impl Prediction {
    /// Outcome with the highest predicted probability (home wins ties)
    pub fn most_likely(&self) -> ResultLabel {
        if self.home_win_pct >= self.draw_pct && self.home_win_pct >= self.away_win_pct {
            ResultLabel::HomeWin
        } else if self.draw_pct >= self.away_win_pct {
            ResultLabel::Draw
        } else {
            ResultLabel::AwayWin
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("Data validation failed: {0}")]
    DataValidation(String),

    #[error("Model not trained - run `outcome train` or load a persisted model first")]
    ModelNotTrained,

    #[error("Invalid prediction input: {0}")]
    PredictionInput(String),

    #[error("Trial #{ordinal} failed: {message}")]
    TrialFailure { ordinal: usize, message: String },

    #[error("Training failed: {0}")]
    TrainingFailure(String),

    #[error("No persisted model for domain '{0}'")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model artifact error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PredictorError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            PredictorError::DataValidation(_) => "data_validation",
            PredictorError::ModelNotTrained => "model_not_trained",
            PredictorError::PredictionInput(_) => "prediction_input",
            PredictorError::TrialFailure { .. } => "trial_failure",
            PredictorError::TrainingFailure(_) => "training_failure",
            PredictorError::NotFound(_) => "not_found",
            PredictorError::Config(_) => "config",
            PredictorError::Model(_) => "model",
            PredictorError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictorError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    pub grid: HyperparameterGrid,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of trials trained concurrently
    pub workers: usize,
    /// Mini-batch size used by every trial
    pub batch_size: usize,
    /// Fraction of the training set held out for validation
    pub validation_split: f64,
    /// Seed for the train/validation shuffle
    pub split_seed: u64,
    /// Seed for per-epoch batch shuffling inside a trial
    pub shuffle_seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding persisted model artifacts (one per domain tag)
    pub model_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            search: SearchConfig {
                workers: 4,
                batch_size: 32,
                validation_split: 0.1,
                split_seed: 42,
                shuffle_seed: 42,
            },
            grid: HyperparameterGrid::default(),
            data: DataConfig {
                model_dir: "model".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PredictorError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| PredictorError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PredictorError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the search cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.search.workers == 0 {
            return Err(PredictorError::Config("search.workers must be at least 1".into()));
        }
        if self.search.batch_size == 0 {
            return Err(PredictorError::Config("search.batch_size must be at least 1".into()));
        }
        let split = self.search.validation_split;
        if !(split > 0.0 && split < 1.0) {
            return Err(PredictorError::Config(format!(
                "search.validation_split must be in (0, 1), got {}",
                split
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_label_parse() {
        assert_eq!(ResultLabel::parse("HomeWin"), ResultLabel::HomeWin);
        assert_eq!(ResultLabel::parse(" Draw "), ResultLabel::Draw);
        assert_eq!(ResultLabel::parse("AwayWin"), ResultLabel::AwayWin);
        assert_eq!(
            ResultLabel::parse("Abandoned"),
            ResultLabel::Other("Abandoned".to_string())
        );
        assert_eq!(ResultLabel::parse("Abandoned").class_index(), None);
        assert_eq!(ResultLabel::from_goals(2, 1).class_index(), Some(0));
        assert_eq!(ResultLabel::from_goals(1, 1).class_index(), Some(1));
        assert_eq!(ResultLabel::from_goals(0, 3).class_index(), Some(2));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.search.workers, 4);
        assert_eq!(parsed.search.batch_size, 32);
        assert_eq!(parsed.grid.configs().len(), 32);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.search.workers = 0;
        assert!(matches!(config.validate(), Err(PredictorError::Config(_))));

        let mut config = Config::default();
        config.search.validation_split = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(PredictorError::ModelNotTrained.kind(), "model_not_trained");
        assert_eq!(
            PredictorError::PredictionInput("empty".into()).kind(),
            "prediction_input"
        );
    }
}
