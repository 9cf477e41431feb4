//! Model inference for predictions

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::features::{MatchFeatures, TeamStatVector};
use crate::model::mlp::OutcomeNet;
use crate::training::grid::HyperparameterConfig;
use crate::{MatchRecord, Prediction, PredictorError, Result};

/// The model currently answering predictions, with its provenance
#[derive(Debug, Clone)]
pub struct ActiveModel<B: Backend> {
    pub model: OutcomeNet<B>,
    pub config: HyperparameterConfig,
    pub domain: String,
    pub validation_accuracy: f32,
}

/// Turns a fixture into outcome percentages
pub struct OutcomePredictor<B: Backend> {
    device: B::Device,
}

impl<B: Backend> OutcomePredictor<B> {
    pub fn new(device: B::Device) -> Self {
        OutcomePredictor { device }
    }

    /// Predict a single fixture from the full record history
    pub fn predict(
        &self,
        home_team: &str,
        away_team: &str,
        records: &[MatchRecord],
        active: Option<&ActiveModel<B>>,
    ) -> Result<Prediction> {
        let active = active.ok_or(PredictorError::ModelNotTrained)?;

        let home_team = home_team.trim();
        let away_team = away_team.trim();
        if home_team.is_empty() || away_team.is_empty() {
            return Err(PredictorError::PredictionInput(
                "home and away team names must be non-empty".to_string(),
            ));
        }

        let features = MatchFeatures::for_fixture(home_team, away_team, records);
        warn_cold_start(home_team, &features.home);
        warn_cold_start(away_team, &features.away);

        let input = Tensor::<B, 1>::from_floats(features.to_vec().as_slice(), &self.device)
            .reshape([1, MatchFeatures::DIM]);
        let probs = active
            .model
            .probabilities(input)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| PredictorError::Model(format!("Failed to read model output: {:?}", e)))?;

        if probs.len() != 3 {
            return Err(PredictorError::Model(format!(
                "expected 3 outcome probabilities, got {}",
                probs.len()
            )));
        }

        log::debug!(
            "{} vs {} ({} model): {:?}",
            home_team,
            away_team,
            active.domain,
            probs
        );

        Ok(Prediction {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_win_pct: probs[0] * 100.0,
            draw_pct: probs[1] * 100.0,
            away_win_pct: probs[2] * 100.0,
        })
    }
}

fn warn_cold_start(team: &str, stats: &TeamStatVector) {
    if stats.is_cold_start() {
        log::warn!("'{}' has no match history; using an all-zero stat vector", team);
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &Prediction) -> String {
    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}
├─────────────────────────────────────────────────┤
│  Home win:  {:>5.1}%
│  Draw:      {:>5.1}%
│  Away win:  {:>5.1}%
│  Most likely: {}
└─────────────────────────────────────────────────┘
"#,
        pred.home_team,
        pred.away_team,
        pred.home_win_pct,
        pred.draw_pct,
        pred.away_win_pct,
        pred.most_likely()
    )
}
