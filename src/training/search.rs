//! Parallel grid search over hyperparameter candidates
//!
//! Candidates run on a bounded rayon pool. Each finished trial is stored
//! under its enumeration ordinal, so selection never depends on which
//! worker finished first: the highest validation accuracy wins and ties
//! go to the earliest candidate in grid order.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;

use crate::data::dataset::OutcomeDataset;
use crate::training::grid::{HyperparameterConfig, HyperparameterGrid};
use crate::training::trial::{TrialResult, TrialRunner};
use crate::{PredictorError, Result};

/// What happened to one candidate
#[derive(Debug)]
pub enum TrialOutcome<M> {
    Succeeded(TrialResult<M>),
    Failed {
        config: HyperparameterConfig,
        error: String,
    },
}

impl<M> TrialOutcome<M> {
    pub fn config(&self) -> &HyperparameterConfig {
        match self {
            TrialOutcome::Succeeded(result) => &result.config,
            TrialOutcome::Failed { config, .. } => config,
        }
    }

    pub fn score(&self) -> Option<f32> {
        match self {
            TrialOutcome::Succeeded(result) => Some(result.validation_accuracy),
            TrialOutcome::Failed { .. } => None,
        }
    }
}

/// Per-candidate line of a search report
#[derive(Debug, Clone)]
pub struct TrialSummary {
    pub ordinal: usize,
    pub config: HyperparameterConfig,
    pub validation_accuracy: Option<f32>,
    pub error: Option<String>,
}

/// Every candidate's outcome, in enumeration order
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub trials: Vec<TrialSummary>,
    pub best_ordinal: usize,
}

impl SearchReport {
    pub fn succeeded(&self) -> usize {
        self.trials.iter().filter(|t| t.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.trials.len() - self.succeeded()
    }
}

/// Winning candidate plus the full report
#[derive(Debug)]
pub struct SearchOutcome<M> {
    pub best: TrialResult<M>,
    pub report: SearchReport,
}

/// Runs every grid candidate with at most `workers` trials in flight
#[derive(Debug, Clone)]
pub struct SearchCoordinator {
    workers: usize,
}

impl SearchCoordinator {
    pub fn new(workers: usize) -> Self {
        SearchCoordinator {
            workers: workers.max(1),
        }
    }

    /// Evaluate the whole grid and keep the best model
    ///
    /// A failing trial is recorded and skipped; the search only fails when
    /// no candidate succeeds.
    pub fn search<R: TrialRunner>(
        &self,
        runner: &R,
        grid: &HyperparameterGrid,
        train: &OutcomeDataset,
        val: &OutcomeDataset,
    ) -> Result<SearchOutcome<R::Model>> {
        let configs = grid.configs();
        if configs.is_empty() {
            return Err(PredictorError::TrainingFailure(
                "hyperparameter grid has no candidates".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("trial-worker-{}", i))
            .build()
            .map_err(|e| PredictorError::TrainingFailure(format!("Failed to start worker pool: {}", e)))?;

        log::info!(
            "Searching {} candidates with {} workers",
            configs.len(),
            self.workers
        );

        let finished: Vec<(usize, TrialOutcome<R::Model>)> = pool.install(|| {
            configs
                .par_iter()
                .enumerate()
                .map(|(ordinal, config)| (ordinal, run_trial(runner, ordinal, config, train, val)))
                .collect()
        });

        let mut outcomes: BTreeMap<usize, TrialOutcome<R::Model>> = finished.into_iter().collect();

        let best_ordinal = select_best(&outcomes).ok_or_else(|| {
            PredictorError::TrainingFailure(format!(
                "all {} trials failed",
                outcomes.len()
            ))
        })?;

        let report = SearchReport {
            trials: outcomes
                .iter()
                .map(|(&ordinal, outcome)| TrialSummary {
                    ordinal,
                    config: outcome.config().clone(),
                    validation_accuracy: outcome.score(),
                    error: match outcome {
                        TrialOutcome::Failed { error, .. } => Some(error.clone()),
                        TrialOutcome::Succeeded(_) => None,
                    },
                })
                .collect(),
            best_ordinal,
        };

        let best = match outcomes.remove(&best_ordinal) {
            Some(TrialOutcome::Succeeded(result)) => result,
            _ => {
                return Err(PredictorError::TrainingFailure(format!(
                    "selected trial #{} has no model",
                    best_ordinal
                )))
            }
        };

        log::info!(
            "Best candidate #{} ({}) with validation accuracy {:.2}% ({} succeeded, {} failed)",
            best_ordinal,
            best.config,
            best.validation_accuracy * 100.0,
            report.succeeded(),
            report.failed()
        );

        Ok(SearchOutcome { best, report })
    }
}

/// Run one trial, converting errors and panics into a failed outcome
fn run_trial<R: TrialRunner>(
    runner: &R,
    ordinal: usize,
    config: &HyperparameterConfig,
    train: &OutcomeDataset,
    val: &OutcomeDataset,
) -> TrialOutcome<R::Model> {
    log::debug!("Trial #{} started: {}", ordinal, config);

    let error = match catch_unwind(AssertUnwindSafe(|| runner.run(config, train, val))) {
        Ok(Ok(result)) => {
            log::info!(
                "Trial #{} ({}) finished: val acc {:.2}%",
                ordinal,
                config,
                result.validation_accuracy * 100.0
            );
            return TrialOutcome::Succeeded(result);
        }
        Ok(Err(e)) => e.to_string(),
        Err(panic) => panic_message(panic.as_ref()),
    };

    let error = PredictorError::TrialFailure {
        ordinal,
        message: error,
    }
    .to_string();
    log::warn!("{} ({})", error, config);

    TrialOutcome::Failed {
        config: config.clone(),
        error,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Ordinal of the winning trial
///
/// Strictly greater accuracy replaces the current best, so on equal scores
/// the lowest ordinal is kept. NaN scores never win.
pub fn select_best<M>(outcomes: &BTreeMap<usize, TrialOutcome<M>>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (&ordinal, outcome) in outcomes {
        let score = match outcome.score() {
            Some(score) if !score.is_nan() => score,
            _ => continue,
        };
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((ordinal, score)),
        }
    }

    best.map(|(ordinal, _)| ordinal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::OutcomeSample;
    use crate::training::grid::Activation;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scores come from a lookup on (num_layers, units); later candidates
    /// sleep less so they finish first.
    struct FakeRunner {
        score: fn(&HyperparameterConfig) -> Result<f32>,
        running: AtomicUsize,
        peak: AtomicUsize,
        calls: Mutex<Vec<HyperparameterConfig>>,
    }

    impl FakeRunner {
        fn new(score: fn(&HyperparameterConfig) -> Result<f32>) -> Self {
            FakeRunner {
                score,
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl TrialRunner for FakeRunner {
        type Model = String;

        fn run(
            &self,
            config: &HyperparameterConfig,
            _train: &OutcomeDataset,
            _val: &OutcomeDataset,
        ) -> Result<TrialResult<String>> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().unwrap().push(config.clone());

            let delay = 4 * (4 - config.num_layers.min(4)) as u64;
            std::thread::sleep(Duration::from_millis(delay));

            let score = (self.score)(config);
            self.running.fetch_sub(1, Ordering::SeqCst);

            Ok(TrialResult {
                config: config.clone(),
                validation_accuracy: score?,
                model: format!("model-{}", config),
            })
        }
    }

    fn grid() -> HyperparameterGrid {
        HyperparameterGrid {
            num_layers: vec![1, 2, 3],
            units: vec![8, 16],
            activation: vec![Activation::Relu],
            learning_rate: vec![0.01],
            epochs: vec![1],
        }
    }

    fn data() -> OutcomeDataset {
        OutcomeDataset::from_samples(vec![OutcomeSample {
            features: [0.0; 12],
            label: 0,
        }])
    }

    #[test]
    fn test_highest_score_wins() {
        let runner = FakeRunner::new(|c| Ok(if c.num_layers == 2 && c.units == 16 { 0.8 } else { 0.5 }));
        let outcome = SearchCoordinator::new(2)
            .search(&runner, &grid(), &data(), &data())
            .unwrap();

        assert_eq!(outcome.best.config.num_layers, 2);
        assert_eq!(outcome.best.config.units, 16);
        assert_eq!(outcome.best.validation_accuracy, 0.8);
        assert_eq!(outcome.report.best_ordinal, 3);
        assert_eq!(outcome.best.model, format!("model-{}", outcome.best.config));
    }

    #[test]
    fn test_tie_goes_to_earliest_candidate() {
        // Ordinals 2..6 tie and finish before ordinals 0..2
        let runner = FakeRunner::new(|c| Ok(if c.num_layers == 1 { 0.3 } else { 0.7 }));
        for workers in [1, 3, 6] {
            let outcome = SearchCoordinator::new(workers)
                .search(&runner, &grid(), &data(), &data())
                .unwrap();
            assert_eq!(outcome.report.best_ordinal, 2, "workers={}", workers);
            assert_eq!(outcome.best.config.num_layers, 2);
            assert_eq!(outcome.best.config.units, 8);
        }
    }

    #[test]
    fn test_failed_trials_are_skipped() {
        let runner = FakeRunner::new(|c| {
            if c.units == 16 {
                Err(PredictorError::Model("diverged".to_string()))
            } else {
                Ok(c.num_layers as f32 / 10.0)
            }
        });
        let outcome = SearchCoordinator::new(4)
            .search(&runner, &grid(), &data(), &data())
            .unwrap();

        assert_eq!(outcome.best.config.num_layers, 3);
        assert_eq!(outcome.best.config.units, 8);
        assert_eq!(outcome.report.trials.len(), 6);
        assert_eq!(outcome.report.failed(), 3);
        assert_eq!(outcome.report.succeeded(), 3);
        let failed = &outcome.report.trials[1];
        assert_eq!(failed.ordinal, 1);
        assert!(failed.error.as_deref().unwrap().contains("diverged"));
    }

    #[test]
    fn test_panicking_trial_is_recorded() {
        let runner = FakeRunner::new(|c| {
            if c.num_layers == 3 {
                panic!("out of memory");
            }
            Ok(0.4)
        });
        let outcome = SearchCoordinator::new(2)
            .search(&runner, &grid(), &data(), &data())
            .unwrap();

        assert_eq!(outcome.report.best_ordinal, 0);
        assert_eq!(outcome.report.failed(), 2);
        assert!(outcome.report.trials[5]
            .error
            .as_deref()
            .unwrap()
            .contains("out of memory"));
    }

    #[test]
    fn test_all_trials_fail() {
        let runner = FakeRunner::new(|_| Err(PredictorError::Model("nope".to_string())));
        let err = SearchCoordinator::new(4)
            .search(&runner, &grid(), &data(), &data())
            .unwrap_err();
        assert!(matches!(err, PredictorError::TrainingFailure(_)));
    }

    #[test]
    fn test_empty_grid_fails() {
        let runner = FakeRunner::new(|_| Ok(1.0));
        let empty = HyperparameterGrid {
            epochs: vec![],
            ..grid()
        };
        let err = SearchCoordinator::new(4)
            .search(&runner, &empty, &data(), &data())
            .unwrap_err();
        assert!(matches!(err, PredictorError::TrainingFailure(_)));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_full_grid_runs_each_candidate_once_within_bound() {
        let runner = FakeRunner::new(|_| Ok(0.5));
        let grid = HyperparameterGrid::default();
        let outcome = SearchCoordinator::new(4)
            .search(&runner, &grid, &data(), &data())
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 32);
        for config in grid.configs() {
            assert_eq!(calls.iter().filter(|c| **c == config).count(), 1);
        }
        assert!(runner.peak.load(Ordering::SeqCst) <= 4);
        assert_eq!(outcome.report.trials.len(), 32);
        assert_eq!(outcome.report.best_ordinal, 0);
    }

    #[test]
    fn test_select_best_ignores_insertion_order_and_nan() {
        let config = grid().configs()[0].clone();
        let ok = |score: f32| {
            TrialOutcome::Succeeded(TrialResult {
                config: config.clone(),
                validation_accuracy: score,
                model: (),
            })
        };

        let mut outcomes = BTreeMap::new();
        outcomes.insert(7, ok(0.6));
        outcomes.insert(3, ok(f32::NAN));
        outcomes.insert(5, ok(0.6));
        outcomes.insert(1, TrialOutcome::Failed {
            config: config.clone(),
            error: "boom".to_string(),
        });
        assert_eq!(select_best(&outcomes), Some(5));

        outcomes.insert(9, ok(0.61));
        assert_eq!(select_best(&outcomes), Some(9));

        let only_nan: BTreeMap<usize, TrialOutcome<()>> = [(0, ok(f32::NAN))].into_iter().collect();
        assert_eq!(select_best(&only_nan), None);
    }
}
