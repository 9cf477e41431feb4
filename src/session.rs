//! Session state: the loaded dataset and the active model slot
//!
//! A session moves Untrained → Training → Active. Training or loading swaps
//! the slot only on success; any failure puts the previous state back.

use std::path::Path;

use burn::tensor::backend::{AutodiffBackend, Backend};
use chrono::Utc;

use crate::data::dataset::TrainValSplit;
use crate::data::records::RecordSet;
use crate::features::TrainingSetBuilder;
use crate::model::store::{validate_domain, ArtifactManifest, ModelStore};
use crate::predict::inference::{ActiveModel, OutcomePredictor};
use crate::training::search::{SearchCoordinator, SearchOutcome, SearchReport};
use crate::training::trial::TrialWorker;
use crate::{Config, Prediction, PredictorError, Result};

/// Which model, if any, answers predictions
#[derive(Debug)]
pub enum ModelSlot<B: Backend> {
    Untrained,
    Training,
    Active(ActiveModel<B>),
}

impl<B: Backend> ModelSlot<B> {
    pub fn name(&self) -> &'static str {
        match self {
            ModelSlot::Untrained => "untrained",
            ModelSlot::Training => "training",
            ModelSlot::Active(_) => "active",
        }
    }
}

/// Explicit replacement for process-wide dataset and model globals
pub struct Session<B: AutodiffBackend> {
    config: Config,
    device: B::Device,
    records: Option<RecordSet>,
    slot: ModelSlot<B::InnerBackend>,
    store: Option<ModelStore>,
}

impl<B: AutodiffBackend> Session<B> {
    pub fn new(config: Config, device: B::Device) -> Self {
        Session {
            config,
            device,
            records: None,
            slot: ModelSlot::Untrained,
            store: None,
        }
    }

    /// Persist trained models to, and load them from, `store`
    pub fn with_store(mut self, store: ModelStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn slot(&self) -> &ModelSlot<B::InnerBackend> {
        &self.slot
    }

    pub fn active(&self) -> Option<&ActiveModel<B::InnerBackend>> {
        match &self.slot {
            ModelSlot::Active(active) => Some(active),
            _ => None,
        }
    }

    pub fn records(&self) -> Option<&RecordSet> {
        self.records.as_ref()
    }

    /// Load a CSV dataset, replacing the current one
    pub fn load_dataset<P: AsRef<Path>>(&mut self, path: P) -> Result<&RecordSet> {
        let records = RecordSet::load_csv(path)?;
        Ok(&*self.records.insert(records))
    }

    pub fn set_records(&mut self, records: RecordSet) {
        self.records = Some(records);
    }

    fn require_records(&self) -> Result<&RecordSet> {
        self.records
            .as_ref()
            .ok_or_else(|| PredictorError::DataValidation("no dataset loaded".to_string()))
    }

    /// Sorted distinct home teams of a league in the loaded dataset
    pub fn list_teams(&self, league: &str) -> Result<Vec<String>> {
        Ok(self.require_records()?.list_teams(league))
    }

    /// Search the grid on the loaded dataset and install the winner
    pub fn train(&mut self, domain: &str) -> Result<SearchReport> {
        validate_domain(domain)?;
        self.require_records()?;

        let previous = std::mem::replace(&mut self.slot, ModelSlot::Training);
        match self.run_training(domain) {
            Ok((active, report)) => {
                self.slot = ModelSlot::Active(active);
                Ok(report)
            }
            Err(e) => {
                log::warn!("Training '{}' failed, keeping {} model: {}", domain, previous.name(), e);
                self.slot = previous;
                Err(e)
            }
        }
    }

    fn run_training(&self, domain: &str) -> Result<(ActiveModel<B::InnerBackend>, SearchReport)> {
        let records = self.require_records()?;
        let search = &self.config.search;

        let set = TrainingSetBuilder::build(records.records())?;
        let split = TrainValSplit::new(&set, search.validation_split, search.split_seed)?;

        let worker = TrialWorker::<B>::new(self.device.clone(), search.batch_size, search.shuffle_seed);
        let SearchOutcome { best, report } = SearchCoordinator::new(search.workers).search(
            &worker,
            &self.config.grid,
            &split.train,
            &split.val,
        )?;

        let active = ActiveModel {
            model: best.model,
            config: best.config,
            domain: domain.to_string(),
            validation_accuracy: best.validation_accuracy,
        };

        if let Some(store) = &self.store {
            let manifest = ArtifactManifest {
                domain: active.domain.clone(),
                config: active.config.clone(),
                validation_accuracy: active.validation_accuracy,
                trained_at: Utc::now(),
            };
            store.save(&active.model, &manifest)?;
        }

        Ok((active, report))
    }

    /// Install a persisted model for `domain`
    pub fn load(&mut self, domain: &str) -> Result<&ActiveModel<B::InnerBackend>> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| PredictorError::Config("session has no model store".to_string()))?;
        let (model, manifest) = store.load::<B::InnerBackend>(&self.device, domain)?;

        let active = ActiveModel {
            model,
            config: manifest.config,
            domain: manifest.domain,
            validation_accuracy: manifest.validation_accuracy,
        };
        self.slot = ModelSlot::Active(active);

        match &self.slot {
            ModelSlot::Active(active) => Ok(active),
            _ => unreachable!("model slot was just set to Active"),
        }
    }

    /// Predict a fixture with the active model over the loaded dataset
    pub fn predict(&self, home_team: &str, away_team: &str) -> Result<Prediction> {
        let active = self.active().ok_or(PredictorError::ModelNotTrained)?;
        let records = self.require_records()?;

        OutcomePredictor::<B::InnerBackend>::new(self.device.clone()).predict(
            home_team,
            away_team,
            records.records(),
            Some(active),
        )
    }
}
