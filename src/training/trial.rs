//! Single hyperparameter trial: train one candidate, score it on validation

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataloader::DataLoaderBuilder;
use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Int, Tensor};

use crate::data::dataset::{OutcomeBatcher, OutcomeDataset};
use crate::model::mlp::{OutcomeNet, OutcomeNetConfig};
use crate::training::grid::HyperparameterConfig;
use crate::training::metrics::{Metrics, TrainingHistory};
use crate::{PredictorError, Result};

/// A trained candidate and its validation score
#[derive(Debug, Clone)]
pub struct TrialResult<M> {
    pub config: HyperparameterConfig,
    /// Accuracy on the validation split after the final epoch
    pub validation_accuracy: f32,
    pub model: M,
}

/// Anything that can train one candidate configuration
///
/// Runners are shared across worker threads, so they must be `Sync` and
/// their models `Send`.
pub trait TrialRunner: Sync {
    type Model: Send;

    fn run(
        &self,
        config: &HyperparameterConfig,
        train: &OutcomeDataset,
        val: &OutcomeDataset,
    ) -> Result<TrialResult<Self::Model>>;
}

/// Trains an [`OutcomeNet`] with Adam and cross-entropy loss
#[derive(Debug, Clone)]
pub struct TrialWorker<B: AutodiffBackend> {
    device: B::Device,
    batch_size: usize,
    shuffle_seed: u64,
}

impl<B: AutodiffBackend> TrialWorker<B> {
    pub fn new(device: B::Device, batch_size: usize, shuffle_seed: u64) -> Self {
        TrialWorker {
            device,
            batch_size,
            shuffle_seed,
        }
    }

    /// Train a single candidate and return its per-epoch history too
    pub fn train(
        &self,
        config: &HyperparameterConfig,
        train: &OutcomeDataset,
        val: &OutcomeDataset,
    ) -> Result<(OutcomeNet<B::InnerBackend>, TrainingHistory)> {
        if train.is_empty() || val.is_empty() {
            return Err(PredictorError::DataValidation(
                "trial needs non-empty train and validation splits".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(PredictorError::Config("batch_size must be positive".to_string()));
        }

        let mut model = OutcomeNet::<B>::new(&self.device, &OutcomeNetConfig::from_hyperparams(config));
        let mut optimizer = AdamConfig::new().init();
        let loss_fn = CrossEntropyLossConfig::new().init(&self.device);

        let train_loader = DataLoaderBuilder::new(OutcomeBatcher::<B>::new(self.device.clone()))
            .batch_size(self.batch_size)
            .shuffle(self.shuffle_seed)
            .build(train.clone());

        // Validation is evaluated as one batch on the non-autodiff backend
        let val_batch = OutcomeBatcher::<B::InnerBackend>::new(self.device.clone())
            .batch(val.samples().to_vec(), &self.device);

        let mut history = TrainingHistory::new();

        for epoch in 0..config.epochs {
            let mut metrics = Metrics::new();

            for batch in train_loader.iter() {
                let batch_size = batch.features.dims()[0];
                let logits = model.forward(batch.features);
                let loss = loss_fn.forward(logits.clone(), batch.labels.clone());

                let loss_val: f32 = loss.clone().into_scalar().elem();
                let correct = count_correct(logits, batch.labels);

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optimizer.step(config.learning_rate, model, grads);

                metrics.update(loss_val, correct, batch_size);
            }

            let val_accuracy = accuracy(&model.valid(), val_batch.features.clone(), val_batch.labels.clone());
            history.record_epoch(&metrics, val_accuracy);

            log::debug!(
                "[{}] epoch {}/{}: {} | Val acc: {:.2}%",
                config,
                epoch + 1,
                config.epochs,
                metrics,
                val_accuracy * 100.0
            );
        }

        Ok((model.valid(), history))
    }
}

impl<B: AutodiffBackend> TrialRunner for TrialWorker<B> {
    type Model = OutcomeNet<B::InnerBackend>;

    fn run(
        &self,
        config: &HyperparameterConfig,
        train: &OutcomeDataset,
        val: &OutcomeDataset,
    ) -> Result<TrialResult<Self::Model>> {
        let (model, history) = self.train(config, train, val)?;

        // Zero epochs still yields a score for the untrained network
        let validation_accuracy = match history.final_val_accuracy() {
            Some(acc) => acc,
            None => {
                let batch = OutcomeBatcher::<B::InnerBackend>::new(self.device.clone())
                    .batch(val.samples().to_vec(), &self.device);
                accuracy(&model, batch.features, batch.labels)
            }
        };

        Ok(TrialResult {
            config: config.clone(),
            validation_accuracy,
            model,
        })
    }
}

/// Number of rows whose arg-max logit matches the label
fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    let predicted = logits.argmax(1);
    let hits: i64 = predicted
        .equal(labels.unsqueeze_dim(1))
        .int()
        .sum()
        .into_scalar()
        .elem();
    hits.max(0) as usize
}

/// Fraction of correctly classified rows
pub fn accuracy<B: Backend>(model: &OutcomeNet<B>, features: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> f32 {
    let total = labels.dims()[0];
    if total == 0 {
        return 0.0;
    }
    count_correct(model.forward(features), labels) as f32 / total as f32
}
