//! Training dataset and batching for burn

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::features::{MatchFeatures, TrainingSet};
use crate::{PredictorError, Result};

/// A single labeled example
#[derive(Debug, Clone)]
pub struct OutcomeSample {
    /// Home stats followed by away stats
    pub features: [f32; MatchFeatures::DIM],
    /// HomeWin=0, Draw=1, AwayWin=2
    pub label: usize,
}

/// In-memory dataset of labeled fixtures
#[derive(Debug, Clone, Default)]
pub struct OutcomeDataset {
    samples: Vec<OutcomeSample>,
}

impl OutcomeDataset {
    pub fn from_samples(samples: Vec<OutcomeSample>) -> Self {
        OutcomeDataset { samples }
    }

    pub fn from_training_set(set: &TrainingSet) -> Self {
        let samples = set
            .features
            .iter()
            .zip(set.labels.iter())
            .map(|(features, &label)| OutcomeSample {
                features: features.to_vec(),
                label,
            })
            .collect();
        OutcomeDataset { samples }
    }

    pub fn samples(&self) -> &[OutcomeSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Dataset<OutcomeSample> for OutcomeDataset {
    fn get(&self, index: usize) -> Option<OutcomeSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Train and validation partitions of a training set
#[derive(Debug, Clone)]
pub struct TrainValSplit {
    pub train: OutcomeDataset,
    pub val: OutcomeDataset,
}

impl TrainValSplit {
    /// Shuffle with a fixed seed and hold out `validation_fraction` (rounded up)
    pub fn new(set: &TrainingSet, validation_fraction: f64, seed: u64) -> Result<Self> {
        let mut samples = OutcomeDataset::from_training_set(set).samples;
        let n = samples.len();
        let n_val = (n as f64 * validation_fraction).ceil() as usize;

        if n_val == 0 || n_val >= n {
            return Err(PredictorError::DataValidation(format!(
                "{} examples cannot be split into non-empty train and validation sets",
                n
            )));
        }

        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        samples.shuffle(&mut rng);
        let train_samples = samples.split_off(n_val);

        log::info!(
            "Split {} samples: train={}, val={}",
            n,
            train_samples.len(),
            samples.len()
        );

        Ok(TrainValSplit {
            train: OutcomeDataset::from_samples(train_samples),
            val: OutcomeDataset::from_samples(samples),
        })
    }
}

/// Batch of examples as tensors
#[derive(Debug, Clone)]
pub struct OutcomeBatch<B: Backend> {
    /// Features: [batch, 12]
    pub features: Tensor<B, 2>,
    /// Class labels: [batch]
    pub labels: Tensor<B, 1, Int>,
}

/// Batcher for creating training batches
#[derive(Clone)]
pub struct OutcomeBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> OutcomeBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        OutcomeBatcher { device }
    }
}

impl<B: Backend> Batcher<B, OutcomeSample, OutcomeBatch<B>> for OutcomeBatcher<B> {
    fn batch(&self, items: Vec<OutcomeSample>, _device: &B::Device) -> OutcomeBatch<B> {
        let batch_size = items.len();

        let mut feature_data = Vec::with_capacity(batch_size * MatchFeatures::DIM);
        let mut label_data = Vec::with_capacity(batch_size);
        for sample in &items {
            feature_data.extend_from_slice(&sample.features);
            label_data.push(sample.label as i32);
        }

        let features = Tensor::<B, 1>::from_floats(feature_data.as_slice(), &self.device)
            .reshape([batch_size, MatchFeatures::DIM]);
        let labels = Tensor::<B, 1, Int>::from_ints(label_data.as_slice(), &self.device);

        OutcomeBatch { features, labels }
    }
}
