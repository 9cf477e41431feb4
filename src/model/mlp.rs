//! Feed-forward outcome classifier
//!
//! Architecture: Input(12) → [Linear(units) → activation] × num_layers
//!                        → Linear(3) → softmax (at inference)

use burn::module::{Ignored, Module};
use burn::nn::{Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::activation::softmax;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::features::MatchFeatures;
use crate::training::grid::{Activation, HyperparameterConfig};
use crate::{PredictorError, ResultLabel};

/// Configuration for the classifier
#[derive(Debug, Clone)]
pub struct OutcomeNetConfig {
    /// Input dimension (fixture features)
    pub input_dim: usize,
    /// Number of hidden layers
    pub num_layers: usize,
    /// Width of every hidden layer
    pub units: usize,
    pub activation: Activation,
}

impl OutcomeNetConfig {
    pub fn from_hyperparams(config: &HyperparameterConfig) -> Self {
        OutcomeNetConfig {
            input_dim: MatchFeatures::DIM,
            num_layers: config.num_layers,
            units: config.units,
            activation: config.activation,
        }
    }
}

/// Multi-layer perceptron with a three-way output
#[derive(Module, Debug)]
pub struct OutcomeNet<B: Backend> {
    hidden: Vec<Linear<B>>,
    output: Linear<B>,
    activation: Ignored<Activation>,
}

impl<B: Backend> OutcomeNet<B> {
    /// Create a new, randomly initialized model
    pub fn new(device: &B::Device, config: &OutcomeNetConfig) -> Self {
        let mut hidden = Vec::with_capacity(config.num_layers);
        let mut in_dim = config.input_dim;
        for _ in 0..config.num_layers {
            hidden.push(LinearConfig::new(in_dim, config.units).init(device));
            in_dim = config.units;
        }

        OutcomeNet {
            hidden,
            output: LinearConfig::new(in_dim, ResultLabel::CLASSES).init(device),
            activation: Ignored(config.activation),
        }
    }

    /// Forward pass returning class logits [batch, 3]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = features;
        for layer in &self.hidden {
            x = self.activation.0.apply(layer.forward(x));
        }
        self.output.forward(x)
    }

    /// Class probabilities [batch, 3] (HomeWin, Draw, AwayWin)
    pub fn probabilities(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.forward(features), 1)
    }

    /// Number of hidden layers
    pub fn depth(&self) -> usize {
        self.hidden.len()
    }

    /// Save model weights to `<path>.mpk`
    pub fn save(&self, path: &str) -> crate::Result<()> {
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        self.clone()
            .save_file(path, &recorder)
            .map_err(|e| PredictorError::Model(format!("Failed to save model: {}", e)))
    }

    /// Load model weights from `<path>.mpk` into a model shaped by `config`
    pub fn load(device: &B::Device, path: &str, config: &OutcomeNetConfig) -> crate::Result<Self> {
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        Self::new(device, config)
            .load_file(path, &recorder, device)
            .map_err(|e| PredictorError::Model(format!("Failed to load model: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn config(num_layers: usize, activation: Activation) -> OutcomeNetConfig {
        OutcomeNetConfig {
            input_dim: MatchFeatures::DIM,
            num_layers,
            units: 16,
            activation,
        }
    }

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let model = OutcomeNet::<TestBackend>::new(&device, &config(2, Activation::Relu));
        assert_eq!(model.depth(), 2);

        let features = Tensor::random(
            [4, MatchFeatures::DIM],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        assert_eq!(model.forward(features).dims(), [4, 3]);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let device = Default::default();
        for activation in [
            Activation::Relu,
            Activation::Tanh,
            Activation::Sigmoid,
            Activation::Gelu,
        ] {
            let model = OutcomeNet::<TestBackend>::new(&device, &config(3, activation));
            let features = Tensor::random(
                [5, MatchFeatures::DIM],
                burn::tensor::Distribution::Normal(0.0, 1.0),
                &device,
            );

            let probs = model.probabilities(features).into_data();
            let values = probs.as_slice::<f32>().unwrap();
            for row in values.chunks(3) {
                let sum: f32 = row.iter().sum();
                assert!((sum - 1.0).abs() < 1e-4, "{}: row sums to {}", activation, sum);
                assert!(row.iter().all(|p| *p >= 0.0));
            }
        }
    }

    #[test]
    fn test_no_hidden_layers() {
        let device = Default::default();
        let model = OutcomeNet::<TestBackend>::new(&device, &config(0, Activation::Relu));
        let features = Tensor::zeros([2, MatchFeatures::DIM], &device);
        assert_eq!(model.forward(features).dims(), [2, 3]);
    }

    #[test]
    fn test_save_and_load() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net");
        let path = path.to_str().unwrap();

        let cfg = config(2, Activation::Tanh);
        let model = OutcomeNet::<TestBackend>::new(&device, &cfg);
        model.save(path).unwrap();
        let loaded = OutcomeNet::<TestBackend>::load(&device, path, &cfg).unwrap();

        let features = Tensor::<TestBackend, 2>::ones([1, MatchFeatures::DIM], &device);
        let a = model.forward(features.clone()).into_data();
        let b = loaded.forward(features).into_data();
        for (x, y) in a
            .as_slice::<f32>()
            .unwrap()
            .iter()
            .zip(b.as_slice::<f32>().unwrap())
        {
            assert!((x - y).abs() < 1e-6);
        }
    }
}
