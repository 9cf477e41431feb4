//! Hyperparameter grid and its enumeration order

use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hidden-layer activation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Tanh,
    Sigmoid,
    Gelu,
}

impl Activation {
    pub fn apply<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Relu => activation::relu(x),
            Activation::Tanh => activation::tanh(x),
            Activation::Sigmoid => activation::sigmoid(x),
            Activation::Gelu => activation::gelu(x),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Relu => write!(f, "relu"),
            Activation::Tanh => write!(f, "tanh"),
            Activation::Sigmoid => write!(f, "sigmoid"),
            Activation::Gelu => write!(f, "gelu"),
        }
    }
}

impl std::str::FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relu" => Ok(Activation::Relu),
            "tanh" => Ok(Activation::Tanh),
            "sigmoid" => Ok(Activation::Sigmoid),
            "gelu" => Ok(Activation::Gelu),
            _ => Err(format!(
                "Unknown activation: {}. Use relu, tanh, sigmoid or gelu.",
                s
            )),
        }
    }
}

/// One point of the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterConfig {
    pub num_layers: usize,
    pub units: usize,
    pub activation: Activation,
    pub learning_rate: f64,
    pub epochs: usize,
}

impl fmt::Display for HyperparameterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "layers={}, units={}, activation={}, lr={}, epochs={}",
            self.num_layers, self.units, self.activation, self.learning_rate, self.epochs
        )
    }
}

/// Five search axes; candidates are their Cartesian product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperparameterGrid {
    pub num_layers: Vec<usize>,
    pub units: Vec<usize>,
    pub activation: Vec<Activation>,
    pub learning_rate: Vec<f64>,
    pub epochs: Vec<usize>,
}

impl Default for HyperparameterGrid {
    fn default() -> Self {
        HyperparameterGrid {
            num_layers: vec![2, 3],
            units: vec![32, 64],
            activation: vec![Activation::Relu, Activation::Tanh],
            learning_rate: vec![0.001, 0.0001],
            epochs: vec![10, 20],
        }
    }
}

impl HyperparameterGrid {
    /// Number of candidates (product of axis sizes)
    pub fn size(&self) -> usize {
        self.num_layers.len()
            * self.units.len()
            * self.activation.len()
            * self.learning_rate.len()
            * self.epochs.len()
    }

    /// All candidates in enumeration order
    ///
    /// Axes nest in declaration order with `num_layers` varying slowest and
    /// `epochs` fastest. Position in this list is the candidate's ordinal and
    /// decides ties during selection.
    pub fn configs(&self) -> Vec<HyperparameterConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &num_layers in &self.num_layers {
            for &units in &self.units {
                for &activation in &self.activation {
                    for &learning_rate in &self.learning_rate {
                        for &epochs in &self.epochs {
                            configs.push(HyperparameterConfig {
                                num_layers,
                                units,
                                activation,
                                learning_rate,
                                epochs,
                            });
                        }
                    }
                }
            }
        }
        configs
    }
}
