//! Training metrics and evaluation

use std::fmt;

/// Metrics accumulated over one training epoch
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    /// Sum of per-batch mean losses
    pub total_loss: f64,
    /// Number of correct class predictions
    pub correct: usize,
    /// Total predictions
    pub total_predictions: usize,
    /// Number of batches accumulated
    pub batch_count: usize,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update metrics with a batch result
    pub fn update(&mut self, loss: f32, correct: usize, batch_size: usize) {
        self.total_loss += loss as f64;
        self.correct += correct;
        self.total_predictions += batch_size;
        self.batch_count += 1;
    }

    /// Get average loss per batch
    pub fn avg_loss(&self) -> f64 {
        if self.batch_count == 0 {
            0.0
        } else {
            self.total_loss / self.batch_count as f64
        }
    }

    /// Get classification accuracy
    pub fn accuracy(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.correct as f64 / self.total_predictions as f64
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loss: {:.4} | Acc: {:.2}%",
            self.avg_loss(),
            self.accuracy() * 100.0
        )
    }
}

/// Per-epoch history of one trial
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub train_losses: Vec<f64>,
    pub train_accuracies: Vec<f64>,
    pub val_accuracies: Vec<f32>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record metrics for an epoch
    pub fn record_epoch(&mut self, train: &Metrics, val_accuracy: f32) {
        self.train_losses.push(train.avg_loss());
        self.train_accuracies.push(train.accuracy());
        self.val_accuracies.push(val_accuracy);
    }

    /// Validation accuracy after the last recorded epoch
    pub fn final_val_accuracy(&self) -> Option<f32> {
        self.val_accuracies.last().copied()
    }
}
