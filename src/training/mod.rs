pub mod trainer;

use crate::model::forest::ForestConfig;
use serde::{Deserialize, Serialize};

/// Training configuration for the stacked classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of base-estimator training epochs
    pub epochs: usize,
    /// Batch size
    pub batch_size: usize,
    /// Learning rate
    pub learning_rate: f64,
    /// Weight decay (L2 regularization)
    pub weight_decay: f64,
    /// Random seed for every stochastic component
    pub seed: u64,
    /// Minimum number of known targets required to fit at all
    pub min_positives: usize,
    /// Meta estimator configuration
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 300,
            batch_size: 256,
            learning_rate: 0.001,
            weight_decay: 0.001,
            seed: 42,
            min_positives: 2,
            forest: ForestConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Configuration for quick runs and tests.
    pub fn quick_test() -> Self {
        Self {
            epochs: 20,
            batch_size: 64,
            learning_rate: 0.01,
            forest: ForestConfig {
                n_trees: 25,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Discovery scores stamped with the run that produced them.
///
/// The report generator refuses to pair these with an artifact from a
/// different run, which rules out mixed-version reports by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDataset {
    pub run_id: String,
    /// One score per modeling row, in row order
    pub scores: Vec<f64>,
}
