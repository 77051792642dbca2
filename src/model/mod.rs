pub mod artifact;
pub mod forest;
pub mod network;
pub mod scaler;
pub mod threshold;

use crate::data::NUM_FEATURES;
use burn::prelude::*;

/// Base estimator configuration
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Number of input features
    #[config(default = "7")]
    pub input_size: usize,

    /// Number of hidden units in first layer
    #[config(default = "256")]
    pub hidden_size_1: usize,

    /// Number of hidden units in second layer
    #[config(default = "128")]
    pub hidden_size_2: usize,

    /// Number of hidden units in third layer
    #[config(default = "64")]
    pub hidden_size_3: usize,

    /// Dropout rate
    #[config(default = "0.0")]
    pub dropout: f64,
}

impl ModelConfig {
    /// Configuration used for discovery runs.
    pub fn discovery_default() -> Self {
        Self::new()
            .with_input_size(NUM_FEATURES)
            .with_hidden_size_1(256)
            .with_hidden_size_2(128)
            .with_hidden_size_3(64)
            .with_dropout(0.0)
    }

    /// Smaller network for quick runs and tests.
    pub fn small() -> Self {
        Self::new()
            .with_input_size(NUM_FEATURES)
            .with_hidden_size_1(32)
            .with_hidden_size_2(16)
            .with_hidden_size_3(8)
            .with_dropout(0.0)
    }
}
