use crate::model::ModelConfig;
use burn::module::Module;
use burn::nn::loss::BinaryCrossEntropyLossConfig;
use burn::nn::*;
use burn::tensor::activation::{relu, sigmoid};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

/// Base estimator: a feed-forward network scoring each gene from its scaled
/// graph features.
///
/// Three hidden layers give the capacity a single shallow model lacks on the
/// skewed interaction-feature distribution; calibration of its output is the
/// meta estimator's job.
#[derive(Module, Debug)]
pub struct TargetNet<B: Backend> {
    /// First fully connected layer
    fc1: Linear<B>,
    /// Second fully connected layer
    fc2: Linear<B>,
    /// Third fully connected layer
    fc3: Linear<B>,
    /// Output layer
    output: Linear<B>,
    /// Dropout layer
    dropout: Dropout,
}

impl<B: Backend> TargetNet<B> {
    /// Forward pass producing logits.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.fc1.forward(input);
        let x = relu(x);
        let x = self.dropout.forward(x);

        let x = self.fc2.forward(x);
        let x = relu(x);
        let x = self.dropout.forward(x);

        let x = self.fc3.forward(x);
        let x = relu(x);
        let x = self.dropout.forward(x);

        self.output.forward(x)
    }

    /// Forward pass for training, with binary cross-entropy loss.
    pub fn forward_training(
        &self,
        input: Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> TrainingOutput<B> {
        let logits = self.forward(input);

        let loss = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device())
            .forward(logits.clone().squeeze(1), targets.clone());

        TrainingOutput {
            loss,
            logits,
            targets,
        }
    }

    /// Per-row probabilities in [0, 1].
    pub fn predict_probabilities(&self, input: Tensor<B, 2>) -> Vec<f64> {
        let probabilities = sigmoid(self.forward(input));
        probabilities
            .squeeze::<1>(1)
            .into_data()
            .iter::<f32>()
            .map(|p| p as f64)
            .collect()
    }
}

/// Training output
#[derive(Debug)]
pub struct TrainingOutput<B: Backend> {
    pub loss: Tensor<B, 1>,
    pub logits: Tensor<B, 2>,
    pub targets: Tensor<B, 1, Int>,
}

/// Initialize the base estimator from configuration.
pub fn init_network<B: Backend>(config: &ModelConfig, device: &B::Device) -> TargetNet<B> {
    let fc1 = LinearConfig::new(config.input_size, config.hidden_size_1)
        .with_bias(true)
        .init(device);

    let fc2 = LinearConfig::new(config.hidden_size_1, config.hidden_size_2)
        .with_bias(true)
        .init(device);

    let fc3 = LinearConfig::new(config.hidden_size_2, config.hidden_size_3)
        .with_bias(true)
        .init(device);

    let output = LinearConfig::new(config.hidden_size_3, 1)
        .with_bias(true)
        .init(device);

    let dropout = DropoutConfig::new(config.dropout).init();

    TargetNet {
        fc1,
        fc2,
        fc3,
        output,
        dropout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NUM_FEATURES;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shape() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ModelConfig::small();
        let network = init_network::<TestBackend>(&config, &device);

        let input = Tensor::<TestBackend, 2>::zeros([4, NUM_FEATURES], &device);
        let output = network.forward(input);

        assert_eq!(output.dims(), [4, 1]);
    }

    #[test]
    fn test_probabilities_in_unit_interval() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ModelConfig::small();
        let network = init_network::<TestBackend>(&config, &device);

        let input = Tensor::<TestBackend, 2>::ones([3, NUM_FEATURES], &device);
        let probabilities = network.predict_probabilities(input);

        assert_eq!(probabilities.len(), 3);
        for p in probabilities {
            assert!((0.0..=1.0).contains(&p));
        }
    }
}
