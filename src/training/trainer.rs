use crate::data::{ModelingRow, NUM_FEATURES};
use crate::error::PipelineError;
use crate::model::artifact::{compute_run_id, ArtifactMetadata, Metrics, TrainedArtifact};
use crate::model::forest::EntropyForest;
use crate::model::network::{init_network, TargetNet};
use crate::model::scaler::RobustScaler;
use crate::model::threshold::select_threshold;
use crate::model::ModelConfig;
use crate::training::{ScoredDataset, TrainingConfig};
use anyhow::{Context, Result};
use burn::module::AutodiffModule;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use burn::tensor::TensorData;
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use tracing::{debug, info};

/// Batch size used when scoring the full table after training.
const INFERENCE_BATCH: usize = 1024;

/// Everything a training run produces.
#[derive(Debug)]
pub struct TrainingOutcome<B: Backend> {
    pub artifact: TrainedArtifact<B>,
    pub scored: ScoredDataset,
    pub duration_secs: f64,
}

/// Trainer for the two-stage stacked classifier.
///
/// Stage one fits the feature scaler and the base network on the scaled
/// features; stage two fits the entropy forest on the base probabilities
/// alone. All randomness (weight init, batch order, tree bagging) derives
/// from the configured seed, so identical inputs reproduce identical scores.
pub struct StackedTrainer<B: AutodiffBackend> {
    config: TrainingConfig,
    model_config: ModelConfig,
    precision_target: f64,
    fallback_threshold: f64,
    device: B::Device,
}

impl<B: AutodiffBackend> StackedTrainer<B> {
    pub fn new(
        config: TrainingConfig,
        model_config: ModelConfig,
        precision_target: f64,
        fallback_threshold: f64,
        device: B::Device,
    ) -> Self {
        Self {
            config,
            model_config,
            precision_target,
            fallback_threshold,
            device,
        }
    }

    /// Train on the assembled modeling table.
    pub fn train(&self, rows: &[ModelingRow]) -> Result<TrainingOutcome<B::InnerBackend>> {
        let start_time = Instant::now();

        let labels: Vec<u8> = rows.iter().map(|r| r.is_target).collect();
        let n_positives = labels.iter().filter(|&&y| y == 1).count();
        if n_positives < self.config.min_positives {
            return Err(PipelineError::InsufficientPositives {
                found: n_positives,
                required: self.config.min_positives,
            })
            .context("Stacked classifier training failed");
        }

        info!(
            "Training stacked classifier on {} genes ({} known targets), seed {}",
            rows.len(),
            n_positives,
            self.config.seed
        );

        let matrix: Vec<[f64; NUM_FEATURES]> =
            rows.iter().map(|r| r.features.as_array()).collect();
        let scaler = RobustScaler::fit(&matrix).context("Feature scaling failed")?;
        let scaled = scaler.transform(&matrix);

        let network = self.fit_network(&scaled, &labels);
        let network = network.valid();

        let base_probabilities = predict_in_batches(&network, &scaled, &self.device);

        debug!("Fitting meta estimator on base probabilities");
        let forest = EntropyForest::fit(
            &base_probabilities,
            &labels,
            &self.config.forest,
            self.config.seed,
        );
        let scores = forest.scores(&base_probabilities);

        let selection = select_threshold(
            &scores,
            &labels,
            self.precision_target,
            self.fallback_threshold,
        );
        let metrics = compute_metrics(&scores, &labels, selection.threshold);
        metrics.log_report(selection.threshold);

        let run_id = compute_run_id(self.config.seed, rows.len(), n_positives, &self.model_config);
        let metadata = ArtifactMetadata {
            run_id: run_id.clone(),
            version: crate::VERSION.to_string(),
            created: chrono::Utc::now().to_rfc3339(),
            seed: self.config.seed,
            n_rows: rows.len(),
            n_positives,
            model_config: self.model_config.clone(),
            forest_config: self.config.forest.clone(),
            threshold: selection,
            metrics,
        };

        let duration_secs = start_time.elapsed().as_secs_f64();
        info!("Training completed in {:.2}s", duration_secs);

        Ok(TrainingOutcome {
            artifact: TrainedArtifact {
                metadata,
                scaler,
                network,
                forest,
            },
            scored: ScoredDataset { run_id, scores },
            duration_secs,
        })
    }

    /// Fit the base network with Adam on mini-batches in seeded order.
    fn fit_network(&self, scaled: &[[f64; NUM_FEATURES]], labels: &[u8]) -> TargetNet<B> {
        B::seed(self.config.seed);
        let mut network = init_network::<B>(&self.model_config, &self.device);
        let mut optimizer = AdamConfig::new()
            .with_weight_decay(Some(WeightDecayConfig::new(self.config.weight_decay as f32)))
            .init();

        let mut indices: Vec<usize> = (0..scaled.len()).collect();

        let progress = ProgressBar::new(self.config.epochs as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:40} {pos}/{len} epochs, loss {msg}")
        {
            progress.set_style(style);
        }

        for epoch in 0..self.config.epochs {
            let mut rng =
                ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(epoch as u64));
            indices.shuffle(&mut rng);

            let mut epoch_loss = 0.0;
            let mut batches = 0usize;

            for batch in indices.chunks(self.config.batch_size) {
                let (x, y) = self.make_batch(scaled, labels, batch);
                let output = network.forward_training(x, y);

                let loss_value: f64 = output.loss.clone().into_scalar().elem();
                epoch_loss += loss_value;
                batches += 1;

                let grads = output.loss.backward();
                let grads = GradientsParams::from_grads(grads, &network);
                network = optimizer.step(self.config.learning_rate, network, grads);
            }

            progress.set_message(format!("{:.4}", epoch_loss / batches.max(1) as f64));
            progress.inc(1);
        }
        progress.finish_and_clear();

        network
    }

    fn make_batch(
        &self,
        scaled: &[[f64; NUM_FEATURES]],
        labels: &[u8],
        batch: &[usize],
    ) -> (Tensor<B, 2>, Tensor<B, 1, Int>) {
        let mut features = Vec::with_capacity(batch.len() * NUM_FEATURES);
        let mut targets = Vec::with_capacity(batch.len());
        for &i in batch {
            features.extend(scaled[i].iter().map(|&v| v as f32));
            targets.push(labels[i] as i64);
        }

        let x = Tensor::<B, 2>::from_data(
            TensorData::new(features, [batch.len(), NUM_FEATURES]),
            &self.device,
        );
        let y = Tensor::<B, 1, Int>::from_data(TensorData::new(targets, [batch.len()]), &self.device);
        (x, y)
    }
}

/// Score rows in fixed-size batches with the inference network.
fn predict_in_batches<B: Backend>(
    network: &TargetNet<B>,
    scaled: &[[f64; NUM_FEATURES]],
    device: &B::Device,
) -> Vec<f64> {
    let mut probabilities = Vec::with_capacity(scaled.len());
    for batch in scaled.chunks(INFERENCE_BATCH) {
        let features: Vec<f32> = batch
            .iter()
            .flat_map(|row| row.iter().map(|&v| v as f32))
            .collect();
        let x = Tensor::<B, 2>::from_data(
            TensorData::new(features, [batch.len(), NUM_FEATURES]),
            device,
        );
        probabilities.extend(network.predict_probabilities(x));
    }
    probabilities
}

/// Diagnostics at a fixed threshold: accuracy, F1, per-class precision and
/// recall.
pub fn compute_metrics(scores: &[f64], labels: &[u8], threshold: f64) -> Metrics {
    let mut tp = 0usize;
    let mut tn = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;

    for (&score, &label) in scores.iter().zip(labels) {
        let predicted = score >= threshold;
        match (predicted, label == 1) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => tn += 1,
        }
    }

    let ratio = |num: usize, den: usize| if den > 0 { num as f64 / den as f64 } else { 0.0 };

    let precision_positive = ratio(tp, tp + fp);
    let recall_positive = ratio(tp, tp + fn_);
    let f1 = if precision_positive + recall_positive > 0.0 {
        2.0 * precision_positive * recall_positive / (precision_positive + recall_positive)
    } else {
        0.0
    };

    Metrics {
        accuracy: ratio(tp + tn, scores.len()),
        f1,
        precision_positive,
        recall_positive,
        precision_negative: ratio(tn, tn + fn_),
        recall_negative: ratio(tn, tn + fp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GeneFeatures;
    use burn::backend::Autodiff;
    use burn_ndarray::NdArray;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn synthetic_rows() -> Vec<ModelingRow> {
        // Known targets are strongly connected hubs; the rest are quiet
        let mut rows = Vec::new();
        for i in 0..40 {
            let is_target = (i % 8 == 0) as u8;
            let strength = if is_target == 1 { 900.0 } else { 150.0 };
            rows.push(ModelingRow {
                gene_symbol: format!("GENE{i}"),
                features: GeneFeatures {
                    ppi_mean: strength,
                    ppi_max: strength + 40.0,
                    ppi_std: 12.0,
                    ppi_skew: 0.3,
                    interaction_count: if is_target == 1 { 30.0 } else { 2.0 },
                    degree_max: if is_target == 1 { 55.0 } else { 3.0 },
                    degree_mean: if is_target == 1 { 40.0 } else { 2.0 },
                },
                is_target,
                existing_drugs: None,
            });
        }
        rows
    }

    fn quick_trainer() -> StackedTrainer<TestBackend> {
        StackedTrainer::new(
            TrainingConfig::quick_test(),
            ModelConfig::small(),
            0.90,
            0.5,
            Default::default(),
        )
    }

    #[test]
    fn test_insufficient_positives_aborts() {
        let mut rows = synthetic_rows();
        for row in rows.iter_mut() {
            row.is_target = 0;
        }
        rows[0].is_target = 1;

        let err = quick_trainer().train(&rows).unwrap_err();
        assert!(err.to_string().contains("failed"));
        assert!(format!("{err:#}").contains("insufficient positive labels"));
    }

    #[test]
    fn test_training_is_deterministic() {
        let rows = synthetic_rows();

        let a = quick_trainer().train(&rows).unwrap();
        let b = quick_trainer().train(&rows).unwrap();

        assert_eq!(a.scored.run_id, b.scored.run_id);
        assert_eq!(a.scored.scores, b.scored.scores);
        assert_eq!(
            a.artifact.metadata.threshold.threshold,
            b.artifact.metadata.threshold.threshold
        );
    }

    #[test]
    fn test_scores_cover_every_row() {
        let rows = synthetic_rows();
        let outcome = quick_trainer().train(&rows).unwrap();

        assert_eq!(outcome.scored.scores.len(), rows.len());
        assert!(outcome
            .scored
            .scores
            .iter()
            .all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_compute_metrics_known_values() {
        let scores = vec![0.9, 0.8, 0.2, 0.1];
        let labels = vec![1, 0, 1, 0];
        let metrics = compute_metrics(&scores, &labels, 0.5);

        assert_eq!(metrics.accuracy, 0.5);
        assert_eq!(metrics.precision_positive, 0.5);
        assert_eq!(metrics.recall_positive, 0.5);
        assert_eq!(metrics.precision_negative, 0.5);
        assert_eq!(metrics.recall_negative, 0.5);
    }
}
