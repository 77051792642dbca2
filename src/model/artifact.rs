use burn::prelude::*;
use burn::record::{CompactRecorder, Recorder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::error::PipelineError;
use crate::model::forest::{EntropyForest, ForestConfig};
use crate::model::network::{init_network, TargetNet};
use crate::model::scaler::RobustScaler;
use crate::model::threshold::ThresholdSelection;
use crate::model::ModelConfig;

/// Operator-visible diagnostics of a training run.
///
/// Reported for visibility only; nothing downstream consumes these.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Metrics {
    pub accuracy: f64,
    pub f1: f64,
    /// Precision/recall for the known-target class
    pub precision_positive: f64,
    pub recall_positive: f64,
    /// Precision/recall for the non-target class
    pub precision_negative: f64,
    pub recall_negative: f64,
}

impl Metrics {
    /// Log a per-class classification report.
    pub fn log_report(&self, threshold: f64) {
        info!("=== Classification report (threshold {:.4}) ===", threshold);
        info!("Overall accuracy: {:.2}%", self.accuracy * 100.0);
        info!("F1 score:         {:.2}%", self.f1 * 100.0);
        info!(
            "Non-target (0):   precision {:.4}, recall {:.4}",
            self.precision_negative, self.recall_negative
        );
        info!(
            "Known target (1): precision {:.4}, recall {:.4}",
            self.precision_positive, self.recall_positive
        );
    }
}

/// Metadata binding every component of one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Identifier shared by all files of this run
    pub run_id: String,
    /// Crate version that produced the artifact
    pub version: String,
    /// Creation timestamp (informational only)
    pub created: String,
    pub seed: u64,
    pub n_rows: usize,
    pub n_positives: usize,
    pub model_config: ModelConfig,
    pub forest_config: ForestConfig,
    pub threshold: ThresholdSelection,
    pub metrics: Metrics,
}

/// A fully trained, versioned model: scaler, base estimator, meta estimator
/// and selected threshold. Components are immutable once persisted; a new
/// training run produces a new artifact under a new run id.
#[derive(Debug)]
pub struct TrainedArtifact<B: Backend> {
    pub metadata: ArtifactMetadata,
    pub scaler: RobustScaler,
    pub network: TargetNet<B>,
    pub forest: EntropyForest,
}

/// Deterministic run identifier over the run's defining inputs.
pub fn compute_run_id(seed: u64, n_rows: usize, n_positives: usize, config: &ModelConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(n_rows.to_le_bytes());
    hasher.update(n_positives.to_le_bytes());
    hasher.update(format!(
        "{}x{}x{}x{}",
        config.input_size, config.hidden_size_1, config.hidden_size_2, config.hidden_size_3
    ));
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..12].to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct VersionedScaler {
    run_id: String,
    scaler: RobustScaler,
}

#[derive(Debug, Serialize, Deserialize)]
struct VersionedForest {
    run_id: String,
    forest: EntropyForest,
}

#[derive(Debug, Serialize, Deserialize)]
struct VersionedThreshold {
    run_id: String,
    threshold: ThresholdSelection,
}

/// Saves and loads trained artifacts, one directory per run.
pub struct ArtifactManager {
    artifact_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new<P: AsRef<Path>>(artifact_dir: P) -> Result<Self> {
        let artifact_dir = artifact_dir.as_ref().to_path_buf();
        fs::create_dir_all(&artifact_dir).context("Failed to create artifact directory")?;
        Ok(Self { artifact_dir })
    }

    /// Persist every component of a trained artifact under its run id.
    pub fn save<B: Backend>(&self, artifact: &TrainedArtifact<B>) -> Result<()> {
        let run_id = &artifact.metadata.run_id;

        let metadata_json = serde_json::to_string_pretty(&artifact.metadata)
            .context("Failed to serialize artifact metadata")?;
        fs::write(self.artifact_dir.join("artifact.json"), metadata_json)
            .context("Failed to write artifact metadata")?;

        let scaler_json = serde_json::to_string_pretty(&VersionedScaler {
            run_id: run_id.clone(),
            scaler: artifact.scaler.clone(),
        })?;
        fs::write(self.artifact_dir.join("scaler.json"), scaler_json)
            .context("Failed to write scaler parameters")?;

        let forest_json = serde_json::to_string(&VersionedForest {
            run_id: run_id.clone(),
            forest: artifact.forest.clone(),
        })?;
        fs::write(self.artifact_dir.join("forest.json"), forest_json)
            .context("Failed to write forest parameters")?;

        let threshold_json = serde_json::to_string_pretty(&VersionedThreshold {
            run_id: run_id.clone(),
            threshold: artifact.metadata.threshold,
        })?;
        fs::write(self.artifact_dir.join("threshold.json"), threshold_json)
            .context("Failed to write threshold")?;

        let record = artifact.network.clone().into_record();
        CompactRecorder::new()
            .record(record, self.artifact_dir.join("network"))
            .context("Failed to save network weights")?;

        info!("Saved artifact {} to {:?}", run_id, self.artifact_dir);
        Ok(())
    }

    /// Load a trained artifact, verifying that every component carries the
    /// same run id.
    pub fn load<B: Backend>(&self, device: &B::Device) -> Result<TrainedArtifact<B>> {
        let metadata_json = fs::read_to_string(self.artifact_dir.join("artifact.json"))
            .context("Failed to read artifact metadata")?;
        let metadata: ArtifactMetadata =
            serde_json::from_str(&metadata_json).context("Failed to parse artifact metadata")?;

        let scaler: VersionedScaler = serde_json::from_str(
            &fs::read_to_string(self.artifact_dir.join("scaler.json"))
                .context("Failed to read scaler parameters")?,
        )?;
        self.check_run_id(&metadata.run_id, &scaler.run_id)?;

        let forest: VersionedForest = serde_json::from_str(
            &fs::read_to_string(self.artifact_dir.join("forest.json"))
                .context("Failed to read forest parameters")?,
        )?;
        self.check_run_id(&metadata.run_id, &forest.run_id)?;

        let threshold: VersionedThreshold = serde_json::from_str(
            &fs::read_to_string(self.artifact_dir.join("threshold.json"))
                .context("Failed to read threshold")?,
        )?;
        self.check_run_id(&metadata.run_id, &threshold.run_id)?;

        let record = CompactRecorder::new()
            .load(self.artifact_dir.join("network"), device)
            .context("Failed to load network weights")?;
        let network = init_network::<B>(&metadata.model_config, device).load_record(record);

        info!("Loaded artifact {}", metadata.run_id);
        Ok(TrainedArtifact {
            metadata,
            scaler: scaler.scaler,
            network,
            forest: forest.forest,
        })
    }

    fn check_run_id(&self, expected: &str, found: &str) -> Result<()> {
        if expected != found {
            return Err(PipelineError::ArtifactVersionMismatch {
                scores_run: found.to_string(),
                artifact_run: expected.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::threshold::ThresholdSelection;
    use burn::backend::NdArray;
    use tempfile::TempDir;

    type TestBackend = NdArray<f32>;

    fn test_artifact(device: &<TestBackend as Backend>::Device) -> TrainedArtifact<TestBackend> {
        let model_config = ModelConfig::small();
        let forest_config = ForestConfig {
            n_trees: 5,
            ..Default::default()
        };
        let network = init_network::<TestBackend>(&model_config, device);
        let scaler = RobustScaler::fit(&[[1.0; crate::data::NUM_FEATURES]]).unwrap();
        let forest = EntropyForest::fit(&[0.1, 0.9], &[0, 1], &forest_config, 1);

        let run_id = compute_run_id(1, 2, 1, &model_config);
        TrainedArtifact {
            metadata: ArtifactMetadata {
                run_id,
                version: "0.1.0".to_string(),
                created: "2026-01-01T00:00:00Z".to_string(),
                seed: 1,
                n_rows: 2,
                n_positives: 1,
                model_config,
                forest_config,
                threshold: ThresholdSelection {
                    threshold: 0.5,
                    precision: 1.0,
                    recall: 1.0,
                    attained: true,
                },
                metrics: Metrics::default(),
            },
            scaler,
            network,
            forest,
        }
    }

    #[test]
    fn test_run_id_is_deterministic() {
        let config = ModelConfig::small();
        assert_eq!(
            compute_run_id(42, 100, 5, &config),
            compute_run_id(42, 100, 5, &config)
        );
        assert_ne!(
            compute_run_id(42, 100, 5, &config),
            compute_run_id(43, 100, 5, &config)
        );
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let device = <TestBackend as Backend>::Device::default();
        let manager = ArtifactManager::new(temp_dir.path()).unwrap();

        let artifact = test_artifact(&device);
        manager.save(&artifact).unwrap();

        let loaded = manager.load::<TestBackend>(&device).unwrap();
        assert_eq!(loaded.metadata.run_id, artifact.metadata.run_id);
        assert_eq!(loaded.scaler, artifact.scaler);
        assert_eq!(loaded.forest, artifact.forest);
        assert_eq!(
            loaded.metadata.threshold.threshold,
            artifact.metadata.threshold.threshold
        );
    }

    #[test]
    fn test_mixed_run_ids_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let device = <TestBackend as Backend>::Device::default();
        let manager = ArtifactManager::new(temp_dir.path()).unwrap();

        let artifact = test_artifact(&device);
        manager.save(&artifact).unwrap();

        // Overwrite the threshold file with one from a different run
        let stale = VersionedThreshold {
            run_id: "deadbeef0000".to_string(),
            threshold: artifact.metadata.threshold,
        };
        fs::write(
            temp_dir.path().join("threshold.json"),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        let err = manager.load::<TestBackend>(&device).unwrap_err();
        assert!(err.to_string().contains("version mismatch"));
    }
}
