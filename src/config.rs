use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default minimum interaction confidence, on the source 0-1000 scale.
///
/// Corresponds to the "high confidence" band of the interaction database.
pub const DEFAULT_MIN_SCORE: f64 = 700.0;

/// Default precision target for threshold selection.
pub const DEFAULT_PRECISION_TARGET: f64 = 0.90;

/// Threshold used when no score reaches the precision target.
pub const DEFAULT_FALLBACK_THRESHOLD: f64 = 0.5;

/// Input file locations for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputPaths {
    /// Interaction edge list (protein_a, protein_b, score), optionally gzipped
    pub links: PathBuf,
    /// Protein id to preferred gene symbol dictionary
    pub protein_info: PathBuf,
    /// Disease catalog (code, name); optional source
    pub disease_catalog: PathBuf,
    /// Disease-gene association catalog; optional source
    pub disease_gene_catalog: PathBuf,
    /// Drug-target catalog; optional source
    pub drug_catalog: PathBuf,
}

/// Configuration for one discovery run.
///
/// Every stage receives the slice of this structure it needs; defaults are
/// supplied only where the orchestration boundary (the CLI) builds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub inputs: InputPaths,
    /// Minimum interaction score retained for feature statistics
    pub min_score: f64,
    /// Precision the selected threshold must reach
    pub precision_target: f64,
    /// Threshold used when the precision target is unattainable
    pub fallback_threshold: f64,
    /// Seed for every stochastic component
    pub seed: u64,
    /// Directory receiving artifacts and the canonical report
    pub output_dir: PathBuf,
    /// Additional well-known paths the report is mirrored to
    pub mirror_paths: Vec<PathBuf>,
}

impl PipelineConfig {
    /// Canonical report location inside the output directory.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("discovery_report.csv")
    }

    /// Artifact directory inside the output directory.
    pub fn artifact_dir(&self) -> PathBuf {
        self.output_dir.join("artifact")
    }

    /// All destinations the report is written to, canonical path first.
    pub fn report_destinations(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.report_path()];
        paths.extend(self.mirror_paths.iter().cloned());
        paths
    }
}
