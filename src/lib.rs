//! # TargetRank: drug-target discovery
//!
//! TargetRank identifies candidate disease-gene drug targets by combining a
//! confidence-scored protein interaction network with weak labels from
//! curated rare-disease and drug-target catalogs, then ranking every gene by
//! a learned discovery score.
//!
//! ## Pipeline
//!
//! - Graph loading: edge list + protein dictionary into a gene-annotated
//!   edge table
//! - Label integration: catalog associations into one deduplicated
//!   weak-label table
//! - Feature aggregation: interaction-strength and connectivity statistics
//!   per gene
//! - Stacked classification: robust scaling, a feed-forward base estimator
//!   and an entropy-forest meta estimator, fully seeded
//! - Precision-constrained threshold selection and a ranked discovery
//!   report with novelty flags
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use targetrank::data::graph::{load_protein_dictionary, GraphLoader};
//! use targetrank::data::features::aggregate_features;
//! use targetrank::data::labels::WeakLabels;
//! use targetrank::data::assemble::assemble_dataset;
//! use targetrank::model::ModelConfig;
//! use targetrank::training::{trainer::StackedTrainer, TrainingConfig};
//!
//! let dictionary = load_protein_dictionary("protein_info.txt").unwrap();
//! let graph = GraphLoader::new(700.0).load("links.txt", &dictionary).unwrap();
//!
//! let features = aggregate_features(&graph);
//! let labels = WeakLabels::integrate(&[]);
//! let rows = assemble_dataset(&features, &labels).unwrap();
//!
//! let device = burn::backend::ndarray::NdArrayDevice::default();
//! let trainer = StackedTrainer::<targetrank::TrainingBackend>::new(
//!     TrainingConfig::default(),
//!     ModelConfig::discovery_default(),
//!     0.90,
//!     0.5,
//!     device,
//! );
//! let outcome = trainer.train(&rows).unwrap();
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod report;
pub mod training;
pub mod utils;

use burn::backend::Autodiff;
use burn_ndarray::NdArray;

/// Default inference backend type
pub type DefaultBackend = NdArray<f32>;

/// Backend used for base-estimator training
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Re-export commonly used types
pub use config::PipelineConfig;
pub use data::{GeneFeatures, ModelingRow};
pub use error::PipelineError;
pub use model::{artifact::TrainedArtifact, ModelConfig};
pub use report::{DiscoveryRecord, DiscoveryReport};
pub use training::{ScoredDataset, TrainingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!(
        "{} v{} - drug-target discovery from protein interaction networks",
        NAME, VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_info() {
        let info_str = info();
        assert!(info_str.contains("targetrank"));
        assert!(info_str.contains(VERSION));
    }
}
