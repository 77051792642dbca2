use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the discovery pipeline.
///
/// Only some variants are fatal to a run: an unavailable optional source is
/// downgraded to an empty contribution by the caller, and an unattainable
/// precision target falls back to the default threshold. Everything else
/// aborts the run with a diagnostic naming the failing stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An optional input file is missing or unparseable.
    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// A required column or field is absent after a merge.
    #[error("schema mismatch in {stage}: {detail}")]
    SchemaMismatch { stage: &'static str, detail: String },

    /// Too few known targets to fit a meaningful classifier.
    #[error("insufficient positive labels: {found} known targets, minimum {required}")]
    InsufficientPositives { found: usize, required: usize },

    /// No score threshold meets the precision target.
    #[error("no threshold reaches precision {target:.2}")]
    ThresholdUnattainable { target: f64 },

    /// Scores and threshold come from different training runs.
    #[error("artifact version mismatch: scores from run {scores_run}, artifact from run {artifact_run}")]
    ArtifactVersionMismatch {
        scores_run: String,
        artifact_run: String,
    },
}

impl PipelineError {
    /// Whether the error may be degraded instead of aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::SourceUnavailable { .. } | PipelineError::ThresholdUnattainable { .. }
        )
    }
}
