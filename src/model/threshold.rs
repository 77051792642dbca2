use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// The selected operating point of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSelection {
    /// Score at or above which a gene is called a target
    pub threshold: f64,
    /// Precision achieved at the threshold
    pub precision: f64,
    /// Recall achieved at the threshold
    pub recall: f64,
    /// False when no threshold reached the target and the fallback applies
    pub attained: bool,
}

/// Choose the smallest threshold whose precision reaches the target.
///
/// Candidates are the distinct score values. When no candidate attains the
/// target (label noise, too few positives), the fixed fallback threshold is
/// used instead; that condition is recoverable and only logged.
pub fn select_threshold(
    scores: &[f64],
    labels: &[u8],
    precision_target: f64,
    fallback: f64,
) -> ThresholdSelection {
    debug_assert_eq!(scores.len(), labels.len());

    let total_positives = labels.iter().filter(|&&y| y == 1).count();

    // Distinct candidate thresholds, ascending
    let mut candidates: Vec<f64> = scores.to_vec();
    candidates.sort_by(|a, b| a.partial_cmp(b).unwrap());
    candidates.dedup();

    for &candidate in &candidates {
        let (precision, recall) = precision_recall_at(scores, labels, candidate, total_positives);
        if precision >= precision_target {
            info!(
                "Selected threshold {:.4} (precision {:.4}, recall {:.4})",
                candidate, precision, recall
            );
            return ThresholdSelection {
                threshold: candidate,
                precision,
                recall,
                attained: true,
            };
        }
    }

    let unattainable = PipelineError::ThresholdUnattainable {
        target: precision_target,
    };
    warn!("{}; falling back to threshold {}", unattainable, fallback);

    let (precision, recall) = precision_recall_at(scores, labels, fallback, total_positives);
    ThresholdSelection {
        threshold: fallback,
        precision,
        recall,
        attained: false,
    }
}

/// Precision and recall of the rule `score >= threshold`.
fn precision_recall_at(
    scores: &[f64],
    labels: &[u8],
    threshold: f64,
    total_positives: usize,
) -> (f64, f64) {
    let mut true_positives = 0usize;
    let mut predicted_positives = 0usize;

    for (&score, &label) in scores.iter().zip(labels) {
        if score >= threshold {
            predicted_positives += 1;
            if label == 1 {
                true_positives += 1;
            }
        }
    }

    let precision = if predicted_positives > 0 {
        true_positives as f64 / predicted_positives as f64
    } else {
        0.0
    };
    let recall = if total_positives > 0 {
        true_positives as f64 / total_positives as f64
    } else {
        0.0
    };

    (precision, recall)
}
