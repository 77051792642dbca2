use crate::data::NUM_FEATURES;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Robust feature scaler: centers by the median and scales by the
/// interquartile range.
///
/// Interaction-count features carry a heavy right skew, which makes
/// mean/variance scaling unstable; quartiles are insensitive to the tail.
/// Fit once on the training rows and reused verbatim at inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustScaler {
    centers: Vec<f64>,
    scales: Vec<f64>,
}

impl RobustScaler {
    /// Fit the scaler on a feature matrix, one row per gene.
    pub fn fit(matrix: &[[f64; NUM_FEATURES]]) -> Result<Self, PipelineError> {
        if matrix.is_empty() {
            return Err(PipelineError::SchemaMismatch {
                stage: "scaler",
                detail: "cannot fit on an empty feature matrix".to_string(),
            });
        }

        let mut centers = Vec::with_capacity(NUM_FEATURES);
        let mut scales = Vec::with_capacity(NUM_FEATURES);

        for column in 0..NUM_FEATURES {
            let mut values: Vec<f64> = matrix.iter().map(|row| row[column]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap());

            let median = percentile(&values, 50.0);
            let iqr = percentile(&values, 75.0) - percentile(&values, 25.0);
            // A constant column scales by 1 so it passes through unchanged
            let scale = if iqr.abs() < 1e-12 { 1.0 } else { iqr };

            centers.push(median);
            scales.push(scale);
        }

        debug!("Fitted robust scaler: centers={:?}", centers);
        Ok(Self { centers, scales })
    }

    /// Scale one feature row.
    pub fn transform_row(&self, row: &[f64; NUM_FEATURES]) -> [f64; NUM_FEATURES] {
        let mut scaled = [0.0; NUM_FEATURES];
        for (i, value) in row.iter().enumerate() {
            scaled[i] = (value - self.centers[i]) / self.scales[i];
        }
        scaled
    }

    /// Scale a full feature matrix.
    pub fn transform(&self, matrix: &[[f64; NUM_FEATURES]]) -> Vec<[f64; NUM_FEATURES]> {
        matrix.iter().map(|row| self.transform_row(row)).collect()
    }
}

/// Linear-interpolation percentile over a sorted slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        sorted[low]
    } else {
        let weight = rank - low as f64;
        sorted[low] * (1.0 - weight) + sorted[high] * weight
    }
}
