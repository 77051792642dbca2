use crate::data::ModelingRow;
use crate::error::PipelineError;
use crate::model::artifact::ArtifactMetadata;
use crate::training::ScoredDataset;
use crate::utils::text;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Placeholder written for genes with no known drug.
pub const NO_KNOWN_DRUG: &str = "none";

/// One row of the persisted discovery report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    pub gene_symbol: String,
    pub ppi_mean: f64,
    pub ppi_max: f64,
    pub ppi_std: f64,
    pub ppi_skew: f64,
    pub interaction_count: f64,
    pub degree_max: f64,
    pub degree_mean: f64,
    pub is_target: u8,
    pub existing_drugs: String,
    pub discovery_score: f64,
    pub is_novel_discovery: u8,
}

/// The canonical ranked output of one discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    pub run_id: String,
    pub threshold: f64,
    /// Records ordered by descending score, gene symbol breaking ties
    pub records: Vec<DiscoveryRecord>,
}

/// Attach scores and novelty flags to the modeling table and rank it.
///
/// The scores must come from the same training run as the artifact whose
/// threshold is applied; anything else is rejected outright.
pub fn build_report(
    rows: &[ModelingRow],
    scored: &ScoredDataset,
    metadata: &ArtifactMetadata,
) -> Result<DiscoveryReport, PipelineError> {
    if scored.run_id != metadata.run_id {
        return Err(PipelineError::ArtifactVersionMismatch {
            scores_run: scored.run_id.clone(),
            artifact_run: metadata.run_id.clone(),
        });
    }
    if scored.scores.len() != rows.len() {
        return Err(PipelineError::SchemaMismatch {
            stage: "report",
            detail: format!(
                "{} scores for {} modeling rows",
                scored.scores.len(),
                rows.len()
            ),
        });
    }

    let threshold = metadata.threshold.threshold;
    let mut records: Vec<DiscoveryRecord> = rows
        .iter()
        .zip(&scored.scores)
        .map(|(row, &score)| {
            let features = row.features;
            DiscoveryRecord {
                gene_symbol: row.gene_symbol.clone(),
                ppi_mean: features.ppi_mean,
                ppi_max: features.ppi_max,
                ppi_std: features.ppi_std,
                ppi_skew: features.ppi_skew,
                interaction_count: features.interaction_count,
                degree_max: features.degree_max,
                degree_mean: features.degree_mean,
                is_target: row.is_target,
                existing_drugs: text::or_placeholder(
                    row.existing_drugs.as_deref(),
                    NO_KNOWN_DRUG,
                ),
                discovery_score: score,
                is_novel_discovery: (score >= threshold && row.is_target == 0) as u8,
            }
        })
        .collect();

    records.sort_by(|a, b| {
        b.discovery_score
            .partial_cmp(&a.discovery_score)
            .unwrap()
            .then_with(|| a.gene_symbol.cmp(&b.gene_symbol))
    });

    Ok(DiscoveryReport {
        run_id: metadata.run_id.clone(),
        threshold,
        records,
    })
}

/// Write the report to every destination, atomically.
///
/// Each file is first written to a temporary sibling and renamed into place,
/// so a concurrent reader never observes a truncated or unordered report.
pub fn write_report(report: &DiscoveryReport, destinations: &[PathBuf]) -> Result<()> {
    let bytes = to_csv_bytes(report)?;

    for destination in destinations {
        atomic_write(destination, &bytes)
            .with_context(|| format!("Failed to write report to {:?}", destination))?;
        info!("Wrote discovery report ({} genes) to {:?}", report.records.len(), destination);
    }
    Ok(())
}

/// Read a persisted report back, preserving its order.
pub fn read_report<P: AsRef<Path>>(path: P) -> Result<Vec<DiscoveryRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open report {:?}", path))?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: DiscoveryRecord = result.context("Failed to parse report row")?;
        records.push(record);
    }
    Ok(records)
}

/// Log operator-facing statistics of a finished run.
pub fn log_summary(report: &DiscoveryReport) {
    let total = report.records.len();
    let known = report.records.iter().filter(|r| r.is_target == 1).count();
    let novel = report
        .records
        .iter()
        .filter(|r| r.is_novel_discovery == 1)
        .count();
    let with_drugs = report
        .records
        .iter()
        .filter(|r| r.existing_drugs != NO_KNOWN_DRUG)
        .count();

    info!("=== Discovery summary (run {}) ===", report.run_id);
    info!("Genes ranked:      {}", total);
    info!(
        "Known targets:     {} ({:.2}% with a drug)",
        known,
        if known > 0 {
            with_drugs as f64 / known as f64 * 100.0
        } else {
            0.0
        }
    );
    info!("Novel discoveries: {} at threshold {:.4}", novel, report.threshold);

    if let Some(top) = report.records.first() {
        info!(
            "Top candidate: {} (score {:.4})",
            top.gene_symbol, top.discovery_score
        );
    }
}

fn to_csv_bytes(report: &DiscoveryReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in &report.records {
        writer.serialize(record).context("Failed to serialize report row")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish report serialization: {e}"))
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("report.csv");
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    fs::write(&temp_path, bytes)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GeneFeatures;
    use crate::model::artifact::Metrics;
    use crate::model::forest::ForestConfig;
    use crate::model::threshold::ThresholdSelection;
    use crate::model::ModelConfig;
    use tempfile::TempDir;

    fn metadata(run_id: &str, threshold: f64) -> ArtifactMetadata {
        ArtifactMetadata {
            run_id: run_id.to_string(),
            version: "0.1.0".to_string(),
            created: "2026-01-01T00:00:00Z".to_string(),
            seed: 42,
            n_rows: 2,
            n_positives: 1,
            model_config: ModelConfig::small(),
            forest_config: ForestConfig::default(),
            threshold: ThresholdSelection {
                threshold,
                precision: 1.0,
                recall: 1.0,
                attained: true,
            },
            metrics: Metrics::default(),
        }
    }

    fn row(gene: &str, is_target: u8) -> ModelingRow {
        ModelingRow {
            gene_symbol: gene.to_string(),
            features: GeneFeatures::default(),
            is_target,
            existing_drugs: None,
        }
    }

    #[test]
    fn test_novelty_flag_rules() {
        let rows = vec![row("UNLABELED", 0), row("KNOWN", 1)];
        let scored = ScoredDataset {
            run_id: "run1".to_string(),
            scores: vec![0.95, 0.95],
        };

        let report = build_report(&rows, &scored, &metadata("run1", 0.90)).unwrap();

        let unlabeled = report
            .records
            .iter()
            .find(|r| r.gene_symbol == "UNLABELED")
            .unwrap();
        let known = report.records.iter().find(|r| r.gene_symbol == "KNOWN").unwrap();

        // High score + no existing label: novel; already documented: not novel
        assert_eq!(unlabeled.is_novel_discovery, 1);
        assert_eq!(known.is_novel_discovery, 0);
    }

    #[test]
    fn test_below_threshold_is_not_novel() {
        let rows = vec![row("GENEA", 0)];
        let scored = ScoredDataset {
            run_id: "run1".to_string(),
            scores: vec![0.89],
        };
        let report = build_report(&rows, &scored, &metadata("run1", 0.90)).unwrap();
        assert_eq!(report.records[0].is_novel_discovery, 0);
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let rows = vec![row("B", 0), row("A", 0), row("C", 0)];
        let scored = ScoredDataset {
            run_id: "run1".to_string(),
            scores: vec![0.5, 0.9, 0.5],
        };
        let report = build_report(&rows, &scored, &metadata("run1", 0.90)).unwrap();

        let order: Vec<&str> = report.records.iter().map(|r| r.gene_symbol.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_mismatched_run_rejected() {
        let rows = vec![row("GENEA", 0)];
        let scored = ScoredDataset {
            run_id: "other".to_string(),
            scores: vec![0.5],
        };
        let err = build_report(&rows, &scored, &metadata("run1", 0.90)).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactVersionMismatch { .. }));
    }

    #[test]
    fn test_write_and_read_roundtrip_all_destinations() {
        let temp_dir = TempDir::new().unwrap();
        let rows = vec![row("GENEA", 1), row("GENEB", 0)];
        let scored = ScoredDataset {
            run_id: "run1".to_string(),
            scores: vec![0.95, 0.2],
        };
        let report = build_report(&rows, &scored, &metadata("run1", 0.90)).unwrap();

        let destinations = vec![
            temp_dir.path().join("discovery_report.csv"),
            temp_dir.path().join("mirror/top_targets.csv"),
        ];
        write_report(&report, &destinations).unwrap();

        for destination in &destinations {
            let records = read_report(destination).unwrap();
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].gene_symbol, "GENEA");
            assert_eq!(records[0].existing_drugs, NO_KNOWN_DRUG);
        }

        // No temporary files left behind
        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
