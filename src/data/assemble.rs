use crate::data::labels::WeakLabels;
use crate::data::{GeneFeatures, ModelingRow};
use crate::error::PipelineError;
use std::collections::BTreeMap;
use tracing::info;

/// Join aggregated graph features with integrated labels into the modeling
/// table.
///
/// Full outer join on gene symbol: a gene missing from the graph gets
/// all-zero features; a gene never asserted as a target gets label 0 and no
/// known drug. The result carries exactly one row per gene, sorted by
/// symbol, with every numeric column finite.
pub fn assemble_dataset(
    features: &BTreeMap<String, GeneFeatures>,
    labels: &WeakLabels,
) -> Result<Vec<ModelingRow>, PipelineError> {
    let mut rows: BTreeMap<String, ModelingRow> = BTreeMap::new();

    for (gene, gene_features) in features {
        rows.insert(
            gene.clone(),
            ModelingRow {
                gene_symbol: gene.clone(),
                features: *gene_features,
                is_target: labels.is_known_target(gene) as u8,
                existing_drugs: labels.existing_drugs(gene),
            },
        );
    }

    for gene in labels.gene_symbols() {
        rows.entry(gene.clone()).or_insert_with(|| ModelingRow {
            gene_symbol: gene.clone(),
            features: GeneFeatures::default(),
            is_target: 1,
            existing_drugs: labels.existing_drugs(gene),
        });
    }

    let rows: Vec<ModelingRow> = rows.into_values().collect();

    for row in &rows {
        if !row.features.is_finite() {
            return Err(PipelineError::SchemaMismatch {
                stage: "assemble",
                detail: format!("non-finite feature for gene {}", row.gene_symbol),
            });
        }
    }

    let positives = rows.iter().filter(|r| r.is_target == 1).count();
    info!(
        "Assembled modeling table: {} genes, {} known targets, {} unlabeled",
        rows.len(),
        positives,
        rows.len() - positives
    );

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{LabelSource, SourceResult, WeakLabelRecord};

    fn labels_for(records: Vec<WeakLabelRecord>) -> WeakLabels {
        WeakLabels::integrate(&[SourceResult::Present(records)])
    }

    fn record(gene: &str, drug: Option<&str>) -> WeakLabelRecord {
        WeakLabelRecord {
            gene_symbol: gene.to_string(),
            source: LabelSource::DrugCatalog,
            drug_name: drug.map(|d| d.to_string()),
        }
    }

    #[test]
    fn test_outer_join_covers_both_sides() {
        let mut features = BTreeMap::new();
        features.insert(
            "GENEA".to_string(),
            GeneFeatures {
                ppi_mean: 925.0,
                ppi_max: 950.0,
                interaction_count: 2.0,
                ..Default::default()
            },
        );

        let labels = labels_for(vec![record("GENEB", Some("DrugX"))]);
        let rows = assemble_dataset(&features, &labels).unwrap();

        assert_eq!(rows.len(), 2);

        // Graph-only gene: features kept, label 0, no drug
        let genea = rows.iter().find(|r| r.gene_symbol == "GENEA").unwrap();
        assert_eq!(genea.is_target, 0);
        assert_eq!(genea.existing_drugs, None);
        assert_eq!(genea.features.ppi_mean, 925.0);

        // Label-only gene: all-zero features, label kept
        let geneb = rows.iter().find(|r| r.gene_symbol == "GENEB").unwrap();
        assert_eq!(geneb.is_target, 1);
        assert_eq!(geneb.existing_drugs.as_deref(), Some("DrugX"));
        assert!(geneb.features.as_array().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_one_row_per_gene() {
        let mut features = BTreeMap::new();
        features.insert("GENEA".to_string(), GeneFeatures::default());

        let labels = labels_for(vec![
            record("GENEA", Some("DrugX")),
            record("GENEA", Some("DrugY")),
        ]);
        let rows = assemble_dataset(&features, &labels).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].is_target, 1);
        assert_eq!(rows[0].existing_drugs.as_deref(), Some("DrugX; DrugY"));
    }

    #[test]
    fn test_rows_sorted_by_symbol() {
        let mut features = BTreeMap::new();
        features.insert("ZNF1".to_string(), GeneFeatures::default());
        features.insert("ABCA1".to_string(), GeneFeatures::default());

        let rows = assemble_dataset(&features, &WeakLabels::default()).unwrap();
        assert_eq!(rows[0].gene_symbol, "ABCA1");
        assert_eq!(rows[1].gene_symbol, "ZNF1");
    }

    #[test]
    fn test_non_finite_feature_rejected() {
        let mut features = BTreeMap::new();
        features.insert(
            "GENEA".to_string(),
            GeneFeatures {
                ppi_skew: f64::NAN,
                ..Default::default()
            },
        );

        let err = assemble_dataset(&features, &WeakLabels::default()).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }
}
