pub mod server;

use crate::data::catalog;
use crate::report::{read_report, DiscoveryRecord};
use crate::utils::text;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// In-memory view over the persisted discovery report and the disease-name
/// to gene index.
///
/// The lookup API performs no training or aggregation; it only filters what
/// a previous pipeline run wrote.
#[derive(Debug, Default)]
pub struct DiscoveryIndex {
    /// Report rows in persisted (descending-score) order
    records: Vec<DiscoveryRecord>,
    /// Gene symbol to position in `records`
    by_gene: HashMap<String, usize>,
    /// Disease name to associated gene symbols
    diseases: HashMap<String, Vec<String>>,
}

/// Result of a disease-name lookup.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiseaseHit {
    pub disease: String,
    pub genes: Vec<DiscoveryRecord>,
}

impl DiscoveryIndex {
    /// Load the report and rebuild the disease index from the catalogs.
    pub fn load(
        report_path: &Path,
        disease_catalog: &Path,
        disease_gene_catalog: &Path,
    ) -> Result<Self> {
        let records = read_report(report_path)
            .with_context(|| format!("Cannot serve without a report at {report_path:?}"))?;

        let by_gene = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.gene_symbol.clone(), i))
            .collect();

        let diseases_list = catalog::read_disease_catalog(disease_catalog)
            .unwrap_or_empty(Vec::new());
        let associations = catalog::read_disease_gene_catalog(disease_gene_catalog)
            .unwrap_or_empty(Vec::new());
        let diseases = catalog::build_disease_index(&diseases_list, &associations);

        info!(
            "Loaded {} report rows and {} diseases for lookup",
            records.len(),
            diseases.len()
        );

        Ok(Self {
            records,
            by_gene,
            diseases,
        })
    }

    /// The top N genes by discovery score.
    pub fn top(&self, n: usize) -> &[DiscoveryRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// Report row for one gene symbol, case-insensitive.
    pub fn by_gene(&self, symbol: &str) -> Option<&DiscoveryRecord> {
        let symbol = crate::data::canonical_symbol(symbol);
        self.by_gene.get(&symbol).map(|&i| &self.records[i])
    }

    /// First disease whose name contains the query, with the report rows of
    /// all its associated genes.
    pub fn by_disease(&self, query: &str) -> Option<DiseaseHit> {
        let needle = text::normalize(query);
        if needle.is_empty() {
            return None;
        }

        // Deterministic pick among matches: lexicographically first name
        let mut names: Vec<&String> = self
            .diseases
            .keys()
            .filter(|name| text::normalize(name).contains(&needle))
            .collect();
        names.sort();
        let name = names.first()?;

        let genes = self.diseases[*name]
            .iter()
            .filter_map(|symbol| self.by_gene(symbol).cloned())
            .collect();

        Some(DiseaseHit {
            disease: (*name).clone(),
            genes,
        })
    }
}
