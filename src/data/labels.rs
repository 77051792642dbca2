use crate::data::{SourceResult, WeakLabelRecord};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Separator used when joining distinct drug names for display.
const DRUG_JOIN: &str = "; ";

/// Integrated weak labels, keyed by canonical gene symbol.
///
/// Identity is the gene symbol, never the source record position: merging is
/// a set union, so re-running integration on the same inputs in any source
/// order yields an identical table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeakLabels {
    genes: BTreeMap<String, BTreeSet<String>>,
}

impl WeakLabels {
    /// Merge any number of weak-label sources into one table.
    ///
    /// Absent sources contribute nothing; the run continues with whatever
    /// is available.
    pub fn integrate(sources: &[SourceResult<Vec<WeakLabelRecord>>]) -> Self {
        let mut labels = WeakLabels::default();

        for source in sources {
            match source {
                SourceResult::Present(records) => {
                    for record in records {
                        labels.insert(record);
                    }
                }
                SourceResult::Absent(reason) => {
                    warn!("Label source absent, continuing without it: {}", reason);
                }
            }
        }

        info!(
            "Integrated {} known target genes ({} with at least one drug)",
            labels.len(),
            labels
                .genes
                .values()
                .filter(|drugs| !drugs.is_empty())
                .count()
        );

        labels
    }

    fn insert(&mut self, record: &WeakLabelRecord) {
        let drugs = self.genes.entry(record.gene_symbol.clone()).or_default();
        if let Some(drug) = &record.drug_name {
            let drug = drug.trim();
            if !drug.is_empty() {
                drugs.insert(drug.to_string());
            }
        }
    }

    /// Number of distinct known-target genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Whether a gene is asserted as a known target by any source.
    pub fn is_known_target(&self, gene_symbol: &str) -> bool {
        self.genes.contains_key(gene_symbol)
    }

    /// Distinct drug names for a gene joined into one display string, or
    /// `None` for a gene with no known drug.
    pub fn existing_drugs(&self, gene_symbol: &str) -> Option<String> {
        self.genes.get(gene_symbol).and_then(|drugs| {
            if drugs.is_empty() {
                None
            } else {
                Some(drugs.iter().cloned().collect::<Vec<_>>().join(DRUG_JOIN))
            }
        })
    }

    /// Known-target gene symbols in canonical (sorted) order.
    pub fn gene_symbols(&self) -> impl Iterator<Item = &String> {
        self.genes.keys()
    }
}
