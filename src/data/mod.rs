pub mod assemble;
pub mod catalog;
pub mod features;
pub mod graph;
pub mod labels;

use serde::{Deserialize, Serialize};

/// Number of aggregated graph features per gene
pub const NUM_FEATURES: usize = 7;

/// Feature column names, in modeling-table order
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "ppi_mean",
    "ppi_max",
    "ppi_std",
    "ppi_skew",
    "interaction_count",
    "degree_max",
    "degree_mean",
];

/// Canonicalize a gene symbol: trimmed, uppercase.
///
/// Every data source is keyed by this form so that case or whitespace
/// variations between catalogs collapse onto one gene.
pub fn canonical_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Outcome of loading one optional data source.
///
/// A missing or unparseable optional file degrades to `Absent` with the
/// reason recorded, instead of aborting the pipeline. Consumers treat
/// `Absent` as an empty contribution.
#[derive(Debug, Clone)]
pub enum SourceResult<T> {
    Present(T),
    Absent(String),
}

impl<T> SourceResult<T> {
    /// The contained data, or the given empty value when absent.
    pub fn unwrap_or_empty(self, empty: T) -> T {
        match self {
            SourceResult::Present(data) => data,
            SourceResult::Absent(_) => empty,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, SourceResult::Present(_))
    }

    /// Transform present data, leaving an absence untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SourceResult<U> {
        match self {
            SourceResult::Present(data) => SourceResult::Present(f(data)),
            SourceResult::Absent(reason) => SourceResult::Absent(reason),
        }
    }
}

/// Which curated catalog asserted a weak label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelSource {
    DiseaseCatalog,
    DrugCatalog,
}

/// One weak assertion that a gene is a known target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeakLabelRecord {
    /// Canonical gene symbol
    pub gene_symbol: String,
    /// Catalog that produced the record
    pub source: LabelSource,
    /// Drug associated with the gene, if the source carries one
    pub drug_name: Option<String>,
}

/// A disease catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disease {
    pub code: String,
    pub name: String,
}

/// Aggregated interaction statistics for one gene.
///
/// All values default to 0.0 for genes absent from the graph; no statistic
/// is ever undefined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneFeatures {
    /// Mean confidence of retained incident edges
    pub ppi_mean: f64,
    /// Maximum confidence of retained incident edges
    pub ppi_max: f64,
    /// Sample standard deviation of incident confidences (0 when n < 2)
    pub ppi_std: f64,
    /// Adjusted skew of incident confidences (0 when n < 3)
    pub ppi_skew: f64,
    /// Number of retained incident edges
    pub interaction_count: f64,
    /// Maximum raw network degree over the gene's incident endpoints
    pub degree_max: f64,
    /// Mean raw network degree over the gene's incident endpoints
    pub degree_mean: f64,
}

impl GeneFeatures {
    /// Feature values in `FEATURE_NAMES` order.
    pub fn as_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.ppi_mean,
            self.ppi_max,
            self.ppi_std,
            self.ppi_skew,
            self.interaction_count,
            self.degree_max,
            self.degree_mean,
        ]
    }

    /// True when every value is a finite number.
    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite())
    }
}

/// One row of the assembled modeling table.
///
/// Exactly one row exists per distinct gene symbol; features and label are
/// always defined, with neutral defaults substituted during assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelingRow {
    pub gene_symbol: String,
    pub features: GeneFeatures,
    /// 1 when at least one curated source asserts the gene as a target
    pub is_target: u8,
    /// Distinct associated drug names joined for display, if any
    pub existing_drugs: Option<String>,
}
