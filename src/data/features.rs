use crate::data::graph::InteractionGraph;
use crate::data::GeneFeatures;
use std::collections::BTreeMap;
use tracing::info;

/// Per-gene accumulation of incident edge evidence.
#[derive(Debug, Default)]
struct GeneEvidence {
    scores: Vec<f64>,
    degrees: Vec<f64>,
}

/// Reduce the annotated edge table to one feature vector per gene.
///
/// Only genes with at least one retained incident edge appear in the output;
/// genes absent from the graph acquire default rows later, during dataset
/// assembly. Score statistics are computed over retained edges; the degree
/// statistics read the raw pre-filter edge counts of the incident endpoints.
pub fn aggregate_features(graph: &InteractionGraph) -> BTreeMap<String, GeneFeatures> {
    let mut evidence: BTreeMap<String, GeneEvidence> = BTreeMap::new();

    for edge in &graph.edges {
        let endpoints = [
            (edge.gene_a.as_ref(), &edge.protein_a),
            (edge.gene_b.as_ref(), &edge.protein_b),
        ];
        for (gene, protein) in endpoints {
            let Some(gene) = gene else { continue };
            let entry = evidence.entry(gene.clone()).or_default();
            entry.scores.push(edge.score);
            let degree = graph.raw_degrees.get(protein).copied().unwrap_or(0);
            entry.degrees.push(degree as f64);
        }
    }

    let features: BTreeMap<String, GeneFeatures> = evidence
        .into_iter()
        .map(|(gene, ev)| {
            let features = GeneFeatures {
                ppi_mean: mean(&ev.scores),
                ppi_max: max(&ev.scores),
                ppi_std: sample_std(&ev.scores),
                ppi_skew: sample_skew(&ev.scores),
                interaction_count: ev.scores.len() as f64,
                degree_max: max(&ev.degrees),
                degree_mean: mean(&ev.degrees),
            };
            (gene, features)
        })
        .collect();

    info!("Aggregated features for {} genes", features.len());
    features
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

/// Sample standard deviation; 0 when fewer than two samples.
fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Adjusted Fisher-Pearson skewness; 0 when fewer than three samples or
/// when the values carry no variance.
fn sample_skew(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let nf = n as f64;
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / nf;
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / nf;
    if m2 <= f64::EPSILON {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0)
}
