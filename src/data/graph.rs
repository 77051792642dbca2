use crate::data::canonical_symbol;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// One raw interaction row: two protein identifiers and an integer
/// confidence score on the source 0-1000 scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEdge {
    pub protein_a: String,
    pub protein_b: String,
    pub score: f64,
}

/// A retained edge annotated with gene symbols where resolvable.
///
/// An endpoint whose protein has no dictionary entry stays `None`; the edge
/// is kept as long as at least one endpoint resolves. Duplicate raw rows
/// survive as independent evidence of interaction strength.
#[derive(Debug, Clone)]
pub struct AnnotatedEdge {
    pub protein_a: String,
    pub protein_b: String,
    pub gene_a: Option<String>,
    pub gene_b: Option<String>,
    pub score: f64,
}

/// Gene-annotated view of the interaction network.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    /// Edges at or above the confidence cutoff, with resolvable endpoints
    pub edges: Vec<AnnotatedEdge>,
    /// Edge count per protein over the raw, unfiltered edge list.
    /// The degree statistic deliberately counts every edge in the raw
    /// network, before the confidence cutoff; the score statistics use
    /// only the filtered edges.
    pub raw_degrees: HashMap<String, u32>,
}

/// Loader for the confidence-scored interaction edge list.
pub struct GraphLoader {
    min_score: f64,
}

impl GraphLoader {
    pub fn new(min_score: f64) -> Self {
        Self { min_score }
    }

    /// Load the edge list and annotate it with the protein dictionary.
    pub fn load<P: AsRef<Path>>(
        &self,
        links_path: P,
        dictionary: &HashMap<String, String>,
    ) -> Result<InteractionGraph> {
        let links_path = links_path.as_ref();
        info!("Loading interaction network from {:?}", links_path);

        let edges = if is_gzipped(links_path) {
            let file = File::open(links_path)
                .with_context(|| format!("Failed to open {:?}", links_path))?;
            self.parse_edges(BufReader::new(GzDecoder::new(file)))?
        } else {
            let file = File::open(links_path)
                .with_context(|| format!("Failed to open {:?}", links_path))?;
            self.parse_edges(BufReader::new(file))?
        };

        let mut raw_degrees: HashMap<String, u32> = HashMap::new();
        for edge in &edges {
            *raw_degrees.entry(edge.protein_a.clone()).or_default() += 1;
            *raw_degrees.entry(edge.protein_b.clone()).or_default() += 1;
        }

        let total = edges.len();
        let annotated: Vec<AnnotatedEdge> = edges
            .into_iter()
            .filter(|e| e.score >= self.min_score)
            .filter_map(|e| {
                let gene_a = dictionary.get(&e.protein_a).cloned();
                let gene_b = dictionary.get(&e.protein_b).cloned();
                if gene_a.is_none() && gene_b.is_none() {
                    return None;
                }
                Some(AnnotatedEdge {
                    protein_a: e.protein_a,
                    protein_b: e.protein_b,
                    gene_a,
                    gene_b,
                    score: e.score,
                })
            })
            .collect();

        info!(
            "Retained {} of {} edges at score >= {}",
            annotated.len(),
            total,
            self.min_score
        );

        Ok(InteractionGraph {
            edges: annotated,
            raw_degrees,
        })
    }

    /// Parse whitespace-delimited (protein_a, protein_b, score) rows.
    fn parse_edges<R: Read>(&self, reader: BufReader<R>) -> Result<Vec<ScoredEdge>> {
        let mut edges = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read edge list line")?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if fields.len() < 3 {
                warn!("Skipping malformed edge row at line {}", line_no + 1);
                continue;
            }

            match fields[2].parse::<i64>() {
                Ok(score) => edges.push(ScoredEdge {
                    protein_a: fields[0].to_string(),
                    protein_b: fields[1].to_string(),
                    score: score as f64,
                }),
                Err(_) if line_no == 0 => {
                    debug!("Skipping header line: {}", trimmed);
                }
                Err(_) => {
                    warn!("Skipping non-numeric score at line {}", line_no + 1);
                }
            }
        }

        debug!("Parsed {} raw edges", edges.len());
        Ok(edges)
    }
}

/// Load the tab-delimited protein id to gene symbol dictionary.
///
/// Lines starting with `#` are comments; symbols are canonicalized to
/// uppercase. Later rows for the same protein overwrite earlier ones.
pub fn load_protein_dictionary<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    info!("Loading protein dictionary from {:?}", path);

    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::new(file);

    let mut dictionary = HashMap::new();
    for line in reader.lines() {
        let line = line.context("Failed to read dictionary line")?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(protein_id), Some(symbol)) = (fields.next(), fields.next()) else {
            continue;
        };
        let symbol = canonical_symbol(symbol);
        if symbol.is_empty() {
            continue;
        }
        dictionary.insert(protein_id.trim().to_string(), symbol);
    }

    info!("Loaded {} protein-gene mappings", dictionary.len());
    Ok(dictionary)
}

fn is_gzipped(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn test_dictionary() -> HashMap<String, String> {
        let mut dict = HashMap::new();
        dict.insert("P1".to_string(), "GENEA".to_string());
        dict.insert("P2".to_string(), "GENEB".to_string());
        dict.insert("P3".to_string(), "GENEC".to_string());
        dict
    }

    #[test]
    fn test_parse_edges_skips_header() {
        let data = "protein1 protein2 combined_score\nP1 P2 900\nP1 P3 950\n";
        let loader = GraphLoader::new(700.0);
        let edges = loader.parse_edges(BufReader::new(Cursor::new(data))).unwrap();

        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].protein_a, "P1");
        assert_eq!(edges[0].score, 900.0);
    }

    #[test]
    fn test_score_filter_applies_before_annotation() {
        let data = "P1 P2 900\nP1 P3 950\nP2 P3 400\n";
        let loader = GraphLoader::new(700.0);
        let edges = loader.parse_edges(BufReader::new(Cursor::new(data))).unwrap();

        let mut raw_degrees: HashMap<String, u32> = HashMap::new();
        for edge in &edges {
            *raw_degrees.entry(edge.protein_a.clone()).or_default() += 1;
            *raw_degrees.entry(edge.protein_b.clone()).or_default() += 1;
        }
        // Raw degree counts the sub-cutoff edge too
        assert_eq!(raw_degrees["P2"], 2);
        assert_eq!(raw_degrees["P3"], 2);

        let retained: Vec<_> = edges.iter().filter(|e| e.score >= 700.0).collect();
        assert_eq!(retained.len(), 2);
    }

    #[test]
    fn test_unresolved_endpoints_dropped() {
        let dict = test_dictionary();
        let loader = GraphLoader::new(700.0);

        let edges = vec![ScoredEdge {
            protein_a: "PX".to_string(),
            protein_b: "PY".to_string(),
            score: 800.0,
        }];
        let annotated: Vec<_> = edges
            .into_iter()
            .filter(|e| e.score >= loader.min_score)
            .filter(|e| dict.contains_key(&e.protein_a) || dict.contains_key(&e.protein_b))
            .collect();
        assert!(annotated.is_empty());
    }

    #[test]
    fn test_duplicate_rows_preserved() {
        let data = "P1 P2 900\nP1 P2 900\n";
        let loader = GraphLoader::new(700.0);
        let edges = loader.parse_edges(BufReader::new(Cursor::new(data))).unwrap();
        assert_eq!(edges.len(), 2);
    }
}
