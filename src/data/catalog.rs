//! Catalog ingestion: flat record extraction from the disease and drug XML
//! catalogs.
//!
//! Each reader degrades gracefully: a missing file or malformed XML yields
//! `SourceResult::Absent` with a warning, never an aborted run.

use crate::data::{canonical_symbol, Disease, LabelSource, SourceResult, WeakLabelRecord};
use crate::error::PipelineError;
use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// One disease-gene association from the rare-disease catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseGeneRecord {
    pub orpha_code: String,
    /// Disease name as carried by the association file itself
    pub disease_name: Option<String>,
    pub gene_symbol: String,
}

/// One drug-target association from the drug catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct DrugTargetRecord {
    pub drug_name: Option<String>,
    pub gene_symbol: String,
}

/// Read the disease catalog: (code, name) per disorder.
pub fn read_disease_catalog(path: &Path) -> SourceResult<Vec<Disease>> {
    read_optional(path, "disease catalog", parse_disease_catalog)
}

/// Read the disease-gene association catalog.
pub fn read_disease_gene_catalog(path: &Path) -> SourceResult<Vec<DiseaseGeneRecord>> {
    read_optional(path, "disease-gene catalog", parse_disease_gene_catalog)
}

/// Read the drug-target catalog.
pub fn read_drug_catalog(path: &Path) -> SourceResult<Vec<DrugTargetRecord>> {
    read_optional(path, "drug catalog", parse_drug_catalog)
}

/// Convert disease-gene associations into weak label records.
pub fn disease_gene_labels(records: &[DiseaseGeneRecord]) -> Vec<WeakLabelRecord> {
    records
        .iter()
        .map(|r| WeakLabelRecord {
            gene_symbol: r.gene_symbol.clone(),
            source: LabelSource::DiseaseCatalog,
            drug_name: None,
        })
        .collect()
}

/// Convert drug-target associations into weak label records.
pub fn drug_target_labels(records: &[DrugTargetRecord]) -> Vec<WeakLabelRecord> {
    records
        .iter()
        .map(|r| WeakLabelRecord {
            gene_symbol: r.gene_symbol.clone(),
            source: LabelSource::DrugCatalog,
            drug_name: r.drug_name.clone(),
        })
        .collect()
}

/// Build the disease-name to gene-symbols index served by the lookup API.
///
/// Names come from the association file when present, falling back to the
/// disease catalog's code-to-name mapping.
pub fn build_disease_index(
    diseases: &[Disease],
    associations: &[DiseaseGeneRecord],
) -> HashMap<String, Vec<String>> {
    let names_by_code: HashMap<&str, &str> = diseases
        .iter()
        .map(|d| (d.code.as_str(), d.name.as_str()))
        .collect();

    let mut index: HashMap<String, Vec<String>> = HashMap::new();
    for record in associations {
        let name = record
            .disease_name
            .as_deref()
            .or_else(|| names_by_code.get(record.orpha_code.as_str()).copied());
        let Some(name) = name else { continue };

        let genes = index.entry(name.to_string()).or_default();
        if !genes.contains(&record.gene_symbol) {
            genes.push(record.gene_symbol.clone());
        }
    }
    index
}

fn read_optional<T, F>(path: &Path, label: &str, parse: F) -> SourceResult<Vec<T>>
where
    F: FnOnce(BufReader<File>) -> Result<Vec<T>>,
{
    let result = File::open(path)
        .with_context(|| {
            PipelineError::SourceUnavailable {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            }
            .to_string()
        })
        .and_then(|file| parse(BufReader::new(file)));

    match result {
        Ok(records) => {
            info!("Loaded {} records from {} {:?}", records.len(), label, path);
            SourceResult::Present(records)
        }
        Err(e) => {
            warn!("Degrading {} {:?} to empty: {:#}", label, path, e);
            SourceResult::Absent(format!("{e:#}"))
        }
    }
}

/// Element name with any namespace prefix stripped.
fn local_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

fn parse_disease_catalog<R: BufRead>(reader: R) -> Result<Vec<Disease>> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut disorder_depth = None;
    let mut code = None;
    let mut name = None;
    let mut text = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                if local_name(e.name().as_ref()) == "Disorder" {
                    disorder_depth = Some(depth);
                    code = None;
                    name = None;
                }
            }
            Ok(Event::Text(e)) => {
                text = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(e)) => {
                let element = local_name(e.name().as_ref());
                if let Some(d) = disorder_depth {
                    // Only direct children of the disorder carry its identity
                    if depth == d + 1 {
                        match element.as_str() {
                            "OrphaCode" if code.is_none() => code = Some(text.clone()),
                            "Name" if name.is_none() => name = Some(text.clone()),
                            _ => {}
                        }
                    }
                    if element == "Disorder" && depth == d {
                        if let (Some(code), Some(name)) = (code.take(), name.take()) {
                            records.push(Disease { code, name });
                        }
                        disorder_depth = None;
                    }
                }
                depth = depth.saturating_sub(1);
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => anyhow::bail!("XML parsing error: {e}"),
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn parse_disease_gene_catalog<R: BufRead>(reader: R) -> Result<Vec<DiseaseGeneRecord>> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut disorder_depth = None;
    let mut gene_depth = None;
    let mut code: Option<String> = None;
    let mut disease_name: Option<String> = None;
    let mut text = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match local_name(e.name().as_ref()).as_str() {
                    "Disorder" => {
                        disorder_depth = Some(depth);
                        code = None;
                        disease_name = None;
                    }
                    "Gene" => gene_depth = Some(depth),
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                text = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(e)) => {
                let element = local_name(e.name().as_ref());
                if let Some(d) = disorder_depth {
                    if depth == d + 1 {
                        match element.as_str() {
                            "OrphaCode" if code.is_none() => code = Some(text.clone()),
                            "Name" if disease_name.is_none() => {
                                disease_name = Some(text.clone())
                            }
                            _ => {}
                        }
                    }
                }
                if let Some(g) = gene_depth {
                    if element == "Symbol" && depth == g + 1 && !text.is_empty() {
                        let symbol = canonical_symbol(&text);
                        let orpha_code = code.clone().unwrap_or_default();
                        if seen.insert((orpha_code.clone(), symbol.clone())) {
                            records.push(DiseaseGeneRecord {
                                orpha_code,
                                disease_name: disease_name.clone(),
                                gene_symbol: symbol,
                            });
                        }
                    }
                    if element == "Gene" && depth == g {
                        gene_depth = None;
                    }
                }
                if element == "Disorder" && disorder_depth == Some(depth) {
                    disorder_depth = None;
                }
                depth = depth.saturating_sub(1);
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => anyhow::bail!("XML parsing error: {e}"),
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn parse_drug_catalog<R: BufRead>(reader: R) -> Result<Vec<DrugTargetRecord>> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut seen: HashSet<(Option<String>, String)> = HashSet::new();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut drug_depth = None;
    let mut target_depth = None;
    let mut drug_name: Option<String> = None;
    let mut text = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match local_name(e.name().as_ref()).as_str() {
                    // Interaction partners are also encoded as nested drug
                    // elements; only top-level drugs open a new record.
                    "drug" if drug_depth.is_none() => {
                        drug_depth = Some(depth);
                        drug_name = None;
                    }
                    "target" => target_depth = Some(depth),
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                text = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(e)) => {
                let element = local_name(e.name().as_ref());
                if let Some(d) = drug_depth {
                    if element == "name" && depth == d + 1 && drug_name.is_none() {
                        drug_name = Some(text.clone());
                    }
                    if element == "drug" && depth == d {
                        drug_depth = None;
                        drug_name = None;
                    }
                }
                if let Some(t) = target_depth {
                    if element == "gene-name" && depth > t && !text.is_empty() {
                        let symbol = canonical_symbol(&text);
                        let key = (drug_name.clone(), symbol.clone());
                        if seen.insert(key) {
                            records.push(DrugTargetRecord {
                                drug_name: drug_name.clone(),
                                gene_symbol: symbol,
                            });
                        }
                    }
                    if element == "target" && depth == t {
                        target_depth = None;
                    }
                }
                depth = depth.saturating_sub(1);
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => anyhow::bail!("XML parsing error: {e}"),
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DISEASE_XML: &str = r#"<?xml version="1.0"?>
<JDBOR>
  <DisorderList>
    <Disorder id="1">
      <OrphaCode>558</OrphaCode>
      <Name lang="en">Marfan syndrome</Name>
    </Disorder>
    <Disorder id="2">
      <OrphaCode>773</OrphaCode>
      <Name lang="en">Rett syndrome</Name>
    </Disorder>
  </DisorderList>
</JDBOR>"#;

    const GENE_XML: &str = r#"<?xml version="1.0"?>
<JDBOR>
  <DisorderList>
    <Disorder id="1">
      <OrphaCode>558</OrphaCode>
      <Name lang="en">Marfan syndrome</Name>
      <DisorderGeneAssociationList>
        <DisorderGeneAssociation>
          <Gene id="g1">
            <Name lang="en">fibrillin 1</Name>
            <Symbol>fbn1</Symbol>
          </Gene>
        </DisorderGeneAssociation>
        <DisorderGeneAssociation>
          <Gene id="g2">
            <Symbol>TGFBR2</Symbol>
          </Gene>
        </DisorderGeneAssociation>
      </DisorderGeneAssociationList>
    </Disorder>
  </DisorderList>
</JDBOR>"#;

    const DRUG_XML: &str = r#"<?xml version="1.0"?>
<drugbank xmlns="http://www.drugbank.ca">
  <drug type="small molecule">
    <drugbank-id>DB001</drugbank-id>
    <name>Losartan</name>
    <targets>
      <target>
        <name>Type-1 angiotensin II receptor</name>
        <polypeptide>
          <gene-name>AGTR1</gene-name>
        </polypeptide>
      </target>
    </targets>
  </drug>
</drugbank>"#;

    #[test]
    fn test_parse_disease_catalog() {
        let records = parse_disease_catalog(Cursor::new(DISEASE_XML)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, "558");
        assert_eq!(records[0].name, "Marfan syndrome");
    }

    #[test]
    fn test_parse_gene_catalog_uppercases_and_skips_gene_level_names() {
        let records = parse_disease_gene_catalog(Cursor::new(GENE_XML)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].gene_symbol, "FBN1");
        assert_eq!(records[0].orpha_code, "558");
        assert_eq!(records[0].disease_name.as_deref(), Some("Marfan syndrome"));
        assert_eq!(records[1].gene_symbol, "TGFBR2");
    }

    #[test]
    fn test_parse_drug_catalog_with_namespace() {
        let records = parse_drug_catalog(Cursor::new(DRUG_XML)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].drug_name.as_deref(), Some("Losartan"));
        assert_eq!(records[0].gene_symbol, "AGTR1");
    }

    #[test]
    fn test_missing_file_degrades_to_absent() {
        let result = read_disease_catalog(Path::new("/nonexistent/en_product1.xml"));
        assert!(!result.is_present());
    }

    #[test]
    fn test_malformed_xml_degrades_to_absent() {
        let malformed = "<JDBOR><Disorder><OrphaCode>1</Disorder>";
        let result = parse_disease_catalog(Cursor::new(malformed));
        // Mismatched tags surface as an error, which read_optional downgrades
        assert!(result.is_err() || result.unwrap().is_empty());
    }

    #[test]
    fn test_disease_index_merges_names() {
        let diseases = vec![Disease {
            code: "558".to_string(),
            name: "Marfan syndrome".to_string(),
        }];
        let associations = vec![
            DiseaseGeneRecord {
                orpha_code: "558".to_string(),
                disease_name: None,
                gene_symbol: "FBN1".to_string(),
            },
            DiseaseGeneRecord {
                orpha_code: "558".to_string(),
                disease_name: Some("Marfan syndrome".to_string()),
                gene_symbol: "TGFBR2".to_string(),
            },
        ];
        let index = build_disease_index(&diseases, &associations);
        assert_eq!(index["Marfan syndrome"], vec!["FBN1", "TGFBR2"]);
    }
}
