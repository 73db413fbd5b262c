//! SIFTS residue-level mappings between UniProt and PDB numbering.
//!
//! Each structure ships as a gzip-compressed XML file; only the
//! `entity > segment > listResidue > residue > crossRefDb` records are
//! read. A residue contributes to the mapping iff it carries a PDB
//! crossref on the requested chain and a UniProt crossref for the
//! requested accession.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use regex::Regex;
use serde::Deserialize;
use tracing::{error, warn};

use crate::error::Result;
use crate::models::PdbEntry;

#[derive(Debug, Deserialize)]
struct SiftsEntry {
    #[serde(rename = "entity", default)]
    entities: Vec<SiftsEntity>,
}

#[derive(Debug, Deserialize)]
struct SiftsEntity {
    #[serde(rename = "segment", default)]
    segments: Vec<SiftsSegment>,
}

#[derive(Debug, Deserialize)]
struct SiftsSegment {
    #[serde(rename = "listResidue", default)]
    residue_lists: Vec<SiftsResidueList>,
}

#[derive(Debug, Deserialize)]
struct SiftsResidueList {
    #[serde(rename = "residue", default)]
    residues: Vec<SiftsResidue>,
}

#[derive(Debug, Deserialize)]
struct SiftsResidue {
    #[serde(rename = "crossRefDb", default)]
    crossrefs: Vec<SiftsCrossRef>,
}

#[derive(Debug, Deserialize)]
struct SiftsCrossRef {
    #[serde(rename = "@dbSource")]
    source: String,
    #[serde(rename = "@dbChainId")]
    chain: Option<String>,
    #[serde(rename = "@dbAccessionId")]
    accession: Option<String>,
    #[serde(rename = "@dbResNum")]
    residue_number: Option<String>,
}

/// Read one structure's `uniprot residue → pdb residue` map, filtered by
/// chain and accession. A corrupt or missing file yields an empty map and
/// an error log; per-structure trouble never aborts the batch.
pub fn residue_mapping(path: &Path, chain: &str, swissprot_id: &str) -> BTreeMap<i64, i64> {
    match read_mapping(path, chain, swissprot_id) {
        Ok(mapping) => mapping,
        Err(e) => {
            error!("could not read residue mapping {}: {e}", path.display());
            BTreeMap::new()
        }
    }
}

fn read_mapping(path: &Path, chain: &str, swissprot_id: &str) -> Result<BTreeMap<i64, i64>> {
    let mut xml = String::new();
    GzDecoder::new(File::open(path)?).read_to_string(&mut xml)?;
    let entry: SiftsEntry = quick_xml::de::from_str(&xml)?;

    // PDB residue numbers may carry insertion codes ("102A"); keep the
    // integer part only.
    let int_re = Regex::new(r"-?\d+").expect("literal regex");

    let mut mapping = BTreeMap::new();
    for entity in &entry.entities {
        for segment in &entity.segments {
            for list in &segment.residue_lists {
                for residue in &list.residues {
                    let mut pdb_residue: Option<i64> = None;
                    let mut uniprot_residue: Option<i64> = None;
                    for crossref in &residue.crossrefs {
                        match crossref.source.as_str() {
                            "PDB" => {
                                if crossref.chain.as_deref() != Some(chain) {
                                    continue;
                                }
                                pdb_residue = crossref
                                    .residue_number
                                    .as_deref()
                                    .and_then(|v| int_re.find(v))
                                    .and_then(|m| m.as_str().parse().ok());
                            }
                            "UniProt" => {
                                if crossref.accession.as_deref() != Some(swissprot_id) {
                                    continue;
                                }
                                uniprot_residue = crossref
                                    .residue_number
                                    .as_deref()
                                    .and_then(|v| v.parse().ok());
                            }
                            _ => {}
                        }
                    }
                    if let (Some(pdb_rn), Some(uniprot_rn)) = (pdb_residue, uniprot_residue) {
                        if let Some(previous) = mapping.insert(uniprot_rn, pdb_rn) {
                            if previous != pdb_rn {
                                warn!(
                                    "redundant mapping for residue {uniprot_rn} in {}: {previous} vs {pdb_rn}",
                                    path.display()
                                );
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(mapping)
}

/// Read the PDB list table (comma-separated; one descriptive line above
/// the header, as shipped): which structures exist, which chain to read,
/// and the UniProt accession each resolves.
pub fn read_pdb_list(path: &Path) -> Result<Vec<PdbEntry>> {
    let file = File::open(path)?;
    let mut lines = std::io::BufReader::new(file);
    // skip the free-text banner line before the real header
    let mut banner = String::new();
    std::io::BufRead::read_line(&mut lines, &mut banner)?;

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(lines);
    let mut entries = Vec::new();
    for record in reader.deserialize() {
        let entry: PdbEntry = record?;
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const SIFTS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<entry xmlns="http://www.ebi.ac.uk/pdbe/docs/sifts/eFamily.xsd">
  <entity type="protein" entityId="A">
    <segment segId="1abc_A_1_3">
      <listResidue>
        <residue dbSource="PDBe" dbResNum="1">
          <crossRefDb dbSource="PDB" dbAccessionId="1abc" dbResNum="101" dbChainId="A"/>
          <crossRefDb dbSource="UniProt" dbAccessionId="P12345" dbResNum="5"/>
        </residue>
        <residue dbSource="PDBe" dbResNum="2">
          <crossRefDb dbSource="PDB" dbAccessionId="1abc" dbResNum="102A" dbChainId="A"/>
          <crossRefDb dbSource="UniProt" dbAccessionId="P12345" dbResNum="6"/>
        </residue>
        <residue dbSource="PDBe" dbResNum="3">
          <crossRefDb dbSource="PDB" dbAccessionId="1abc" dbResNum="201" dbChainId="B"/>
          <crossRefDb dbSource="UniProt" dbAccessionId="P12345" dbResNum="7"/>
        </residue>
        <residue dbSource="PDBe" dbResNum="4">
          <crossRefDb dbSource="PDB" dbAccessionId="1abc" dbResNum="103" dbChainId="A"/>
          <crossRefDb dbSource="UniProt" dbAccessionId="Q99999" dbResNum="8"/>
        </residue>
      </listResidue>
    </segment>
  </entity>
</entry>"#;

    fn write_gz(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
        file
    }

    #[test]
    fn reads_chain_and_accession_filtered_residues() {
        let file = write_gz(SIFTS_XML);
        let mapping = residue_mapping(file.path(), "A", "P12345");

        // residue 7 is on chain B, residue 8 maps another accession
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping[&5], 101);
        // insertion code stripped
        assert_eq!(mapping[&6], 102);
    }

    #[test]
    fn corrupt_file_yields_empty_mapping() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not gzip at all").unwrap();
        assert!(residue_mapping(file.path(), "A", "P12345").is_empty());
    }

    #[test]
    fn missing_file_yields_empty_mapping() {
        assert!(residue_mapping(Path::new("/does/not/exist.xml.gz"), "A", "P12345").is_empty());
    }

    #[test]
    fn reads_pdb_list_with_banner_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# generated 2024-01-01").unwrap();
        writeln!(file, "PDB,CHAIN,SP_PRIMARY").unwrap();
        writeln!(file, "1abc,A,P12345").unwrap();
        writeln!(file, "2xyz,B,Q99999").unwrap();
        file.flush().unwrap();

        let entries = read_pdb_list(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pdb_id, "1abc");
        assert_eq!(entries[1].chain, "B");
        assert_eq!(entries[1].swissprot_id, "Q99999");
    }
}
