//! Document-store schema for enriched per-gene results.
//!
//! One JSON document per gene, one document per line (the import format
//! of the downstream document store).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Serialize, Serializer};

use crate::chromosome::Chromosome;
use crate::error::Result;
use crate::models::{Gene, Guide, Strand};
use crate::structure_blocks::StructureBlocks;

/// Serialize a missing amino-acid position as the `-1` sentinel the
/// document schema uses.
pub fn serialize_aa_cut_position<S: Serializer>(
    value: &Option<u64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(position) => serializer.serialize_i64(*position as i64),
        None => serializer.serialize_i64(-1),
    }
}

#[derive(Debug, Serialize)]
pub struct ExonSummary {
    pub exon_id: String,
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Serialize)]
pub struct DomainSummary {
    pub name: String,
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Serialize)]
pub struct PdbSummary {
    pub pdb: String,
    pub chain: String,
    pub swissprot_id: String,
    pub start: u64,
    pub end: u64,
}

/// The per-gene document handed to the sink.
#[derive(Debug, Serialize)]
pub struct GeneDocument {
    pub gene_id: String,
    pub gene_symbol: String,
    pub chromosome: Chromosome,
    pub strand: Strand,
    pub exons: Vec<ExonSummary>,
    pub domains: Vec<DomainSummary>,
    pub guides: Vec<Guide>,
    pub pdbs: Vec<PdbSummary>,
    /// Cell lines with an aberrant copy number over the gene span.
    pub cns: Vec<String>,
}

impl GeneDocument {
    pub fn new(gene: &Gene) -> Self {
        GeneDocument {
            gene_id: gene.gene_id.clone(),
            gene_symbol: gene.gene_symbol.clone(),
            chromosome: gene.chromosome,
            strand: gene.strand,
            exons: gene
                .exons
                .iter()
                .map(|e| ExonSummary {
                    exon_id: e.exon_id.clone(),
                    start: e.start,
                    end: e.end,
                })
                .collect(),
            domains: Vec::new(),
            guides: Vec::new(),
            pdbs: Vec::new(),
            cns: Vec::new(),
        }
    }

    pub fn push_structure(&mut self, blocks: &StructureBlocks) {
        self.pdbs.push(PdbSummary {
            pdb: blocks.pdb_id.clone(),
            chain: blocks.chain.clone(),
            swissprot_id: blocks.swissprot_id.clone(),
            start: blocks.start,
            end: blocks.end,
        });
    }
}

/// Write documents as JSON lines.
pub fn write_documents<'a>(
    path: &Path,
    documents: impl IntoIterator<Item = &'a GeneDocument>,
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for document in documents {
        let json = serde_json::to_string(document)
            .map_err(|e| crate::error::EngineError::parse(&document.gene_id, e.to_string()))?;
        writeln!(out, "{json}")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Orientation;

    #[test]
    fn missing_aa_position_serializes_as_minus_one() {
        let guide = Guide {
            exon_id: "E1".to_string(),
            start: 3,
            genome_start: 87,
            target: "AAAACCCCGGGGTTTTAAAATGG".to_string(),
            orientation: Orientation::Fwd,
            ot_count: 0,
            off_targets_raw: String::new(),
            cut_position: Some(103),
            aa_cut_position: None,
            percent_peptide: None,
            off_target_relevant: Some(false),
            mutations: Vec::new(),
        };
        let json = serde_json::to_value(&guide).unwrap();
        assert_eq!(json["aa_cut_position"], -1);
        assert_eq!(json["otCount"], 0);
        assert_eq!(json["orientation"], "FWD");
        // the raw off-target field stays out of the document
        assert!(json.get("off_targets_raw").is_none());
    }
}
