//! Core data model shared across the engine.
//!
//! All genomic coordinates are 0-based half-open after ingestion; the
//! readers in `ingest` normalize the mixed conventions of the source
//! tables before anything here is constructed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chromosome::Chromosome;
use crate::error::EngineError;

/// Genomic strand of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn as_char(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Strand {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            other => Err(EngineError::parse(other, "expected strand '+' or '-'")),
        }
    }
}

impl Serialize for Strand {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.as_char())
    }
}

/// Guide orientation as reported by the off-target search tool. `Fwd`
/// guides read off the forward strand of the queried contig, `Rvs` guides
/// off its reverse complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Orientation {
    #[serde(rename = "FWD")]
    Fwd,
    #[serde(rename = "RVS")]
    Rvs,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Fwd => "FWD",
            Orientation::Rvs => "RVS",
        }
    }

    /// The genomic strand a guide in this orientation binds.
    pub fn strand(&self) -> Strand {
        match self {
            Orientation::Fwd => Strand::Forward,
            Orientation::Rvs => Strand::Reverse,
        }
    }
}

impl Serialize for Orientation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "FWD" => Ok(Orientation::Fwd),
            "RVS" => Ok(Orientation::Rvs),
            other => Err(EngineError::parse(other, "expected orientation FWD or RVS")),
        }
    }
}

/// One exon of a gene's representative transcript.
#[derive(Debug, Clone, Serialize)]
pub struct Exon {
    pub chromosome: Chromosome,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub exon_id: String,
    pub exon_number: u32,
    pub gene_id: String,
    pub gene_symbol: String,
    pub transcript_id: String,
    pub swissprot_id: Option<String>,
}

impl Exon {
    pub fn length(&self) -> u64 {
        self.end - self.start
    }
}

/// A protein-coding gene with the exons of its representative transcript,
/// ordered 5'→3' (ascending exon number).
#[derive(Debug, Clone)]
pub struct Gene {
    pub gene_id: String,
    pub gene_symbol: String,
    pub chromosome: Chromosome,
    pub strand: Strand,
    pub start: u64,
    pub end: u64,
    pub exons: Vec<Exon>,
}

impl Gene {
    pub fn identity(&self) -> GeneIdentity {
        GeneIdentity {
            gene_id: self.gene_id.clone(),
            gene_symbol: self.gene_symbol.clone(),
        }
    }

    pub fn swissprot_id(&self) -> Option<&str> {
        self.exons.iter().find_map(|e| e.swissprot_id.as_deref())
    }
}

/// The identity a gene presents to the off-target classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneIdentity {
    pub gene_id: String,
    pub gene_symbol: String,
}

/// Payload stored in the exon interval index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExonAnnotation {
    pub gene_id: String,
    pub gene_symbol: String,
    pub exon_number: u32,
}

/// Payload stored in the Pfam domain index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainAnnotation {
    pub name: String,
    pub strand: Strand,
}

/// Payload stored in the cell-line mutation index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CelllineMutation {
    pub cellline: String,
    pub variant_type: String,
}

/// Payload stored in the copy-number segment index. `copy_number` is the
/// absolute copy count derived from the source's log2 segment mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CnsSegment {
    pub cellline: String,
    pub copy_number: f64,
}

/// One candidate guide from the off-target search output, enriched in
/// place by the projection and classification passes.
#[derive(Debug, Clone, Serialize)]
pub struct Guide {
    pub exon_id: String,
    /// Start within the padded exon contig handed to the search tool.
    pub start: u64,
    /// Left-most genomic base of the 23bp guide site.
    pub genome_start: u64,
    pub target: String,
    pub orientation: Orientation,
    #[serde(rename = "otCount")]
    pub ot_count: u32,
    #[serde(skip)]
    pub off_targets_raw: String,
    pub cut_position: Option<u64>,
    #[serde(serialize_with = "crate::records::serialize_aa_cut_position")]
    pub aa_cut_position: Option<u64>,
    pub percent_peptide: Option<f64>,
    /// `None` when the off-target field could not be classified.
    pub off_target_relevant: Option<bool>,
    /// Cell lines with a mutation overlapping the cut site.
    pub mutations: Vec<String>,
}

/// One row of the PDB list table: a structure, the chain to read, and the
/// UniProt accession it resolves.
#[derive(Debug, Clone, Deserialize)]
pub struct PdbEntry {
    #[serde(rename = "PDB")]
    pub pdb_id: String,
    #[serde(rename = "CHAIN")]
    pub chain: String,
    #[serde(rename = "SP_PRIMARY")]
    pub swissprot_id: String,
}
