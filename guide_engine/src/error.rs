//! Error types for the guide engine.
//!
//! Failures are isolated to the smallest unit of work: a malformed
//! annotation row, one guide's off-target field, one PDB structure. The
//! only hard-fatal condition is an inconsistent reference annotation at
//! index-build time.

use thiserror::Error;

use crate::chromosome::Chromosome;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("invalid interval {chromosome}:{start}-{end}")]
    InvalidInterval {
        chromosome: Chromosome,
        start: u64,
        end: u64,
    },

    #[error("unknown chromosome: {0}")]
    UnknownChromosome(String),

    #[error("malformed token '{token}': {reason}")]
    Parse { token: String, reason: String },

    #[error("no exons for transcript {0}")]
    NoExonsForTranscript(String),

    #[error("residue range of {pdb_id} ends at bp {range_end} but transcript has only {transcript_bp} coding bp")]
    RangeExceedsTranscript {
        pdb_id: String,
        range_end: u64,
        transcript_bp: u64,
    },

    #[error("structure {pdb_id} produced a negative or zero-length block")]
    NegativeOrZeroBlock { pdb_id: String },

    #[error("structure {pdb_id} produced duplicate block starts")]
    DuplicateBlockStart { pdb_id: String },

    #[error("reference annotation has no exon rows for {0}")]
    EmptyChromosome(Chromosome),

    #[error("off-target search failed for {gene}: {status}\n{stderr}")]
    SearchFailed {
        gene: String,
        status: String,
        stderr: String,
    },
}

impl EngineError {
    /// Helper for per-token parse failures that carry the offending input.
    pub fn parse(token: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Parse {
            token: token.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
