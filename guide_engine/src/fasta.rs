//! Per-gene FASTA files handed to the off-target search tool.
//!
//! Each record is one exon of the gene's representative transcript padded
//! by 16bp of flanking chromosome sequence on both sides, so guides whose
//! protospacer straddles an exon boundary are still discoverable. The
//! record header carries everything needed to map tool output back to
//! genome coordinates.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tracing::warn;

use crate::error::{EngineError, Result};
use crate::models::Gene;

/// Flanking sequence kept around each exon; shared with guide
/// genome-coordinate reconstruction in `flashfry`.
pub const EXON_PADDING: u64 = 16;

/// Load a raw (headerless, newline-free) chromosome sequence file.
pub fn load_raw_chromosome(path: &Path) -> Result<String> {
    let mut sequence = String::new();
    File::open(path)?.read_to_string(&mut sequence)?;
    Ok(sequence)
}

/// Write one gene's exon FASTA. Exons whose padded slice falls outside
/// the chromosome sequence are skipped with a warning.
pub fn write_gene_exon_fasta(gene: &Gene, chromosome_seq: &str, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for exon in &gene.exons {
        let start = exon.start.saturating_sub(EXON_PADDING) as usize;
        let end = (exon.end + EXON_PADDING) as usize;
        if exon.start < EXON_PADDING || end > chromosome_seq.len() {
            warn!(
                "exon {} of {} exceeds chromosome bounds, skipping",
                exon.exon_id, gene.gene_id
            );
            continue;
        }
        let sequence = chromosome_seq
            .get(start..end)
            .ok_or_else(|| EngineError::parse(&exon.exon_id, "padded slice not on char boundary"))?;
        writeln!(
            out,
            ">{};{};{};{};{}:{}",
            exon.exon_id, exon.strand, exon.start, exon.end, exon.transcript_id, exon.exon_number
        )?;
        writeln!(out, "{}", sequence.to_uppercase())?;
    }
    out.flush()?;
    Ok(())
}
