//! Projection of a structurally resolved protein region onto the genome.
//!
//! Given the sparse UniProt→PDB residue map of one structure and the
//! ordered coding exons of its transcript, computes the genomic blocks
//! the resolved region spans, ready for BED12-style emission.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::chromosome::Chromosome;
use crate::error::{EngineError, Result};
use crate::models::{Exon, PdbEntry, Strand};

/// Genomic span of a resolved structure, decomposed into per-exon blocks.
/// Block starts are relative to `start` and listed in increasing genomic
/// order on both strands.
#[derive(Debug, Clone, Serialize)]
pub struct StructureBlocks {
    pub pdb_id: String,
    pub chain: String,
    pub swissprot_id: String,
    pub chromosome: Chromosome,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub block_sizes: Vec<u64>,
    pub block_starts: Vec<u64>,
}

/// Map the resolved residue range of `pdb` through `exons` (transcript
/// order, ascending exon number) into genomic blocks.
///
/// The mapping's min/max keys bound the resolved UniProt residue range,
/// inclusive; codon arithmetic turns that into the coding-sequence
/// bp-range `[min*3, (max+1)*3)`.
pub fn map_structure(
    pdb: &PdbEntry,
    mapping: &BTreeMap<i64, i64>,
    exons: &[Exon],
) -> Result<StructureBlocks> {
    if exons.is_empty() {
        return Err(EngineError::NoExonsForTranscript(pdb.swissprot_id.clone()));
    }
    let (sp_start, sp_end) = match (mapping.keys().next(), mapping.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last + 1),
        _ => return Err(EngineError::parse(&pdb.pdb_id, "empty residue mapping")),
    };

    let strand = exons[0].strand;
    let chromosome = exons[0].chromosome;

    // Normalize exon coordinates so the transcript's first exon starts at
    // offset zero; on '-' the coordinates are flipped around the
    // transcript's genomic boundary first.
    let zero = match strand {
        Strand::Forward => exons[0].start as i64,
        Strand::Reverse => exons[0].end as i64,
    };
    let normalized: Vec<(i64, i64)> = exons
        .iter()
        .map(|exon| match strand {
            Strand::Forward => (exon.start as i64 - zero, exon.end as i64 - zero),
            Strand::Reverse => (zero - exon.end as i64, zero - exon.start as i64),
        })
        .collect();

    let bp_start = sp_start * 3;
    let bp_end = sp_end * 3;

    let mut index = 0i64;
    let mut ranges: Vec<(i64, i64)> = Vec::new();
    let mut pdb_start = 0i64;
    let mut pdb_end: Option<i64> = None;

    for &(exon_start, exon_end) in &normalized {
        let exon_length = exon_end - exon_start;

        let in_exon_start = if bp_start >= index {
            if bp_start < index + exon_length {
                let offset = bp_start - index;
                pdb_start = exon_start + offset;
                offset
            } else {
                index += exon_length;
                continue;
            }
        } else {
            0
        };

        let in_exon_end = if bp_end <= index + exon_length {
            let offset = bp_end - index;
            pdb_end = Some(exon_start + offset);
            offset
        } else {
            exon_length
        };

        match strand {
            Strand::Forward => ranges.push((
                exon_start + in_exon_start - pdb_start,
                exon_start + in_exon_end - pdb_start,
            )),
            Strand::Reverse => ranges.insert(
                0,
                (zero - (exon_start + in_exon_end), zero - (exon_start + in_exon_start)),
            ),
        }

        index += exon_length;
        if pdb_end.is_some() {
            break;
        }
    }

    let Some(pdb_end) = pdb_end else {
        // protein longer than the annotated CDS
        return Err(EngineError::RangeExceedsTranscript {
            pdb_id: pdb.pdb_id.clone(),
            range_end: bp_end as u64,
            transcript_bp: index as u64,
        });
    };

    let (genome_start, genome_end) = match strand {
        Strand::Forward => (pdb_start + zero, pdb_end + zero),
        Strand::Reverse => {
            // re-base block starts to the genomic start of the structure
            let first_start = ranges[0].0;
            for range in &mut ranges {
                range.0 -= first_start;
                range.1 -= first_start;
            }
            (zero - pdb_end, zero - pdb_start)
        }
    };

    if genome_end <= genome_start || ranges.iter().any(|r| r.1 <= r.0) {
        return Err(EngineError::NegativeOrZeroBlock {
            pdb_id: pdb.pdb_id.clone(),
        });
    }
    let mut starts: Vec<i64> = ranges.iter().map(|r| r.0).collect();
    starts.dedup();
    if starts.len() != ranges.len() {
        return Err(EngineError::DuplicateBlockStart {
            pdb_id: pdb.pdb_id.clone(),
        });
    }

    Ok(StructureBlocks {
        pdb_id: pdb.pdb_id.clone(),
        chain: pdb.chain.clone(),
        swissprot_id: pdb.swissprot_id.clone(),
        chromosome,
        start: genome_start as u64,
        end: genome_end as u64,
        strand,
        block_sizes: ranges.iter().map(|r| (r.1 - r.0) as u64).collect(),
        block_starts: ranges.iter().map(|r| r.0 as u64).collect(),
    })
}
