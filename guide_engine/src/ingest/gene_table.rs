//! GTF-like gene/transcript/exon table reader.
//!
//! The table is tab-separated with a header and mixes `gene`,
//! `transcript` and `exon` feature rows. Coordinates are 1-based
//! inclusive in the source and normalized to 0-based half-open here.
//! Per gene, one representative transcript is selected and its exons are
//! kept in ascending exon-number order (5'→3' on both strands).

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::chromosome::Chromosome;
use crate::error::Result;
use crate::models::{Exon, Gene, Strand};

/// Raw table row; payload columns are free-form and optional.
#[derive(Debug, Deserialize)]
struct GeneTableRow {
    feature: String,
    seqname: String,
    start: u64,
    end: u64,
    strand: String,
    gene_id: String,
    gene_name: String,
    gene_type: String,
    transcript_id: String,
    exon_id: String,
    exon_number: String,
    swissprot_id: String,
    tag: String,
}

/// Annotation-priority tags for representative-transcript selection, in
/// preference order.
const TRANSCRIPT_PRIORITY: [&str; 3] = [
    "appris_principal",
    "appris_candidate_longest",
    "appris_candidate",
];

/// Read the gene table into `Gene`s carrying their representative
/// transcript's exons. Rows on unknown chromosomes or with malformed
/// fields are dropped and counted.
pub fn read_gene_table(path: &Path) -> Result<Vec<Gene>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)?;

    struct GeneAccumulator {
        gene: Option<(Chromosome, Strand, u64, u64, String)>,
        transcript_tags: Vec<(String, String)>,
        exons: Vec<Exon>,
    }

    let mut genes: HashMap<String, GeneAccumulator> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut dropped = 0usize;

    for record in reader.deserialize() {
        let row: GeneTableRow = match record {
            Ok(row) => row,
            Err(e) => {
                warn!("dropping malformed gene table row: {e}");
                dropped += 1;
                continue;
            }
        };
        let Ok(chromosome) = row.seqname.parse::<Chromosome>() else {
            dropped += 1;
            continue;
        };
        if row.gene_type != "protein_coding" {
            dropped += 1;
            continue;
        }
        let Ok(strand) = row.strand.parse::<Strand>() else {
            warn!("dropping row with bad strand '{}'", row.strand);
            dropped += 1;
            continue;
        };

        let entry = genes.entry(row.gene_id.clone()).or_insert_with(|| {
            order.push(row.gene_id.clone());
            GeneAccumulator {
                gene: None,
                transcript_tags: Vec::new(),
                exons: Vec::new(),
            }
        });

        match row.feature.as_str() {
            "gene" => {
                entry.gene = Some((
                    chromosome,
                    strand,
                    row.start.saturating_sub(1),
                    row.end,
                    row.gene_name.clone(),
                ));
            }
            "transcript" => {
                entry
                    .transcript_tags
                    .push((row.transcript_id.clone(), row.tag.clone()));
            }
            "exon" => {
                if row.transcript_id.is_empty() {
                    dropped += 1;
                    continue;
                }
                let Ok(exon_number) = row.exon_number.parse::<u32>() else {
                    warn!("dropping exon {} with bad exon_number", row.exon_id);
                    dropped += 1;
                    continue;
                };
                entry.exons.push(Exon {
                    chromosome,
                    start: row.start.saturating_sub(1),
                    end: row.end,
                    strand,
                    exon_id: row.exon_id.clone(),
                    exon_number,
                    gene_id: row.gene_id.clone(),
                    gene_symbol: row.gene_name.clone(),
                    transcript_id: row.transcript_id.clone(),
                    swissprot_id: if row.swissprot_id.is_empty() {
                        None
                    } else {
                        Some(row.swissprot_id.clone())
                    },
                });
            }
            _ => {}
        }
    }

    let mut result = Vec::new();
    for gene_id in order {
        let Some(acc) = genes.remove(&gene_id) else {
            continue;
        };
        let Some((chromosome, strand, start, end, symbol)) = acc.gene else {
            warn!("gene {gene_id} has transcripts/exons but no gene row, skipping");
            dropped += 1;
            continue;
        };
        let Some(transcript_id) = representative_transcript(&acc.transcript_tags) else {
            warn!("gene {gene_id} has no transcripts, skipping");
            continue;
        };
        let mut exons: Vec<Exon> = acc
            .exons
            .into_iter()
            .filter(|e| e.transcript_id == transcript_id)
            .collect();
        exons.sort_by_key(|e| e.exon_number);
        if exons.is_empty() {
            warn!("gene {gene_id} transcript {transcript_id} has no exons, skipping");
            continue;
        }
        result.push(Gene {
            gene_id,
            gene_symbol: symbol,
            chromosome,
            strand,
            start,
            end,
            exons,
        });
    }

    if dropped > 0 {
        info!("gene table: dropped {dropped} rows");
    }
    info!("gene table: {} genes", result.len());
    Ok(result)
}

/// Pick the representative transcript: first annotation-priority tag that
/// matches, else the gene's first transcript.
fn representative_transcript(transcripts: &[(String, String)]) -> Option<String> {
    for priority in TRANSCRIPT_PRIORITY {
        if let Some((id, _)) = transcripts.iter().find(|(_, tag)| tag.contains(priority)) {
            return Some(id.clone());
        }
    }
    transcripts.first().map(|(id, _)| id.clone())
}
