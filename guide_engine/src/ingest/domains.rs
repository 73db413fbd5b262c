//! Pfam domain track reader.
//!
//! The UCSC track is BED12-shaped, tab-separated, headerless and already
//! 0-based half-open. Each row is block-decomposed: one index interval
//! per block, so nested/split domains query correctly by overlap.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::annotation_index::AnnotationRow;
use crate::chromosome::Chromosome;
use crate::error::Result;
use crate::models::{DomainAnnotation, Strand};

#[derive(Debug, Deserialize)]
struct DomainRow {
    _bin: u32,
    chrom: String,
    chrom_start: u64,
    chrom_end: u64,
    name: String,
    _score: String,
    strand: String,
    _thick_start: u64,
    _thick_end: u64,
    _reserved: String,
    _block_count: u32,
    block_sizes: String,
    chrom_starts: String,
}

/// Read the domain track into per-block annotation rows.
pub fn read_domain_table(path: &Path) -> Result<Vec<AnnotationRow<DomainAnnotation>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for record in reader.deserialize() {
        let row: DomainRow = match record {
            Ok(row) => row,
            Err(e) => {
                warn!("dropping malformed domain row: {e}");
                dropped += 1;
                continue;
            }
        };
        let Ok(chromosome) = row.chrom.parse::<Chromosome>() else {
            dropped += 1;
            continue;
        };
        let Ok(strand) = row.strand.parse::<Strand>() else {
            warn!("dropping domain {} with bad strand", row.name);
            dropped += 1;
            continue;
        };
        if row.chrom_end <= row.chrom_start {
            dropped += 1;
            continue;
        }

        for (local_start, size) in block_list(&row.chrom_starts).zip(block_list(&row.block_sizes)) {
            rows.push(AnnotationRow::new(
                chromosome,
                row.chrom_start + local_start,
                row.chrom_start + local_start + size,
                DomainAnnotation {
                    name: row.name.clone(),
                    strand,
                },
            ));
        }
    }

    if dropped > 0 {
        info!("domain table: dropped {dropped} rows");
    }
    Ok(rows)
}

/// Iterate a comma-separated block list, tolerating the trailing comma
/// the source format carries.
fn block_list(list: &str) -> impl Iterator<Item = u64> + '_ {
    list.split(',')
        .filter(|v| !v.is_empty())
        .filter_map(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn decomposes_rows_into_blocks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "585\tchr1\t1000\t1300\tPF00001\t0\t+\t1000\t1300\t0\t2\t50,100,\t0,200,"
        )
        .unwrap();
        writeln!(
            file,
            "585\tchrM\t10\t20\tPF00002\t0\t+\t10\t20\t0\t1\t10,\t0,"
        )
        .unwrap();
        file.flush().unwrap();

        let rows = read_domain_table(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].start, rows[0].end), (1000, 1050));
        assert_eq!((rows[1].start, rows[1].end), (1200, 1300));
        assert_eq!(rows[0].payload.name, "PF00001");
        assert_eq!(rows[0].payload.strand, Strand::Forward);
    }
}
