//! Copy-number segment table reader.
//!
//! Tab-separated with a header; `Chromosome` lacks the `chr` prefix,
//! coordinates are 1-based inclusive, and the source reports a log2
//! segment mean that is converted to an absolute copy count
//! (`2 * 2^segment_mean`) on ingest.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::annotation_index::AnnotationRow;
use crate::chromosome::Chromosome;
use crate::error::Result;
use crate::models::CnsSegment;

#[derive(Debug, Deserialize)]
struct CnsRow {
    #[serde(rename = "CCLE_name")]
    cellline: String,
    #[serde(rename = "Chromosome")]
    chromosome: String,
    #[serde(rename = "Start")]
    start: u64,
    #[serde(rename = "End")]
    end: u64,
    #[serde(rename = "Segment_Mean")]
    segment_mean: f64,
}

pub fn read_cns_table(path: &Path) -> Result<Vec<AnnotationRow<CnsSegment>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for record in reader.deserialize() {
        let row: CnsRow = match record {
            Ok(row) => row,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let Ok(chromosome) = row.chromosome.parse::<Chromosome>() else {
            skipped += 1;
            continue;
        };
        rows.push(AnnotationRow::new(
            chromosome,
            row.start.saturating_sub(1),
            row.end,
            CnsSegment {
                cellline: row.cellline,
                copy_number: 2.0 * row.segment_mean.exp2(),
            },
        ));
    }

    if skipped > 0 {
        info!("copy-number table: skipped {skipped} rows");
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn converts_segment_mean_to_copy_count() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CCLE_name\tChromosome\tStart\tEnd\tSegment_Mean").unwrap();
        writeln!(file, "A549\t1\t2001\t5000\t1.0").unwrap();
        writeln!(file, "A549\tX\t100\t200\t0.0").unwrap();
        file.flush().unwrap();

        let rows = read_cns_table(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].start, rows[0].end), (2000, 5000));
        assert!((rows[0].payload.copy_number - 4.0).abs() < 1e-9);
        assert_eq!(rows[1].chromosome, Chromosome::ChrX);
        assert!((rows[1].payload.copy_number - 2.0).abs() < 1e-9);
    }
}
