//! Cell-line mutation table reader.
//!
//! Tab-separated with a header; `Chromosome` values lack the `chr`
//! prefix and coordinates are 1-based inclusive. Rows on chromosomes the
//! engine does not index are skipped and counted.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::annotation_index::AnnotationRow;
use crate::chromosome::Chromosome;
use crate::error::Result;
use crate::models::CelllineMutation;

#[derive(Debug, Deserialize)]
struct MutationRow {
    #[serde(rename = "Chromosome")]
    chromosome: String,
    #[serde(rename = "Start_position")]
    start: u64,
    #[serde(rename = "End_position")]
    end: u64,
    #[serde(rename = "Variant_Type")]
    variant_type: String,
    #[serde(rename = "Tumor_Sample_Barcode")]
    cellline: String,
}

pub fn read_mutation_table(path: &Path) -> Result<Vec<AnnotationRow<CelllineMutation>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for record in reader.deserialize() {
        let row: MutationRow = match record {
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
            CelllineMutation {
                cellline: row.cellline,
                variant_type: row.variant_type,
            },
        ));
    }

    if skipped > 0 {
        info!("mutation table: skipped {skipped} rows");
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn normalizes_one_based_coordinates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "Chromosome\tStart_position\tEnd_position\tVariant_Type\tTumor_Sample_Barcode"
        )
        .unwrap();
        writeln!(file, "7\t1001\t1001\tSNP\tHELA").unwrap();
        writeln!(file, "GL000220\t5\t6\tSNP\tHELA").unwrap();
        file.flush().unwrap();

        let rows = read_mutation_table(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].chromosome, Chromosome::Chr7);
        assert_eq!((rows[0].start, rows[0].end), (1000, 1001));
        assert_eq!(rows[0].payload.cellline, "HELA");
        assert_eq!(rows[0].payload.variant_type, "SNP");
    }
}
