//! Off-target search tool integration.
//!
//! The search binary is a black box: it receives a per-gene exon FASTA
//! and a prebuilt off-target database and emits a tab-separated table
//! with per-guide positions and an encoded off-target field. Invocation
//! is synchronous inside a worker slot; a non-zero exit is a per-gene
//! failure, never a pipeline abort.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::fasta::EXON_PADDING;
use crate::models::{Guide, Orientation};

/// Options for the discovery run, held once in the pipeline config.
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// e.g. "java"
    pub java_executable: String,
    pub jar_path: PathBuf,
    pub database: PathBuf,
    pub max_mismatches: u8,
    pub java_ram_gb: u32,
}

/// Run guide discovery for one gene FASTA, writing the guides table to
/// `output`.
pub fn run_discovery(
    options: &DiscoverOptions,
    gene_id: &str,
    fasta: &Path,
    output: &Path,
) -> Result<()> {
    info!("running off-target discovery for {gene_id}");
    debug!(
        "command: {} -Xmx{}g -jar {} --analysis discover --fasta {} --output {} --maxMismatch {} --positionOutput=true --database {}",
        options.java_executable,
        options.java_ram_gb,
        options.jar_path.display(),
        fasta.display(),
        output.display(),
        options.max_mismatches,
        options.database.display()
    );

    let result = Command::new(&options.java_executable)
        .arg(format!("-Xmx{}g", options.java_ram_gb))
        .arg("-jar")
        .arg(&options.jar_path)
        .arg("--analysis")
        .arg("discover")
        .arg("--fasta")
        .arg(fasta)
        .arg("--output")
        .arg(output)
        .arg("--maxMismatch")
        .arg(options.max_mismatches.to_string())
        .arg("--positionOutput=true")
        .arg("--database")
        .arg(&options.database)
        .output()?;

    if !result.status.success() {
        return Err(EngineError::SearchFailed {
            gene: gene_id.to_string(),
            status: result.status.to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        });
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct GuideRow {
    contig: String,
    start: u64,
    #[allow(dead_code)]
    stop: u64,
    target: String,
    orientation: String,
    #[serde(rename = "otCount")]
    ot_count: u32,
    #[serde(rename = "offTargets")]
    off_targets: String,
}

/// Parse one guides table. Guide positions are relative to the padded
/// exon contig; the contig header carries the exon's genomic start, so
/// each guide's left-most genomic base is reconstructed here. Malformed
/// rows are dropped and counted.
pub fn read_guides(path: &Path) -> Result<Vec<Guide>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut guides = Vec::new();
    let mut dropped = 0usize;

    for record in reader.deserialize() {
        let row: GuideRow = match record {
            Ok(row) => row,
            Err(e) => {
                warn!("dropping malformed guide row: {e}");
                dropped += 1;
                continue;
            }
        };
        match guide_from_row(row) {
            Ok(guide) => guides.push(guide),
            Err(e) => {
                warn!("dropping guide: {e}");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        info!("guides table {}: dropped {dropped} rows", path.display());
    }
    Ok(guides)
}

/// Decode the contig header (`exon_id;strand;start;end;transcripts`) and
/// derive the guide's genomic start.
fn guide_from_row(row: GuideRow) -> Result<Guide> {
    let mut fields = row.contig.split(';');
    let exon_id = fields
        .next()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EngineError::parse(&row.contig, "contig missing exon id"))?;
    let _strand = fields
        .next()
        .ok_or_else(|| EngineError::parse(&row.contig, "contig missing strand"))?;
    let exon_start = fields
        .next()
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| EngineError::parse(&row.contig, "contig missing exon start"))?;

    let orientation: Orientation = row.orientation.parse()?;
    let genome_start = (exon_start + row.start)
        .checked_sub(EXON_PADDING)
        .ok_or_else(|| EngineError::parse(&row.contig, "guide upstream of chromosome start"))?;

    Ok(Guide {
        exon_id: exon_id.to_string(),
        start: row.start,
        genome_start,
        target: row.target,
        orientation,
        ot_count: row.ot_count,
        off_targets_raw: row.off_targets,
        cut_position: None,
        aa_cut_position: None,
        percent_peptide: None,
        off_target_relevant: None,
        mutations: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "contig\tstart\tstop\ttarget\torientation\totCount\toffTargets\n";

    #[test]
    fn reconstructs_genome_start_from_contig_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        writeln!(
            file,
            "E1;+;1000;1100;T1:1\t20\t43\tAAAACCCCGGGGTTTTAAAATGG\tFWD\t2\tAAAACCCCGGGGTTTTAAAA_2_0<chr1:500^F>"
        )
        .unwrap();
        file.flush().unwrap();

        let guides = read_guides(file.path()).unwrap();
        assert_eq!(guides.len(), 1);
        let guide = &guides[0];
        assert_eq!(guide.exon_id, "E1");
        // contig is padded by 16bp: genomic start = 1000 + 20 - 16
        assert_eq!(guide.genome_start, 1004);
        assert_eq!(guide.orientation, Orientation::Fwd);
        assert_eq!(guide.ot_count, 2);
    }

    #[test]
    fn malformed_contigs_are_dropped_not_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        writeln!(file, "badcontig\t3\t26\tAAAA\tFWD\t0\tNONE").unwrap();
        writeln!(
            file,
            "E2;-;50;80;T1:2\t4\t27\tCCCC\tRVS\t0\tNONE"
        )
        .unwrap();
        file.flush().unwrap();

        let guides = read_guides(file.path()).unwrap();
        assert_eq!(guides.len(), 1);
        assert_eq!(guides[0].exon_id, "E2");
        assert_eq!(guides[0].genome_start, 50 + 4 - EXON_PADDING);
    }
}
