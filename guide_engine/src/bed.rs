//! BED12-style flat emission of guides and structure blocks.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::chromosome::Chromosome;
use crate::error::Result;
use crate::models::{Guide, Orientation};
use crate::structure_blocks::StructureBlocks;

/// Full guide site length: 20bp protospacer plus 3bp PAM.
const GUIDE_SITE_LENGTH: u64 = 23;
const TRACK_RGB: &str = "0,255,0";

fn join(values: &[u64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// One BED12 line for a guide. `index` becomes part of the display name;
/// `score` is clamped into BED's 0–100 convention.
pub fn guide_bed_line(chromosome: Chromosome, guide: &Guide, index: usize, score: i64) -> String {
    let strand = match guide.orientation {
        Orientation::Fwd => '+',
        Orientation::Rvs => '-',
    };
    let end = guide.genome_start + GUIDE_SITE_LENGTH;
    [
        chromosome.to_string(),
        guide.genome_start.to_string(),
        end.to_string(),
        format!("{}:{}", index + 1, guide.target),
        score.clamp(0, 100).to_string(),
        strand.to_string(),
        guide.genome_start.to_string(),
        end.to_string(),
        TRACK_RGB.to_string(),
        "1".to_string(),
        GUIDE_SITE_LENGTH.to_string(),
        "0".to_string(),
    ]
    .join("\t")
}

/// One BED12 line for a structure's genomic blocks.
pub fn structure_bed_line(blocks: &StructureBlocks) -> String {
    [
        blocks.chromosome.to_string(),
        blocks.start.to_string(),
        blocks.end.to_string(),
        blocks.pdb_id.clone(),
        "0".to_string(),
        blocks.strand.to_string(),
        blocks.start.to_string(),
        blocks.end.to_string(),
        TRACK_RGB.to_string(),
        blocks.block_sizes.len().to_string(),
        join(&blocks.block_sizes),
        join(&blocks.block_starts),
    ]
    .join("\t")
}

pub fn write_bed(path: &Path, lines: impl IntoIterator<Item = String>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}
