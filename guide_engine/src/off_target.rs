//! Parsing and relevance classification of off-target hits.
//!
//! The search tool reports one field per guide, a comma-separated list of
//! hit groups in the form `<protospacer>_<occurrences>_<mismatches><loci>`
//! where `loci` is a `|`-delimited list of `chromosome:position^strand`
//! tokens wrapped in literal angle brackets. Off-target loci are always
//! reported on the forward strand regardless of the guide's own
//! orientation.

use std::str::FromStr;

use tracing::debug;

use crate::annotation_index::AnnotationIndex;
use crate::chromosome::Chromosome;
use crate::error::{EngineError, Result};
use crate::models::{ExonAnnotation, GeneIdentity};

/// Cut-site offset from a forward-strand off-target locus.
const LOCUS_FWD_CUT_OFFSET: u64 = 17;
/// Cut-site offset from a reverse-strand off-target locus.
const LOCUS_RVS_CUT_OFFSET: u64 = 6;

/// Strand marker of an off-target locus token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocusStrand {
    F,
    R,
}

/// One genomic locus at which a guide could also cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffTargetLocus {
    pub chromosome: Chromosome,
    pub position: u64,
    pub strand: LocusStrand,
}

impl OffTargetLocus {
    /// Genomic cut position of this locus.
    pub fn cut_position(&self) -> u64 {
        match self.strand {
            LocusStrand::F => self.position + LOCUS_FWD_CUT_OFFSET,
            LocusStrand::R => self.position + LOCUS_RVS_CUT_OFFSET,
        }
    }
}

impl FromStr for OffTargetLocus {
    type Err = EngineError;

    /// Parses a `chromosome:position^strand` token.
    fn from_str(token: &str) -> Result<Self> {
        let (chromosome, rest) = token
            .split_once(':')
            .ok_or_else(|| EngineError::parse(token, "missing ':' in locus"))?;
        let (position, strand) = rest
            .split_once('^')
            .ok_or_else(|| EngineError::parse(token, "missing '^' in locus"))?;
        let chromosome = chromosome
            .parse::<Chromosome>()
            .map_err(|_| EngineError::parse(token, "unknown chromosome in locus"))?;
        let position = position
            .parse::<u64>()
            .map_err(|_| EngineError::parse(token, "non-numeric position in locus"))?;
        let strand = match strand {
            "F" => LocusStrand::F,
            "R" => LocusStrand::R,
            _ => return Err(EngineError::parse(token, "locus strand must be F or R")),
        };
        Ok(OffTargetLocus {
            chromosome,
            position,
            strand,
        })
    }
}

/// One parsed hit group. Loci are only decoded for zero-mismatch groups;
/// anything with mismatches can never disqualify a guide, so its loci are
/// not worth parsing.
#[derive(Debug, Clone)]
pub struct OffTargetHit {
    pub occurrences: u32,
    pub mismatches: u32,
    pub loci: Vec<OffTargetLocus>,
}

/// Parse one `<protospacer>_<occurrences>_<mismatches><loci>` group.
pub fn parse_hit_group(group: &str) -> Result<OffTargetHit> {
    let (head, loci_part) = match group.split_once('<') {
        Some((head, rest)) => {
            let loci = rest
                .strip_suffix('>')
                .ok_or_else(|| EngineError::parse(group, "unterminated loci list"))?;
            (head, Some(loci))
        }
        None => (group, None),
    };

    let mut fields = head.rsplitn(3, '_');
    let mismatches = fields
        .next()
        .ok_or_else(|| EngineError::parse(group, "missing mismatch count"))?
        .parse::<u32>()
        .map_err(|_| EngineError::parse(group, "non-numeric mismatch count"))?;
    let occurrences = fields
        .next()
        .ok_or_else(|| EngineError::parse(group, "missing occurrence count"))?
        .parse::<u32>()
        .map_err(|_| EngineError::parse(group, "non-numeric occurrence count"))?;
    if fields.next().is_none() {
        return Err(EngineError::parse(group, "missing protospacer"));
    }

    if mismatches > 0 {
        return Ok(OffTargetHit {
            occurrences,
            mismatches,
            loci: Vec::new(),
        });
    }

    let loci = match loci_part {
        Some(list) if !list.is_empty() => list
            .split('|')
            .map(OffTargetLocus::from_str)
            .collect::<Result<Vec<_>>>()?,
        _ => Vec::new(),
    };

    Ok(OffTargetHit {
        occurrences,
        mismatches,
        loci,
    })
}

/// Close-paralog heuristic: truncate both gene symbols by one character
/// and test substring containment. A known approximation preserved from
/// the behavior downstream scoring was tuned against.
pub fn symbols_are_paralogs(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let a_trunc = &a[..a.len() - 1];
    let b_trunc = &b[..b.len() - 1];
    b.contains(a_trunc) || a.contains(b_trunc)
}

/// Whether one zero-mismatch locus disqualifies a guide targeting
/// `target`: it must land inside an exon of a gene that is neither the
/// target gene nor a close paralog of it.
fn locus_is_relevant(
    locus: &OffTargetLocus,
    target: &GeneIdentity,
    exon_index: &AnnotationIndex<ExonAnnotation>,
) -> bool {
    let cut = locus.cut_position();
    exon_index
        .query_point(locus.chromosome, cut)
        .into_iter()
        .any(|exon| {
            exon.gene_id != target.gene_id
                && !symbols_are_paralogs(&exon.gene_symbol, &target.gene_symbol)
        })
}

/// Classify a guide's whole off-target field. `true` means some hit makes
/// the guide unsafe. Malformed tokens abort only this guide's
/// classification; the caller logs and continues with the batch.
pub fn classify(
    off_target_field: &str,
    target: &GeneIdentity,
    exon_index: &AnnotationIndex<ExonAnnotation>,
) -> Result<bool> {
    let field = off_target_field.trim();
    if field.is_empty() || field == "NONE" {
        return Ok(false);
    }

    for group in field.split(',') {
        let hit = parse_hit_group(group)?;
        if hit.mismatches > 0 {
            continue;
        }
        for locus in &hit.loci {
            if locus_is_relevant(locus, target, exon_index) {
                debug!(
                    chromosome = %locus.chromosome,
                    position = locus.position,
                    gene = %target.gene_symbol,
                    "zero-mismatch off-target in foreign exon"
                );
                return Ok(true);
            }
        }
    }
    Ok(false)
}
