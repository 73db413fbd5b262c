//! Stateless coordinate transforms between genome, exon-relative,
//! amino-acid and percent-peptide space.
//!
//! `aa_cut_position` and `percent_peptide` both walk the representative
//! transcript's exon ordering, so the two features stay mutually
//! consistent as scoring-model inputs.

use crate::models::{Exon, Orientation, Strand};

/// Distance from the left-most genomic base of a FWD guide site to its
/// double-strand break (3bp upstream of the PAM).
const FWD_CUT_OFFSET: u64 = 16;
/// Same geometry mirrored for RVS guides.
const RVS_CUT_OFFSET: u64 = 7;

/// Offset of `genome_pos` from the exon's 5' boundary.
pub fn genome_to_exon_relative(genome_pos: u64, exon: &Exon) -> i64 {
    match exon.strand {
        Strand::Forward => genome_pos as i64 - exon.start as i64,
        Strand::Reverse => exon.end as i64 - genome_pos as i64,
    }
}

/// Genomic cut position of a guide from its left-most genomic base and
/// orientation.
pub fn cut_position(genome_start: u64, orientation: Orientation) -> u64 {
    match orientation {
        Orientation::Fwd => genome_start + FWD_CUT_OFFSET,
        Orientation::Rvs => genome_start + RVS_CUT_OFFSET,
    }
}

/// Amino-acid index of the codon containing `cut_pos`, walking the
/// canonically ordered exons of the representative transcript. `None`
/// when no exon contains the cut (intronic or UTR guide).
pub fn aa_cut_position(cut_pos: u64, ordered_exons: &[Exon]) -> Option<u64> {
    let mut bp_position = 0u64;
    for exon in ordered_exons {
        if cut_pos >= exon.start && cut_pos < exon.end {
            let offset = genome_to_exon_relative(cut_pos, exon);
            return Some((bp_position + offset as u64) / 3);
        }
        bp_position += exon.length();
    }
    None
}

/// The cut position as a percentage along the gene span, measured from
/// the gene's 5' end.
pub fn percent_peptide(cut_pos: u64, gene_start: u64, gene_end: u64, strand: Strand) -> f64 {
    let span = (gene_end - gene_start) as f64;
    match strand {
        Strand::Forward => 100.0 * (cut_pos as f64 - gene_start as f64) / span,
        Strand::Reverse => 100.0 * (gene_end as f64 - cut_pos as f64) / span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::Chromosome;

    fn exon(start: u64, end: u64, strand: Strand, number: u32) -> Exon {
        Exon {
            chromosome: Chromosome::Chr1,
            start,
            end,
            strand,
            exon_id: format!("E{number}"),
            exon_number: number,
            gene_id: "G1".to_string(),
            gene_symbol: "GENE1".to_string(),
            transcript_id: "T1".to_string(),
            swissprot_id: None,
        }
    }

    #[test]
    fn cut_position_is_pure_in_start_and_orientation() {
        assert_eq!(cut_position(100, Orientation::Fwd), 116);
        assert_eq!(cut_position(100, Orientation::Rvs), 107);
        assert_eq!(cut_position(0, Orientation::Fwd), 16);
    }

    #[test]
    fn exon_relative_offsets_are_strand_aware() {
        let plus = exon(100, 130, Strand::Forward, 1);
        assert_eq!(genome_to_exon_relative(105, &plus), 5);
        assert_eq!(genome_to_exon_relative(95, &plus), -5);

        let minus = exon(100, 130, Strand::Reverse, 1);
        assert_eq!(genome_to_exon_relative(105, &minus), 25);
    }

    #[test]
    fn aa_cut_position_walks_ordered_exons() {
        // exon set [(100,110),(200,230)] on '+', cut at 205:
        // 10bp of exon 1 plus 5bp into exon 2 -> codon 5
        let exons = vec![
            exon(100, 110, Strand::Forward, 1),
            exon(200, 230, Strand::Forward, 2),
        ];
        assert_eq!(aa_cut_position(205, &exons), Some(5));
        assert_eq!(aa_cut_position(102, &exons), Some(0));
    }

    #[test]
    fn intronic_cut_has_no_aa_position() {
        let exons = vec![
            exon(100, 110, Strand::Forward, 1),
            exon(200, 230, Strand::Forward, 2),
        ];
        assert_eq!(aa_cut_position(150, &exons), None);
        assert_eq!(aa_cut_position(230, &exons), None);
    }

    #[test]
    fn percent_peptide_matches_reference_example() {
        let pp = percent_peptide(205, 100, 230, Strand::Forward);
        assert!((pp - 80.769).abs() < 1e-2, "got {pp}");
    }

    #[test]
    fn percent_peptide_is_strand_corrected() {
        let plus = percent_peptide(205, 100, 230, Strand::Forward);
        let minus = percent_peptide(205, 100, 230, Strand::Reverse);
        assert!((plus + minus - 100.0).abs() < 1e-9);
    }

    #[test]
    fn percent_peptide_monotonic_with_aa_position() {
        let exons = vec![
            exon(100, 110, Strand::Forward, 1),
            exon(200, 230, Strand::Forward, 2),
        ];
        let cuts = [101, 104, 108, 203, 210, 225];
        let mut last = (0.0f64, 0u64);
        for cut in cuts {
            let pp = percent_peptide(cut, 100, 230, Strand::Forward);
            let aa = aa_cut_position(cut, &exons).unwrap();
            assert!(pp >= last.0);
            assert!(aa >= last.1);
            last = (pp, aa);
        }
    }
}
