//! Pipeline orchestration: build the shared context once, then fan out
//! per-gene work across a worker pool.
//!
//! Indexes and residue mappings are built before fan-out and only read
//! afterwards; gene tasks are independent and their results are consumed
//! as an unordered stream. A failed gene is logged and skipped, never a
//! pipeline abort.

use std::collections::HashMap;
use std::fs;

use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::annotation_index::{dedup_overlapping, AnnotationIndex, AnnotationRow};
use crate::chromosome::Chromosome;
use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::fasta::{load_raw_chromosome, write_gene_exon_fasta};
use crate::flashfry::{read_guides, run_discovery};
use crate::models::{CelllineMutation, CnsSegment, DomainAnnotation, ExonAnnotation, Gene, Guide, PdbEntry};
use crate::off_target;
use crate::pdb_mapping::{read_pdb_list, residue_mapping};
use crate::projection::{aa_cut_position, cut_position, percent_peptide};
use crate::records::{DomainSummary, GeneDocument};
use crate::structure_blocks::{map_structure, StructureBlocks};

/// Immutable shared state for the per-gene workers. Built once at
/// startup and passed by reference; the per-chromosome indexes are safe
/// for unsynchronized concurrent reads.
pub struct EngineContext {
    pub genes: Vec<Gene>,
    pub exon_index: AnnotationIndex<ExonAnnotation>,
    pub domain_index: AnnotationIndex<DomainAnnotation>,
    pub mutation_index: AnnotationIndex<CelllineMutation>,
    pub cns_index: AnnotationIndex<CnsSegment>,
    pub pdb_entries: Vec<PdbEntry>,
    pub chromosomes: HashMap<Chromosome, String>,
}

/// Result of one gene's worker task.
pub struct GeneResult {
    pub document: GeneDocument,
    pub structures: Vec<StructureBlocks>,
}

/// Build all indexes from the annotation tables. The sole hard-fatal
/// condition lives here: a reference chromosome with zero exon rows
/// indicates a corrupt reference build, not a per-record issue.
pub fn build_context(config: &Config) -> Result<EngineContext> {
    info!("building annotation indexes");

    let genes = crate::ingest::gene_table::read_gene_table(&config.gene_table)?;

    let exon_rows: Vec<AnnotationRow<ExonAnnotation>> = genes
        .iter()
        .flat_map(|gene| gene.exons.iter())
        .map(|exon| {
            AnnotationRow::new(
                exon.chromosome,
                exon.start,
                exon.end,
                ExonAnnotation {
                    gene_id: exon.gene_id.clone(),
                    gene_symbol: exon.gene_symbol.clone(),
                    exon_number: exon.exon_number,
                },
            )
        })
        .collect();
    // alternate exons of the same gene otherwise double-count boundaries
    let (exon_rows, _) = dedup_overlapping(exon_rows, |payload| {
        (payload.gene_id.clone(), payload.exon_number)
    });
    let exon_index = AnnotationIndex::build(exon_rows, "exon");
    verify_reference(&exon_index)?;

    let domain_index = AnnotationIndex::build(
        crate::ingest::domains::read_domain_table(&config.domain_table)?,
        "domain",
    );
    let mutation_index = AnnotationIndex::build(
        crate::ingest::mutations::read_mutation_table(&config.mutation_table)?,
        "mutation",
    );
    let cns_index = AnnotationIndex::build(
        crate::ingest::copy_number::read_cns_table(&config.cns_table)?,
        "copy-number",
    );
    let pdb_entries = read_pdb_list(&config.pdb_list)?;

    let mut chromosomes = HashMap::new();
    for chromosome in genes.iter().map(|g| g.chromosome) {
        if chromosomes.contains_key(&chromosome) {
            continue;
        }
        let sequence = load_raw_chromosome(&config.chromosome_raw_path(chromosome))?;
        chromosomes.insert(chromosome, sequence);
    }

    Ok(EngineContext {
        genes,
        exon_index,
        domain_index,
        mutation_index,
        cns_index,
        pdb_entries,
        chromosomes,
    })
}

/// Every reference chromosome must carry exon rows.
pub fn verify_reference(exon_index: &AnnotationIndex<ExonAnnotation>) -> Result<()> {
    for chromosome in Chromosome::ALL {
        if !exon_index.has_chromosome(chromosome) {
            return Err(EngineError::EmptyChromosome(chromosome));
        }
    }
    Ok(())
}

/// Derive a guide's projected coordinates and off-target relevance in
/// place. A malformed off-target field aborts only this guide's
/// classification.
pub fn enrich_guide(guide: &mut Guide, gene: &Gene, context: &EngineContext) {
    let cut = cut_position(guide.genome_start, guide.orientation);
    guide.cut_position = Some(cut);
    guide.aa_cut_position = aa_cut_position(cut, &gene.exons);
    guide.percent_peptide = Some(percent_peptide(cut, gene.start, gene.end, gene.strand));

    guide.off_target_relevant =
        match off_target::classify(&guide.off_targets_raw, &gene.identity(), &context.exon_index) {
            Ok(relevant) => Some(relevant),
            Err(e) => {
                warn!("off-target classification failed for a guide of {}: {e}", gene.gene_id);
                None
            }
        };

    guide.mutations = context
        .mutation_index
        .query_point(gene.chromosome, cut)
        .into_iter()
        .map(|m| m.cellline.clone())
        .collect();
}

/// Full worker task for one gene: FASTA out, search tool run, guides
/// parsed and enriched, structures mapped.
pub fn process_gene(gene: &Gene, context: &EngineContext, config: &Config) -> Result<GeneResult> {
    let chromosome_seq = context
        .chromosomes
        .get(&gene.chromosome)
        .ok_or(EngineError::EmptyChromosome(gene.chromosome))?;

    let fasta_path = config.gene_fasta_path(&gene.gene_id);
    let guides_path = config.guides_path(&gene.gene_id);
    write_gene_exon_fasta(gene, chromosome_seq, &fasta_path)?;
    run_discovery(&config.discover, &gene.gene_id, &fasta_path, &guides_path)?;

    let mut guides = read_guides(&guides_path)?;
    for guide in &mut guides {
        enrich_guide(guide, gene, context);
    }

    let mut document = GeneDocument::new(gene);
    document.guides = guides;

    document.domains = context
        .domain_index
        .query_range(gene.chromosome, gene.start, gene.end)
        .into_iter()
        .map(|(start, end, domain)| DomainSummary {
            name: domain.name.clone(),
            start,
            end,
        })
        .collect();

    let mut cns: Vec<String> = context
        .cns_index
        .query_range(gene.chromosome, gene.start, gene.end)
        .into_iter()
        .map(|(_, _, segment)| segment.cellline.clone())
        .collect();
    cns.sort_unstable();
    cns.dedup();
    document.cns = cns;

    let structures = map_gene_structures(gene, context, config, &mut document);

    Ok(GeneResult {
        document,
        structures,
    })
}

/// Project each structure resolving this gene's protein. Per-structure
/// trouble (missing mapping, range/block violations) drops that entry.
fn map_gene_structures(
    gene: &Gene,
    context: &EngineContext,
    config: &Config,
    document: &mut GeneDocument,
) -> Vec<StructureBlocks> {
    let Some(swissprot_id) = gene.swissprot_id() else {
        return Vec::new();
    };

    let mut structures = Vec::new();
    for entry in context
        .pdb_entries
        .iter()
        .filter(|e| e.swissprot_id == swissprot_id)
    {
        let mapping = residue_mapping(&config.sifts_path(&entry.pdb_id), &entry.chain, swissprot_id);
        if mapping.is_empty() {
            continue;
        }
        match map_structure(entry, &mapping, &gene.exons) {
            Ok(blocks) => {
                document.push_structure(&blocks);
                structures.push(blocks);
            }
            Err(e) => warn!("dropping structure {}: {e}", entry.pdb_id),
        }
    }
    structures
}

/// Run the whole batch: build context, fan out one task per gene, stream
/// unordered results into the sinks.
pub fn run(config: &Config) -> Result<()> {
    let context = build_context(config)?;
    fs::create_dir_all(&config.exon_dir)?;
    fs::create_dir_all(&config.output_dir)?;

    info!("processing {} genes", context.genes.len());
    let results: Vec<GeneResult> = context
        .genes
        .par_iter()
        .filter_map(|gene| match process_gene(gene, &context, config) {
            Ok(result) => Some(result),
            Err(e) => {
                error!("gene {} failed: {e}", gene.gene_id);
                None
            }
        })
        .collect();
    info!("{} of {} genes succeeded", results.len(), context.genes.len());

    write_sinks(config, &results)?;
    Ok(())
}

fn write_sinks(config: &Config, results: &[GeneResult]) -> Result<()> {
    crate::records::write_documents(
        &config.output_dir.join("genes.jsonl"),
        results.iter().map(|r| &r.document),
    )?;

    let guide_lines = results.iter().flat_map(|result| {
        result
            .document
            .guides
            .iter()
            .enumerate()
            .map(|(index, guide)| {
                crate::bed::guide_bed_line(result.document.chromosome, guide, index, 0)
            })
    });
    crate::bed::write_bed(&config.output_dir.join("guides.bed"), guide_lines)?;

    let structure_lines = results
        .iter()
        .flat_map(|result| result.structures.iter().map(crate::bed::structure_bed_line));
    crate::bed::write_bed(&config.output_dir.join("structures.bed"), structure_lines)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exon, Orientation, Strand};

    fn exon(start: u64, end: u64, number: u32) -> Exon {
        Exon {
            chromosome: Chromosome::Chr1,
            start,
            end,
            strand: Strand::Forward,
            exon_id: format!("E{number}"),
            exon_number: number,
            gene_id: "G1".to_string(),
            gene_symbol: "GENE1".to_string(),
            transcript_id: "T1".to_string(),
            swissprot_id: None,
        }
    }

    fn test_context(gene: &Gene) -> EngineContext {
        let exon_rows = gene
            .exons
            .iter()
            .map(|e| {
                AnnotationRow::new(
                    e.chromosome,
                    e.start,
                    e.end,
                    ExonAnnotation {
                        gene_id: e.gene_id.clone(),
                        gene_symbol: e.gene_symbol.clone(),
                        exon_number: e.exon_number,
                    },
                )
            })
            .collect();
        EngineContext {
            genes: vec![gene.clone()],
            exon_index: AnnotationIndex::build(exon_rows, "exon"),
            domain_index: AnnotationIndex::build(Vec::new(), "domain"),
            mutation_index: AnnotationIndex::build(
                vec![AnnotationRow::new(
                    Chromosome::Chr1,
                    200,
                    210,
                    CelllineMutation {
                        cellline: "HELA".to_string(),
                        variant_type: "SNP".to_string(),
                    },
                )],
                "mutation",
            ),
            cns_index: AnnotationIndex::build(Vec::new(), "copy-number"),
            pdb_entries: Vec::new(),
            chromosomes: HashMap::new(),
        }
    }

    fn test_gene() -> Gene {
        Gene {
            gene_id: "G1".to_string(),
            gene_symbol: "GENE1".to_string(),
            chromosome: Chromosome::Chr1,
            strand: Strand::Forward,
            start: 100,
            end: 230,
            exons: vec![exon(100, 110, 1), exon(200, 230, 2)],
        }
    }

    #[test]
    fn enrichment_fills_projected_coordinates() {
        let gene = test_gene();
        let context = test_context(&gene);
        let mut guide = Guide {
            exon_id: "E2".to_string(),
            start: 5,
            genome_start: 189,
            target: "AAAACCCCGGGGTTTTAAAATGG".to_string(),
            orientation: Orientation::Fwd,
            ot_count: 0,
            off_targets_raw: "NONE".to_string(),
            cut_position: None,
            aa_cut_position: None,
            percent_peptide: None,
            off_target_relevant: None,
            mutations: Vec::new(),
        };

        enrich_guide(&mut guide, &gene, &context);

        assert_eq!(guide.cut_position, Some(205));
        assert_eq!(guide.aa_cut_position, Some(5));
        let pp = guide.percent_peptide.unwrap();
        assert!((pp - 80.769).abs() < 1e-2);
        assert_eq!(guide.off_target_relevant, Some(false));
        assert_eq!(guide.mutations, vec!["HELA".to_string()]);
    }

    #[test]
    fn malformed_off_target_field_leaves_guide_unclassified() {
        let gene = test_gene();
        let context = test_context(&gene);
        let mut guide = Guide {
            exon_id: "E1".to_string(),
            start: 0,
            genome_start: 84,
            target: "AAAA".to_string(),
            orientation: Orientation::Fwd,
            ot_count: 1,
            off_targets_raw: "AAAA_1_0<chr1:broken>".to_string(),
            cut_position: None,
            aa_cut_position: None,
            percent_peptide: None,
            off_target_relevant: None,
            mutations: Vec::new(),
        };

        enrich_guide(&mut guide, &gene, &context);

        // classification aborted for this guide, projections still land
        assert_eq!(guide.off_target_relevant, None);
        assert_eq!(guide.cut_position, Some(100));
    }

    #[test]
    fn reference_verification_requires_every_chromosome() {
        let rows: Vec<AnnotationRow<ExonAnnotation>> = Chromosome::ALL
            .iter()
            .map(|&chromosome| {
                AnnotationRow::new(
                    chromosome,
                    0,
                    10,
                    ExonAnnotation {
                        gene_id: "G".to_string(),
                        gene_symbol: "G".to_string(),
                        exon_number: 1,
                    },
                )
            })
            .collect();
        let full = AnnotationIndex::build(rows, "exon");
        assert!(verify_reference(&full).is_ok());

        let partial = AnnotationIndex::build(
            vec![AnnotationRow::new(
                Chromosome::Chr1,
                0,
                10,
                ExonAnnotation {
                    gene_id: "G".to_string(),
                    gene_symbol: "G".to_string(),
                    exon_number: 1,
                },
            )],
            "exon",
        );
        let err = verify_reference(&partial).unwrap_err();
        assert!(matches!(err, EngineError::EmptyChromosome(_)));
    }
}
