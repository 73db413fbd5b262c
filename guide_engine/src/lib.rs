//! Indexing and coordinate-projection engine for a CRISPR guide-design
//! pipeline.
//!
//! Builds per-chromosome interval indexes over genomic annotations,
//! projects guide cut sites between genome, exon-relative, amino-acid
//! and percent-peptide space, classifies off-target hits, and maps
//! structurally resolved protein regions back onto genomic blocks.

pub mod annotation_index;
pub mod bed;
pub mod chromosome;
pub mod config;
pub mod error;
pub mod fasta;
pub mod flashfry;
pub mod ingest;
pub mod models;
pub mod off_target;
pub mod pdb_mapping;
pub mod pipeline;
pub mod projection;
pub mod records;
pub mod structure_blocks;

pub use annotation_index::{AnnotationIndex, AnnotationRow};
pub use chromosome::Chromosome;
pub use error::{EngineError, Result};
pub use models::{Exon, Gene, Guide, Orientation, Strand};
