//! Pipeline configuration.
//!
//! All paths hang off a project root that defaults to the current
//! directory and can be overridden with the `PROJECT_ROOT` environment
//! variable.

use std::env;
use std::path::PathBuf;

use crate::chromosome::Chromosome;
use crate::flashfry::DiscoverOptions;

pub fn project_root() -> PathBuf {
    match env::var_os("PROJECT_ROOT") {
        Some(val) => PathBuf::from(val),
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    /// GTF-like gene/transcript/exon table.
    pub gene_table: PathBuf,
    /// UCSC Pfam domain track.
    pub domain_table: PathBuf,
    /// Cell-line mutation table.
    pub mutation_table: PathBuf,
    /// Copy-number segment table.
    pub cns_table: PathBuf,
    /// PDB list (structure, chain, accession).
    pub pdb_list: PathBuf,
    /// Directory of per-structure SIFTS `<pdb>.xml.gz` files.
    pub sifts_dir: PathBuf,
    /// Working directory for per-gene FASTA and guides files.
    pub exon_dir: PathBuf,
    /// Output directory for documents and BED tracks.
    pub output_dir: PathBuf,
    pub discover: DiscoverOptions,
}

impl Config {
    pub fn from_env() -> Self {
        let root = project_root();
        let data_dir = root.join("data");
        Config {
            gene_table: data_dir.join("gene_table.tsv"),
            domain_table: data_dir.join("ucscGenePfam.txt"),
            mutation_table: data_dir.join("mutations.tsv"),
            cns_table: data_dir.join("copy_number.tsv"),
            pdb_list: data_dir.join("pdb_list.csv"),
            sifts_dir: data_dir.join("sifts"),
            exon_dir: data_dir.join("exons"),
            output_dir: root.join("output"),
            discover: DiscoverOptions {
                java_executable: env::var("JAVA_EXECUTABLE").unwrap_or_else(|_| "java".to_string()),
                jar_path: data_dir.join("FlashFry-assembly-1.7.jar"),
                database: data_dir.join("offtarget_db"),
                max_mismatches: 5,
                java_ram_gb: env::var("JAVA_RAM_GB")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(4),
            },
            data_dir,
        }
    }

    /// Raw (headerless, newline-free) chromosome sequence file.
    pub fn chromosome_raw_path(&self, chromosome: Chromosome) -> PathBuf {
        self.data_dir.join(format!("{chromosome}.raw"))
    }

    /// SIFTS mapping file for one structure.
    pub fn sifts_path(&self, pdb_id: &str) -> PathBuf {
        self.sifts_dir.join(format!("{}.xml.gz", pdb_id.to_lowercase()))
    }

    pub fn gene_fasta_path(&self, gene_id: &str) -> PathBuf {
        self.exon_dir.join(gene_id)
    }

    pub fn guides_path(&self, gene_id: &str) -> PathBuf {
        self.exon_dir.join(format!("{gene_id}.guides"))
    }
}
