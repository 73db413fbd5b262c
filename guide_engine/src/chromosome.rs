//! Interned chromosome identifiers.
//!
//! Every per-chromosome index is keyed by this enum rather than a raw
//! string, so a typo in an annotation file surfaces as an
//! `UnknownChromosome` error at ingest instead of a silently empty query
//! result later.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// The reference chromosomes the engine indexes (autosomes plus X/Y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Chromosome {
    Chr1,
    Chr2,
    Chr3,
    Chr4,
    Chr5,
    Chr6,
    Chr7,
    Chr8,
    Chr9,
    Chr10,
    Chr11,
    Chr12,
    Chr13,
    Chr14,
    Chr15,
    Chr16,
    Chr17,
    Chr18,
    Chr19,
    Chr20,
    Chr21,
    Chr22,
    ChrX,
    ChrY,
}

impl Chromosome {
    pub const ALL: [Chromosome; 24] = [
        Chromosome::Chr1,
        Chromosome::Chr2,
        Chromosome::Chr3,
        Chromosome::Chr4,
        Chromosome::Chr5,
        Chromosome::Chr6,
        Chromosome::Chr7,
        Chromosome::Chr8,
        Chromosome::Chr9,
        Chromosome::Chr10,
        Chromosome::Chr11,
        Chromosome::Chr12,
        Chromosome::Chr13,
        Chromosome::Chr14,
        Chromosome::Chr15,
        Chromosome::Chr16,
        Chromosome::Chr17,
        Chromosome::Chr18,
        Chromosome::Chr19,
        Chromosome::Chr20,
        Chromosome::Chr21,
        Chromosome::Chr22,
        Chromosome::ChrX,
        Chromosome::ChrY,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chromosome::Chr1 => "chr1",
            Chromosome::Chr2 => "chr2",
            Chromosome::Chr3 => "chr3",
            Chromosome::Chr4 => "chr4",
            Chromosome::Chr5 => "chr5",
            Chromosome::Chr6 => "chr6",
            Chromosome::Chr7 => "chr7",
            Chromosome::Chr8 => "chr8",
            Chromosome::Chr9 => "chr9",
            Chromosome::Chr10 => "chr10",
            Chromosome::Chr11 => "chr11",
            Chromosome::Chr12 => "chr12",
            Chromosome::Chr13 => "chr13",
            Chromosome::Chr14 => "chr14",
            Chromosome::Chr15 => "chr15",
            Chromosome::Chr16 => "chr16",
            Chromosome::Chr17 => "chr17",
            Chromosome::Chr18 => "chr18",
            Chromosome::Chr19 => "chr19",
            Chromosome::Chr20 => "chr20",
            Chromosome::Chr21 => "chr21",
            Chromosome::Chr22 => "chr22",
            Chromosome::ChrX => "chrX",
            Chromosome::ChrY => "chrY",
        }
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chromosome {
    type Err = EngineError;

    /// Accepts both `chrN` and bare `N` spellings; the mutation and
    /// copy-number tables ship without the `chr` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let bare = name.strip_prefix("chr").unwrap_or(name);
        let parsed = match bare {
            "1" => Chromosome::Chr1,
            "2" => Chromosome::Chr2,
            "3" => Chromosome::Chr3,
            "4" => Chromosome::Chr4,
            "5" => Chromosome::Chr5,
            "6" => Chromosome::Chr6,
            "7" => Chromosome::Chr7,
            "8" => Chromosome::Chr8,
            "9" => Chromosome::Chr9,
            "10" => Chromosome::Chr10,
            "11" => Chromosome::Chr11,
            "12" => Chromosome::Chr12,
            "13" => Chromosome::Chr13,
            "14" => Chromosome::Chr14,
            "15" => Chromosome::Chr15,
            "16" => Chromosome::Chr16,
            "17" => Chromosome::Chr17,
            "18" => Chromosome::Chr18,
            "19" => Chromosome::Chr19,
            "20" => Chromosome::Chr20,
            "21" => Chromosome::Chr21,
            "22" => Chromosome::Chr22,
            "X" => Chromosome::ChrX,
            "Y" => Chromosome::ChrY,
            _ => return Err(EngineError::UnknownChromosome(name.to_string())),
        };
        Ok(parsed)
    }
}

impl Serialize for Chromosome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct ChromosomeVisitor;

impl Visitor<'_> for ChromosomeVisitor {
    type Value = Chromosome;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a chromosome name such as chr1 or chrX")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(|_| E::custom(format!("unknown chromosome: {v}")))
    }
}

impl<'de> Deserialize<'de> for Chromosome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(ChromosomeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_and_bare_names() {
        assert_eq!("chr7".parse::<Chromosome>().unwrap(), Chromosome::Chr7);
        assert_eq!("7".parse::<Chromosome>().unwrap(), Chromosome::Chr7);
        assert_eq!("X".parse::<Chromosome>().unwrap(), Chromosome::ChrX);
        assert_eq!("chrY".parse::<Chromosome>().unwrap(), Chromosome::ChrY);
    }

    #[test]
    fn rejects_unknown_names() {
        assert!("chrM".parse::<Chromosome>().is_err());
        assert!("scaffold_12".parse::<Chromosome>().is_err());
    }

    #[test]
    fn roundtrips_through_display() {
        for chromosome in Chromosome::ALL {
            assert_eq!(chromosome.as_str().parse::<Chromosome>().unwrap(), chromosome);
        }
    }
}
