//! Per-chromosome interval indexes over one annotation class.
//!
//! Built once per pipeline run from flat files and queried many times
//! afterward; the structures are immutable after `build` and safe for
//! unsynchronized concurrent reads.

use std::collections::HashMap;

use bio::data_structures::interval_tree::IntervalTree;
use tracing::{debug, info};

use crate::chromosome::Chromosome;

/// One normalized input row for an index build.
#[derive(Debug, Clone)]
pub struct AnnotationRow<T> {
    pub chromosome: Chromosome,
    pub start: u64,
    pub end: u64,
    pub payload: T,
}

impl<T> AnnotationRow<T> {
    pub fn new(chromosome: Chromosome, start: u64, end: u64, payload: T) -> Self {
        AnnotationRow {
            chromosome,
            start,
            end,
            payload,
        }
    }

    /// Zero- and negative-length features occur in the source tables; they
    /// are a recoverable per-row condition, never fatal.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.end <= self.start {
            return Err(crate::error::EngineError::InvalidInterval {
                chromosome: self.chromosome,
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// A balanced interval tree per chromosome for one annotation class
/// (exons, domains, mutations, copy-number segments).
pub struct AnnotationIndex<T> {
    trees: HashMap<Chromosome, IntervalTree<u64, T>>,
    nodes: usize,
    dropped: usize,
}

impl<T> AnnotationIndex<T> {
    /// Build the index. Rows with `end <= start` are zero/negative-length
    /// features from the source tables; they are dropped and counted, never
    /// fatal.
    pub fn build(rows: Vec<AnnotationRow<T>>, label: &str) -> Self {
        let mut trees: HashMap<Chromosome, IntervalTree<u64, T>> = HashMap::new();
        let mut nodes = 0usize;
        let mut dropped = 0usize;

        for row in rows {
            if let Err(e) = row.validate() {
                debug!("dropping row: {e}");
                dropped += 1;
                continue;
            }
            trees
                .entry(row.chromosome)
                .or_insert_with(IntervalTree::new)
                .insert(row.start..row.end, row.payload);
            nodes += 1;
        }

        if dropped > 0 {
            info!("{label} index dropped {dropped} invalid rows");
        }
        info!("built {label} index with {nodes} nodes");

        AnnotationIndex {
            trees,
            nodes,
            dropped,
        }
    }

    /// All payloads whose interval contains `position`. Empty when the
    /// chromosome is absent or nothing overlaps.
    pub fn query_point(&self, chromosome: Chromosome, position: u64) -> Vec<&T> {
        self.query_range(chromosome, position, position + 1)
            .into_iter()
            .map(|(_, _, payload)| payload)
            .collect()
    }

    /// All `(start, end, payload)` triples overlapping the half-open range
    /// `[start, end)`.
    pub fn query_range(&self, chromosome: Chromosome, start: u64, end: u64) -> Vec<(u64, u64, &T)> {
        let Some(tree) = self.trees.get(&chromosome) else {
            return Vec::new();
        };
        tree.find(start..end)
            .map(|entry| (entry.interval().start, entry.interval().end, entry.data()))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    pub fn has_chromosome(&self, chromosome: Chromosome) -> bool {
        self.trees.contains_key(&chromosome)
    }
}

/// De-duplicate overlapping intervals that describe the same feature
/// group (alternate exons of the same gene across transcripts): within
/// each `(chromosome, key)` group, overlapping intervals collapse to the
/// shortest one. Prevents double-counting of nested exon boundaries.
///
/// Returns the surviving rows and the number discarded.
pub fn dedup_overlapping<T, K, F>(rows: Vec<AnnotationRow<T>>, key: F) -> (Vec<AnnotationRow<T>>, usize)
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut groups: HashMap<(Chromosome, K), Vec<AnnotationRow<T>>> = HashMap::new();
    for row in rows {
        groups
            .entry((row.chromosome, key(&row.payload)))
            .or_default()
            .push(row);
    }

    let mut kept = Vec::new();
    let mut discarded = 0usize;

    for (_, mut group) in groups {
        group.sort_by_key(|r| (r.start, r.end));
        let mut cluster: Vec<AnnotationRow<T>> = Vec::new();
        let mut cluster_end = 0u64;
        for row in group {
            if !cluster.is_empty() && row.start < cluster_end {
                cluster_end = cluster_end.max(row.end);
                cluster.push(row);
            } else {
                discarded += flush_shortest(&mut cluster, &mut kept);
                cluster_end = row.end;
                cluster.push(row);
            }
        }
        discarded += flush_shortest(&mut cluster, &mut kept);
    }

    if discarded > 0 {
        info!("discarded {discarded} overlapping duplicate intervals");
    }
    (kept, discarded)
}

/// Keep only the shortest interval of an overlap cluster; returns how many
/// were discarded.
fn flush_shortest<T>(cluster: &mut Vec<AnnotationRow<T>>, kept: &mut Vec<AnnotationRow<T>>) -> usize {
    if cluster.is_empty() {
        return 0;
    }
    let discarded = cluster.len() - 1;
    let mut shortest = 0;
    for (i, row) in cluster.iter().enumerate() {
        if row.end - row.start < cluster[shortest].end - cluster[shortest].start {
            shortest = i;
        }
    }
    kept.push(cluster.swap_remove(shortest));
    cluster.clear();
    discarded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(chromosome: Chromosome, start: u64, end: u64, payload: &str) -> AnnotationRow<String> {
        AnnotationRow::new(chromosome, start, end, payload.to_string())
    }

    #[test]
    fn every_inserted_position_is_found() {
        let rows = vec![
            row(Chromosome::Chr1, 100, 110, "a"),
            row(Chromosome::Chr1, 200, 230, "b"),
        ];
        let index = AnnotationIndex::build(rows, "test");

        for p in 100..110 {
            let hits = index.query_point(Chromosome::Chr1, p);
            assert_eq!(hits, vec![&"a".to_string()], "position {p}");
        }
        for p in 200..230 {
            let hits = index.query_point(Chromosome::Chr1, p);
            assert_eq!(hits, vec![&"b".to_string()], "position {p}");
        }
        assert!(index.query_point(Chromosome::Chr1, 110).is_empty());
        assert!(index.query_point(Chromosome::Chr1, 99).is_empty());
    }

    #[test]
    fn absent_chromosome_is_an_empty_result_not_an_error() {
        let index = AnnotationIndex::build(vec![row(Chromosome::Chr1, 5, 10, "a")], "test");
        assert!(index.query_point(Chromosome::Chr2, 7).is_empty());
        assert!(index.query_range(Chromosome::ChrX, 0, 1_000_000).is_empty());
    }

    #[test]
    fn invalid_rows_are_dropped_and_counted() {
        let rows = vec![
            row(Chromosome::Chr1, 10, 10, "zero"),
            row(Chromosome::Chr1, 20, 15, "negative"),
            row(Chromosome::Chr1, 30, 40, "ok"),
        ];
        let index = AnnotationIndex::build(rows, "test");
        assert_eq!(index.dropped_count(), 2);
        assert_eq!(index.node_count(), 1);
    }

    #[test]
    fn range_query_returns_bounds_and_payload() {
        let index = AnnotationIndex::build(vec![row(Chromosome::Chr3, 50, 80, "d")], "test");
        let hits = index.query_range(Chromosome::Chr3, 70, 200);
        assert_eq!(hits, vec![(50, 80, &"d".to_string())]);
        // half-open: a query starting at the end does not overlap
        assert!(index.query_range(Chromosome::Chr3, 80, 90).is_empty());
    }

    #[test]
    fn dedup_keeps_shortest_of_overlapping_group() {
        let rows = vec![
            row(Chromosome::Chr1, 100, 200, "g1"),
            row(Chromosome::Chr1, 120, 150, "g1"),
            row(Chromosome::Chr1, 300, 400, "g1"),
        ];
        let (kept, discarded) = dedup_overlapping(rows, |p| p.clone());
        assert_eq!(discarded, 1);
        let mut spans: Vec<(u64, u64)> = kept.iter().map(|r| (r.start, r.end)).collect();
        spans.sort_unstable();
        assert_eq!(spans, vec![(120, 150), (300, 400)]);
    }

    #[test]
    fn dedup_leaves_distinct_groups_alone() {
        let rows = vec![
            row(Chromosome::Chr1, 100, 200, "g1"),
            row(Chromosome::Chr1, 120, 150, "g2"),
        ];
        let (kept, discarded) = dedup_overlapping(rows, |p| p.clone());
        assert_eq!(discarded, 0);
        assert_eq!(kept.len(), 2);
    }
}
