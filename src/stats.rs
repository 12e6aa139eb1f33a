//! # Index Statistics
//!
//! Per-chromosome variant counts and position ranges computed from the
//! interval index alone. Record counts ride in the packed entry values, so
//! the archive body is never opened; a missing archive file does not stop
//! `stat` from answering.

use std::sync::Arc;

use crate::io::index::IntervalIndex;

/// Summary row for one chromosome
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChromosomeStats {
    /// Chromosome name
    pub chromosome: Arc<str>,
    /// Total records across all indexed blocks
    pub variant_count: u64,
    /// Lowest indexed position
    pub min_position: u64,
    /// Highest indexed position
    pub max_position: u64,
}

/// Aggregate every chromosome tree, in the index's on-disk order.
pub fn chromosome_stats(index: &IntervalIndex) -> Vec<ChromosomeStats> {
    index
        .chromosomes()
        .map(|tree| {
            let variant_count = tree
                .query(0, u64::MAX)
                .map(|entry| entry.record_count())
                .sum();
            let (min_position, max_position) = tree.range();
            ChromosomeStats {
                chromosome: Arc::from(tree.name()),
                variant_count,
                min_position,
                max_position,
            }
        })
        .collect()
}
