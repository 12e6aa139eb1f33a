//! # I/O Module
//!
//! File boundaries: the memory-mapped archive container, its sibling
//! interval index, and the streaming region reader built on both.

pub mod archive;
pub mod binary;
pub mod index;
pub mod query;

pub use archive::{Archive, INDEX_SUFFIX};
pub use index::{ChromosomeTree, IndexEntry, IntervalIndex};
pub use query::{extract_region, RegionExtract, RegionQuery, RegionReader};
