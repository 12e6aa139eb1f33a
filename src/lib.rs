//! # svar Library
//!
//! Region-indexed genotype extraction from compressed, chromosome-partitioned
//! variant archives. Opens an archive plus its sibling interval index, plans
//! a region against the index, streams matching records block by block, and
//! materializes them into a dense genotype matrix with a parallel site table.
//!
//! ## Modules
//! - `config`: CLI argument parsing
//! - `data`: formats, sparse vectors, samples, records, and the output matrix
//! - `error`: error types and result alias
//! - `io`: archive container, interval index, and the region reader
//! - `stats`: per-chromosome summaries computed from the index alone

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod stats;

// Re-export commonly used types
pub use data::format::Format;
pub use data::matrix::{materialize, GenotypeMatrix, SiteTable};
pub use data::record::VariantRecord;
pub use data::sample::{SampleIdx, SampleSelection, Samples};
pub use data::sparse::{Conversion, SparseGenotypes};
pub use error::{Result, SvarError};
pub use io::archive::{Archive, INDEX_SUFFIX};
pub use io::index::{ChromosomeTree, IndexEntry, IntervalIndex};
pub use io::query::{extract_region, RegionExtract, RegionQuery, RegionReader};
pub use stats::{chromosome_stats, ChromosomeStats};
