//! # Data Module
//!
//! In-memory representations of archive contents and query output.
//!
//! ## Design Philosophy: Data-Oriented Design
//! - **Structure of Arrays (SoA):** The site table stores each column
//!   separately for cache-friendly iteration and cheap host hand-off.
//! - **Zero-cost newtypes:** `SampleIdx` keeps native and requested sample
//!   positions from being confused at compile time.
//! - **Sparse carriers:** genotype payloads stay (offset, value) pairs until
//!   the materializer scatters them into a dense matrix.

pub mod format;
pub mod matrix;
pub mod record;
pub mod sample;
pub mod sparse;

// Re-export commonly used types
pub use format::Format;
pub use matrix::{materialize, GenotypeMatrix, SiteTable};
pub use record::VariantRecord;
pub use sample::{SampleIdx, SampleSelection, Samples};
pub use sparse::{Conversion, SparseGenotypes};
