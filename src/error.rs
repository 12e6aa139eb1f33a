//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::data::format::Format;

/// Main error type for svar operations
#[derive(Error, Debug)]
pub enum SvarError {
    /// I/O errors (file missing, permission denied, read/write failures)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive file absent at open time
    #[error("Archive not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Interval index absent next to an archive that does exist
    #[error("Interval index not found: {path}")]
    IndexNotFound { path: PathBuf },

    /// Archive metadata unreadable or inconsistent
    #[error("Invalid archive header in {path}: {message}")]
    Header { path: PathBuf, message: String },

    /// Index file structurally unreadable
    #[error("Corrupt interval index {path}: {message}")]
    CorruptIndex { path: PathBuf, message: String },

    /// Queried chromosome has no tree in the index
    #[error("Chromosome {chromosome:?} not present in index")]
    UnknownChromosome { chromosome: String },

    /// Region bounds out of order (begin exceeds end)
    #[error("Invalid region {chromosome}:{begin}-{end}: begin exceeds end")]
    InvalidRegion {
        chromosome: String,
        begin: u64,
        end: u64,
    },

    /// Requested format not derivable from the archive's stored encoding
    #[error("Format {requested} cannot be served by a {native}-encoded archive")]
    UnsupportedFormat { requested: Format, native: Format },

    /// Format name outside the closed GT/AC/HDS/DS/GP set
    #[error("Unknown genotype format {0:?} (expected GT, AC, HDS, DS, or GP)")]
    UnknownFormat(String),

    /// Requested sample list names the same sample twice
    #[error("Sample {id:?} requested more than once")]
    DuplicateSample { id: String },

    /// One or more requested samples absent from the archive
    #[error("Sample(s) not present in archive: {}", missing.join(", "))]
    SampleMismatch { missing: Vec<String> },

    /// Record payload unreadable inside an otherwise well-formed block
    #[error("Corrupt record in block at offset {offset} (chromosome {chromosome}): {message}")]
    CorruptRecord {
        chromosome: String,
        offset: u64,
        message: String,
    },

    /// Internal dimension or bookkeeping inconsistency
    #[error("Logic error: {message}")]
    Logic { message: String },
}

/// Type alias for Results using SvarError
pub type Result<T> = std::result::Result<T, SvarError>;

impl SvarError {
    /// Create a header error for an archive path
    pub fn header(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Header {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a corrupt index error
    pub fn corrupt_index(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::CorruptIndex {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an unknown chromosome error
    pub fn unknown_chromosome(chromosome: impl Into<String>) -> Self {
        Self::UnknownChromosome {
            chromosome: chromosome.into(),
        }
    }

    /// Create an invalid region error
    pub fn invalid_region(chromosome: impl Into<String>, begin: u64, end: u64) -> Self {
        Self::InvalidRegion {
            chromosome: chromosome.into(),
            begin,
            end,
        }
    }

    /// Create a corrupt record error
    pub fn corrupt_record(
        chromosome: impl Into<String>,
        offset: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::CorruptRecord {
            chromosome: chromosome.into(),
            offset,
            message: message.into(),
        }
    }

    /// Create a logic error
    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic {
            message: message.into(),
        }
    }
}
