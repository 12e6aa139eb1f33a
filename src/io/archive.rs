//! # Archive Container
//!
//! Memory-mapped access to a chromosome-partitioned variant archive.
//!
//! Format:
//! - [Magic 8 bytes] "SVARCH01"
//! - [Metadata Length u64]
//! - [Metadata JSON] (headers, samples, ploidy, info fields, native format)
//! - [Blocks] each `[raw_len u32][compressed_len u32][deflate bytes]`
//!
//! Blocks are addressed by absolute byte offset taken from the interval
//! index; the archive itself stores no block table.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::DeflateDecoder;
use memmap2::Mmap;
use serde::Deserialize;
use tracing::debug;

use crate::data::format::Format;
use crate::data::sample::Samples;
use crate::error::{Result, SvarError};
use crate::io::binary::{read_u32_le, read_u64_le};
use crate::io::index::IntervalIndex;

const MAGIC: &[u8; 8] = b"SVARCH01";

/// Suffix appended to the archive path to locate its interval index
pub const INDEX_SUFFIX: &str = ".svx";

/// Decompressed blocks larger than this are treated as corruption
const MAX_BLOCK_LEN: u32 = 1 << 26;

/// Metadata stored in the JSON header
#[derive(Debug, Deserialize)]
struct ArchiveMeta {
    /// Ordered (name, value) header lines
    headers: Vec<(String, String)>,
    /// Sample identifiers in native column order
    samples: Vec<String>,
    /// Haplotypes per sample
    ploidy: u8,
    /// Declared info field names
    info_fields: Vec<String>,
    /// Stored genotype encoding
    native_format: Format,
}

/// A read-only, memory-mapped variant archive
#[derive(Debug)]
pub struct Archive {
    path: PathBuf,
    mmap: Mmap,
    meta: ArchiveMeta,
    samples: Samples,
    data_start: u64,
}

impl Archive {
    /// Open an archive and parse its metadata header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(SvarError::FileNotFound { path });
        }

        let file = File::open(&path)?;
        if file.metadata()?.len() < 16 {
            return Err(SvarError::header(&path, "file too short for magic and header"));
        }
        let mmap = unsafe { Mmap::map(&file)? };

        if &mmap[0..8] != MAGIC {
            return Err(SvarError::header(&path, "missing or unrecognized magic"));
        }

        let mut cursor = &mmap[8..];
        let meta_len = read_u64_le(&mut cursor)
            .map_err(|e| SvarError::header(&path, format!("unreadable metadata length: {e}")))?;
        let data_start = 16u64
            .checked_add(meta_len)
            .filter(|&end| end <= mmap.len() as u64)
            .ok_or_else(|| SvarError::header(&path, "metadata extends past end of file"))?;

        let meta: ArchiveMeta = serde_json::from_slice(&mmap[16..data_start as usize])
            .map_err(|e| SvarError::header(&path, format!("invalid metadata: {e}")))?;

        if meta.ploidy == 0 {
            return Err(SvarError::header(&path, "ploidy must be at least 1"));
        }
        if !meta.native_format.is_native_encoding() {
            return Err(SvarError::header(
                &path,
                format!(
                    "native format {} is a derived view; archives store GT or HDS",
                    meta.native_format
                ),
            ));
        }
        let mut seen = HashSet::with_capacity(meta.samples.len());
        for id in &meta.samples {
            if !seen.insert(id.as_str()) {
                return Err(SvarError::header(&path, format!("duplicate sample id {id:?}")));
            }
        }

        let samples = Samples::from_ids(meta.samples.clone());
        debug!(
            path = %path.display(),
            samples = samples.len(),
            ploidy = meta.ploidy,
            native = %meta.native_format,
            "opened archive"
        );

        Ok(Self {
            path,
            mmap,
            meta,
            samples,
            data_start,
        })
    }

    /// Archive file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ordered archive header lines
    pub fn headers(&self) -> &[(String, String)] {
        &self.meta.headers
    }

    /// Native sample registry
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Number of samples
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Haplotypes per sample
    pub fn ploidy(&self) -> u8 {
        self.meta.ploidy
    }

    /// Declared info field names
    pub fn info_fields(&self) -> &[String] {
        &self.meta.info_fields
    }

    /// The genotype encoding records are stored in
    pub fn native_format(&self) -> Format {
        self.meta.native_format
    }

    /// Path of the sibling interval index (`<archive>.svx`)
    pub fn index_path(&self) -> PathBuf {
        index_path_for(&self.path)
    }

    /// Open the sibling interval index.
    pub fn open_index(&self) -> Result<IntervalIndex> {
        IntervalIndex::open(self.index_path())
    }

    /// Read and decompress the block at an absolute byte offset.
    ///
    /// Failures come back as `io::Error`; the region reader attaches
    /// chromosome and offset context when mapping into the crate taxonomy.
    pub fn read_block(&self, offset: u64) -> io::Result<Vec<u8>> {
        let len = self.mmap.len() as u64;
        if offset < self.data_start || len.saturating_sub(offset) < 8 {
            return Err(invalid_data(format!("block offset {offset} out of bounds")));
        }

        let start = offset as usize;
        let mut cursor = &self.mmap[start..];
        let raw_len = read_u32_le(&mut cursor)?;
        let comp_len = read_u32_le(&mut cursor)?;
        if raw_len > MAX_BLOCK_LEN {
            return Err(invalid_data(format!(
                "block at {offset} declares {raw_len} decompressed bytes"
            )));
        }
        let end = offset + 8 + comp_len as u64;
        if end > len {
            return Err(invalid_data(format!(
                "block at {offset} extends past end of file"
            )));
        }

        let compressed = &self.mmap[start + 8..end as usize];
        let mut raw = Vec::with_capacity(raw_len as usize);
        // inflate at most one byte past the declared length; anything longer
        // trips the mismatch below without expanding further
        DeflateDecoder::new(compressed)
            .take(raw_len as u64 + 1)
            .read_to_end(&mut raw)?;
        if raw.len() != raw_len as usize {
            return Err(invalid_data(format!(
                "block at {offset} does not decompress to the declared {raw_len} bytes"
            )));
        }
        Ok(raw)
    }
}

/// Index path for an archive path: the full file name plus `.svx`, so the
/// index can be located without opening the archive itself.
pub fn index_path_for(archive_path: &Path) -> PathBuf {
    let mut name = archive_path.as_os_str().to_os_string();
    name.push(INDEX_SUFFIX);
    PathBuf::from(name)
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
