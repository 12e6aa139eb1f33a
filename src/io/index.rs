//! # Interval Index
//!
//! Sibling `.svx` file mapping position ranges to archive blocks, one tree
//! per chromosome. The index is small and fully parsed at open, so region
//! planning and per-chromosome statistics never touch the archive body.
//!
//! Format:
//! - [Magic 4 bytes] "svx1"
//! - [Tree count u32]
//! - per tree: [name string] [min_pos u64] [max_pos u64] [entry_count u32]
//!   then entries `[start u64][end u64][value u64]` sorted by start
//!
//! An entry's value packs the block address and its record count:
//! offset in the high 48 bits, `record_count - 1` in the low 16.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, SvarError};
use crate::io::binary::{read_string, read_u32_le, read_u64_le};

const MAGIC: &[u8; 4] = b"svx1";

/// One indexed block: an inclusive position range plus a packed value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// Lowest record position in the block
    pub start: u64,
    /// Highest record position in the block
    pub end: u64,
    /// Packed block offset and record count
    value: u64,
}

impl IndexEntry {
    /// Create from a raw packed value.
    pub fn new(start: u64, end: u64, value: u64) -> Self {
        Self { start, end, value }
    }

    /// Pack a block offset and record count (1..=65536) into an entry.
    pub fn pack(start: u64, end: u64, block_offset: u64, record_count: u64) -> Self {
        debug_assert!((1..=0x1_0000).contains(&record_count));
        Self {
            start,
            end,
            value: (block_offset << 16) | (record_count - 1),
        }
    }

    /// Absolute byte offset of the block in the archive
    #[inline]
    pub fn block_offset(&self) -> u64 {
        self.value >> 16
    }

    /// Number of records stored in the block
    #[inline]
    pub fn record_count(&self) -> u64 {
        (self.value & 0xFFFF) + 1
    }

    /// The raw packed value
    pub fn value(&self) -> u64 {
        self.value
    }
}

/// All indexed blocks for one chromosome
#[derive(Clone, Debug)]
pub struct ChromosomeTree {
    name: Arc<str>,
    min_pos: u64,
    max_pos: u64,
    entries: Vec<IndexEntry>,
}

impl ChromosomeTree {
    /// Chromosome name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowest and highest indexed positions
    pub fn range(&self) -> (u64, u64) {
        (self.min_pos, self.max_pos)
    }

    /// Number of index entries
    pub fn n_entries(&self) -> usize {
        self.entries.len()
    }

    /// All entries in ascending start order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Entries whose range intersects the inclusive query range, in
    /// ascending start order. Ties keep on-disk order.
    pub fn query(&self, lo: u64, hi: u64) -> impl Iterator<Item = &IndexEntry> + '_ {
        let cut = self.entries.partition_point(|e| e.start <= hi);
        self.entries[..cut].iter().filter(move |e| e.end >= lo)
    }
}

/// Fully parsed interval index for one archive
#[derive(Clone, Debug)]
pub struct IntervalIndex {
    path: PathBuf,
    trees: Vec<ChromosomeTree>,
    by_name: HashMap<Arc<str>, usize>,
}

impl IntervalIndex {
    /// Open and fully parse an index file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(SvarError::IndexNotFound { path });
        }
        let file = File::open(&path)?;
        let mut reader = BufReader::new(file);
        Self::parse(&mut reader, path)
    }

    fn parse<R: Read>(reader: &mut R, path: PathBuf) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(|e| read_err(&path, e))?;
        if &magic != MAGIC {
            return Err(SvarError::corrupt_index(&path, "missing or unrecognized magic"));
        }

        let tree_count = read_u32_le(reader).map_err(|e| read_err(&path, e))?;
        let mut trees = Vec::with_capacity(tree_count.min(1024) as usize);
        let mut by_name: HashMap<Arc<str>, usize> = HashMap::new();

        for _ in 0..tree_count {
            let name: Arc<str> = read_string(reader).map_err(|e| read_err(&path, e))?.into();
            let min_pos = read_u64_le(reader).map_err(|e| read_err(&path, e))?;
            let max_pos = read_u64_le(reader).map_err(|e| read_err(&path, e))?;
            if min_pos > max_pos {
                return Err(SvarError::corrupt_index(
                    &path,
                    format!("chromosome {name:?} declares inverted range {min_pos}-{max_pos}"),
                ));
            }

            let entry_count = read_u32_le(reader).map_err(|e| read_err(&path, e))?;
            // trust the count for iteration, not for allocation
            let mut entries = Vec::with_capacity(entry_count.min(1 << 20) as usize);
            let mut prev_start = 0u64;
            for i in 0..entry_count {
                let start = read_u64_le(reader).map_err(|e| read_err(&path, e))?;
                let end = read_u64_le(reader).map_err(|e| read_err(&path, e))?;
                let value = read_u64_le(reader).map_err(|e| read_err(&path, e))?;
                if start > end {
                    return Err(SvarError::corrupt_index(
                        &path,
                        format!("entry {i} of chromosome {name:?} has start after end"),
                    ));
                }
                if start < prev_start {
                    return Err(SvarError::corrupt_index(
                        &path,
                        format!("entries for chromosome {name:?} not sorted by start"),
                    ));
                }
                prev_start = start;
                entries.push(IndexEntry::new(start, end, value));
            }

            if by_name.insert(Arc::clone(&name), trees.len()).is_some() {
                return Err(SvarError::corrupt_index(
                    &path,
                    format!("duplicate tree for chromosome {name:?}"),
                ));
            }
            trees.push(ChromosomeTree {
                name,
                min_pos,
                max_pos,
                entries,
            });
        }

        let mut trailing = [0u8; 1];
        match reader.read(&mut trailing) {
            Ok(0) => {}
            Ok(_) => {
                return Err(SvarError::corrupt_index(&path, "trailing bytes after last tree"))
            }
            Err(e) => return Err(SvarError::Io(e)),
        }

        debug!(path = %path.display(), chromosomes = trees.len(), "loaded interval index");
        Ok(Self {
            path,
            trees,
            by_name,
        })
    }

    /// Index file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of chromosome trees
    pub fn n_chromosomes(&self) -> usize {
        self.trees.len()
    }

    /// Trees in on-disk order
    pub fn chromosomes(&self) -> impl Iterator<Item = &ChromosomeTree> {
        self.trees.iter()
    }

    /// Chromosome names in on-disk order
    pub fn chromosome_names(&self) -> impl Iterator<Item = &str> {
        self.trees.iter().map(|tree| tree.name())
    }

    fn tree(&self, chromosome: &str) -> Result<&ChromosomeTree> {
        self.by_name
            .get(chromosome)
            .map(|&i| &self.trees[i])
            .ok_or_else(|| SvarError::unknown_chromosome(chromosome))
    }

    /// Indexed position range for one chromosome.
    pub fn range_for(&self, chromosome: &str) -> Result<(u64, u64)> {
        Ok(self.tree(chromosome)?.range())
    }

    /// Entries intersecting the inclusive range on one chromosome.
    pub fn query(
        &self,
        chromosome: &str,
        lo: u64,
        hi: u64,
    ) -> Result<impl Iterator<Item = &IndexEntry> + '_> {
        Ok(self.tree(chromosome)?.query(lo, hi))
    }
}

fn read_err(path: &Path, e: io::Error) -> SvarError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => SvarError::corrupt_index(path, "unexpected end of file"),
        io::ErrorKind::InvalidData => SvarError::corrupt_index(path, e.to_string()),
        _ => SvarError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_string(bytes: &mut Vec<u8>, s: &str) {
        bytes.extend_from_slice(&(s.len() as u32).to_le_bytes());
        bytes.extend_from_slice(s.as_bytes());
    }

    fn index_bytes(trees: &[(&str, u64, u64, Vec<(u64, u64, u64)>)]) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&(trees.len() as u32).to_le_bytes());
        for (name, min, max, entries) in trees {
            push_string(&mut bytes, name);
            bytes.extend_from_slice(&min.to_le_bytes());
            bytes.extend_from_slice(&max.to_le_bytes());
            bytes.extend_from_slice(&(entries.len() as u32).to_le_bytes());
            for (start, end, value) in entries {
                bytes.extend_from_slice(&start.to_le_bytes());
                bytes.extend_from_slice(&end.to_le_bytes());
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        bytes
    }

    fn parse(bytes: &[u8]) -> Result<IntervalIndex> {
        IntervalIndex::parse(&mut &bytes[..], PathBuf::from("test.svx"))
    }

    #[test]
    fn test_entry_packing() {
        let entry = IndexEntry::pack(100, 500, 4096, 4);
        assert_eq!(entry.block_offset(), 4096);
        assert_eq!(entry.record_count(), 4);
        assert_eq!(entry.value(), (4096 << 16) | 3);
    }

    #[test]
    fn test_record_counts_from_packed_values() {
        // low 16 bits hold count - 1
        assert_eq!(IndexEntry::new(0, 0, 0x0003).record_count(), 4);
        assert_eq!(IndexEntry::new(0, 0, 0x0000).record_count(), 1);
        assert_eq!(IndexEntry::new(0, 0, 0xFFFF).record_count(), 0x1_0000);
    }

    #[test]
    fn test_parse_and_query() {
        let bytes = index_bytes(&[(
            "1",
            100,
            500,
            vec![(100, 199, 1), (200, 299, 2), (300, 500, 3)],
        )]);
        let index = parse(&bytes).unwrap();

        assert_eq!(index.n_chromosomes(), 1);
        assert_eq!(index.range_for("1").unwrap(), (100, 500));

        let hits: Vec<u64> = index
            .query("1", 250, 400)
            .unwrap()
            .map(|e| e.value())
            .collect();
        assert_eq!(hits, vec![2, 3]);
    }

    #[test]
    fn test_query_bounds_are_inclusive() {
        let bytes = index_bytes(&[("1", 100, 299, vec![(100, 199, 1), (200, 299, 2)])]);
        let index = parse(&bytes).unwrap();

        // hi touching an entry's start
        let hits: Vec<u64> = index.query("1", 0, 200).unwrap().map(|e| e.value()).collect();
        assert_eq!(hits, vec![1, 2]);
        // lo touching an entry's end
        let hits: Vec<u64> = index
            .query("1", 199, 199)
            .unwrap()
            .map(|e| e.value())
            .collect();
        assert_eq!(hits, vec![1]);
        // gap between entries
        assert_eq!(index.query("1", 1, 99).unwrap().count(), 0);
    }

    #[test]
    fn test_query_is_restartable() {
        let bytes = index_bytes(&[("1", 100, 500, vec![(100, 500, 9)])]);
        let index = parse(&bytes).unwrap();
        assert_eq!(index.query("1", 0, u64::MAX).unwrap().count(), 1);
        assert_eq!(index.query("1", 0, u64::MAX).unwrap().count(), 1);
    }

    #[test]
    fn test_unknown_chromosome() {
        let bytes = index_bytes(&[("1", 100, 500, vec![])]);
        let index = parse(&bytes).unwrap();
        assert!(matches!(
            index.query("MT", 0, 100),
            Err(SvarError::UnknownChromosome { chromosome }) if chromosome == "MT"
        ));
    }

    #[test]
    fn test_multiple_chromosomes_keep_file_order() {
        let bytes = index_bytes(&[
            ("2", 10, 20, vec![(10, 20, 1)]),
            ("1", 5, 6, vec![(5, 6, 2)]),
        ]);
        let index = parse(&bytes).unwrap();
        let names: Vec<&str> = index.chromosome_names().collect();
        assert_eq!(names, vec!["2", "1"]);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = index_bytes(&[]);
        bytes[0] = b'X';
        assert!(matches!(parse(&bytes), Err(SvarError::CorruptIndex { .. })));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let bytes = index_bytes(&[("1", 100, 500, vec![(100, 500, 1)])]);
        assert!(matches!(
            parse(&bytes[..bytes.len() - 3]),
            Err(SvarError::CorruptIndex { .. })
        ));
    }

    #[test]
    fn test_rejects_unsorted_entries() {
        let bytes = index_bytes(&[("1", 0, 500, vec![(300, 400, 1), (100, 200, 2)])]);
        assert!(matches!(parse(&bytes), Err(SvarError::CorruptIndex { .. })));
    }

    #[test]
    fn test_rejects_inverted_entry_range() {
        let bytes = index_bytes(&[("1", 0, 500, vec![(400, 300, 1)])]);
        assert!(matches!(parse(&bytes), Err(SvarError::CorruptIndex { .. })));
    }

    #[test]
    fn test_rejects_duplicate_chromosome() {
        let bytes = index_bytes(&[("1", 0, 10, vec![]), ("1", 20, 30, vec![])]);
        assert!(matches!(parse(&bytes), Err(SvarError::CorruptIndex { .. })));
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = index_bytes(&[("1", 0, 10, vec![])]);
        bytes.push(0);
        assert!(matches!(parse(&bytes), Err(SvarError::CorruptIndex { .. })));
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            IntervalIndex::open("/nonexistent/archive.svar.svx"),
            Err(SvarError::IndexNotFound { .. })
        ));
    }
}
