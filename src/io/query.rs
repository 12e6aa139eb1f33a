//! # Region Queries
//!
//! Plans a region against the interval index, then streams matching records
//! out of the archive one block at a time. Decompressed blocks never
//! accumulate: the reader holds at most one.
//!
//! Blocks straddle region edges, so every decoded record is re-checked
//! against the inclusive position window before it is yielded.

use std::io;
use std::sync::Arc;

use tracing::{debug, info_span};

use crate::data::format::Format;
use crate::data::matrix::{materialize, GenotypeMatrix, SiteTable};
use crate::data::record::VariantRecord;
use crate::data::sample::SampleSelection;
use crate::data::sparse::{Conversion, SparseGenotypes};
use crate::error::{Result, SvarError};
use crate::io::archive::Archive;
use crate::io::binary::{read_f32_le, read_string, read_u32_le, read_u64_le};
use crate::io::index::IntervalIndex;

/// A region request: chromosome, inclusive bounds, and output options
#[derive(Clone, Debug)]
pub struct RegionQuery {
    chromosome: String,
    begin: u64,
    end: u64,
    format: Format,
    samples: Option<Vec<String>>,
    transpose: bool,
}

impl RegionQuery {
    /// Create a query over `chromosome:begin-end` (both bounds inclusive)
    /// requesting hard calls over all samples.
    pub fn new(chromosome: impl Into<String>, begin: u64, end: u64) -> Self {
        Self {
            chromosome: chromosome.into(),
            begin,
            end,
            format: Format::Gt,
            samples: None,
            transpose: false,
        }
    }

    /// Set the requested genotype format
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Restrict and reorder output to these samples
    pub fn samples(mut self, samples: Vec<String>) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Swap matrix axes so genotype columns become rows
    pub fn transpose(mut self, transpose: bool) -> Self {
        self.transpose = transpose;
        self
    }
}

/// A planned block: where it lives and how many records it holds
#[derive(Clone, Copy, Debug)]
struct BlockLocation {
    offset: u64,
    n_records: u64,
}

/// Streaming iterator over the records of one region query.
///
/// Construction runs the whole plan-time validation ladder (region bounds,
/// chromosome, format capability, sample resolution) without touching the
/// archive body; record I/O starts on the first `next()`. Yields records in
/// ascending genomic order with genotypes already converted to the requested
/// format.
pub struct RegionReader<'a> {
    archive: &'a Archive,
    chromosome: Arc<str>,
    begin: u64,
    end: u64,
    conversion: Conversion,
    selection: Option<SampleSelection>,
    blocks: std::vec::IntoIter<BlockLocation>,
    n_planned: usize,
    block: Vec<u8>,
    cursor: usize,
    block_offset: u64,
    remaining: u64,
    done: bool,
}

impl<'a> RegionReader<'a> {
    /// Plan a region query against an archive and its index.
    pub fn new(archive: &'a Archive, index: &IntervalIndex, query: &RegionQuery) -> Result<Self> {
        if query.begin > query.end {
            return Err(SvarError::invalid_region(
                &query.chromosome,
                query.begin,
                query.end,
            ));
        }

        let blocks: Vec<BlockLocation> = index
            .query(&query.chromosome, query.begin, query.end)?
            .map(|entry| BlockLocation {
                offset: entry.block_offset(),
                n_records: entry.record_count(),
            })
            .collect();

        let conversion = Conversion::resolve(archive.native_format(), query.format)?;
        let selection = match &query.samples {
            Some(requested) => Some(SampleSelection::resolve(archive.samples(), requested)?),
            None => None,
        };

        debug!(
            chromosome = %query.chromosome,
            begin = query.begin,
            end = query.end,
            blocks = blocks.len(),
            "planned region query"
        );

        let n_planned = blocks.len();
        Ok(Self {
            archive,
            chromosome: Arc::from(query.chromosome.as_str()),
            begin: query.begin,
            end: query.end,
            conversion,
            selection,
            blocks: blocks.into_iter(),
            n_planned,
            block: Vec::new(),
            cursor: 0,
            block_offset: 0,
            remaining: 0,
            done: false,
        })
    }

    /// Number of blocks the plan selected
    pub fn n_planned_blocks(&self) -> usize {
        self.n_planned
    }

    /// Sample selection resolved at plan time, when the query requested one
    pub fn selection(&self) -> Option<&SampleSelection> {
        self.selection.as_ref()
    }

    fn map_block_err(&self, e: io::Error) -> SvarError {
        match e.kind() {
            io::ErrorKind::InvalidData
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::UnexpectedEof => SvarError::corrupt_record(
                self.chromosome.as_ref(),
                self.block_offset,
                e.to_string(),
            ),
            _ => SvarError::Io(e),
        }
    }

    fn load_block(&mut self, location: BlockLocation) -> Result<()> {
        self.block_offset = location.offset;
        self.block = self
            .archive
            .read_block(location.offset)
            .map_err(|e| self.map_block_err(e))?;
        self.cursor = 0;
        self.remaining = location.n_records;
        debug!(
            offset = location.offset,
            records = location.n_records,
            "decompressed block"
        );
        Ok(())
    }

    /// Decode one record at the cursor and convert its genotypes.
    fn decode_record(&mut self) -> Result<VariantRecord> {
        let slice = &self.block[self.cursor..];
        let mut r: &[u8] = slice;

        let position = read_u64_le(&mut r).map_err(|e| self.map_block_err(e))?;
        let ref_allele = read_string(&mut r).map_err(|e| self.map_block_err(e))?;
        let alt_allele = read_string(&mut r).map_err(|e| self.map_block_err(e))?;

        let n_fields = self.archive.info_fields().len();
        let mut info = Vec::with_capacity(n_fields);
        for _ in 0..n_fields {
            info.push(read_string(&mut r).map_err(|e| self.map_block_err(e))?);
        }

        let n_columns = read_u32_le(&mut r).map_err(|e| self.map_block_err(e))?;
        let n_pairs = read_u32_le(&mut r).map_err(|e| self.map_block_err(e))?;
        let mut pairs = Vec::with_capacity((n_pairs as usize).min(1 << 20));
        let mut prev: Option<u32> = None;
        for _ in 0..n_pairs {
            let offset = read_u32_le(&mut r).map_err(|e| self.map_block_err(e))?;
            let value = read_f32_le(&mut r).map_err(|e| self.map_block_err(e))?;
            if offset >= n_columns {
                return Err(SvarError::corrupt_record(
                    self.chromosome.as_ref(),
                    self.block_offset,
                    format!("pair offset {offset} outside {n_columns} columns at position {position}"),
                ));
            }
            if prev.is_some_and(|p| offset <= p) {
                return Err(SvarError::corrupt_record(
                    self.chromosome.as_ref(),
                    self.block_offset,
                    format!("pair offsets not strictly increasing at position {position}"),
                ));
            }
            prev = Some(offset);
            pairs.push((offset, value));
        }

        self.cursor += slice.len() - r.len();

        let genotypes = SparseGenotypes::new(n_columns, pairs);
        genotypes.expect_layout(
            self.archive.native_format(),
            self.archive.n_samples(),
            self.archive.ploidy(),
        )?;
        let genotypes = self.conversion.apply(genotypes, self.archive.ploidy())?;

        Ok(VariantRecord {
            chromosome: Arc::clone(&self.chromosome),
            position,
            ref_allele,
            alt_allele,
            info,
            genotypes,
        })
    }
}

impl<'a> Iterator for RegionReader<'a> {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if self.remaining > 0 {
                self.remaining -= 1;
                match self.decode_record() {
                    Ok(record) => {
                        if record.position >= self.begin && record.position <= self.end {
                            return Some(Ok(record));
                        }
                        // block straddles a region edge; skip and keep going
                        continue;
                    }
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }

            if !self.block.is_empty() && self.cursor != self.block.len() {
                self.done = true;
                let extra = self.block.len() - self.cursor;
                return Some(Err(SvarError::corrupt_record(
                    self.chromosome.as_ref(),
                    self.block_offset,
                    format!("{extra} trailing bytes after last record"),
                )));
            }

            match self.blocks.next() {
                Some(location) => {
                    if let Err(e) = self.load_block(location) {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

/// Everything one region query produces
#[derive(Clone, Debug)]
pub struct RegionExtract {
    /// Per-site metadata, one row per matched record
    pub sites: SiteTable,
    /// Dense genotype values
    pub genotypes: GenotypeMatrix,
}

/// Run a region query end to end: plan, stream, select, materialize.
pub fn extract_region(
    archive: &Archive,
    index: &IntervalIndex,
    query: &RegionQuery,
) -> Result<RegionExtract> {
    let span = info_span!(
        "extract_region",
        chromosome = %query.chromosome,
        begin = query.begin,
        end = query.end,
        format = %query.format,
    );
    let _guard = span.enter();

    let reader = RegionReader::new(archive, index, query)?;
    let selection = reader.selection().cloned();

    let records: Vec<VariantRecord> = reader.collect::<Result<_>>()?;
    debug!(records = records.len(), "decoded region records");

    let (genotypes, sites) = materialize(
        &records,
        query.format,
        archive.n_samples(),
        archive.ploidy(),
        selection.as_ref(),
        query.transpose,
        archive.info_fields(),
    )?;

    Ok(RegionExtract { sites, genotypes })
}
