//! # Materialized Query Output
//!
//! Dense genotype matrix plus the parallel site table produced from a region
//! query. Rows follow ascending genomic order; genotype columns follow the
//! caller's requested sample order when a selection is given, otherwise the
//! archive's native order.

use std::sync::Arc;

use crate::data::format::Format;
use crate::data::record::VariantRecord;
use crate::data::sample::SampleSelection;
use crate::error::{Result, SvarError};

/// Dense row-major f32 matrix of genotype values
#[derive(Clone, Debug, PartialEq)]
pub struct GenotypeMatrix {
    n_rows: usize,
    n_cols: usize,
    values: Vec<f32>,
}

impl GenotypeMatrix {
    /// Create a zero-filled matrix
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            values: vec![0.0; n_rows * n_cols],
        }
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Get value at (row, col)
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.n_cols + col]
    }

    /// Set value at (row, col)
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.values[row * self.n_cols + col] = value;
    }

    /// One full row as a slice
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.n_cols;
        &self.values[start..start + self.n_cols]
    }

    /// The backing row-major buffer
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Per-site metadata columns parallel to the matrix's variant axis
#[derive(Clone, Debug, Default)]
pub struct SiteTable {
    chromosomes: Vec<Arc<str>>,
    positions: Vec<u64>,
    ref_alleles: Vec<String>,
    alt_alleles: Vec<String>,
    info_fields: Vec<String>,
    /// One column per declared info field, each parallel to the rows
    info_columns: Vec<Vec<String>>,
}

impl SiteTable {
    /// Build from decoded records, carrying the archive's declared info
    /// fields as extra columns.
    pub fn from_records(records: &[VariantRecord], info_fields: &[String]) -> Self {
        let mut table = Self {
            chromosomes: Vec::with_capacity(records.len()),
            positions: Vec::with_capacity(records.len()),
            ref_alleles: Vec::with_capacity(records.len()),
            alt_alleles: Vec::with_capacity(records.len()),
            info_fields: info_fields.to_vec(),
            info_columns: vec![Vec::with_capacity(records.len()); info_fields.len()],
        };
        for record in records {
            table.chromosomes.push(Arc::clone(&record.chromosome));
            table.positions.push(record.position);
            table.ref_alleles.push(record.ref_allele.clone());
            table.alt_alleles.push(record.alt_allele.clone());
            for (column, value) in table.info_columns.iter_mut().zip(&record.info) {
                column.push(value.clone());
            }
        }
        table
    }

    /// Number of sites
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Column names: the four fixed site columns, then declared info fields
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![
            "chrom".to_string(),
            "pos".to_string(),
            "ref".to_string(),
            "alt".to_string(),
        ];
        names.extend(self.info_fields.iter().cloned());
        names
    }

    pub fn chromosome(&self, row: usize) -> &str {
        &self.chromosomes[row]
    }

    pub fn position(&self, row: usize) -> u64 {
        self.positions[row]
    }

    pub fn ref_allele(&self, row: usize) -> &str {
        &self.ref_alleles[row]
    }

    pub fn alt_allele(&self, row: usize) -> &str {
        &self.alt_alleles[row]
    }

    /// Declared info field names
    pub fn info_fields(&self) -> &[String] {
        &self.info_fields
    }

    /// One info column, parallel to the rows
    pub fn info_column(&self, field: usize) -> &[String] {
        &self.info_columns[field]
    }

    /// Info value at (row, field index)
    pub fn info_value(&self, row: usize, field: usize) -> &str {
        &self.info_columns[field][row]
    }
}

/// Scatter decoded records into a dense matrix and site table.
///
/// Records must already be in `format`; their sparse offsets still address
/// native archive columns. With a selection, unselected samples are dropped
/// and the survivors land in requested order. `transpose` swaps the axes so
/// genotype columns become rows.
pub fn materialize(
    records: &[VariantRecord],
    format: Format,
    n_archive_samples: usize,
    ploidy: u8,
    selection: Option<&SampleSelection>,
    transpose: bool,
    info_fields: &[String],
) -> Result<(GenotypeMatrix, SiteTable)> {
    let width = format.columns_per_sample(ploidy);
    let expected_columns = n_archive_samples * width;
    let out_samples = selection.map_or(n_archive_samples, |s| s.len());
    let inverse = selection.map(|s| s.inverse(n_archive_samples));

    let (n_rows, n_cols) = if transpose {
        (out_samples * width, records.len())
    } else {
        (records.len(), out_samples * width)
    };
    let mut matrix = GenotypeMatrix::zeros(n_rows, n_cols);

    for (row, record) in records.iter().enumerate() {
        if record.genotypes.n_columns() as usize != expected_columns {
            return Err(SvarError::logic(format!(
                "record {}:{} carries {} genotype columns, expected {}",
                record.chromosome,
                record.position,
                record.genotypes.n_columns(),
                expected_columns
            )));
        }
        for (offset, value) in record.genotypes.pairs() {
            let native_sample = offset as usize / width;
            let col = match &inverse {
                None => offset as usize,
                Some(map) => match map[native_sample] {
                    Some(out) => out as usize * width + offset as usize % width,
                    None => continue,
                },
            };
            if transpose {
                matrix.set(col, row, value);
            } else {
                matrix.set(row, col, value);
            }
        }
    }

    let sites = SiteTable::from_records(records, info_fields);
    Ok((matrix, sites))
}
