//! # Variant Records
//!
//! One decoded site: coordinates, alleles, info-field values, and the sparse
//! genotype payload (already converted to the requested format).

use std::sync::Arc;

use crate::data::sparse::SparseGenotypes;

/// A fully decoded variant record
#[derive(Clone, Debug)]
pub struct VariantRecord {
    /// Chromosome name, shared across all records of a query
    pub chromosome: Arc<str>,
    /// 1-based genomic position
    pub position: u64,
    /// Reference allele
    pub ref_allele: String,
    /// Alternate allele (multi-allelic sites carry a comma-joined string)
    pub alt_allele: String,
    /// Info values parallel to the archive's declared field names; an empty
    /// string marks a field the record does not set
    pub info: Vec<String>,
    /// Sparse genotype values
    pub genotypes: SparseGenotypes,
}

impl VariantRecord {
    /// Look up an info value by field name against the archive's declared
    /// field order.
    pub fn info_value<'a>(&'a self, declared: &[String], name: &str) -> Option<&'a str> {
        declared
            .iter()
            .position(|field| field == name)
            .and_then(|i| self.info.get(i))
            .map(String::as_str)
    }
}
