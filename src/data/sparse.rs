//! # Sparse Genotype Vectors
//!
//! One variant's genotype values as (column offset, value) pairs over a
//! conceptual dense row. Offsets are strictly increasing; any column without
//! a pair holds 0.0. Missing calls are stored explicitly as NaN so they
//! survive the sparse representation.
//!
//! Conversions between encodings happen here, per sample:
//! - haplotype columns fold into one summed column (GT -> AC, GT/HDS -> DS)
//! - haplotype dosages expand into genotype-class probabilities (HDS -> GP)

use crate::data::format::Format;
use crate::error::{Result, SvarError};

/// Sparse per-column genotype values for one variant record.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseGenotypes {
    /// Width of the conceptual dense row
    n_columns: u32,

    /// (offset, value) pairs with strictly increasing offsets
    pairs: Vec<(u32, f32)>,
}

impl SparseGenotypes {
    /// Create from pre-validated pairs.
    ///
    /// Offsets must be strictly increasing and below `n_columns`; the wire
    /// decoder enforces this before construction.
    pub fn new(n_columns: u32, pairs: Vec<(u32, f32)>) -> Self {
        debug_assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
        debug_assert!(pairs.last().map_or(true, |&(off, _)| off < n_columns));
        Self { n_columns, pairs }
    }

    /// Width of the dense row this vector describes.
    #[inline]
    pub fn n_columns(&self) -> u32 {
        self.n_columns
    }

    /// Number of explicitly stored values.
    #[inline]
    pub fn n_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Iterate stored (offset, value) pairs in ascending offset order.
    pub fn pairs(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.pairs.iter().copied()
    }

    /// Check the declared width against the archive's sample count and the
    /// format's per-sample column count. A mismatch means the payload and
    /// the archive metadata disagree about layout.
    pub fn expect_layout(&self, format: Format, n_samples: usize, ploidy: u8) -> Result<()> {
        let expected = n_samples * format.columns_per_sample(ploidy);
        if self.n_columns as usize != expected {
            return Err(SvarError::logic(format!(
                "payload declares {} genotype columns but {} samples as {} require {}",
                self.n_columns, n_samples, format, expected
            )));
        }
        Ok(())
    }

    /// Materialize the full dense row. Unstored columns become 0.0.
    pub fn to_dense(&self) -> Vec<f32> {
        let mut dense = vec![0.0; self.n_columns as usize];
        for &(offset, value) in &self.pairs {
            dense[offset as usize] = value;
        }
        dense
    }

    /// Collapse `width` adjacent columns per sample into one summed column.
    ///
    /// Zero sums are dropped to preserve sparsity; NaN sums are kept, so a
    /// missing haplotype call marks the whole sample missing.
    pub fn fold(&self, width: usize) -> SparseGenotypes {
        let n_samples = self.n_columns as usize / width.max(1);
        let mut pairs: Vec<(u32, f32)> = Vec::new();
        for &(offset, value) in &self.pairs {
            let sample = offset / width as u32;
            match pairs.last_mut() {
                Some((last, sum)) if *last == sample => *sum += value,
                _ => pairs.push((sample, value)),
            }
        }
        // NaN != 0.0, so missing sums survive the filter
        pairs.retain(|&(_, sum)| sum != 0.0);
        SparseGenotypes {
            n_columns: n_samples as u32,
            pairs,
        }
    }

    /// Expand per-haplotype dosages into genotype-class probabilities.
    ///
    /// Each sample's `ploidy` dosage columns become `ploidy + 1` probability
    /// columns, treating haplotypes as independent Bernoulli draws. Every
    /// sample emits at least its class-0 probability, so the result is dense
    /// in samples even when the input is empty. Fails when the widened row
    /// no longer fits the u32 offset space.
    pub fn expand_probabilities(&self, ploidy: u8) -> Result<SparseGenotypes> {
        let width = (ploidy as usize).max(1);
        let n_samples = self.n_columns as usize / width;
        let out_width = width + 1;
        let out_columns = n_samples
            .checked_mul(out_width)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                SvarError::logic(format!(
                    "probability columns for {n_samples} samples overflow the u32 offset space"
                ))
            })?;

        let mut pairs = Vec::with_capacity(n_samples);
        let mut dosages = vec![0.0f32; width];
        let mut probs = vec![0.0f32; out_width];
        let mut cursor = 0usize;

        for sample in 0..n_samples {
            let base = (sample * width) as u32;
            dosages.fill(0.0);
            while cursor < self.pairs.len() && self.pairs[cursor].0 < base + width as u32 {
                let (offset, value) = self.pairs[cursor];
                dosages[(offset - base) as usize] = value;
                cursor += 1;
            }

            probs.fill(0.0);
            probs[0] = 1.0;
            for (k, &d) in dosages.iter().enumerate() {
                // in-place convolution; descending j keeps probs[j] unread
                // until its contribution to probs[j + 1] is recorded
                for j in (0..=k).rev() {
                    let p = probs[j];
                    probs[j + 1] += p * d;
                    probs[j] = p * (1.0 - d);
                }
            }

            let out_base = (sample * out_width) as u32;
            for (k, &p) in probs.iter().enumerate() {
                if p != 0.0 {
                    pairs.push((out_base + k as u32, p));
                }
            }
        }

        Ok(SparseGenotypes {
            n_columns: out_columns,
            pairs,
        })
    }
}

/// Plan-time resolution of how native payloads become the requested format.
///
/// Resolved once per region query so the per-record path never re-checks
/// the capability table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conversion {
    /// Requested format equals the stored encoding
    Identity,
    /// Sum haplotype columns into one column per sample (AC, DS)
    Fold,
    /// Expand haplotype dosages into class probabilities (GP)
    Expand,
}

impl Conversion {
    /// Resolve the conversion for a native/requested pair, failing fast when
    /// the archive's encoding cannot serve the request.
    pub fn resolve(native: Format, requested: Format) -> Result<Conversion> {
        match (native, requested) {
            (native, requested) if native == requested => Ok(Conversion::Identity),
            (Format::Gt, Format::Ac)
            | (Format::Gt, Format::Ds)
            | (Format::Hds, Format::Ds) => Ok(Conversion::Fold),
            (Format::Hds, Format::Gp) => Ok(Conversion::Expand),
            (native, requested) => Err(SvarError::UnsupportedFormat { requested, native }),
        }
    }

    /// Apply the resolved conversion to one record's genotypes.
    pub fn apply(self, genotypes: SparseGenotypes, ploidy: u8) -> Result<SparseGenotypes> {
        match self {
            Conversion::Identity => Ok(genotypes),
            Conversion::Fold => Ok(genotypes.fold(ploidy as usize)),
            Conversion::Expand => genotypes.expand_probabilities(ploidy),
        }
    }
}
