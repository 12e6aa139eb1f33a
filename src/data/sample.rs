//! # Sample Registry and Selection
//!
//! Archive-native sample identifiers with fast lookup, and the permutation
//! that maps a caller's requested sample order onto native columns.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{Result, SvarError};

/// Zero-cost newtype for native sample indices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SampleIdx(pub u32);

impl SampleIdx {
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for SampleIdx {
    fn from(idx: u32) -> Self {
        Self(idx)
    }
}

impl From<SampleIdx> for usize {
    fn from(idx: SampleIdx) -> usize {
        idx.0 as usize
    }
}

/// The archive's sample identifiers in native column order
#[derive(Clone, Debug, Default)]
pub struct Samples {
    /// Sample IDs
    ids: Vec<Arc<str>>,
    /// Map from sample ID to index for fast lookup
    id_to_idx: HashMap<Arc<str>, SampleIdx>,
}

impl Samples {
    /// Create from a vector of sample IDs
    pub fn from_ids(ids: Vec<String>) -> Self {
        let ids: Vec<Arc<str>> = ids.into_iter().map(|s| s.into()).collect();
        let id_to_idx = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), SampleIdx::new(i as u32)))
            .collect();

        Self { ids, id_to_idx }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Get native index by ID
    pub fn index_of(&self, id: &str) -> Option<SampleIdx> {
        self.id_to_idx.get(id).copied()
    }

    /// Get all sample IDs
    pub fn ids(&self) -> &[Arc<str>] {
        &self.ids
    }
}

impl std::ops::Index<SampleIdx> for Samples {
    type Output = str;

    fn index(&self, idx: SampleIdx) -> &Self::Output {
        &self.ids[idx.as_usize()]
    }
}

/// Permutation from requested sample order to native archive columns.
///
/// `order()[i]` is the native index of the i-th requested sample, so output
/// column blocks follow the caller's order, not the archive's.
#[derive(Clone, Debug)]
pub struct SampleSelection {
    order: Vec<SampleIdx>,
}

impl SampleSelection {
    /// Resolve requested IDs against the archive registry.
    ///
    /// Every requested sample must exist; the error lists all absent IDs at
    /// once rather than stopping at the first. Duplicate requests are
    /// rejected because one native column cannot feed two output slots.
    pub fn resolve(samples: &Samples, requested: &[String]) -> Result<Self> {
        let mut order = Vec::with_capacity(requested.len());
        let mut seen: HashSet<&str> = HashSet::with_capacity(requested.len());
        let mut missing = Vec::new();

        for id in requested {
            if !seen.insert(id.as_str()) {
                return Err(SvarError::DuplicateSample { id: id.clone() });
            }
            match samples.index_of(id) {
                Some(idx) => order.push(idx),
                None => missing.push(id.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(SvarError::SampleMismatch { missing });
        }
        Ok(Self { order })
    }

    /// Number of requested samples
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Native index of the i-th requested sample
    pub fn native_index(&self, i: usize) -> SampleIdx {
        self.order[i]
    }

    /// The full permutation in requested order
    pub fn order(&self) -> &[SampleIdx] {
        &self.order
    }

    /// Invert the permutation: native index -> output position, `None` for
    /// native samples the caller did not request.
    pub fn inverse(&self, n_samples: usize) -> Vec<Option<u32>> {
        let mut inverse = vec![None; n_samples];
        for (out, idx) in self.order.iter().enumerate() {
            inverse[idx.as_usize()] = Some(out as u32);
        }
        inverse
    }
}
