//! # Genotype Encoding Formats
//!
//! Closed set of per-record payload encodings. An archive stores exactly one
//! native encoding (hard calls or haplotype dosages); the remaining formats
//! are derived from it per sample at decode time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SvarError;

/// Genotype value encoding for one variant record payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Format {
    /// Hard allele calls: one 0/1 column per haplotype
    Gt,
    /// Total alternate-allele count: one column per sample
    Ac,
    /// Per-haplotype alternate dosage in [0, 1]: one column per haplotype
    Hds,
    /// Summed dosage in [0, ploidy]: one column per sample
    Ds,
    /// Genotype-class probabilities: ploidy + 1 columns per sample
    Gp,
}

impl Format {
    /// Number of matrix columns one sample occupies under this encoding.
    #[inline]
    pub fn columns_per_sample(self, ploidy: u8) -> usize {
        match self {
            Format::Gt | Format::Hds => ploidy as usize,
            Format::Ac | Format::Ds => 1,
            Format::Gp => ploidy as usize + 1,
        }
    }

    /// Whether this format is one an archive may store natively.
    ///
    /// AC, DS, and GP are derived views; only hard calls and haplotype
    /// dosages carry enough information to reconstruct the others.
    #[inline]
    pub fn is_native_encoding(self) -> bool {
        matches!(self, Format::Gt | Format::Hds)
    }

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            Format::Gt => "GT",
            Format::Ac => "AC",
            Format::Hds => "HDS",
            Format::Ds => "DS",
            Format::Gp => "GP",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = SvarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GT" => Ok(Format::Gt),
            "AC" => Ok(Format::Ac),
            "HDS" => Ok(Format::Hds),
            "DS" => Ok(Format::Ds),
            "GP" => Ok(Format::Gp),
            _ => Err(SvarError::UnknownFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_per_sample() {
        assert_eq!(Format::Gt.columns_per_sample(2), 2);
        assert_eq!(Format::Ac.columns_per_sample(2), 1);
        assert_eq!(Format::Hds.columns_per_sample(2), 2);
        assert_eq!(Format::Ds.columns_per_sample(2), 1);
        assert_eq!(Format::Gp.columns_per_sample(2), 3);

        // haploid archives collapse the haplotype axis
        assert_eq!(Format::Gt.columns_per_sample(1), 1);
        assert_eq!(Format::Gp.columns_per_sample(1), 2);
    }

    #[test]
    fn test_parse_round_trip() {
        for name in ["GT", "AC", "HDS", "DS", "GP"] {
            let format: Format = name.parse().unwrap();
            assert_eq!(format.name(), name);
        }
        assert!("gp".parse::<Format>().is_ok());
        assert!(matches!(
            "GL".parse::<Format>(),
            Err(SvarError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_native_encodings() {
        assert!(Format::Gt.is_native_encoding());
        assert!(Format::Hds.is_native_encoding());
        assert!(!Format::Ac.is_native_encoding());
        assert!(!Format::Ds.is_native_encoding());
        assert!(!Format::Gp.is_native_encoding());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Format::Hds).unwrap();
        assert_eq!(json, "\"HDS\"");
        let back: Format = serde_json::from_str("\"GT\"").unwrap();
        assert_eq!(back, Format::Gt);
    }
}
