//! # Configuration Logic
//!
//! CLI argument parsing for the `svar` binary. Region strings use the
//! conventional `chrom:begin-end` form with both bounds inclusive.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};

use crate::data::format::Format;

#[derive(Parser)]
#[command(
    name = "svar",
    version,
    about = "Region-indexed extraction from sparse variant archives"
)]
pub struct Cli {
    /// Verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Per-chromosome variant counts and position ranges from the index
    Stat {
        /// Archive path; reads only the sibling .svx index
        archive: PathBuf,
    },

    /// Print archive header lines and sample identifiers
    Header {
        /// Archive path
        archive: PathBuf,
    },

    /// Extract a region as tab-separated sites and genotype values
    Export {
        /// Archive path (the .svx index must sit next to it)
        archive: PathBuf,

        /// Region to extract, as chrom:begin-end (inclusive bounds)
        #[arg(long)]
        region: RegionSpec,

        /// Genotype format to emit
        #[arg(long, default_value = "GT")]
        format: Format,

        /// Comma-separated sample subset; output follows this order
        #[arg(long, value_delimiter = ',')]
        samples: Option<Vec<String>>,

        /// One row per genotype column instead of one per site
        #[arg(long)]
        transpose: bool,

        /// Print the site table only
        #[arg(long)]
        sites_only: bool,
    },
}

/// A parsed `chrom:begin-end` region argument
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionSpec {
    pub chromosome: String,
    pub begin: u64,
    pub end: u64,
}

impl FromStr for RegionSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // rsplit so chromosome names containing ':' survive
        let (chromosome, range) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("expected chrom:begin-end, got {s:?}"))?;
        if chromosome.is_empty() {
            return Err(format!("empty chromosome in {s:?}"));
        }
        let (begin, end) = range
            .split_once('-')
            .ok_or_else(|| format!("expected begin-end after the colon, got {range:?}"))?;
        let begin: u64 = begin
            .parse()
            .map_err(|_| format!("invalid begin position {begin:?}"))?;
        let end: u64 = end
            .parse()
            .map_err(|_| format!("invalid end position {end:?}"))?;
        Ok(Self {
            chromosome: chromosome.to_string(),
            begin,
            end,
        })
    }
}
