//! # svar: Region-Indexed Variant Archive Extraction
//!
//! ## Usage
//! ```bash
//! # Per-chromosome counts and ranges (index only)
//! svar stat panel.svar
//!
//! # Header lines and sample identifiers
//! svar header panel.svar
//!
//! # Extract a region as TSV
//! svar export panel.svar --region 1:100-500 --format DS --samples S3,S1
//! ```

use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use svar::config::{Cli, Command, RegionSpec};
use svar::data::format::Format;
use svar::data::matrix::SiteTable;
use svar::io::archive::{index_path_for, Archive};
use svar::io::index::IntervalIndex;
use svar::io::query::{extract_region, RegionQuery};
use svar::stats::chromosome_stats;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout is reserved for TSV output.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Stat { archive } => stat(&archive),
        Command::Header { archive } => header(&archive),
        Command::Export {
            archive,
            region,
            format,
            samples,
            transpose,
            sites_only,
        } => export(&archive, &region, format, samples, transpose, sites_only),
    }
}

/// `stat` opens only the index, so it answers even when the archive body
/// is missing or unreadable.
fn stat(archive: &Path) -> Result<()> {
    let index = IntervalIndex::open(index_path_for(archive))
        .with_context(|| format!("cannot stat {}", archive.display()))?;

    let mut out = BufWriter::new(io::stdout().lock());
    writeln!(out, "chromosome\tvariant_count\tmin_position\tmax_position")?;
    for row in chromosome_stats(&index) {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            row.chromosome, row.variant_count, row.min_position, row.max_position
        )?;
    }
    out.flush()?;
    Ok(())
}

fn header(archive: &Path) -> Result<()> {
    let archive = Archive::open(archive)?;

    let mut out = BufWriter::new(io::stdout().lock());
    for (name, value) in archive.headers() {
        writeln!(out, "header\t{name}\t{value}")?;
    }
    for id in archive.samples().ids() {
        writeln!(out, "sample\t{id}")?;
    }
    out.flush()?;
    Ok(())
}

fn export(
    path: &Path,
    region: &RegionSpec,
    format: Format,
    samples: Option<Vec<String>>,
    transpose: bool,
    sites_only: bool,
) -> Result<()> {
    let start = Instant::now();
    let archive = Archive::open(path)?;
    let index = archive.open_index()?;

    let mut query = RegionQuery::new(&region.chromosome, region.begin, region.end)
        .format(format)
        .transpose(transpose);
    if let Some(ids) = samples.clone() {
        query = query.samples(ids);
    }
    let extract = extract_region(&archive, &index, &query)?;

    let site_columns = extract.sites.column_names();
    let output_ids: Vec<String> = match samples {
        Some(ids) => ids,
        None => archive.samples().ids().iter().map(|id| id.to_string()).collect(),
    };
    let width = format.columns_per_sample(archive.ploidy());
    let labels = column_labels(&output_ids, width);

    let mut out = BufWriter::new(io::stdout().lock());
    if sites_only {
        writeln!(out, "{}", site_columns.join("\t"))?;
        for row in 0..extract.sites.len() {
            writeln!(out, "{}", site_row(&extract.sites, row).join("\t"))?;
        }
    } else if transpose {
        // one row per genotype column, one column per site
        let keys: Vec<String> = (0..extract.sites.len())
            .map(|row| {
                format!(
                    "{}:{}",
                    extract.sites.chromosome(row),
                    extract.sites.position(row)
                )
            })
            .collect();
        writeln!(out, "column\t{}", keys.join("\t"))?;
        for (row, label) in labels.iter().enumerate() {
            write!(out, "{label}")?;
            for value in extract.genotypes.row(row) {
                write!(out, "\t{value}")?;
            }
            writeln!(out)?;
        }
    } else {
        writeln!(out, "{}\t{}", site_columns.join("\t"), labels.join("\t"))?;
        for row in 0..extract.sites.len() {
            write!(out, "{}", site_row(&extract.sites, row).join("\t"))?;
            for value in extract.genotypes.row(row) {
                write!(out, "\t{value}")?;
            }
            writeln!(out)?;
        }
    }
    out.flush()?;

    tracing::info!(
        sites = extract.sites.len(),
        "export finished in {:.2}s",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn site_row(sites: &SiteTable, row: usize) -> Vec<String> {
    let mut fields = vec![
        sites.chromosome(row).to_string(),
        sites.position(row).to_string(),
        sites.ref_allele(row).to_string(),
        sites.alt_allele(row).to_string(),
    ];
    for field in 0..sites.info_fields().len() {
        fields.push(sites.info_value(row, field).to_string());
    }
    fields
}

/// One label per genotype column: the sample id, with a `:k` haplotype
/// suffix when the format spans multiple columns per sample.
fn column_labels(ids: &[String], width: usize) -> Vec<String> {
    let mut labels = Vec::with_capacity(ids.len() * width);
    for id in ids {
        if width == 1 {
            labels.push(id.clone());
        } else {
            for k in 1..=width {
                labels.push(format!("{id}:{k}"));
            }
        }
    }
    labels
}
