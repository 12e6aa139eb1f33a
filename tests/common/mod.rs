//! Shared fixture builder: writes a synthetic archive and its sibling
//! interval index to a temp directory, so tests exercise the same on-disk
//! path as production readers.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde_json::json;
use tempfile::TempDir;

pub struct FixtureRecord {
    pub position: u64,
    pub ref_allele: String,
    pub alt_allele: String,
    pub info: Vec<String>,
    pub pairs: Vec<(u32, f32)>,
}

impl FixtureRecord {
    pub fn new(position: u64, pairs: Vec<(u32, f32)>) -> Self {
        Self {
            position,
            ref_allele: "A".to_string(),
            alt_allele: "G".to_string(),
            info: Vec::new(),
            pairs,
        }
    }

    #[allow(dead_code)]
    pub fn alleles(mut self, ref_allele: &str, alt_allele: &str) -> Self {
        self.ref_allele = ref_allele.to_string();
        self.alt_allele = alt_allele.to_string();
        self
    }

    #[allow(dead_code)]
    pub fn info(mut self, values: &[&str]) -> Self {
        self.info = values.iter().map(|v| v.to_string()).collect();
        self
    }
}

pub struct FixtureArchive {
    samples: Vec<String>,
    ploidy: u8,
    native_format: String,
    info_fields: Vec<String>,
    headers: Vec<(String, String)>,
    /// (chromosome, records) per block, in on-disk order
    blocks: Vec<(String, Vec<FixtureRecord>)>,
}

pub struct Fixture {
    /// Keeps the backing directory alive for the test's lifetime
    #[allow(dead_code)]
    pub dir: TempDir,
    pub archive_path: PathBuf,
    pub index_path: PathBuf,
}

impl FixtureArchive {
    pub fn new(samples: &[&str], ploidy: u8) -> Self {
        Self {
            samples: samples.iter().map(|s| s.to_string()).collect(),
            ploidy,
            native_format: "GT".to_string(),
            info_fields: Vec::new(),
            headers: vec![("fileformat".to_string(), "SVARv1".to_string())],
            blocks: Vec::new(),
        }
    }

    #[allow(dead_code)]
    pub fn native_format(mut self, format: &str) -> Self {
        self.native_format = format.to_string();
        self
    }

    #[allow(dead_code)]
    pub fn info_fields(mut self, fields: &[&str]) -> Self {
        self.info_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    #[allow(dead_code)]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Add one block of records for a chromosome. Callers keep positions
    /// ascending within and across a chromosome's blocks, as a writer would.
    pub fn block(mut self, chromosome: &str, records: Vec<FixtureRecord>) -> Self {
        assert!(!records.is_empty(), "blocks cannot be empty");
        assert!(records.len() <= 0x1_0000, "record count exceeds 16-bit run length");
        self.blocks.push((chromosome.to_string(), records));
        self
    }

    /// Write `panel.svar` and `panel.svar.svx` into a fresh temp directory.
    pub fn write(self) -> Fixture {
        let n_columns = self.samples.len() as u32 * self.ploidy as u32;

        let meta = json!({
            "headers": self.headers,
            "samples": self.samples,
            "ploidy": self.ploidy,
            "info_fields": self.info_fields,
            "native_format": self.native_format,
        });
        let meta_bytes = serde_json::to_vec(&meta).expect("serialize metadata");

        let mut archive = b"SVARCH01".to_vec();
        archive.extend_from_slice(&(meta_bytes.len() as u64).to_le_bytes());
        archive.extend_from_slice(&meta_bytes);

        // write blocks, remembering each one's offset and position range
        let mut chrom_order: Vec<String> = Vec::new();
        let mut entries: HashMap<String, Vec<(u64, u64, u64)>> = HashMap::new();
        for (chromosome, records) in &self.blocks {
            let offset = archive.len() as u64;
            let raw = encode_records(records, &self.info_fields, n_columns);
            let compressed = compress(&raw);
            archive.extend_from_slice(&(raw.len() as u32).to_le_bytes());
            archive.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
            archive.extend_from_slice(&compressed);

            let start = records.iter().map(|r| r.position).min().expect("non-empty");
            let end = records.iter().map(|r| r.position).max().expect("non-empty");
            let value = (offset << 16) | (records.len() as u64 - 1);
            if !entries.contains_key(chromosome) {
                chrom_order.push(chromosome.clone());
            }
            entries.entry(chromosome.clone()).or_default().push((start, end, value));
        }

        let mut index = b"svx1".to_vec();
        index.extend_from_slice(&(chrom_order.len() as u32).to_le_bytes());
        for chromosome in &chrom_order {
            let tree = &entries[chromosome];
            let min_pos = tree.iter().map(|e| e.0).min().expect("non-empty tree");
            let max_pos = tree.iter().map(|e| e.1).max().expect("non-empty tree");
            push_string(&mut index, chromosome);
            index.extend_from_slice(&min_pos.to_le_bytes());
            index.extend_from_slice(&max_pos.to_le_bytes());
            index.extend_from_slice(&(tree.len() as u32).to_le_bytes());
            for (start, end, value) in tree {
                index.extend_from_slice(&start.to_le_bytes());
                index.extend_from_slice(&end.to_le_bytes());
                index.extend_from_slice(&value.to_le_bytes());
            }
        }

        let dir = TempDir::new().expect("create temp dir");
        let archive_path = dir.path().join("panel.svar");
        let index_path = dir.path().join("panel.svar.svx");
        fs::write(&archive_path, &archive).expect("write archive");
        fs::write(&index_path, &index).expect("write index");

        Fixture {
            dir,
            archive_path,
            index_path,
        }
    }
}

fn encode_records(records: &[FixtureRecord], info_fields: &[String], n_columns: u32) -> Vec<u8> {
    let mut raw = Vec::new();
    for record in records {
        raw.extend_from_slice(&record.position.to_le_bytes());
        push_string(&mut raw, &record.ref_allele);
        push_string(&mut raw, &record.alt_allele);
        for i in 0..info_fields.len() {
            let value = record.info.get(i).map(String::as_str).unwrap_or("");
            push_string(&mut raw, value);
        }
        raw.extend_from_slice(&n_columns.to_le_bytes());
        raw.extend_from_slice(&(record.pairs.len() as u32).to_le_bytes());
        for &(offset, value) in &record.pairs {
            raw.extend_from_slice(&offset.to_le_bytes());
            raw.extend_from_slice(&value.to_le_bytes());
        }
    }
    raw
}

fn push_string(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u32).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

fn compress(raw: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).expect("compress block");
    encoder.finish().expect("finish block")
}
