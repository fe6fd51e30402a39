//! Parallel alignment of tab-separated request files.
//!
//! Input lines are `read<TAB>template<TAB>start[<TAB>rc]`, where `rc` is `1`,
//! `true`, `rc` or `-` for the reverse strand. Blank lines and lines starting
//! with `#` are skipped. Output has one line per request, in input order.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rayon::prelude::*;

use crate::core::alignment::actions::ActionSequence;
use crate::core::alignment::cigar::AlignmentResult;
use crate::core::alignment::request::{AlignRequest, Arm};
use crate::core::compute::encoding::{encode_dna, reverse_complement};
use crate::pipelines::chain::{AlignerFactory, ChainStats};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub line: usize,
    pub read: Vec<u8>,
    pub template: Vec<u8>,
    pub start: i32,
    pub reverse_complement: bool,
}

/// Per-call settings shared by every record.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub max_score: i32,
    pub max_shift: u32,
    pub arm: Option<Arm>,
}

fn parse_strand(field: &str) -> Option<bool> {
    match field {
        "1" | "true" | "rc" | "-" => Some(true),
        "0" | "false" | "fwd" | "+" => Some(false),
        _ => None,
    }
}

/// Parse one line; `Ok(None)` for blank and comment lines.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<BatchRecord>> {
    let trimmed = line.trim_end();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let fields: Vec<&str> = trimmed.split('\t').collect();
    if !(3..=4).contains(&fields.len()) {
        bail!(
            "line {line_no}: expected read, template, start and optional strand, got {} fields",
            fields.len()
        );
    }
    let start = fields[2]
        .parse::<i32>()
        .with_context(|| format!("line {line_no}: invalid start '{}'", fields[2]))?;
    let reverse_complement = match fields.get(3) {
        Some(f) => parse_strand(f).with_context(|| format!("line {line_no}: invalid strand '{f}'"))?,
        None => false,
    };
    Ok(Some(BatchRecord {
        line: line_no,
        read: encode_dna(fields[0].as_bytes()),
        template: encode_dna(fields[1].as_bytes()),
        start,
        reverse_complement,
    }))
}

pub fn read_records(path: &Path) -> Result<Vec<BatchRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading batch file {}", path.display()))?;
    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(record) = parse_line(i + 1, line)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// `score start cigar nm md`, tab-separated; `*` fields for no alignment.
pub fn format_result(actions: &ActionSequence, read: &[u8], template: &[u8]) -> String {
    if actions.is_no_alignment() {
        return format!("*\t{}\t*\t*\t*", actions.template_start());
    }
    let result = AlignmentResult::new(actions.clone(), read, template);
    format!(
        "{}\t{}\t{}\t{}\t{}",
        result.score(),
        result.template_start(),
        result.cigar(),
        result.nm(),
        result.md()
    )
}

/// Align every record with one chain per worker thread. Returns output lines
/// in input order and the merged statistics.
pub fn align_records(
    factory: &AlignerFactory,
    records: &[BatchRecord],
    options: BatchOptions,
) -> (Vec<String>, ChainStats) {
    let results: Vec<(String, ChainStats)> = records
        .par_iter()
        .map_init(
            || factory.chain(),
            |chain, record| {
                let mut stats = ChainStats::new();
                let req = AlignRequest::new(&record.read, &record.template, record.start)
                    .with_max_score(options.max_score)
                    .with_max_shift(options.max_shift)
                    .with_arm(options.arm);
                let actions = chain.align(&req, record.reverse_complement, &mut stats);
                let aligned_read = if record.reverse_complement {
                    reverse_complement(&record.read)
                } else {
                    record.read.clone()
                };
                (format_result(&actions, &aligned_read, &record.template), stats)
            },
        )
        .collect();

    let mut merged = ChainStats::new();
    let mut lines = Vec::with_capacity(results.len());
    for (line, stats) in results {
        merged.merge(&stats);
        lines.push(line);
    }
    (lines, merged)
}

/// Read `path`, align it and write one line per record to `out`.
pub fn run_batch<W: Write>(
    path: &Path,
    factory: &AlignerFactory,
    options: BatchOptions,
    out: &mut W,
) -> Result<ChainStats> {
    let records = read_records(path)?;
    log::info!("Aligning {} records from {}", records.len(), path.display());
    let (lines, stats) = align_records(factory, &records, options);
    for line in lines {
        writeln!(out, "{line}").context("Error writing batch output")?;
    }
    Ok(stats)
}
