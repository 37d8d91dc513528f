//! Exact-key dedup of a corpus file.
//!
//! Streams the input, keeps the first line for each Key in input order and
//! rewrites the output file with the kept lines.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::cli::{AppContext, DedupArgs};
use crate::core::key::{DEFAULT_DELIMITER, extract_key_with};
use crate::error::Result;
use crate::infra::config::load_config_or_default;
use crate::infra::io::{peek_lines, read_lines, write_lines_atomic};

/// How previously kept keys are searched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DedupStrategy {
    /// Linear scan over kept lines in keep order, keys derived on the fly
    #[default]
    Scan,
    /// Hash set of kept keys; same output, O(n)
    Hash,
}

/// Inputs for one exact dedup run
#[derive(Debug, Clone)]
pub struct DedupOptions {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub delimiter: char,
    pub strategy: DedupStrategy,
}

impl DedupOptions {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            delimiter: DEFAULT_DELIMITER,
            strategy: DedupStrategy::default(),
        }
    }
}

/// Counters reported after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    pub total_lines: usize,
    pub unique_lines: usize,
    pub duplicates_removed: usize,
}

/// Filter `lines` down to the first line per Key, preserving order.
pub fn dedup_lines<I>(
    lines: I,
    delimiter: char,
    strategy: DedupStrategy,
) -> Result<(Vec<String>, DedupStats)>
where
    I: IntoIterator<Item = Result<String>>,
{
    let mut kept: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut total = 0usize;

    for line in lines {
        let line = line?;
        total += 1;

        let key = extract_key_with(&line, delimiter);
        let duplicate = match strategy {
            DedupStrategy::Scan => kept
                .iter()
                .any(|k| extract_key_with(k, delimiter) == key),
            DedupStrategy::Hash => !seen.insert(key.to_string()),
        };

        if duplicate {
            debug!(line = %line, "dropping exact duplicate");
        } else {
            kept.push(line);
        }
    }

    let stats = DedupStats {
        total_lines: total,
        unique_lines: kept.len(),
        duplicates_removed: total - kept.len(),
    };

    Ok((kept, stats))
}

/// Dedup `input_path` into `output_path`, overwriting it.
///
/// Any I/O error aborts the run; the output file is only replaced once the
/// complete result has been written.
pub fn dedup_exact(opts: &DedupOptions) -> Result<DedupStats> {
    dedup_exact_with(opts, || {})
}

/// [`dedup_exact`] calling `on_line` for every input line read.
#[instrument(skip_all, fields(input = %opts.input_path.display(), output = %opts.output_path.display()))]
pub fn dedup_exact_with<F: FnMut()>(opts: &DedupOptions, mut on_line: F) -> Result<DedupStats> {
    let stream = read_lines(&opts.input_path)?.inspect(|_| on_line());
    let (kept, stats) = dedup_lines(stream, opts.delimiter, opts.strategy)?;
    write_lines_atomic(&opts.output_path, &kept)?;

    info!(
        total = stats.total_lines,
        unique = stats.unique_lines,
        removed = stats.duplicates_removed,
        "exact dedup complete"
    );

    Ok(stats)
}

/// `log.csv` -> `log-distinct.csv`, next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "corpus".to_string());

    let name = match input.extension() {
        Some(ext) => format!("{stem}-distinct.{}", ext.to_string_lossy()),
        None => format!("{stem}-distinct"),
    };

    input.with_file_name(name)
}

pub fn run(args: DedupArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let config = load_config_or_default();

    let opts = DedupOptions {
        output_path: args
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&args.input)),
        delimiter: args.delimiter.unwrap_or(config.dedup.delimiter),
        strategy: args.strategy.unwrap_or(config.dedup.strategy),
        input_path: args.input,
    };

    let spinner = if ctx.quiet || args.json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("spinner template")?,
        );
        pb.set_message(format!("Scanning {}", opts.input_path.display()));
        pb
    };

    let stats = if ctx.dry_run {
        // Read-only: a missing input counts as empty and is not created
        let stream = peek_lines(&opts.input_path)
            .with_context(|| format!("Failed to open {}", opts.input_path.display()))?
            .inspect(|_| spinner.tick());
        let (_, stats) = dedup_lines(stream, opts.delimiter, opts.strategy)
            .with_context(|| format!("Failed to read {}", opts.input_path.display()))?;
        spinner.finish_and_clear();

        if !ctx.quiet && !args.json {
            let banner = "DRY RUN: Would write:";
            if ctx.no_color {
                println!("{banner}");
            } else {
                println!("{}", banner.yellow());
            }
            println!("  Output: {}", opts.output_path.display());
        }
        stats
    } else {
        let stats = dedup_exact_with(&opts, || spinner.tick()).with_context(|| {
            format!(
                "Failed to dedup {} into {}",
                opts.input_path.display(),
                opts.output_path.display()
            )
        })?;
        spinner.finish_and_clear();
        stats
    };

    crate::output::print_dedup_stats(&stats, &opts.output_path, args.json, ctx)?;
    Ok(())
}
