//! CLI command handlers for the near-duplicate appender.
//!
//! `append`, `check` and `count` resolve the corpus file and threshold from
//! flags first, then `[append]` in the config file, then built-in defaults.

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::cli::{AppContext, AppendArgs, CheckArgs, CountArgs, ScoreArgs};
use crate::core::appender::{AdmissionResult, AppenderConfig, RejectReason, UniqueLineAppender};
use crate::core::similarity::{levenshtein, similarity};
use crate::infra::config::load_config_or_default;
use crate::output;

/// Merge CLI overrides onto the configured appender settings.
fn resolve(
    file: Option<std::path::PathBuf>,
    threshold: Option<f64>,
) -> AppenderConfig
{
    let mut cfg = load_config_or_default().append;
    if let Some(file) = file
    {
        cfg.file = file;
    }
    if let Some(threshold) = threshold
    {
        cfg.threshold = threshold;
    }
    cfg
}

/// Dry runs must not create the corpus just by looking at it.
fn open_appender(
    cfg: &AppenderConfig,
    ctx: &AppContext,
) -> Result<UniqueLineAppender>
{
    Ok(UniqueLineAppender::from_config(cfg)?.with_create_missing(!ctx.dry_run))
}

#[instrument(skip_all)]
pub fn run_append(
    args: AppendArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let cfg = resolve(args.file, args.threshold);
    let appender = open_appender(&cfg, ctx)?;

    let candidates: Vec<String> = if args
        .lines
        .is_empty()
    {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<_>>()
            .context("Failed to read candidate lines from stdin")?
    }
    else
    {
        args.lines
    };

    let mut accepted = 0usize;
    for line in &candidates
    {
        if ctx.dry_run
        {
            if line
                .trim()
                .is_empty()
            {
                let result = AdmissionResult::rejected(RejectReason::EmptyLine);
                output::print_admission(line, &result, args.json, ctx)?;
                continue;
            }

            let found = appender
                .is_similar_to_existing(line)
                .with_context(|| format!("Failed to load {}", cfg.file.display()))?;
            output::print_check(line, found.as_ref(), cfg.threshold, args.json, ctx)?;
            continue;
        }

        let result = appender.append_line(line);
        if result.accepted
        {
            accepted += 1;
        }
        output::print_admission(line, &result, args.json, ctx)?;
    }

    info!(candidates = candidates.len(), accepted, "append finished");
    Ok(())
}

pub fn run_check(
    args: CheckArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let cfg = resolve(args.file, args.threshold);
    let appender = open_appender(&cfg, ctx)?;

    let lookup = if args.best
    {
        appender.best_match(&args.line)
    }
    else
    {
        appender.is_similar_to_existing(&args.line)
    };
    let found = lookup.with_context(|| format!("Failed to load {}", cfg.file.display()))?;

    output::print_check(&args.line, found.as_ref(), cfg.threshold, args.json, ctx)
}

pub fn run_score(
    args: ScoreArgs,
    _ctx: &AppContext,
) -> Result<()>
{
    let score = similarity(&args.a, &args.b);
    let distance = levenshtein(&args.a, &args.b);
    output::print_score(&args.a, &args.b, score, distance, args.json)
}

pub fn run_count(
    args: CountArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let cfg = resolve(args.file, None);
    let appender = open_appender(&cfg, ctx)?;

    appender
        .initialize()
        .with_context(|| format!("Failed to load {}", cfg.file.display()))?;
    output::print_count(&cfg.file, appender.line_count()?, args.json)
}
