//! Operator-facing rendering: colored text or single-line JSON.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use serde_json::json;

use crate::cli::AppContext;
use crate::core::appender::{AdmissionResult, SimilarMatch};
use crate::core::dedup::DedupStats;

/// Color only when allowed
fn paint(
    text: &str,
    ctx: &AppContext,
    style: fn(&str) -> String,
) -> String
{
    if ctx.no_color { text.to_string() } else { style(text) }
}

fn green(s: &str) -> String
{
    s.green()
        .to_string()
}

fn red(s: &str) -> String
{
    s.red()
        .to_string()
}

fn yellow(s: &str) -> String
{
    s.yellow()
        .to_string()
}

pub fn print_dedup_stats(
    stats: &DedupStats,
    output: &Path,
    as_json: bool,
    ctx: &AppContext,
) -> Result<()>
{
    if as_json
    {
        let value = json!({
            "output": output.display().to_string(),
            "dry_run": ctx.dry_run,
            "total_lines": stats.total_lines,
            "unique_lines": stats.unique_lines,
            "duplicates_removed": stats.duplicates_removed,
        });
        println!("{}", serde_json::to_string(&value)?);
        return Ok(());
    }

    if ctx.quiet
    {
        return Ok(());
    }

    println!("{}", paint("Processing complete:", ctx, green));
    println!("  - Total lines processed: {}", stats.total_lines);
    println!("  - Unique lines: {}", stats.unique_lines);
    println!("  - Duplicates removed: {}", stats.duplicates_removed);
    Ok(())
}

pub fn print_admission(
    line: &str,
    result: &AdmissionResult,
    as_json: bool,
    ctx: &AppContext,
) -> Result<()>
{
    if as_json
    {
        let mut value = serde_json::to_value(result)?;
        value["line"] = json!(line.trim());
        println!("{}", serde_json::to_string(&value)?);
        return Ok(());
    }

    if ctx.quiet
    {
        return Ok(());
    }

    if result.accepted
    {
        println!("{} {}", paint("accepted", ctx, green), line.trim());
        return Ok(());
    }

    let reason = result
        .reason
        .map(|r| r.to_string())
        .unwrap_or_default();

    match (&result.matched_line, result.similarity, &result.error)
    {
        (Some(matched), Some(score), _) =>
        {
            println!("{} {} ({reason}, {:.3} vs {matched})", paint("rejected", ctx, red), line.trim(), score)
        }
        (_, _, Some(err)) => println!("{} {} ({reason}: {err})", paint("rejected", ctx, red), line.trim()),
        _ => println!("{} {:?} ({reason})", paint("rejected", ctx, red), line),
    }
    Ok(())
}

pub fn print_check(
    line: &str,
    found: Option<&SimilarMatch>,
    threshold: f64,
    as_json: bool,
    ctx: &AppContext,
) -> Result<()>
{
    if as_json
    {
        let value = json!({
            "line": line.trim(),
            "threshold": threshold,
            "similar": found.is_some(),
            "matched_line": found.map(|m| m.line.as_str()),
            "similarity": found.map(|m| m.similarity),
        });
        println!("{}", serde_json::to_string(&value)?);
        return Ok(());
    }

    if ctx.quiet
    {
        return Ok(());
    }

    match found
    {
        Some(m) => println!(
            "{} {:.3} >= {threshold}: {}",
            paint("similar", ctx, yellow),
            m.similarity,
            m.line
        ),
        None => println!("{} no line at or above {threshold}", paint("unique", ctx, green)),
    }
    Ok(())
}

pub fn print_score(
    a: &str,
    b: &str,
    similarity: f64,
    distance: usize,
    as_json: bool,
) -> Result<()>
{
    if as_json
    {
        let value = json!({ "a": a, "b": b, "similarity": similarity, "distance": distance });
        println!("{}", serde_json::to_string(&value)?);
    }
    else
    {
        println!("similarity: {similarity:.6}");
        println!("distance: {distance}");
    }
    Ok(())
}

pub fn print_count(
    path: &Path,
    count: usize,
    as_json: bool,
) -> Result<()>
{
    if as_json
    {
        let value = json!({ "file": path.display().to_string(), "lines": count });
        println!("{}", serde_json::to_string(&value)?);
    }
    else
    {
        println!("{count}");
    }
    Ok(())
}
