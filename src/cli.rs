use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::dedup::DedupStrategy;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "lcull")]
#[command(
    about = "Curate line corpora: drop exact-key duplicates and refuse near-duplicate appends"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress output and non-essential messages
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug); LINECULL_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite a file keeping the first line per comparison key
    Dedup(DedupArgs),

    /// Append lines to a corpus unless a similar line is already there
    Append(AppendArgs),

    /// Report the line a candidate would collide with, without appending
    Check(CheckArgs),

    /// Print the similarity of two strings
    Score(ScoreArgs),

    /// Print the number of distinct lines in a corpus
    Count(CountArgs),

    /// Initialize a linecull.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
pub struct DedupArgs {
    /// Input file to deduplicate
    pub input: PathBuf,

    /// Output file path (default: <input stem>-distinct.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Key delimiter; the key is everything before its last occurrence
    #[arg(short, long)]
    pub delimiter: Option<char>,

    /// Duplicate search strategy
    #[arg(long, value_enum)]
    pub strategy: Option<DedupStrategy>,

    /// Output counters in JSON format (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct AppendArgs {
    /// Lines to admit; read from stdin when omitted
    #[arg(value_name = "LINE")]
    pub lines: Vec<String>,

    /// Corpus file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Similarity at or above which a candidate is rejected, in (0, 1]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Output one JSON result per line
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Candidate line
    pub line: String,

    /// Corpus file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Similarity at or above which a candidate is rejected, in (0, 1]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Report the most similar line instead of the first one over threshold
    #[arg(long)]
    pub best: bool,

    /// Output results in JSON format (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ScoreArgs {
    /// First string
    pub a: String,

    /// Second string
    pub b: String,

    /// Output results in JSON format (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct CountArgs {
    /// Corpus file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output results in JSON format (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
