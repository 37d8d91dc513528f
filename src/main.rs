use anyhow::Result;
use clap::Parser;
use linecull::cli::{AppContext, Cli, Commands};
use linecull::cli_ext::corpus_cmd;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("LINECULL_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Dedup(args) => linecull::core::dedup_run(args, &ctx),
        Commands::Append(args) => corpus_cmd::run_append(args, &ctx),
        Commands::Check(args) => corpus_cmd::run_check(args, &ctx),
        Commands::Score(args) => corpus_cmd::run_score(args, &ctx),
        Commands::Count(args) => corpus_cmd::run_count(args, &ctx),
        Commands::Init(args) => linecull::infra::config::init(args, &ctx),
        Commands::Completions(args) => linecull::completion::run(args, &ctx),
    }
}
