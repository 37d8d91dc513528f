//! `lcull completions <shell>`.
//!
//! Scripts are rendered from the live clap definition, so every subcommand
//! and flag in [`Cli`] is completed without a hand-maintained list. Either
//! printed (`--stdout`) or written into `--out-dir` under the file name the
//! shell expects (`lcull.bash`, `_lcull`, `lcull.fish`, ...).

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::CommandFactory;
use clap_complete::{Shell as CompletionShell, generate, generate_to};
use tracing::debug;

use crate::cli::{AppContext, Cli, CompletionsArgs, Shell};

/// Name completions are registered under; must match the `[[bin]]` name.
pub const BIN_NAME: &str = "lcull";

impl From<Shell> for CompletionShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompletionShell::Bash,
            Shell::Zsh => CompletionShell::Zsh,
            Shell::Fish => CompletionShell::Fish,
            Shell::PowerShell => CompletionShell::PowerShell,
            Shell::Elvish => CompletionShell::Elvish,
        }
    }
}

/// Write the completion script for `shell` into `out`.
pub fn render<W: Write>(shell: Shell, out: &mut W) {
    generate(CompletionShell::from(shell), &mut Cli::command(), BIN_NAME, out);
}

/// Write the script into `dir` (created if needed) and return its path.
pub fn write_to_dir(shell: Shell, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = generate_to(CompletionShell::from(shell), &mut Cli::command(), BIN_NAME, dir)
        .with_context(|| format!("Failed to write completion into {}", dir.display()))?;
    debug!(path = %path.display(), "completion script written");
    Ok(path)
}

pub fn run(args: CompletionsArgs, ctx: &AppContext) -> Result<()> {
    if args.stdout {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        render(args.shell, &mut lock);
        lock.flush().context("Failed to flush stdout")?;
        return Ok(());
    }

    let Some(dir) = args.out_dir else {
        bail!("--out-dir is required unless --stdout is set");
    };

    if ctx.dry_run {
        if !ctx.quiet {
            println!("Would write {:?} completion into {}", args.shell, dir.display());
        }
        return Ok(());
    }

    let path = write_to_dir(args.shell, &dir)?;
    if !ctx.quiet {
        eprintln!("Wrote completion to {}", path.display());
    }
    Ok(())
}
