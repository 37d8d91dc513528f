use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cli::{AppContext, InitArgs};
use crate::core::appender::AppenderConfig;
use crate::core::dedup::DedupStrategy;
use crate::core::key::DEFAULT_DELIMITER;

/// Config file names looked up in the working directory, first hit wins
pub const CONFIG_FILES: [&str; 4] = ["linecull.toml", "linecull.yaml", "linecull.json", ".linecull.toml"];

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Near-duplicate appender settings
    pub append: AppenderConfig,

    /// Exact dedup settings
    pub dedup: DedupConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig
{
    pub delimiter: char,
    pub strategy: DedupStrategy,
}

impl Default for DedupConfig
{
    fn default() -> Self
    {
        Self { delimiter: DEFAULT_DELIMITER, strategy: DedupStrategy::Scan }
    }
}

/// Load config from the first file found plus `LINECULL__*` variables.
pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    for name in &CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    // e.g. LINECULL__APPEND__THRESHOLD=0.9
    builder = builder.add_source(
        config::Environment::with_prefix("LINECULL")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

/// [`load_config`], falling back to defaults with a warning on bad input.
pub fn load_config_or_default() -> Config
{
    load_config_or_default_from(Path::new("."))
}

pub fn load_config_or_default_from(dir: &Path) -> Config
{
    match load_config_from(dir)
    {
        Ok(cfg) => cfg,
        Err(e) =>
        {
            warn!("ignoring unusable configuration, using defaults: {e:#}");
            Config::default()
        }
    }
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("Would create config file at {}", config_path.display());
        }
        return Ok(());
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
