use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use propstore_config::{ConfigLoader, read_file_config};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "propstore-config", about = "PropStore configuration inspector")]
struct Cli {
    /// Config file; defaults to $PROPSTORE_CONFIG_PATH, then propstore.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Env file loaded before reading PROPSTORE_* variables
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the effective configuration
    Show {
        #[arg(long, value_enum, default_value = "toml")]
        format: Format,
    },
    /// Load and validate without printing the configuration
    Check,
    /// Parse a single config file without applying env overrides
    Lint { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Toml,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = cli.env_file {
        loader = loader.with_env_file(path);
    }

    match cli.command {
        Command::Show { format } => {
            let load = loader.load().context("failed to load configuration")?;
            let rendered = match format {
                Format::Toml => toml::to_string_pretty(&load.config)
                    .context("failed to render configuration as TOML")?,
                Format::Json => serde_json::to_string_pretty(&load.config)
                    .context("failed to render configuration as JSON")?,
            };
            println!("{rendered}");
        }
        Command::Check => {
            let load = loader.load().context("configuration is invalid")?;
            let metadata = &load.config.metadata;
            println!(
                "ok: file={} env_file_loaded={} overrides=[{}]",
                metadata
                    .config_path
                    .as_deref()
                    .map_or_else(|| "none".to_string(), |p| p.display().to_string()),
                metadata.env_file_loaded,
                metadata.env_overrides.join(", ")
            );
        }
        Command::Lint { path } => {
            let file = read_file_config(&path)?;
            file.limits
                .validate()
                .with_context(|| format!("{} has invalid limits", path.display()))?;
            println!("ok: {}", path.display());
        }
    }

    Ok(())
}
