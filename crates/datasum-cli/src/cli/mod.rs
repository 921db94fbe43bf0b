//! CLI for datasum: dataset checksum reporting and verification.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use datasum_core::config::{self, DatasumConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use commands::{run_checksum, run_print, run_size, run_update, run_verify};

/// Top-level CLI for datasum.
#[derive(Debug, Parser)]
#[command(name = "datasum")]
#[command(about = "Verify dataset archives in an object store against recorded checksums", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/datasum/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Dataset catalog (TOML). Overrides `catalog_path` from the config.
    #[arg(long, global = true, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by the commands that fetch every catalog entry.
#[derive(Debug, Clone, Default, Args)]
pub struct ReportArgs {
    /// Digest algorithm (sha224, sha256, sha384, sha512). Overrides the config.
    #[arg(long, value_name = "ALGO")]
    pub algorithm: Option<String>,

    /// Fetch up to N datasets concurrently. Overrides the config.
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Only check the named dataset (repeatable).
    #[arg(long = "dataset", value_name = "NAME")]
    pub datasets: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the current remote checksum and size of every dataset.
    Print(ReportArgs),

    /// Compare remote checksums with the catalog; exits 1 if any dataset fails.
    Verify(ReportArgs),

    /// Print replacement catalog entries built from fresh checksums.
    Update(ReportArgs),

    /// Show the size of a single object (HEAD only, no download).
    Size {
        /// Storage key, e.g. bills/bills.zip.
        key: String,
    },

    /// Compute the tagged checksum of a local file.
    Checksum {
        /// Path to the file.
        path: PathBuf,

        /// Digest algorithm. Defaults to the config value.
        #[arg(long, value_name = "ALGO")]
        algorithm: Option<String>,
    },
}

fn load_config(path: Option<&Path>) -> Result<DatasumConfig> {
    match path {
        Some(p) => config::load_from(p),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<ExitCode> {
        run(Cli::parse()).await
    }
}

/// Run a parsed command line. `ExitCode::FAILURE` when verify finds a failure.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let cfg = load_config(cli.config.as_deref())?;
    tracing::debug!("loaded config: {:?}", cfg);
    let catalog_path = cfg.catalog_path_or(cli.catalog.as_deref());

    match cli.command {
        CliCommand::Print(args) => run_print(&cfg, &catalog_path, &args).await?,
        CliCommand::Verify(args) => {
            if !run_verify(&cfg, &catalog_path, &args).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        CliCommand::Update(args) => run_update(&cfg, &catalog_path, &args).await?,
        CliCommand::Size { key } => run_size(&cfg, &key).await?,
        CliCommand::Checksum { path, algorithm } => {
            run_checksum(&cfg, &path, algorithm.as_deref())?
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests;
