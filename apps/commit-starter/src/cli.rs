//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "commit-starter",
    version,
    about = "Keep .huskyrc.json in sync with the Conventional Commits starter"
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    Version,
    /// Fetch the canonical husky config and merge it into the local one
    Sync {
        #[arg(long)]
        repo_root: Option<String>,
        #[arg(long, help = "Local config file, relative to the repo root")]
        target: Option<String>,
        #[arg(long, help = "URL of the canonical config")]
        url: Option<String>,
        #[arg(long)]
        output: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Setup for a project that uses Yarn")]
        yarn: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Fetch and merge without changing files")]
        dry_run: bool,
        #[arg(long, short, action = clap::ArgAction::SetTrue)]
        verbose: bool,
    },
}
