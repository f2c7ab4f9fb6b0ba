//! commit-starter CLI binary entry point.
//! Resolves settings, runs one sync attempt and prints the result.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use commit_starter::sync::{SyncSettings, Synchronizer};
use commit_starter::{config, output};
use owo_colors::OwoColorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::Sync {
            repo_root,
            target,
            url,
            output,
            timeout_secs,
            yarn,
            dry_run,
            verbose,
        } => {
            init_tracing(verbose);
            let eff = match config::resolve_effective(
                repo_root.as_deref(),
                target.as_deref(),
                url.as_deref(),
                output.as_deref(),
                timeout_secs,
                yarn,
                dry_run,
            ) {
                Ok(eff) => eff,
                Err(e) => {
                    output::print_error(&e, output.as_deref().unwrap_or("human"));
                    return ExitCode::from(2);
                }
            };
            if eff.config_file.is_none() && eff.output != "json" {
                eprintln!(
                    "{} {}",
                    "ℹ️  note:".blue().bold(),
                    "No commit-starter.{toml,yaml} found; using defaults."
                );
            }
            let sync = match SyncSettings::from_effective(&eff).and_then(Synchronizer::new) {
                Ok(s) => s,
                Err(e) => {
                    output::print_error(&e, &eff.output);
                    return ExitCode::from(2);
                }
            };
            if eff.output != "json" {
                let what = if eff.use_yarn {
                    "Syncing husky config for a Yarn project..."
                } else {
                    "Syncing husky config..."
                };
                println!("{}", what.bold());
            }
            match sync.run().await {
                Ok(report) => {
                    output::print_report(&report, &eff.output);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    output::print_error(&e, &eff.output);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
