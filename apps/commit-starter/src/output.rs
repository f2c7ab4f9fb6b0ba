//! Output rendering for the sync command.
//!
//! Supports `human` (default) and `json` outputs.

use crate::models::{SyncError, SyncOutcome, SyncReport};
use crate::utils::rel_to_wd;
use owo_colors::OwoColorize;
use serde_json::json;

pub const ISSUES_URL: &str = "https://github.com/ptibbetts/conventional-commits-starter/issues/new/";

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Print a finished sync in the requested format.
pub fn print_report(report: &SyncReport, output: &str) {
    let file = rel_to_wd(&report.target);
    match output {
        "json" => {
            let out = json!({
                "ok": true,
                "target": file,
                "url": report.url,
                "outcome": report.outcome.as_str(),
                "wrote": report.outcome.wrote(),
                "yarn": report.use_yarn,
            });
            println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        }
        _ => {
            let color = use_colors(output);
            let (label, text) = match report.outcome {
                SyncOutcome::Downloaded => ("📥 downloaded:", format!("{} file downloaded", file)),
                SyncOutcome::Updated => ("✏️  merged:", "safely updated existing husky config".to_string()),
                SyncOutcome::AlreadyInSync => (
                    "✔ in sync:",
                    "husky config already setup for Conventional Commits".to_string(),
                ),
                SyncOutcome::WouldDownload => ("would download:", file.clone()),
                SyncOutcome::WouldUpdate => ("would merge:", file.clone()),
            };
            if !color {
                println!("{} {}", label, text);
            } else if report.outcome.wrote() {
                println!("{} {}", label.green().bold(), text);
            } else if report.outcome == SyncOutcome::AlreadyInSync {
                println!("{} {}", label.green(), text);
            } else {
                println!("{} {}", label.cyan().bold(), text);
            }
            if report.use_yarn {
                let note = "package manager: yarn";
                if color {
                    println!("{}", note.bright_black());
                } else {
                    println!("{}", note);
                }
            }
        }
    }
}

/// Print a failed sync. Human output goes to stderr with a tracker hint.
pub fn print_error(err: &SyncError, output: &str) {
    match output {
        "json" => {
            let out = json!({
                "ok": false,
                "error": { "kind": err.kind(), "message": err.to_string() },
            });
            println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        }
        _ => {
            if use_colors(output) {
                eprintln!("{} {}", "✖ ⟦error⟧".red().bold(), err);
                eprintln!("{}", format!("Please let me know about it at {}", ISSUES_URL).red());
            } else {
                eprintln!("✖ ⟦error⟧ {}", err);
                eprintln!("Please let me know about it at {}", ISSUES_URL);
            }
        }
    }
}
