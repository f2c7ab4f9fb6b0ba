//! Configuration discovery and effective settings resolution.
//!
//! commit-starter reads `commit-starter.toml|yaml|yml` from the repository
//! root (or closest ancestor) and merges it with CLI flags to produce an
//! `Effective` config.
//! Defaults:
//! - `target`: `.huskyrc.json`
//! - `url`: the conventional-commits-starter `.huskyrc.json` on GitHub
//! - `output`: `human`
//! - `timeout_secs`: 30
//! - `staging_suffix`: `.tmp`
//! - `yarn`: false, unless a `yarn.lock` is present
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::models::SyncError;
use crate::utils;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TARGET: &str = ".huskyrc.json";
pub const DEFAULT_URL: &str =
    "https://raw.githubusercontent.com/ptibbetts/conventional-commits-starter/master/.huskyrc.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_STAGING_SUFFIX: &str = ".tmp";

const CONFIG_NAMES: [&str; 3] = [
    "commit-starter.toml",
    "commit-starter.yaml",
    "commit-starter.yml",
];

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `commit-starter.toml|yaml`.
pub struct StarterConfig {
    pub target: Option<String>,
    pub url: Option<String>,
    pub output: Option<String>,
    pub timeout_secs: Option<u64>,
    pub staging_suffix: Option<String>,
    pub yarn: Option<bool>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    /// Config file that was loaded, if any.
    pub config_file: Option<PathBuf>,
    pub target: String,
    pub url: String,
    pub output: String,
    pub timeout_secs: u64,
    pub staging_suffix: String,
    pub use_yarn: bool,
    pub dry_run: bool,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `commit-starter.toml|yaml|yml` or a `.git` entry is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// First `commit-starter.toml|yaml|yml` present in `root`.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_NAMES
        .iter()
        .map(|n| root.join(n))
        .find(|p| p.exists())
}

/// Load `StarterConfig` from `commit-starter.toml` or `.yaml|.yml` if present.
///
/// A file that exists but cannot be read or parsed is an error, not a default.
pub fn load_config(root: &Path) -> Result<Option<StarterConfig>, SyncError> {
    let Some(path) = find_config(root) else {
        return Ok(None);
    };
    let s = fs::read_to_string(&path)
        .map_err(|e| SyncError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    let cfg: StarterConfig = if is_toml {
        toml::from_str(&s)
            .map_err(|e| SyncError::Config(format!("invalid {}: {}", path.display(), e)))?
    } else {
        serde_yaml::from_str(&s)
            .map_err(|e| SyncError::Config(format!("invalid {}: {}", path.display(), e)))?
    };
    Ok(Some(cfg))
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_target: Option<&str>,
    cli_url: Option<&str>,
    cli_output: Option<&str>,
    cli_timeout_secs: Option<u64>,
    cli_yarn: bool,
    dry_run: bool,
) -> Result<Effective, SyncError> {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root)?.unwrap_or_default();
    let config_file = find_config(&repo_root);

    let target = cli_target
        .map(|s| s.to_string())
        .or(cfg.target)
        .unwrap_or_else(|| DEFAULT_TARGET.to_string());

    let url = cli_url
        .map(|s| s.to_string())
        .or(cfg.url)
        .unwrap_or_else(|| DEFAULT_URL.to_string());

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let timeout_secs = cli_timeout_secs
        .or(cfg.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let staging_suffix = cfg
        .staging_suffix
        .unwrap_or_else(|| DEFAULT_STAGING_SUFFIX.to_string());

    // flag only switches yarn on; a lockfile implies it too
    let use_yarn = cli_yarn || cfg.yarn.unwrap_or(false) || utils::yarn_lock_present(&repo_root);

    Ok(Effective {
        repo_root,
        config_file,
        target,
        url,
        output,
        timeout_secs,
        staging_suffix,
        use_yarn,
        dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();

        let eff =
            resolve_effective(root.to_str(), None, None, None, None, false, false).unwrap();
        assert_eq!(eff.repo_root, root);
        assert!(eff.config_file.is_none());
        assert_eq!(eff.target, DEFAULT_TARGET);
        assert_eq!(eff.url, DEFAULT_URL);
        assert_eq!(eff.output, "human");
        assert_eq!(eff.timeout_secs, 30);
        assert_eq!(eff.staging_suffix, ".tmp");
        assert!(!eff.use_yarn);
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("commit-starter.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
target = "config/husky.json"
url = "https://example.com/husky.json"
output = "json"
timeout_secs = 5
staging_suffix = ".part"
"#
        )
        .unwrap();
        let nested = root.join("packages/web");
        fs::create_dir_all(&nested).unwrap();

        // Resolve from a nested dir to exercise upward discovery
        let eff =
            resolve_effective(nested.to_str(), None, None, None, None, false, false).unwrap();
        assert_eq!(eff.repo_root, root);
        assert_eq!(eff.config_file, Some(root.join("commit-starter.toml")));
        assert_eq!(eff.target, "config/husky.json");
        assert_eq!(eff.url, "https://example.com/husky.json");
        assert_eq!(eff.output, "json");
        assert_eq!(eff.timeout_secs, 5);
        assert_eq!(eff.staging_suffix, ".part");
    }

    #[test]
    fn test_load_yaml_and_cli_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("commit-starter.yaml"),
            "target: from-yaml.json\noutput: json\ntimeout_secs: 9\n",
        )
        .unwrap();

        let eff = resolve_effective(
            root.to_str(),
            Some("from-cli.json"),
            None,
            Some("human"),
            None,
            false,
            true,
        )
        .unwrap();
        assert_eq!(eff.target, "from-cli.json");
        assert_eq!(eff.output, "human");
        assert_eq!(eff.timeout_secs, 9);
        assert!(eff.dry_run);
    }

    #[test]
    fn test_yarn_from_flag_config_or_lockfile() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();

        let yarn_at = |flag: bool| {
            resolve_effective(root.to_str(), None, None, None, None, flag, false)
                .unwrap()
                .use_yarn
        };

        assert!(yarn_at(true));
        assert!(!yarn_at(false));

        fs::write(root.join("commit-starter.toml"), "yarn = true\n").unwrap();
        assert!(yarn_at(false));

        fs::write(root.join("commit-starter.toml"), "yarn = false\n").unwrap();
        assert!(!yarn_at(false));
        fs::write(root.join("yarn.lock"), "").unwrap();
        assert!(yarn_at(false));
    }

    #[test]
    fn test_malformed_config_file_is_reported() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("commit-starter.toml"), "target = [unclosed\n").unwrap();

        match resolve_effective(root.to_str(), None, None, None, None, false, false) {
            Err(SyncError::Config(msg)) => assert!(msg.contains("commit-starter.toml")),
            other => panic!("expected config error, got {:?}", other.map(|e| e.target)),
        }
        assert!(matches!(load_config(root), Err(SyncError::Config(_))));

        fs::remove_file(root.join("commit-starter.toml")).unwrap();
        fs::write(root.join("commit-starter.yml"), "timeout_secs: [1\n").unwrap();
        assert!(matches!(load_config(root), Err(SyncError::Config(_))));
    }
}
