//! Synchronization of the local config file with its canonical remote copy.
//!
//! One attempt runs `CheckLocalExists -> DirectFetch | MergeFlow -> Done |
//! Failed`. The remote document always lands in a staging file next to the
//! target first; the target is only ever replaced by an atomic rename. The
//! staging file is removed on every terminal path.

use crate::config::Effective;
use crate::fetch::HttpFetcher;
use crate::lock::SyncLock;
use crate::merge::{self, MergeOutcome};
use crate::models::{Side, SyncError, SyncOutcome, SyncReport};
use crate::utils;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything one sync target needs, passed in rather than read from globals.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub target: PathBuf,
    pub url: String,
    pub staging_suffix: String,
    pub timeout: Duration,
    pub dry_run: bool,
    pub use_yarn: bool,
}

impl SyncSettings {
    /// Validate resolved config into settings for one target.
    pub fn from_effective(eff: &Effective) -> Result<Self, SyncError> {
        if eff.target.trim().is_empty() {
            return Err(SyncError::Config("target file name is empty".into()));
        }
        if eff.staging_suffix.is_empty() {
            return Err(SyncError::Config("staging suffix is empty".into()));
        }
        if eff.timeout_secs == 0 {
            return Err(SyncError::Config("timeout must be at least 1 second".into()));
        }
        let parsed = reqwest::Url::parse(&eff.url)
            .map_err(|e| SyncError::Config(format!("invalid url '{}': {}", eff.url, e)))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(SyncError::Config(format!(
                "url must be http(s), got '{}'",
                eff.url
            )));
        }
        Ok(Self {
            target: eff.repo_root.join(&eff.target),
            url: eff.url.clone(),
            staging_suffix: eff.staging_suffix.clone(),
            timeout: Duration::from_secs(eff.timeout_secs),
            dry_run: eff.dry_run,
            use_yarn: eff.use_yarn,
        })
    }

    pub fn staging_path(&self) -> PathBuf {
        utils::sibling_with_suffix(&self.target, &self.staging_suffix)
    }

    pub fn lock_path(&self) -> PathBuf {
        utils::sibling_with_suffix(&self.target, ".lock")
    }
}

pub struct Synchronizer {
    settings: SyncSettings,
    fetcher: HttpFetcher,
}

impl Synchronizer {
    pub fn new(settings: SyncSettings) -> Result<Self, SyncError> {
        let fetcher = HttpFetcher::new(settings.timeout)?;
        Ok(Self { settings, fetcher })
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Run exactly one sync attempt.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let target = &self.settings.target;
        let staging = self.settings.staging_path();
        let _lock = SyncLock::acquire(&self.settings.lock_path())?;

        let result = if target.exists() {
            debug!(file = %target.display(), "local config present, merging");
            self.merge_flow(&staging).await
        } else {
            debug!(file = %target.display(), "no local config, downloading");
            self.direct_fetch(&staging).await
        };

        let cleanup = remove_staging(&staging).await;
        let outcome = match (result, cleanup) {
            (Ok(outcome), Ok(())) => outcome,
            (Ok(_), Err(e)) => return Err(e),
            (Err(e), Ok(())) => return Err(e),
            (Err(e), Err(cleanup_err)) => {
                warn!(error = %cleanup_err, "staging cleanup failed after sync error");
                return Err(e);
            }
        };

        info!(file = %target.display(), outcome = outcome.as_str(), "sync finished");
        Ok(SyncReport {
            target: target.clone(),
            url: self.settings.url.clone(),
            outcome,
            use_yarn: self.settings.use_yarn,
        })
    }

    /// No local file: stage the download, then rename it onto the target.
    ///
    /// A 200 body that is not a JSON object is rejected as a remote
    /// `ConfigParse` error and the target is never created. Accepted bodies
    /// are installed byte for byte.
    async fn direct_fetch(&self, staging: &Path) -> Result<SyncOutcome, SyncError> {
        let target = &self.settings.target;
        self.fetcher.fetch_to(&self.settings.url, staging).await?;
        let raw = read_bytes(staging).await?;
        merge::parse_document(&raw, Side::Remote, staging)?;
        if self.settings.dry_run {
            return Ok(SyncOutcome::WouldDownload);
        }
        tokio::fs::rename(staging, target)
            .await
            .map_err(|e| SyncError::fs("move download into", target, e))?;
        Ok(SyncOutcome::Downloaded)
    }

    async fn merge_flow(&self, staging: &Path) -> Result<SyncOutcome, SyncError> {
        let target = &self.settings.target;
        self.fetcher.fetch_to(&self.settings.url, staging).await?;

        let local_raw = read_bytes(target).await?;
        let local = merge::parse_document(&local_raw, Side::Local, target)?;
        let remote_raw = read_bytes(staging).await?;
        let remote = merge::parse_document(&remote_raw, Side::Remote, staging)?;

        let merged = match merge::merge(&local, &remote) {
            MergeOutcome::Unchanged => {
                debug!("documents are equal");
                return Ok(SyncOutcome::AlreadyInSync);
            }
            MergeOutcome::Merged(doc) => doc,
        };
        let rendered = merge::render(&merged);
        // a previous merge already wrote exactly this
        if rendered.as_bytes() == local_raw.as_slice() {
            debug!("merged document matches local file byte for byte");
            return Ok(SyncOutcome::AlreadyInSync);
        }
        if self.settings.dry_run {
            return Ok(SyncOutcome::WouldUpdate);
        }
        utils::write_atomic(target, rendered.as_bytes())
            .map_err(|e| SyncError::fs("write merged config to", target, e))?;
        Ok(SyncOutcome::Updated)
    }
}

async fn read_bytes(path: &Path) -> Result<Vec<u8>, SyncError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SyncError::fs("read", path, e))
}

async fn remove_staging(path: &Path) -> Result<(), SyncError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SyncError::fs("remove staging file", path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn effective(root: &Path, url: &str) -> Effective {
        Effective {
            repo_root: root.to_path_buf(),
            config_file: None,
            target: ".huskyrc.json".into(),
            url: url.into(),
            output: "human".into(),
            timeout_secs: 5,
            staging_suffix: ".tmp".into(),
            use_yarn: false,
            dry_run: false,
        }
    }

    #[test]
    fn test_settings_reject_bad_values() {
        let dir = tempdir().unwrap();
        let mut eff = effective(dir.path(), "ftp://example.com/x.json");
        assert!(matches!(SyncSettings::from_effective(&eff), Err(SyncError::Config(_))));
        eff.url = "not a url".into();
        assert!(matches!(SyncSettings::from_effective(&eff), Err(SyncError::Config(_))));
        eff.url = "https://example.com/x.json".into();
        eff.timeout_secs = 0;
        assert!(matches!(SyncSettings::from_effective(&eff), Err(SyncError::Config(_))));
        eff.timeout_secs = 5;
        let s = SyncSettings::from_effective(&eff).unwrap();
        assert_eq!(s.target, dir.path().join(".huskyrc.json"));
        assert_eq!(s.staging_path(), dir.path().join(".huskyrc.json.tmp"));
        assert_eq!(s.lock_path(), dir.path().join(".huskyrc.json.lock"));
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_local_untouched() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let local = root.join(".huskyrc.json");
        std::fs::write(&local, "{\"a\": 1}").unwrap();

        // port 1 refuses connections on loopback
        let settings =
            SyncSettings::from_effective(&effective(root, "http://127.0.0.1:1/.huskyrc.json"))
                .unwrap();
        let sync = Synchronizer::new(settings).unwrap();
        let err = sync.run().await.unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert_eq!(std::fs::read_to_string(&local).unwrap(), "{\"a\": 1}");
        assert!(!root.join(".huskyrc.json.tmp").exists());
        assert!(!root.join(".huskyrc.json.lock").exists());
    }

    #[tokio::test]
    async fn test_held_lock_blocks_second_attempt() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let settings =
            SyncSettings::from_effective(&effective(root, "http://127.0.0.1:1/.huskyrc.json"))
                .unwrap();
        let _held = SyncLock::acquire(&settings.lock_path()).unwrap();
        let sync = Synchronizer::new(settings).unwrap();
        assert!(matches!(sync.run().await, Err(SyncError::Locked { .. })));
        assert!(!root.join(".huskyrc.json").exists());
    }
}
