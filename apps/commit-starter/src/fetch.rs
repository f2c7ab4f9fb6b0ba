//! Download of the canonical config document.
//!
//! The response body is streamed chunk by chunk into the destination file.
//! Only HTTP 200 counts as success; there are no retries.

use crate::models::SyncError;
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("commit-starter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Stream `url` into `dest`, returning the number of bytes written.
    ///
    /// `dest` is created only after a 200 response arrives, so a rejected
    /// request leaves nothing on disk.
    pub async fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64, SyncError> {
        if dest.is_dir() {
            return Err(SyncError::fs(
                "write download to",
                dest,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "destination is a directory"),
            ));
        }
        let transport = |source| SyncError::Transport {
            url: url.to_string(),
            source,
        };

        debug!(url, dest = %dest.display(), "fetching canonical config");
        let mut resp = self.client.get(url).send().await.map_err(transport)?;
        if resp.status() != StatusCode::OK {
            return Err(SyncError::RemoteUnavailable {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let mut file = File::create(dest)
            .await
            .map_err(|e| SyncError::fs("create", dest, e))?;
        let mut total: u64 = 0;
        while let Some(chunk) = resp.chunk().await.map_err(transport)? {
            file.write_all(&chunk)
                .await
                .map_err(|e| SyncError::fs("write", dest, e))?;
            total += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| SyncError::fs("flush", dest, e))?;
        file.sync_all()
            .await
            .map_err(|e| SyncError::fs("sync", dest, e))?;

        debug!(bytes = total, "download complete");
        Ok(total)
    }
}
