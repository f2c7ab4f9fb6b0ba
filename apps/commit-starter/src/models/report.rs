//! Result of a finished sync attempt.

use std::path::PathBuf;

/// Terminal success states of the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No local file existed; the remote document was saved as-is.
    Downloaded,
    /// Local file already matches the canonical config; nothing written.
    AlreadyInSync,
    /// Local file was rewritten with the merged document.
    Updated,
    /// Dry run: the file would have been downloaded.
    WouldDownload,
    /// Dry run: the merged document would have been written.
    WouldUpdate,
}

impl SyncOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Downloaded => "downloaded",
            SyncOutcome::AlreadyInSync => "already_in_sync",
            SyncOutcome::Updated => "updated",
            SyncOutcome::WouldDownload => "would_download",
            SyncOutcome::WouldUpdate => "would_update",
        }
    }

    pub fn wrote(&self) -> bool {
        matches!(self, SyncOutcome::Downloaded | SyncOutcome::Updated)
    }
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub target: PathBuf,
    pub url: String,
    pub outcome: SyncOutcome,
    /// Package-manager context for follow-up steps; not used by the sync itself.
    pub use_yarn: bool,
}
