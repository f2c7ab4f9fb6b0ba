//! Failure taxonomy for a sync attempt.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which document a parse failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => f.write_str("local"),
            Side::Remote => f.write_str("remote"),
        }
    }
}

/// Why a document could not be used as a config object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCause {
    /// Zero bytes or whitespace only.
    Empty,
    /// Invalid JSON, or valid JSON whose top level is not an object.
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("could not reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not download starter config from {url} (HTTP {status})")]
    RemoteUnavailable { url: String, status: u16 },

    #[error("{}", parse_message(.side, .path, .cause))]
    ConfigParse {
        side: Side,
        path: PathBuf,
        cause: ParseCause,
    },

    #[error("failed to {action} '{}': {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("another sync holds the lock '{}'", .path.display())]
    Locked { path: PathBuf },

    #[error("invalid settings: {0}")]
    Config(String),
}

impl SyncError {
    pub fn fs(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }

    /// Stable tag used in machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Transport { .. } => "transport",
            SyncError::RemoteUnavailable { .. } => "remote_unavailable",
            SyncError::ConfigParse { .. } => "config_parse",
            SyncError::Filesystem { .. } => "filesystem",
            SyncError::Locked { .. } => "locked",
            SyncError::Config(_) => "config",
        }
    }
}

fn parse_message(side: &Side, path: &Path, cause: &ParseCause) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    match (side, cause) {
        (Side::Local, ParseCause::Empty) => format!(
            "Found an empty {} file. If it should be empty then please delete it and run this again.",
            name
        ),
        (Side::Local, ParseCause::Malformed(detail)) => format!(
            "Existing {} is not a valid JSON object ({}); fix or delete it and run this again.",
            name, detail
        ),
        (Side::Remote, ParseCause::Empty) => {
            "The downloaded config file was empty.".to_string()
        }
        (Side::Remote, ParseCause::Malformed(detail)) => format!(
            "There was an error reading the downloaded config file ({}).",
            detail
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_malformed_messages_differ() {
        let path = PathBuf::from("/tmp/x/.huskyrc.json");
        let empty = SyncError::ConfigParse {
            side: Side::Local,
            path: path.clone(),
            cause: ParseCause::Empty,
        };
        let bad = SyncError::ConfigParse {
            side: Side::Local,
            path,
            cause: ParseCause::Malformed("EOF while parsing".into()),
        };
        assert!(empty.to_string().contains("empty .huskyrc.json"));
        assert!(bad.to_string().contains("not a valid JSON object"));
        assert_ne!(empty.to_string(), bad.to_string());
        assert_eq!(empty.kind(), "config_parse");
    }
}
