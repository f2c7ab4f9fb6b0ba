//! Exclusive lock guarding a target against concurrent sync attempts.
//!
//! On unix the lock is an advisory `flock` on a sibling `<target>.lock`
//! file, so the kernel releases it if the process dies; a leftover file
//! from a killed run does not block the next one. Elsewhere the file is
//! created with `create_new`. The guard removes the file on drop while it
//! still holds the lock.

use crate::models::SyncError;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct SyncLock {
    path: PathBuf,
    /// Held open for the lock duration; closing it releases the `flock`.
    #[allow(dead_code)]
    file: File,
}

impl SyncLock {
    /// Take the lock or fail with `Locked` if another attempt holds it.
    #[cfg(unix)]
    pub fn acquire(path: &Path) -> Result<Self, SyncError> {
        loop {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)
                .map_err(|e| SyncError::fs("open lock", path, e))?;
            match try_lock_exclusive(&file) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Err(SyncError::Locked {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) => return Err(SyncError::fs("lock", path, e)),
            }
            // a releasing holder may have unlinked the file between open and flock
            if still_linked(&file, path) {
                return Ok(Self::record(path, file));
            }
        }
    }

    /// Take the lock or fail with `Locked` if another attempt holds it.
    #[cfg(not(unix))]
    pub fn acquire(path: &Path) -> Result<Self, SyncError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => Ok(Self::record(path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(SyncError::Locked {
                path: path.to_path_buf(),
            }),
            Err(e) => Err(SyncError::fs("create lock", path, e)),
        }
    }

    // owner pid, for humans inspecting the lock
    fn record(path: &Path, mut file: File) -> Self {
        let written = file
            .set_len(0)
            .and_then(|_| writeln!(file, "{}", std::process::id()));
        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "failed to record pid in lock file");
        }
        Self {
            path: path.to_path_buf(),
            file,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(on_disk)) => held.dev() == on_disk.dev() && held.ino() == on_disk.ino(),
        _ => false,
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        // unlink before `file` closes so the next holder locks a fresh inode
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove lock file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_is_exclusive_and_released_on_drop() {
        let dir = tempdir().unwrap();
        let p = dir.path().join(".huskyrc.json.lock");

        let first = SyncLock::acquire(&p).unwrap();
        assert!(first.path().exists());
        assert_eq!(
            fs::read_to_string(&p).unwrap().trim(),
            std::process::id().to_string()
        );
        match SyncLock::acquire(&p) {
            Err(SyncError::Locked { path }) => assert_eq!(path, p),
            other => panic!("expected Locked, got {:?}", other.map(|l| l.path().to_path_buf())),
        }

        drop(first);
        assert!(!p.exists());
        let _again = SyncLock::acquire(&p).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_leftover_lock_file_from_dead_process_is_reclaimed() {
        let dir = tempdir().unwrap();
        let p = dir.path().join(".huskyrc.json.lock");
        // a killed run leaves the file behind but no kernel lock
        fs::write(&p, "999999\n").unwrap();

        let lock = SyncLock::acquire(&p).unwrap();
        assert_eq!(
            fs::read_to_string(&p).unwrap().trim(),
            std::process::id().to_string()
        );
        drop(lock);
        assert!(!p.exists());
    }
}
