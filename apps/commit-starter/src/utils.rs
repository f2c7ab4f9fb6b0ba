//! Utility helpers for paths and file replacement.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Return a path relative to the current working directory when possible.
pub fn rel_to_wd(p: &Path) -> String {
    match std::env::current_dir() {
        Ok(wd) => match pathdiff::diff_paths(p, wd) {
            Some(r) => r.to_string_lossy().to_string(),
            None => p.to_string_lossy().to_string(),
        },
        Err(_) => p.to_string_lossy().to_string(),
    }
}

/// Sibling path formed by appending `suffix` to the file name of `target`.
///
/// `.huskyrc.json` + `.tmp` gives `.huskyrc.json.tmp` in the same directory.
pub fn sibling_with_suffix(target: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    target.with_file_name(name)
}

/// Replace `path` with `contents` via a temp file in the same directory and a
/// rename, so readers never see a partial write. Existing permissions are kept.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Whether the repository uses Yarn, judged by a `yarn.lock` at its root.
pub fn yarn_lock_present(repo_root: &Path) -> bool {
    repo_root.join("yarn.lock").exists()
}
