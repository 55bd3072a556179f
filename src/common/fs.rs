//! Atomic file placement.
//!
//! Output goes to an exclusive scratch file next to its destination and is
//! renamed over the destination only when complete, so a failed write never
//! replaces a good file.

use crate::common::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// Directory that receives scratch files for `path`.
fn scratch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// A scratch file in the destination's directory.
pub fn scratch_for(path: &Path) -> Result<NamedTempFile> {
    let dir = scratch_dir(path);
    std::fs::create_dir_all(&dir).map_err(|source| Error::Output {
        path: path.to_path_buf(),
        source,
    })?;
    tempfile::Builder::new()
        .prefix(".liturgy-deck-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|source| Error::Output {
            path: path.to_path_buf(),
            source,
        })
}

/// Move a finished scratch file onto `path`.
pub fn persist(scratch: NamedTempFile, path: &Path) -> Result<()> {
    scratch.persist(path).map_err(|e| Error::Output {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// An exclusive scratch directory next to `path`, for producers that insist
/// on creating the file themselves.
pub fn scratch_dir_for(path: &Path) -> Result<TempDir> {
    let dir = scratch_dir(path);
    std::fs::create_dir_all(&dir).map_err(|source| Error::Output {
        path: path.to_path_buf(),
        source,
    })?;
    tempfile::Builder::new()
        .prefix(".liturgy-deck-")
        .tempdir_in(&dir)
        .map_err(|source| Error::Output {
            path: path.to_path_buf(),
            source,
        })
}

/// Rename a finished file from a scratch directory onto `path`.
pub fn persist_path(finished: &Path, path: &Path) -> Result<()> {
    std::fs::rename(finished, path).map_err(|source| Error::Output {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `bytes` to `path` through a scratch file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut scratch = scratch_for(path)?;
    scratch
        .write_all(bytes)
        .and_then(|()| scratch.as_file().sync_all())
        .map_err(|source| Error::Output {
            path: path.to_path_buf(),
            source,
        })?;
    persist(scratch, path)
}
