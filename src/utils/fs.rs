//! Filesystem helpers with typed errors for the cache layout.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::core::GleanError;

/// Ensures a directory exists, creating it and all parents if necessary.
///
/// Fails with [`GleanError::CachePathInvalid`] if the path exists but is not a
/// directory, or if it still is not a directory after creation.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    if !path.is_dir() {
        return Err(GleanError::CachePathInvalid {
            path: path.display().to_string(),
            expected: "directory".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Fails if `path` exists but is not a regular file. A missing path is fine.
pub fn verify_file(path: &Path) -> Result<()> {
    if path.exists() && !path.is_file() {
        return Err(GleanError::CachePathInvalid {
            path: path.display().to_string(),
            expected: "regular file".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Atomically writes `content` to `path` (temp file in the same directory, then rename).
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Path has no parent directory: {}", path.display()))?;
    ensure_dir(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    temp.write_all(content)
        .with_context(|| format!("Failed to write temporary file for {}", path.display()))?;
    temp.as_file().sync_all().context("Failed to sync temporary file")?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move temporary file into place: {}", path.display()))?;
    Ok(())
}

/// Whether `path` is missing or an empty directory.
#[must_use]
pub fn is_missing_or_empty(path: &Path) -> bool {
    match std::fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => !path.exists(),
    }
}
