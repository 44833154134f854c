//! Scoped change of the process working directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Switches the working directory on creation and restores the previous one
/// on drop, including on early return and unwinding.
#[derive(Debug)]
pub struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    /// Enter `dir`.
    pub fn enter(dir: &Path) -> Result<Self> {
        let previous = std::env::current_dir().context("Failed to read current directory")?;
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to enter directory {}", dir.display()))?;
        Ok(Self {
            previous,
        })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::warn!(
                "Failed to restore working directory {}: {e}",
                self.previous.display()
            );
        }
    }
}
