//! Platform-specific helpers.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Checks if running on Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Returns the user's home directory.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Default git executable name for this platform.
#[must_use]
pub const fn default_git_binary() -> &'static str {
    if is_windows() {
        "git.exe"
    } else {
        "git"
    }
}

/// Default cmake executable name for this platform.
#[must_use]
pub const fn default_cmake_binary() -> &'static str {
    if is_windows() {
        "cmake.exe"
    } else {
        "cmake"
    }
}

/// Whether `cmd` resolves to an executable on `PATH` (or is an existing path).
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Expands a leading `~` and `$VAR` references in a user-supplied path.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Failed to expand environment variables in path: {path}"))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Makes `path` absolute against the current directory without touching the filesystem.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Failed to make {} absolute", path.display()))
}
