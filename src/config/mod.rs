//! Configuration management for glean
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. Command line flags (`--cache`, `--jobs`, ...)
//! 2. Environment variables (`GLEAN_CACHE_DIR`, `GLEAN_CONFIG`)
//! 3. The global config file (`~/.glean/config.toml`, see [`GleanConfig`])
//!
//! This module also owns cache root setup: the root must exist (it is
//! created when missing) and must be a directory before any dependency is
//! touched.

mod global;

pub use global::GleanConfig;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::constants::{CACHE_DIR_ENV, DEFAULT_CACHE_DIR_NAME};
use crate::core::GleanError;
use crate::utils::platform;

/// Pick the cache root from the command line, environment, config file or default.
///
/// # Location Priority
///
/// 1. `cli_override` (the `--cache` flag)
/// 2. `GLEAN_CACHE_DIR`
/// 3. `cache_folder` from the config file
/// 4. `~/.glean_cache`
pub fn get_cache_dir(cli_override: Option<&Path>, config: &GleanConfig) -> Result<PathBuf> {
    if let Some(dir) = cli_override {
        return Ok(dir.to_path_buf());
    }

    if let Ok(dir) = std::env::var(CACHE_DIR_ENV)
        && !dir.is_empty()
    {
        return platform::resolve_path(&dir);
    }

    if let Some(folder) = &config.cache_folder {
        return platform::resolve_path(folder);
    }

    Ok(platform::get_home_dir()?.join(DEFAULT_CACHE_DIR_NAME))
}

/// Create the cache root if missing and verify it is a directory.
///
/// Returns the absolute form of `path`.
pub fn setup_cache_root(path: &Path) -> Result<PathBuf> {
    let invalid = || GleanError::CacheRootInvalid {
        path: path.display().to_string(),
    };

    if !path.exists() {
        tracing::info!("Creating cache root {}", path.display());
        std::fs::create_dir_all(path).map_err(|e| {
            tracing::debug!("create_dir_all({}) failed: {e}", path.display());
            invalid()
        })?;
    }
    if !path.is_dir() {
        return Err(invalid().into());
    }

    platform::absolute(path)
        .with_context(|| format!("Failed to resolve cache root {}", path.display()))
}
