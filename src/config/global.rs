//! User-wide configuration file (`~/.glean/config.toml`).
//!
//! Every field is optional; anything missing falls back to the built-in
//! defaults and anything given on the command line wins over the file.
//!
//! ```toml
//! cache_folder = "~/.cache/glean"
//! cmake_binary = "/opt/cmake/bin/cmake"
//! git_binary = "git"
//! jobs = 8
//! cmake_args = ["-DBUILD_TESTING=OFF"]
//! update_policy = "stamp"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::CONFIG_PATH_ENV;
use crate::core::{GleanError, UpdatePolicy};

/// Contents of the global config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GleanConfig {
    /// Cache root; `~` and environment variables are expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_folder: Option<String>,

    /// CMake executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmake_binary: Option<String>,

    /// Git executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_binary: Option<String>,

    /// Compile parallelism for `cmake --build`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<u32>,

    /// Default extra configure arguments applied to every dependency.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cmake_args: Vec<String>,

    /// When to rebuild already-installed dependencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_policy: Option<UpdatePolicy>,
}

impl GleanConfig {
    /// Default location: `$GLEAN_CONFIG`, else `~/.glean/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return crate::utils::platform::resolve_path(&path);
        }
        Ok(crate::utils::platform::get_home_dir()?.join(".glean").join("config.toml"))
    }

    /// Load from `path` if given, else from the default location.
    ///
    /// A missing file yields the default configuration. An explicitly given
    /// path that does not exist is an error.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(GleanError::ConfigError {
                        message: format!("config file not found: {}", path.display()),
                    }
                    .into());
                }
                Self::load_from(&path).await
            }
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path).await
                } else {
                    tracing::debug!("No config file at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| GleanError::ConfigError {
            message: format!("{}: {}", path.display(), e.message()),
        })?;

        if config.jobs == Some(0) {
            return Err(GleanError::ConfigError {
                message: format!("{}: jobs must be at least 1", path.display()),
            }
            .into());
        }

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}
