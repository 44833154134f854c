//! Immutable per-run build context.
//!
//! A [`BuildContext`] is assembled once at startup from the config file and
//! the command line, then passed by reference into every component. Nothing
//! mutates it while the graph is walked; the dual debug+release pass derives a
//! fresh [`PassContext`] per pass instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Concrete CMake build type of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    /// `CMAKE_BUILD_TYPE=Debug`
    Debug,
    /// `CMAKE_BUILD_TYPE=Release`
    Release,
}

impl BuildType {
    /// Value passed to CMake (`Debug` / `Release`).
    #[must_use]
    pub const fn cmake_name(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }

    /// Lowercase name used for directory names and stamps.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Build types requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BuildSelection {
    /// Debug only
    #[default]
    Debug,
    /// Release only
    Release,
    /// Debug pass followed by a release pass
    All,
}

impl BuildSelection {
    /// The passes to run, in order.
    #[must_use]
    pub fn passes(self) -> Vec<BuildType> {
        match self {
            Self::Debug => vec![BuildType::Debug],
            Self::Release => vec![BuildType::Release],
            Self::All => vec![BuildType::Debug, BuildType::Release],
        }
    }
}

/// When the pipeline should re-run configure/build/install for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Always rebuild.
    #[default]
    Always,
    /// Skip nodes with a pinned ref whose fingerprint matches the last install stamp.
    Stamp,
}

/// Process-wide, read-only settings for one run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Shared install prefix every dependency installs into (absolute).
    pub install_prefix: PathBuf,
    /// Root under which every dependency gets its own cache directory.
    pub cache_root: PathBuf,
    /// Which build types to run.
    pub build_selection: BuildSelection,
    /// Git executable name or path.
    pub git_binary: String,
    /// CMake executable name or path.
    pub cmake_binary: String,
    /// Compile parallelism handed to `cmake --build`.
    pub jobs: u32,
    /// Global default extra configure arguments, merged with per-node overrides.
    pub default_cmake_args: Vec<String>,
    /// Staleness policy for `is_update_needed`.
    pub update_policy: UpdatePolicy,
}

impl BuildContext {
    /// Context with tool defaults, mainly for tests and programmatic use.
    pub fn new(install_prefix: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            install_prefix: install_prefix.into(),
            cache_root: cache_root.into(),
            build_selection: BuildSelection::default(),
            git_binary: crate::utils::platform::default_git_binary().to_string(),
            cmake_binary: crate::utils::platform::default_cmake_binary().to_string(),
            jobs: crate::constants::default_jobs(),
            default_cmake_args: Vec::new(),
            update_policy: UpdatePolicy::default(),
        }
    }

    /// Derive the context of one pass.
    #[must_use]
    pub const fn pass(&self, build_type: BuildType) -> PassContext<'_> {
        PassContext {
            build: self,
            build_type,
        }
    }
}

/// A [`BuildContext`] bound to one concrete build type.
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    /// The shared run settings.
    pub build: &'a BuildContext,
    /// Build type of this pass.
    pub build_type: BuildType,
}

impl PassContext<'_> {
    /// Shorthand for the install prefix.
    #[must_use]
    pub fn install_prefix(&self) -> &Path {
        &self.build.install_prefix
    }
}
