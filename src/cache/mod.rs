//! Per-dependency cache layout and staleness checks.
//!
//! Every dependency owns one directory under the cache root:
//!
//! ```text
//! <cache_root>/
//! └── <project_name>/<ref>/
//!     ├── src/                  # git working tree
//!     ├── build/
//!     │   ├── debug/            # binary dir of the debug pass
//!     │   └── release/          # binary dir of the release pass
//!     ├── glean_init.cmake      # generated initial-cache script
//!     └── .glean_stamp_<type>   # fingerprint of the last successful install
//! ```
//!
//! Refs can contain `/` (`release/1.x`), so the ref segment is escaped to keep
//! exactly one path component per ref while staying unique per ref. A
//! dependency without a ref uses `%default`, which no escaped ref can spell.

pub mod stamp;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::constants::{
    BUILD_DIR_NAME, DESCRIPTOR_FILE_NAME, SOURCE_DIR_NAME, STAMP_FILE_PREFIX, UNPINNED_REF_DIR_NAME,
};
use crate::core::{BuildType, PassContext, UpdatePolicy};
use crate::manifest::DependencySpec;
use crate::utils::fs::{ensure_dir, verify_file};

/// Paths owned by one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// `cache_root/project_name/ref`
    pub cache_dir: PathBuf,
    /// Git working tree
    pub source_dir: PathBuf,
    /// Parent of the per build type binary dirs
    pub build_root: PathBuf,
    /// Initial-cache script handed to configure
    pub descriptor_file: PathBuf,
}

impl CacheEntry {
    /// Compute the layout for `spec`. Pure: touches nothing on disk.
    #[must_use]
    pub fn layout_for(spec: &DependencySpec, cache_root: &Path) -> Self {
        let ref_dir = spec.reference().map_or_else(|| UNPINNED_REF_DIR_NAME.to_string(), escape_ref);
        let cache_dir = cache_root.join(&spec.project_name).join(ref_dir);

        Self {
            source_dir: cache_dir.join(SOURCE_DIR_NAME),
            build_root: cache_dir.join(BUILD_DIR_NAME),
            descriptor_file: cache_dir.join(DESCRIPTOR_FILE_NAME),
            cache_dir,
        }
    }

    /// Binary directory of one build type.
    #[must_use]
    pub fn build_dir(&self, build_type: BuildType) -> PathBuf {
        self.build_root.join(build_type.dir_name())
    }

    /// Stamp file of one build type.
    #[must_use]
    pub fn stamp_file(&self, build_type: BuildType) -> PathBuf {
        self.cache_dir.join(format!("{STAMP_FILE_PREFIX}_{}", build_type.dir_name()))
    }

    /// Create missing directories and check every existing path has the right type.
    ///
    /// Idempotent. Fails with a configuration error when a directory path is
    /// occupied by something else or the descriptor path is not a regular file.
    pub fn materialize(&self) -> Result<()> {
        ensure_dir(&self.cache_dir)?;
        ensure_dir(&self.source_dir)?;
        ensure_dir(&self.build_root)?;
        verify_file(&self.descriptor_file)?;
        tracing::trace!("Materialized cache entry {}", self.cache_dir.display());
        Ok(())
    }

    /// Whether the source tree has never been populated.
    #[must_use]
    pub fn needs_clone(&self) -> bool {
        crate::utils::fs::is_missing_or_empty(&self.source_dir)
    }
}

/// Escape a ref into a single, unique path component.
///
/// `%` is escaped first so the mapping stays injective.
#[must_use]
pub fn escape_ref(reference: &str) -> String {
    let mut escaped = String::with_capacity(reference.len());
    for c in reference.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            '\\' => escaped.push_str("%5C"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Decide whether configure/build/install must run for a node in this pass.
///
/// With [`UpdatePolicy::Always`] the answer is always yes. With
/// [`UpdatePolicy::Stamp`] a node with a pinned ref is skipped when the
/// fingerprint of its remote, ref, checked-out commit, effective arguments,
/// prefix and build type matches the stamp of its last successful install.
/// A source tree whose commit cannot be read always needs an update.
#[must_use]
pub fn is_update_needed(
    spec: &DependencySpec,
    entry: &CacheEntry,
    effective_args: &[String],
    pass: PassContext<'_>,
) -> bool {
    match pass.build.update_policy {
        UpdatePolicy::Always => true,
        UpdatePolicy::Stamp => {
            if spec.reference().is_none() {
                return true;
            }
            let Some(revision) = stamp::source_revision(&entry.source_dir) else {
                return true;
            };
            let expected = stamp::fingerprint(spec, &revision, effective_args, pass);
            match stamp::read(&entry.stamp_file(pass.build_type)) {
                Some(found) if found == expected => {
                    tracing::debug!(
                        "{} ({}) is up to date at {revision}",
                        spec.project_name,
                        pass.build_type
                    );
                    false
                }
                _ => true,
            }
        }
    }
}
