//! Manifest parsing and validation (`glean.json`).
//!
//! The same schema is used for the project's root manifest and for manifests
//! discovered inside fetched dependency sources:
//!
//! ```json
//! {
//!   "dependencies": [
//!     { "project_name": "fmt", "remote_uri": "https://github.com/fmtlib/fmt.git", "ref": "10.2.1" },
//!     { "project_name": "header_libraries", "uri": "https://github.com/beached/header_libraries.git",
//!       "branch": "v2", "recurse_submodules": true }
//!   ]
//! }
//! ```
//!
//! `uri` and `branch` are accepted as aliases of `remote_uri` and `ref`. An
//! empty `ref` is treated as no ref at all.

pub mod options;

pub use options::{DependencyOption, DependencyOptions, MergeType};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::core::GleanError;

/// One dependency entry of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Unique name of the dependency; also its cache directory name.
    pub project_name: String,
    /// Git remote to clone from.
    #[serde(alias = "uri")]
    pub remote_uri: String,
    /// Branch, tag or commit to check out. `None` means the remote's default branch.
    #[serde(rename = "ref", alias = "branch", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Clone with `--recurse-submodules`.
    #[serde(default)]
    pub recurse_submodules: bool,
}

impl DependencySpec {
    /// A dependency without a ref.
    pub fn new(project_name: impl Into<String>, remote_uri: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            remote_uri: remote_uri.into(),
            reference: None,
            recurse_submodules: false,
        }
    }

    /// Pin the dependency to a ref.
    #[must_use]
    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// The pinned ref, if any and non-empty.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref().filter(|r| !r.is_empty())
    }
}

/// A parsed `glean.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Dependencies in declaration order.
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
}

impl Manifest {
    /// Load and validate a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(GleanError::ManifestNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;
        Self::parse(&content, path)
    }

    /// Parse and validate manifest JSON. `origin` is only used for messages.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let mut manifest: Self =
            serde_json::from_str(content).map_err(|e| GleanError::ManifestParseError {
                file: origin.display().to_string(),
                reason: e.to_string(),
            })?;

        for spec in &mut manifest.dependencies {
            if spec.reference.as_deref().is_some_and(|r| r.trim().is_empty()) {
                spec.reference = None;
            }
        }

        manifest.validate().with_context(|| format!("Invalid manifest: {}", origin.display()))?;
        Ok(manifest)
    }

    /// Check names and refs are usable as cache path components and names are unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.dependencies {
            validate_project_name(&spec.project_name)?;

            if spec.remote_uri.trim().is_empty() {
                return Err(GleanError::ManifestValidationError {
                    reason: format!("dependency '{}' has an empty remote_uri", spec.project_name),
                }
                .into());
            }

            if let Some(reference) = spec.reference()
                && matches!(reference, "." | "..")
            {
                return Err(GleanError::ManifestValidationError {
                    reason: format!(
                        "dependency '{}' has an invalid ref '{reference}'",
                        spec.project_name
                    ),
                }
                .into());
            }

            if !seen.insert(spec.project_name.as_str()) {
                return Err(GleanError::ManifestValidationError {
                    reason: format!("dependency '{}' is declared twice", spec.project_name),
                }
                .into());
            }
        }
        Ok(())
    }
}

fn validate_project_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("project_name must not be empty".to_string())
    } else if matches!(name, "." | "..") || name.contains(['/', '\\']) {
        Some(format!("project_name '{name}' must be a single path component"))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(GleanError::ManifestValidationError {
            reason,
        }
        .into()),
        None => Ok(()),
    }
}
