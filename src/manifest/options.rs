//! Per-dependency option overrides (`glean_options.json`).
//!
//! ```json
//! {
//!   "values": [
//!     { "dep_name": "fmt", "opt_name": "cmake_args",
//!       "opt_value": ["-DFMT_TEST=OFF"], "merge_type": "append" }
//!   ]
//! }
//! ```
//!
//! `merge_type` decides how `opt_value` combines with the global default
//! arguments: `append` keeps the defaults and adds the override after them,
//! `replace` drops the defaults. Any other merge type string reads as `append`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::CMAKE_ARGS_OPTION;
use crate::core::GleanError;

/// How override values combine with defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MergeType {
    /// Defaults first, then override values.
    #[default]
    Append,
    /// Override values only.
    Replace,
}

impl From<String> for MergeType {
    fn from(value: String) -> Self {
        if value == "replace" {
            Self::Replace
        } else {
            Self::Append
        }
    }
}

impl From<MergeType> for String {
    fn from(value: MergeType) -> Self {
        match value {
            MergeType::Append => "append".to_string(),
            MergeType::Replace => "replace".to_string(),
        }
    }
}

impl MergeType {
    /// Combine `defaults` with `values` according to this merge type.
    #[must_use]
    pub fn merge(self, defaults: &[String], values: &[String]) -> Vec<String> {
        match self {
            Self::Append => defaults.iter().chain(values).cloned().collect(),
            Self::Replace => values.to_vec(),
        }
    }
}

/// One override entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyOption {
    /// Project the override applies to.
    #[serde(alias = "project_name")]
    pub dep_name: String,
    /// Option name; only `cmake_args` is defined.
    #[serde(alias = "option_name", default = "default_option_name")]
    pub opt_name: String,
    /// Option values, in order.
    #[serde(alias = "option_values", default)]
    pub opt_value: Vec<String>,
    /// How the values combine with the defaults.
    #[serde(default)]
    pub merge_type: MergeType,
}

fn default_option_name() -> String {
    CMAKE_ARGS_OPTION.to_string()
}

impl DependencyOption {
    /// A `cmake_args` override.
    pub fn cmake_args(
        dep_name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
        merge_type: MergeType,
    ) -> Self {
        Self {
            dep_name: dep_name.into(),
            opt_name: CMAKE_ARGS_OPTION.to_string(),
            opt_value: values.into_iter().map(Into::into).collect(),
            merge_type,
        }
    }

    /// Effective configure arguments for this override given the global defaults.
    #[must_use]
    pub fn apply(&self, defaults: &[String]) -> Vec<String> {
        self.merge_type.merge(defaults, &self.opt_value)
    }
}

/// Effective configure arguments for a node with an optional override.
#[must_use]
pub fn effective_cmake_args(defaults: &[String], option: Option<&DependencyOption>) -> Vec<String> {
    option.map_or_else(|| defaults.to_vec(), |o| o.apply(defaults))
}

/// The whole option override file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyOptions {
    /// Entries in file order.
    #[serde(default)]
    pub values: Vec<DependencyOption>,
}

impl DependencyOptions {
    /// Load the override file; a missing file yields no overrides.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No option override file at {}", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read option file: {}", path.display()))?;
        Self::parse(&content, path)
    }

    /// Parse and validate override JSON.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let options: Self = serde_json::from_str(content).map_err(|e| GleanError::InvalidOption {
            file: origin.display().to_string(),
            reason: e.to_string(),
        })?;

        if let Some(bad) = options.values.iter().find(|o| o.opt_name != CMAKE_ARGS_OPTION) {
            return Err(GleanError::InvalidOption {
                file: origin.display().to_string(),
                reason: format!(
                    "unknown option name '{}' for dependency '{}'",
                    bad.opt_name, bad.dep_name
                ),
            }
            .into());
        }
        Ok(options)
    }

    /// First override for `dep_name`, if any.
    #[must_use]
    pub fn get(&self, dep_name: &str) -> Option<&DependencyOption> {
        self.values.iter().find(|o| o.dep_name == dep_name)
    }
}
