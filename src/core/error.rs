//! Error handling for glean
//!
//! Errors are split into two layers:
//! 1. [`GleanError`] - strongly-typed failure cases matched on in code
//! 2. [`ErrorContext`] - a wrapper that adds details and a suggestion for the
//!    operator-facing CLI output
//!
//! # Error Categories
//!
//! - **Configuration**: [`GleanError::ConfigError`], [`GleanError::CacheRootInvalid`],
//!   [`GleanError::CachePathInvalid`], [`GleanError::DescriptorWriteFailed`],
//!   [`GleanError::InvalidOption`]. Fatal to the whole run.
//! - **Resolution**: [`GleanError::ManifestNotFound`], [`GleanError::ManifestParseError`],
//!   [`GleanError::ManifestValidationError`], [`GleanError::CyclicDependency`].
//!   Fatal to the whole run, raised before any build step.
//! - **Pipeline**: not an error type. A failed step is recorded on the node
//!   as `NodeStatus::Failed` and the orchestrator moves on.
//! - **Aggregate**: [`GleanError::BuildFailures`], only raised in strict mode.
//!
//! Call sites propagate with `anyhow::Result` and attach context; the CLI entry
//! point turns whatever reaches it into an [`ErrorContext`] via
//! [`user_friendly_error`].

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for glean operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GleanError {
    /// Generic configuration problem (bad config file, unusable prefix, ...).
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// The cache root does not exist and could not be created, or is not a directory.
    #[error("Cache root ({path}) does not exist or is not a directory")]
    CacheRootInvalid {
        /// The offending cache root
        path: String,
    },

    /// A path inside a cache entry exists with the wrong type.
    #[error("Cache path ({path}) exists but is not a {expected}")]
    CachePathInvalid {
        /// The offending path
        path: String,
        /// What the path should have been ("directory" or "regular file")
        expected: String,
    },

    /// The generated build descriptor could not be written.
    #[error("Could not write build descriptor ({path}): {reason}")]
    DescriptorWriteFailed {
        /// Descriptor path
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// Root manifest missing.
    #[error("Manifest file not found: {path}")]
    ManifestNotFound {
        /// Path that was looked up
        path: String,
    },

    /// A manifest (root or nested) could not be parsed.
    #[error("Invalid manifest file syntax in {file}")]
    ManifestParseError {
        /// Path to the manifest
        file: String,
        /// Parser message
        reason: String,
    },

    /// A manifest parsed but its content is unusable.
    #[error("Manifest validation failed: {reason}")]
    ManifestValidationError {
        /// Why validation failed
        reason: String,
    },

    /// The option override file is malformed or names an unknown option.
    #[error("Invalid dependency option in {file}: {reason}")]
    InvalidOption {
        /// Path to the option file
        file: String,
        /// What is wrong with it
        reason: String,
    },

    /// The discovered dependency graph contains a cycle.
    #[error("Circular dependency detected: {chain}")]
    CyclicDependency {
        /// Human readable chain, e.g. `a → b → a`
        chain: String,
        /// Every project participating in the cycle
        projects: Vec<String>,
    },

    /// Descriptor template rendering failed.
    #[error("Failed to render template '{name}'")]
    TemplateError {
        /// Template name
        name: String,
        /// Tera's error chain
        reason: String,
    },

    /// Strict mode: at least one dependency failed to build.
    #[error("{count} dependencies failed to build: {}", projects.join(", "))]
    BuildFailures {
        /// Number of failed node outcomes across all passes
        count: usize,
        /// Distinct project names that failed
        projects: Vec<String>,
    },

    /// Catch-all with a preformatted message.
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl GleanError {
    /// Whether this error belongs to the configuration class (fatal, raised
    /// before or during materialization).
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigError { .. }
                | Self::CacheRootInvalid { .. }
                | Self::CachePathInvalid { .. }
                | Self::DescriptorWriteFailed { .. }
                | Self::InvalidOption { .. }
        )
    }
}

/// An error plus operator-facing details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying glean error
    pub error: GleanError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    #[must_use]
    pub const fn new(error: GleanError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
///
/// [`GleanError`] values anywhere in the chain get tailored suggestions; IO
/// errors get filesystem guidance; anything else is shown with its full cause
/// chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(glean_error) = error.chain().find_map(|e| e.downcast_ref::<GleanError>()) {
        return create_error_context(glean_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(GleanError::Other {
            message: error.to_string(),
        })
        .with_suggestion("Check ownership and permissions of the cache root and install prefix");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(GleanError::Other {
        message,
    })
}

fn create_error_context(error: GleanError) -> ErrorContext {
    match &error {
        GleanError::CacheRootInvalid { path } => {
            let details = format!("glean keeps every dependency's sources and build trees under {path}");
            ErrorContext::new(error)
                .with_suggestion("Pass --cache <dir> or set GLEAN_CACHE_DIR to a writable directory")
                .with_details(details)
        }
        GleanError::CachePathInvalid { path, .. } => {
            let suggestion = format!("Remove or rename {path} so glean can recreate it");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        GleanError::ManifestNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Run glean from a directory containing glean.json or pass --manifest <path>"),
        GleanError::ManifestParseError { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check the JSON syntax; every dependency needs project_name and remote_uri")
                .with_details(details)
        }
        GleanError::InvalidOption { .. } => ErrorContext::new(error)
            .with_suggestion("The only supported opt_name is \"cmake_args\"; merge_type is \"append\" or \"replace\""),
        GleanError::CyclicDependency { .. } => ErrorContext::new(error)
            .with_suggestion("Review the glean.json files of the listed projects and break the cycle")
            .with_details("Dependencies cannot depend on themselves directly or indirectly"),
        GleanError::TemplateError { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error).with_details(details)
        }
        GleanError::BuildFailures { .. } => ErrorContext::new(error)
            .with_suggestion("Re-run with --verbose to see the tool output of the failing steps"),
        _ => ErrorContext::new(error),
    }
}
