//! Test utilities shared by unit and integration tests.
//!
//! Enabled for `cfg(test)` and, for the integration tests under `tests/`,
//! through the `test-utils` feature.
//!
//! - [`ScriptedRunner`]: a [`crate::process::ToolRunner`] that records every
//!   invocation instead of spawning processes, fails chosen steps and plants
//!   nested manifests into "cloned" trees
//! - [`TestGit`]: thin wrapper over the real `git` for building fixture repos
//! - [`init_test_logging`]: once-only tracing setup for tests

pub mod git_helper;
pub mod runner;

pub use git_helper::TestGit;
pub use runner::ScriptedRunner;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, else
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=glean=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Write a `glean.json` listing `deps` as `(name, uri, ref)` triples.
pub fn manifest_json(deps: &[(&str, &str, Option<&str>)]) -> String {
    let entries: Vec<serde_json::Value> = deps
        .iter()
        .map(|(name, uri, reference)| {
            let mut entry = serde_json::json!({
                "project_name": name,
                "remote_uri": uri,
            });
            if let Some(reference) = reference {
                entry["ref"] = serde_json::Value::String((*reference).to_string());
            }
            entry
        })
        .collect();
    serde_json::json!({ "dependencies": entries }).to_string()
}
