//! Common fixtures for glean integration tests
//!
//! [`TestProject`] gives every test its own project directory, cache root,
//! install prefix and home directory, and runs the `glean` binary against
//! them with a scrubbed environment.

// Not every test file uses every helper
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use glean::test_utils::{TestGit, manifest_json};

/// Isolated directories for one glean run.
pub struct TestProject {
    _temp_dir: TempDir,
    project_dir: PathBuf,
    cache_dir: PathBuf,
    prefix_dir: PathBuf,
    home_dir: PathBuf,
    repos_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        let project_dir = root.join("project");
        let home_dir = root.join("home");
        let repos_dir = root.join("repos");
        for dir in [&project_dir, &home_dir, &repos_dir] {
            std::fs::create_dir_all(dir)?;
        }

        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
            cache_dir: root.join("cache"),
            prefix_dir: root.join("prefix"),
            home_dir,
            repos_dir,
        })
    }

    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_dir
    }

    pub fn prefix_path(&self) -> &Path {
        &self.prefix_dir
    }

    pub fn home_path(&self) -> &Path {
        &self.home_dir
    }

    /// Write `glean.json` into the project directory.
    pub fn write_manifest(&self, content: &str) -> Result<()> {
        std::fs::write(self.project_dir.join("glean.json"), content)
            .context("Failed to write glean.json")
    }

    /// Write `glean_options.json` into the project directory.
    pub fn write_options(&self, content: &str) -> Result<()> {
        std::fs::write(self.project_dir.join("glean_options.json"), content)
            .context("Failed to write glean_options.json")
    }

    /// Initialize a git repository `name` with a committed `CMakeLists.txt`.
    pub fn create_source_repo(&self, name: &str, cmake_lists: &str) -> Result<TestGit> {
        let git = TestGit::init_repo(self.repos_dir.join(name))?;
        git.write_file("CMakeLists.txt", cmake_lists)?;
        git.commit_all("Initial commit")?;
        Ok(git)
    }

    /// Run glean in the project directory with the cache and prefix preset.
    pub fn run_glean(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::cargo_bin("glean")?
            .current_dir(&self.project_dir)
            .arg("--cache")
            .arg(&self.cache_dir)
            .arg("--prefix")
            .arg(&self.prefix_dir)
            .args(args)
            .env("HOME", &self.home_dir)
            .env("GLEAN_CONFIG", self.home_dir.join(".glean").join("config.toml"))
            .env_remove("GLEAN_CACHE_DIR")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .output()
            .context("Failed to run glean")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Captured result of one glean run.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "glean failed with code {:?}\nstdout:\n{}\nstderr:\n{}",
            self.code, self.stdout, self.stderr
        );
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(!self.success, "glean unexpectedly succeeded\nstdout:\n{}", self.stdout);
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(self.stdout.contains(text), "Expected stdout to contain '{text}', got:\n{}", self.stdout);
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(self.stderr.contains(text), "Expected stderr to contain '{text}', got:\n{}", self.stderr);
        self
    }
}

/// Whether an external tool is available; tests needing it skip otherwise.
pub fn have_tool(name: &str) -> bool {
    which::which(name).is_ok()
}
