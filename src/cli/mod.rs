//! Command-line interface for glean.
//!
//! glean has a single command: read `glean.json`, resolve the dependency
//! graph, then either build everything (`--output process`, the default) or
//! print a CMake `ExternalProject` descriptor for it (`--output cmake`).
//!
//! # Examples
//!
//! ```bash
//! glean                                   # debug build of ./glean.json into ./glean_install
//! glean --build-type all --prefix /opt/deps
//! glean --output cmake --export-file deps.cmake
//! glean --cache /tmp/glean -j 4 --strict
//! ```
//!
//! Logging goes to stderr. `RUST_LOG` takes precedence over `--verbose` and
//! `--quiet` when set.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::{self, GleanConfig};
use crate::constants::{self, DEFAULT_PREFIX_DIR_NAME, MANIFEST_FILE_NAME, OPTIONS_FILE_NAME};
use crate::core::{BuildContext, BuildSelection};
use crate::manifest::DependencyOptions;
use crate::orchestrator::{Orchestrator, RunMode};
use crate::process::ProcessRunner;
use crate::resolver::Resolver;
use crate::utils::platform;

/// What a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputKind {
    /// Fetch, configure, build and install every dependency
    #[default]
    Process,
    /// Emit a CMake ExternalProject descriptor without building
    Cmake,
}

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(
    name = "glean",
    about = "Fetch source dependencies with git and build them with CMake",
    version,
    long_about = "glean reads glean.json, recursively discovers the glean.json files of every \
                  fetched dependency, and builds the whole graph children first into a shared \
                  install prefix."
)]
pub struct Cli {
    /// Build the dependencies or only export a CMake descriptor.
    #[arg(short, long, value_enum, default_value_t = OutputKind::Process)]
    output: OutputKind,

    /// Build type(s) to produce. `all` runs a debug pass, then a release pass.
    #[arg(short = 't', long, value_enum, default_value_t = BuildSelection::Debug)]
    build_type: BuildSelection,

    /// Shared install prefix for every dependency [default: ./glean_install]
    #[arg(short, long, value_name = "PATH")]
    prefix: Option<PathBuf>,

    /// Cache root holding sources and build trees.
    ///
    /// Overrides `GLEAN_CACHE_DIR` and `cache_folder` from the config file.
    /// Defaults to `~/.glean_cache`.
    #[arg(long, value_name = "PATH")]
    cache: Option<PathBuf>,

    /// Root manifest.
    #[arg(short, long, value_name = "PATH", default_value = MANIFEST_FILE_NAME)]
    manifest: PathBuf,

    /// Per-dependency option overrides [default: glean_options.json next to the manifest]
    #[arg(long, value_name = "PATH")]
    options: Option<PathBuf>,

    /// Compile parallelism passed to `cmake --build` [default: number of cores]
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    jobs: Option<u32>,

    /// Write the export descriptor to this file instead of stdout. Implies `--output cmake`.
    #[arg(long, value_name = "PATH")]
    export_file: Option<PathBuf>,

    /// Exit non-zero when any dependency fails to build.
    #[arg(long)]
    strict: bool,

    /// Enable debug logging, including tool output.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors, and skip the summary.
    #[arg(short, long)]
    quiet: bool,

    /// Global config file [default: $GLEAN_CONFIG or ~/.glean/config.toml]
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Run glean with the parsed arguments.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();

        let config = GleanConfig::load_with_optional(self.config.clone()).await?;
        let context = self.build_context(&config)?;
        let mode = self.run_mode();

        tracing::info!("glean cache: {}", context.cache_root.display());
        tracing::info!("install prefix: {}", context.install_prefix.display());
        check_tools(&context, &mode);

        let options_path = self.options_path();
        let options = DependencyOptions::load(&options_path)?;

        let runner = ProcessRunner;
        let resolver = Resolver::new(&context, &options, &runner);
        let mut graph = resolver.resolve(&self.manifest).await?;
        if graph.is_empty() {
            tracing::info!("{} declares no dependencies", self.manifest.display());
        }

        let orchestrator = Orchestrator::new(&context, &runner);
        let report = orchestrator.run(&mut graph, &mode).await?;

        if mode == RunMode::Process && !self.quiet {
            print!("{}", report.summary());
        }

        if self.strict
            && let Some(error) = report.failure_error()
        {
            return Err(error.into());
        }
        Ok(())
    }

    fn init_logging(&self) {
        let default_filter = if self.verbose {
            "glean=debug"
        } else if self.quiet {
            "warn"
        } else {
            "glean=info"
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

        // A subscriber may already be installed when running under tests.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .try_init();
    }

    /// Assemble the run context: command line over config file over defaults.
    fn build_context(&self, config: &GleanConfig) -> Result<BuildContext> {
        let cache_dir = config::get_cache_dir(self.cache.as_deref(), config)?;
        let cache_root = config::setup_cache_root(&cache_dir)?;

        let prefix = self.prefix.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_PREFIX_DIR_NAME));
        let install_prefix = platform::absolute(&prefix)
            .with_context(|| format!("Invalid install prefix {}", prefix.display()))?;

        let mut context = BuildContext::new(install_prefix, cache_root);
        context.build_selection = self.build_type;
        if let Some(git) = &config.git_binary {
            context.git_binary.clone_from(git);
        }
        if let Some(cmake) = &config.cmake_binary {
            context.cmake_binary.clone_from(cmake);
        }
        context.jobs = self.jobs.or(config.jobs).unwrap_or_else(constants::default_jobs);
        context.default_cmake_args.clone_from(&config.cmake_args);
        context.update_policy = config.update_policy.unwrap_or_default();
        Ok(context)
    }

    fn run_mode(&self) -> RunMode {
        match (self.output, &self.export_file) {
            (OutputKind::Process, None) => RunMode::Process,
            (_, target) => RunMode::Export {
                target: target.clone(),
            },
        }
    }

    fn options_path(&self) -> PathBuf {
        self.options.clone().unwrap_or_else(|| {
            self.manifest.parent().unwrap_or_else(|| Path::new("")).join(OPTIONS_FILE_NAME)
        })
    }
}

/// Warn early about missing tools instead of failing every node later.
fn check_tools(context: &BuildContext, mode: &RunMode) {
    if !platform::command_exists(&context.git_binary) {
        tracing::warn!("git executable '{}' not found on PATH", context.git_binary);
    }
    if *mode == RunMode::Process && !platform::command_exists(&context.cmake_binary) {
        tracing::warn!("cmake executable '{}' not found on PATH", context.cmake_binary);
    }
}
