//! Per-node build pipeline.
//!
//! Each dependency walks a small state machine:
//!
//! ```text
//! Discovered → SourceAcquiring → SourceAcquired → Configuring → Configured
//!            → Building → Built → Installing → Installed
//! ```
//!
//! `Failed` is reachable from every non-terminal state. Tool failures are
//! scoped to the node: they are recorded in its state and returned as a
//! [`PipelineOutcome`], never as an error. Errors returned from this module
//! are configuration problems (unusable cache paths, unwritable descriptor)
//! and abort the whole run.

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::action::{Action, CmakeAction, GitAction, Step};
use crate::cache::{self, stamp};
use crate::core::{BuildContext, BuildType, UpdatePolicy};
use crate::descriptor;
use crate::process::{ActionStatus, Invocation, TailSink, ToolRunner};
use crate::resolver::DependencyNode;
use crate::utils::fs::ensure_dir;

/// Lifecycle state of one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeState {
    /// Known from a manifest, nothing done yet
    #[default]
    Discovered,
    /// Clone or update in progress
    SourceAcquiring,
    /// Source tree is at the requested ref
    SourceAcquired,
    /// Descriptor written, configure running
    Configuring,
    /// Configure succeeded
    Configured,
    /// Compile running
    Building,
    /// Compile succeeded
    Built,
    /// Install running
    Installing,
    /// Installed into the prefix (or already up to date)
    Installed,
    /// A step failed
    Failed {
        /// Failing step
        step: Step,
        /// Tool status and trailing output
        reason: String,
    },
}

impl NodeState {
    /// Whether no further transition happens in this pass.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Installed | Self::Failed { .. })
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovered => f.write_str("discovered"),
            Self::SourceAcquiring => f.write_str("acquiring source"),
            Self::SourceAcquired => f.write_str("source acquired"),
            Self::Configuring => f.write_str("configuring"),
            Self::Configured => f.write_str("configured"),
            Self::Building => f.write_str("building"),
            Self::Built => f.write_str("built"),
            Self::Installing => f.write_str("installing"),
            Self::Installed => f.write_str("installed"),
            Self::Failed {
                step,
                ..
            } => write!(f, "failed at {step}"),
        }
    }
}

/// Result of running one node through one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Configure, build and install all succeeded
    Installed,
    /// Nothing to do; the last install is still current
    UpToDate,
    /// A step failed
    Failed {
        /// Failing step
        step: Step,
        /// Tool status and trailing output
        reason: String,
    },
}

/// Drives nodes through their steps using a [`ToolRunner`].
pub struct BuildPipeline<'a, R> {
    context: &'a BuildContext,
    runner: &'a R,
}

impl<'a, R: ToolRunner> BuildPipeline<'a, R> {
    /// Pipeline over `context` that spawns tools through `runner`.
    pub const fn new(context: &'a BuildContext, runner: &'a R) -> Self {
        Self {
            context,
            runner,
        }
    }

    /// Clone or update the node's source tree.
    ///
    /// An empty source directory is cloned; an existing tree is pulled, checked
    /// out at the pinned ref (if any) and hard reset. On success the node is
    /// `SourceAcquired`, otherwise `Failed`.
    pub async fn acquire_source(&self, node: &mut DependencyNode) -> bool {
        node.state = NodeState::SourceAcquiring;
        let name = node.spec.project_name.clone();

        let source = node.cache.source_dir.clone();
        let steps: Vec<(GitAction, PathBuf)> = if node.cache.needs_clone() {
            tracing::info!(target: "glean::pipeline", "Cloning {name} from {}", node.spec.remote_uri);
            let mut steps = vec![(
                GitAction::clone_into(
                    node.spec.remote_uri.clone(),
                    node.spec.recurse_submodules,
                    source.clone(),
                ),
                node.cache.cache_dir.clone(),
            )];
            // A fresh clone sits on the default branch.
            if let Some(reference) = node.spec.reference() {
                steps.push((GitAction::checkout_version(reference), source));
            }
            steps
        } else {
            tracing::info!(target: "glean::pipeline", "Updating {name}");
            let mut steps = vec![(GitAction::Pull, source.clone())];
            if let Some(reference) = node.spec.reference() {
                steps.push((GitAction::checkout_version(reference), source.clone()));
            }
            steps.push((GitAction::Reset, source));
            steps
        };

        for (action, working_dir) in steps {
            let action = Action::from(action);
            if let Err((step, reason)) = self.execute(&name, &action, &working_dir).await {
                node.fail(step, reason);
                return false;
            }
        }

        node.source_acquired = true;
        node.state = NodeState::SourceAcquired;
        true
    }

    /// Run one pass for `node`: acquire the source if needed, then configure,
    /// build and install when an update is needed.
    pub async fn run(&self, node: &mut DependencyNode, build_type: BuildType) -> Result<PipelineOutcome> {
        let pass = self.context.pass(build_type);
        let name = node.spec.project_name.clone();

        if node.source_acquired {
            node.state = NodeState::SourceAcquired;
        } else if let NodeState::Failed {
            step,
            reason,
        } = &node.state
        {
            return Ok(PipelineOutcome::Failed {
                step: *step,
                reason: reason.clone(),
            });
        } else if !self.acquire_source(node).await {
            return Ok(node.outcome());
        }

        let args = node.effective_cmake_args(&self.context.default_cmake_args);
        if !cache::is_update_needed(&node.spec, &node.cache, &args, pass) {
            tracing::info!(target: "glean::pipeline", "{name} ({build_type}) is up to date");
            node.state = NodeState::Installed;
            return Ok(PipelineOutcome::UpToDate);
        }

        let build_dir = node.cache.build_dir(build_type);
        ensure_dir(&build_dir)?;
        // The prefix is about to change; an interrupted rebuild must not leave
        // the previous stamp claiming it is current.
        stamp::clear(&node.cache, build_type)?;

        node.state = NodeState::Configuring;
        descriptor::write_node(&node.spec, &node.cache, pass.install_prefix(), &args)?;
        let configure = Action::from(CmakeAction::Configure {
            source_dir: node.cache.source_dir.clone(),
            build_dir: build_dir.clone(),
            descriptor: Some(node.cache.descriptor_file.clone()),
            build_type,
            install_prefix: pass.install_prefix().to_path_buf(),
            has_glean: node.has_manifest,
            custom_args: args.clone(),
        });
        if let Err((step, reason)) = self.execute(&name, &configure, &build_dir).await {
            node.fail(step, reason);
            return Ok(node.outcome());
        }
        node.state = NodeState::Configured;

        node.state = NodeState::Building;
        let build = Action::from(CmakeAction::Build {
            build_dir: build_dir.clone(),
            build_type,
            jobs: self.context.jobs,
        });
        if let Err((step, reason)) = self.execute(&name, &build, &build_dir).await {
            node.fail(step, reason);
            return Ok(node.outcome());
        }
        node.state = NodeState::Built;

        node.state = NodeState::Installing;
        let install = Action::from(CmakeAction::Install {
            build_dir: build_dir.clone(),
            build_type,
        });
        if let Err((step, reason)) = self.execute(&name, &install, &build_dir).await {
            node.fail(step, reason);
            return Ok(node.outcome());
        }
        node.state = NodeState::Installed;

        if self.context.update_policy == UpdatePolicy::Stamp
            && let Err(e) = stamp::write(&node.cache, &node.spec, &args, pass)
        {
            tracing::warn!(target: "glean::pipeline", "Could not record install stamp for {name}: {e:#}");
        }

        tracing::info!(target: "glean::pipeline", "Installed {name} ({build_type})");
        Ok(PipelineOutcome::Installed)
    }

    async fn execute(
        &self,
        project: &str,
        action: &Action,
        working_dir: &Path,
    ) -> std::result::Result<(), (Step, String)> {
        let invocation = Invocation::new(project, action, self.context, working_dir);
        tracing::debug!(target: "glean::pipeline", "({project}) {}", invocation.step);

        let mut sink = TailSink::new(project);
        let status = self.runner.run(&invocation, &mut sink).await;
        match status {
            ActionStatus::Success => Ok(()),
            failed => {
                let tail = sink.take_tail();
                let mut reason = format!("{} {}", invocation.tool, failed.describe());
                if !tail.is_empty() {
                    reason.push('\n');
                    reason.push_str(&tail);
                }
                tracing::error!(
                    target: "glean::pipeline",
                    "{} failed for '{project}': {}",
                    invocation.step,
                    failed.describe()
                );
                Err((invocation.step, reason))
            }
        }
    }
}
