//! Top-level run over a resolved graph.
//!
//! In process mode every node is pushed through the build pipeline in
//! topological order, once per requested build type. A failing node is
//! logged and recorded; the walk carries on with the next node. In export
//! mode nothing is built: the graph is rendered as an `ExternalProject`
//! list instead.

pub mod report;

pub use report::{NodeOutcome, NodeStatus, PassReport, RunReport};

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::core::{BuildContext, GleanError};
use crate::descriptor::{self, ExportProject};
use crate::pipeline::{BuildPipeline, NodeState};
use crate::process::ToolRunner;
use crate::resolver::DependencyGraph;
use crate::utils::fs::atomic_write;

/// What a run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Clone, configure, build and install every dependency
    Process,
    /// Render the export descriptor to stdout, or to the given file
    Export {
        /// Output file; stdout when `None`
        target: Option<PathBuf>,
    },
}

/// Walks a [`DependencyGraph`].
pub struct Orchestrator<'a, R> {
    context: &'a BuildContext,
    runner: &'a R,
}

impl<'a, R: ToolRunner> Orchestrator<'a, R> {
    /// Orchestrator over `context`.
    pub const fn new(context: &'a BuildContext, runner: &'a R) -> Self {
        Self {
            context,
            runner,
        }
    }

    /// Run `graph` in `mode`.
    pub async fn run(&self, graph: &mut DependencyGraph, mode: &RunMode) -> Result<RunReport> {
        match mode {
            RunMode::Process => self.process(graph).await,
            RunMode::Export {
                target,
            } => {
                let rendered = export(graph, self.context)?;
                match target {
                    Some(path) => {
                        atomic_write(path, rendered.as_bytes()).with_context(|| {
                            format!("Failed to write export file {}", path.display())
                        })?;
                        tracing::info!("Wrote {}", path.display());
                    }
                    None => print!("{rendered}"),
                }
                Ok(RunReport::default())
            }
        }
    }

    /// Build every node for every requested build type.
    pub async fn process(&self, graph: &mut DependencyGraph) -> Result<RunReport> {
        let order = graph.topological_order()?;
        let pipeline = BuildPipeline::new(self.context, self.runner);
        let mut report = RunReport::default();

        for build_type in self.context.build_selection.passes() {
            tracing::info!("Starting {build_type} pass over {} dependencies", order.len());
            let mut pass = PassReport::new(build_type);

            for name in &order {
                let failed_deps: Vec<String> = graph
                    .get_direct_deps(name)
                    .into_iter()
                    .filter(|dep| {
                        pass.outcomes.iter().any(|o| &o.project_name == dep && o.is_failure())
                    })
                    .collect();
                if !failed_deps.is_empty() {
                    tracing::warn!(
                        "Building '{name}' although its dependencies failed: {}",
                        failed_deps.join(", ")
                    );
                }

                let node = graph.get_mut(name).ok_or_else(|| GleanError::Other {
                    message: format!("project '{name}' missing from graph"),
                })?;
                let outcome = pipeline.run(node, build_type).await?;
                debug_assert!(node.state.is_terminal());

                let status = NodeStatus::from(outcome);
                if let NodeStatus::Failed {
                    step,
                    reason,
                } = &status
                {
                    tracing::error!("'{name}' failed at {step} ({build_type}): {reason}");
                }
                pass.outcomes.push(NodeOutcome {
                    project_name: name.clone(),
                    status,
                });
            }

            report.passes.push(pass);
        }

        Ok(report)
    }
}

/// Render the export descriptor for `graph` in build order.
pub fn export(graph: &DependencyGraph, context: &BuildContext) -> Result<String> {
    let order = graph.topological_order()?;
    let mut projects = Vec::with_capacity(order.len());
    for name in &order {
        let Some(node) = graph.get(name) else {
            continue;
        };
        if matches!(node.state, NodeState::Failed { .. }) {
            tracing::warn!("'{name}' could not be fetched; exporting it anyway");
        }
        let args = node.effective_cmake_args(&context.default_cmake_args);
        projects.push(ExportProject::new(&node.spec, node.has_manifest, &args, graph.get_direct_deps(name)));
    }
    descriptor::render_export(&projects, &context.install_prefix)
}
