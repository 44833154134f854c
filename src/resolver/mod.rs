//! Recursive dependency discovery.
//!
//! Discovery is a worklist over project names. Starting from the root
//! manifest's entries, each new dependency gets its cache entry materialized
//! and its source acquired through the build pipeline; its source tree is then
//! checked for a nested `glean.json` whose entries join the worklist with an
//! edge from the parent. Every node is acquired at most once.
//!
//! # Reconciling repeated names
//!
//! The same `project_name` can appear in several manifests:
//!
//! - same ref: one node, the new parent only adds an edge;
//! - different ref: the first declaration wins and a warning names both refs.
//!
//! # Failure handling
//!
//! A dependency whose source acquisition fails stays in the graph as
//! `Failed`; nothing below it can be discovered. Manifest syntax errors,
//! unusable cache paths and cycles abort resolution before any build step.

pub mod dependency_graph;

pub use dependency_graph::{DependencyGraph, DependencyNode};

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::Path;

use crate::constants::MANIFEST_FILE_NAME;
use crate::core::BuildContext;
use crate::manifest::{DependencyOptions, DependencySpec, Manifest};
use crate::pipeline::BuildPipeline;
use crate::process::ToolRunner;

/// Builds the [`DependencyGraph`] for one run.
pub struct Resolver<'a, R> {
    context: &'a BuildContext,
    options: &'a DependencyOptions,
    runner: &'a R,
}

impl<'a, R: ToolRunner> Resolver<'a, R> {
    /// Resolver using `runner` for source acquisition.
    pub const fn new(context: &'a BuildContext, options: &'a DependencyOptions, runner: &'a R) -> Self {
        Self {
            context,
            options,
            runner,
        }
    }

    /// Load the root manifest at `root_manifest` and resolve everything below it.
    pub async fn resolve(&self, root_manifest: &Path) -> Result<DependencyGraph> {
        let manifest = Manifest::load(root_manifest)?;
        self.resolve_manifest(&manifest).await
    }

    /// Resolve an already loaded root manifest.
    pub async fn resolve_manifest(&self, manifest: &Manifest) -> Result<DependencyGraph> {
        let pipeline = BuildPipeline::new(self.context, self.runner);
        let mut graph = DependencyGraph::new();
        let mut frontier: VecDeque<(Option<String>, DependencySpec)> =
            manifest.dependencies.iter().cloned().map(|spec| (None, spec)).collect();

        while let Some((parent, spec)) = frontier.pop_front() {
            let name = spec.project_name.clone();

            if let Some(existing) = graph.get(&name) {
                if existing.spec.reference() != spec.reference() {
                    tracing::warn!(
                        target: "glean::resolver",
                        "Conflicting refs for '{name}': keeping {} (first declared), ignoring {}{}",
                        existing.spec.reference().unwrap_or("<default branch>"),
                        spec.reference().unwrap_or("<default branch>"),
                        parent.as_deref().map(|p| format!(" requested by '{p}'")).unwrap_or_default()
                    );
                }
            } else {
                let (node, children) = self.discover(&pipeline, spec).await?;
                frontier.extend(children.into_iter().map(|child| (Some(name.clone()), child)));
                graph.add_node(node);
            }

            if let Some(parent) = parent {
                tracing::trace!(target: "glean::resolver", "Edge {parent} → {name}");
                graph.add_dependency(&parent, &name)?;
            }
        }

        graph.detect_cycles()?;

        tracing::info!(
            target: "glean::resolver",
            "Resolved {} dependencies ({} edges)",
            graph.node_count(),
            graph.edge_count()
        );
        if !graph.is_empty() {
            tracing::debug!(target: "glean::resolver", "Dependency tree:\n{}", graph.to_tree_string());
        }
        Ok(graph)
    }

    /// Create, materialize and acquire one new node. Returns the node and the
    /// dependencies its nested manifest declares.
    async fn discover(
        &self,
        pipeline: &BuildPipeline<'_, R>,
        spec: DependencySpec,
    ) -> Result<(DependencyNode, Vec<DependencySpec>)> {
        let option = self.options.get(&spec.project_name).cloned();
        let mut node = DependencyNode::new(spec, &self.context.cache_root, option);
        node.cache.materialize().with_context(|| {
            format!("Failed to prepare cache directory for '{}'", node.name())
        })?;

        if !pipeline.acquire_source(&mut node).await {
            tracing::warn!(
                target: "glean::resolver",
                "Could not acquire '{}'; its dependencies cannot be discovered",
                node.name()
            );
            return Ok((node, Vec::new()));
        }

        let nested_path = node.cache.source_dir.join(MANIFEST_FILE_NAME);
        if !nested_path.is_file() {
            return Ok((node, Vec::new()));
        }

        node.has_manifest = true;
        let nested = Manifest::load(&nested_path)
            .with_context(|| format!("Failed to load manifest of '{}'", node.name()))?;
        tracing::debug!(
            target: "glean::resolver",
            "'{}' declares {} dependencies",
            node.name(),
            nested.dependencies.len()
        );
        Ok((node, nested.dependencies))
    }
}
