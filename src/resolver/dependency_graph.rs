//! Dependency graph over discovered nodes.
//!
//! Nodes are keyed by `project_name`. An edge `a → b` means `a` depends on
//! `b`, so `b` must be installed first. The graph provides cycle detection
//! and a children-first build order.

use anyhow::Result;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::action::Step;
use crate::cache::CacheEntry;
use crate::core::GleanError;
use crate::manifest::{DependencyOption, DependencySpec, options::effective_cmake_args};
use crate::pipeline::{NodeState, PipelineOutcome};

/// One dependency with its cache layout and pipeline state.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    /// The manifest entry that introduced the node
    pub spec: DependencySpec,
    /// Paths under the cache root
    pub cache: CacheEntry,
    /// Option override from `glean_options.json`
    pub option_override: Option<DependencyOption>,
    /// Pipeline state
    pub state: NodeState,
    /// Whether the source tree carries its own `glean.json`
    pub has_manifest: bool,
    /// Whether the source tree has been acquired during this run
    pub source_acquired: bool,
}

impl DependencyNode {
    /// New node in the `Discovered` state.
    #[must_use]
    pub fn new(spec: DependencySpec, cache_root: &Path, option_override: Option<DependencyOption>) -> Self {
        let cache = CacheEntry::layout_for(&spec, cache_root);
        Self {
            spec,
            cache,
            option_override,
            state: NodeState::Discovered,
            has_manifest: false,
            source_acquired: false,
        }
    }

    /// The node's key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.project_name
    }

    /// Global defaults merged with this node's override.
    #[must_use]
    pub fn effective_cmake_args(&self, defaults: &[String]) -> Vec<String> {
        effective_cmake_args(defaults, self.option_override.as_ref())
    }

    /// Move to `Failed`.
    pub fn fail(&mut self, step: Step, reason: String) {
        self.state = NodeState::Failed {
            step,
            reason,
        };
    }

    /// Outcome matching the current terminal state.
    #[must_use]
    pub fn outcome(&self) -> PipelineOutcome {
        match &self.state {
            NodeState::Failed {
                step,
                reason,
            } => PipelineOutcome::Failed {
                step: *step,
                reason: reason.clone(),
            },
            _ => PipelineOutcome::Installed,
        }
    }
}

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is on the DFS stack.
    Gray,
    /// Node and everything below it is done.
    Black,
}

/// Discovered dependencies and their edges.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<DependencyNode, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node` unless a node with the same name exists. Returns whether it was inserted.
    pub fn add_node(&mut self, node: DependencyNode) -> bool {
        if self.node_map.contains_key(node.name()) {
            return false;
        }
        let name = node.name().to_string();
        let index = self.graph.add_node(node);
        self.node_map.insert(name, index);
        true
    }

    /// Record that `from` depends on `to`. Both must already be nodes.
    pub fn add_dependency(&mut self, from: &str, to: &str) -> Result<()> {
        let (Some(&from_idx), Some(&to_idx)) = (self.node_map.get(from), self.node_map.get(to))
        else {
            return Err(GleanError::Other {
                message: format!("cannot add edge {from} → {to}: unknown project"),
            }
            .into());
        };

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
        Ok(())
    }

    /// Node by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DependencyNode> {
        self.node_map.get(name).map(|&idx| &self.graph[idx])
    }

    /// Mutable node by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut DependencyNode> {
        self.node_map.get(name).map(|&idx| &mut self.graph[idx])
    }

    /// Whether a node with `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    /// Fail with [`GleanError::CyclicDependency`] if any cycle exists.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|idx| (idx, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                let names: Vec<String> =
                    cycle.iter().map(|&idx| self.graph[idx].name().to_string()).collect();
                let chain = names.join(" → ");
                let mut projects = names;
                projects.pop();
                return Err(GleanError::CyclicDependency {
                    chain,
                    projects,
                }
                .into());
            }
        }

        Ok(())
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.graph.neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|&n| n == neighbor).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Project names in build order: every node after all of its dependencies.
    ///
    /// Roots keep discovery order and the dependencies of one node are built in
    /// the order they were declared.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        self.detect_cycles()?;

        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut visited = HashSet::new();
        for start in self.graph.node_indices() {
            self.post_order(start, &mut visited, &mut order);
        }
        Ok(order)
    }

    fn post_order(&self, node: NodeIndex, visited: &mut HashSet<NodeIndex>, order: &mut Vec<String>) {
        if !visited.insert(node) {
            return;
        }
        for dep in self.declared_deps(node) {
            self.post_order(dep, visited, order);
        }
        order.push(self.graph[node].name().to_string());
    }

    fn declared_deps(&self, node: NodeIndex) -> Vec<NodeIndex> {
        // petgraph yields the most recently added edge first.
        let mut deps: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        deps.reverse();
        deps
    }

    /// Direct dependencies of `name`, in the order they were declared.
    #[must_use]
    pub fn get_direct_deps(&self, name: &str) -> Vec<String> {
        let Some(&idx) = self.node_map.get(name) else {
            return Vec::new();
        };
        self.declared_deps(idx).into_iter().map(|n| self.graph[n].name().to_string()).collect()
    }

    /// Nodes nothing else depends on, in discovery order.
    #[must_use]
    pub fn roots(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph.neighbors_directed(idx, petgraph::Direction::Incoming).next().is_none()
            })
            .map(|idx| self.graph[idx].name().to_string())
            .collect()
    }

    /// All nodes in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// Check if the graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Human-readable tree of every root and its dependencies.
    #[must_use]
    pub fn to_tree_string(&self) -> String {
        let mut result = String::new();
        let roots = self.roots();
        for (i, root) in roots.iter().enumerate() {
            let mut visited = HashSet::new();
            self.build_tree_string(root, &mut result, "", i == roots.len() - 1, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        name: &str,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<String>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        let label = match self.get(name).and_then(|n| n.spec.reference()) {
            Some(reference) => format!("{name}@{reference}"),
            None => name.to_string(),
        };
        result.push_str(&format!("{prefix}{connector}{label}\n"));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if !visited.insert(name.to_string()) {
            result.push_str(&format!("{child_prefix}└── (circular reference)\n"));
            return;
        }

        let deps = self.get_direct_deps(name);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, result, &child_prefix, i == deps.len() - 1, visited);
        }
        visited.remove(name);
    }
}
