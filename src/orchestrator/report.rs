//! Per-run outcome report.

use colored::Colorize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::action::Step;
use crate::core::{BuildType, GleanError};
use crate::pipeline::PipelineOutcome;

/// Final status of one node in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeStatus {
    /// Configured, built and installed in this pass
    Installed,
    /// Skipped because the last install is still current
    UpToDate,
    /// A step failed
    Failed {
        /// Failing step
        step: Step,
        /// Tool status and trailing output
        reason: String,
    },
}

impl From<PipelineOutcome> for NodeStatus {
    fn from(outcome: PipelineOutcome) -> Self {
        match outcome {
            PipelineOutcome::Installed => Self::Installed,
            PipelineOutcome::UpToDate => Self::UpToDate,
            PipelineOutcome::Failed {
                step,
                reason,
            } => Self::Failed {
                step,
                reason,
            },
        }
    }
}

/// Outcome of one node in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOutcome {
    /// The node
    pub project_name: String,
    /// What happened
    pub status: NodeStatus,
}

impl NodeOutcome {
    /// Whether the node failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.status, NodeStatus::Failed { .. })
    }
}

/// Outcomes of one build type pass, in build order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Build type of the pass
    pub build_type: BuildType,
    /// One entry per node
    pub outcomes: Vec<NodeOutcome>,
}

impl PassReport {
    /// Empty report for `build_type`.
    #[must_use]
    pub const fn new(build_type: BuildType) -> Self {
        Self {
            build_type,
            outcomes: Vec::new(),
        }
    }

    /// Number of nodes with `status` matching `pred`.
    fn count(&self, pred: impl Fn(&NodeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    /// Nodes installed in this pass.
    #[must_use]
    pub fn installed(&self) -> usize {
        self.count(|s| matches!(s, NodeStatus::Installed))
    }

    /// Nodes skipped as up to date.
    #[must_use]
    pub fn up_to_date(&self) -> usize {
        self.count(|s| matches!(s, NodeStatus::UpToDate))
    }

    /// Failed nodes.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, NodeStatus::Failed { .. }))
    }
}

/// Everything that happened in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// One report per pass, in execution order
    pub passes: Vec<PassReport>,
}

impl RunReport {
    /// Every failed outcome across all passes.
    pub fn failures(&self) -> impl Iterator<Item = &NodeOutcome> {
        self.passes.iter().flat_map(|p| p.outcomes.iter()).filter(|o| o.is_failure())
    }

    /// Whether no node failed in any pass.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Aggregate error for strict mode, `None` when everything succeeded.
    #[must_use]
    pub fn failure_error(&self) -> Option<GleanError> {
        let count = self.failures().count();
        if count == 0 {
            return None;
        }
        let projects: BTreeSet<String> = self.failures().map(|o| o.project_name.clone()).collect();
        Some(GleanError::BuildFailures {
            count,
            projects: projects.into_iter().collect(),
        })
    }

    /// Colored multi-line summary for the terminal.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for pass in &self.passes {
            let _ = writeln!(out, "{}", format!("{} build", pass.build_type).bold());
            for outcome in &pass.outcomes {
                let _ = match &outcome.status {
                    NodeStatus::Installed => {
                        writeln!(out, "  {} {} installed", "✓".green(), outcome.project_name)
                    }
                    NodeStatus::UpToDate => writeln!(
                        out,
                        "  {} {} {}",
                        "✓".green(),
                        outcome.project_name,
                        "up to date".dimmed()
                    ),
                    NodeStatus::Failed {
                        step,
                        ..
                    } => writeln!(
                        out,
                        "  {} {} {}",
                        "✗".red(),
                        outcome.project_name,
                        format!("{step} failed").red()
                    ),
                };
            }
            let _ = writeln!(
                out,
                "  {} installed, {} up to date, {} failed",
                pass.installed(),
                pass.up_to_date(),
                pass.failed()
            );
        }
        out
    }
}
