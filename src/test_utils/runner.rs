//! Scripted tool runner.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::action::Step;
use crate::constants::MANIFEST_FILE_NAME;
use crate::process::{ActionStatus, Invocation, OutputSink, Stream, ToolRunner};

/// A [`ToolRunner`] that never spawns anything.
///
/// Every call is recorded. Calls succeed unless their `(project, step)` was
/// registered with [`ScriptedRunner::fail_step`]. A successful clone creates
/// the destination with a placeholder `CMakeLists.txt`, plus the manifest
/// registered with [`ScriptedRunner::plant_manifest`] for that project. The
/// clone is checked out at [`ScriptedRunner::INITIAL_COMMIT`]; projects
/// registered with [`ScriptedRunner::advance_on_pull`] get a new commit on
/// every pull.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    invocations: Mutex<Vec<Invocation>>,
    failures: HashSet<(String, Step)>,
    manifests: HashMap<String, String>,
    moving: HashSet<String>,
    output: Vec<String>,
}

impl ScriptedRunner {
    /// Commit every scripted clone starts at.
    pub const INITIAL_COMMIT: &'static str = "0000000000000000000000000000000000000001";

    /// Runner where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `step` fail for `project`.
    #[must_use]
    pub fn fail_step(mut self, project: &str, step: Step) -> Self {
        self.failures.insert((project.to_string(), step));
        self
    }

    /// Drop `manifest_json` as `glean.json` into `project`'s tree on clone.
    #[must_use]
    pub fn plant_manifest(mut self, project: &str, manifest_json: impl Into<String>) -> Self {
        self.manifests.insert(project.to_string(), manifest_json.into());
        self
    }

    /// Simulate a branch that gains a commit before every pull of `project`.
    #[must_use]
    pub fn advance_on_pull(mut self, project: &str) -> Self {
        self.moving.insert(project.to_string());
        self
    }

    /// Emit `line` on stdout for every call.
    #[must_use]
    pub fn with_output(mut self, line: impl Into<String>) -> Self {
        self.output.push(line.into());
        self
    }

    /// Every recorded invocation, in call order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// `(project, step)` of every call, in call order.
    pub fn calls(&self) -> Vec<(String, Step)> {
        self.invocations().into_iter().map(|i| (i.project, i.step)).collect()
    }

    /// Steps run for `project`, in call order.
    pub fn steps_for(&self, project: &str) -> Vec<Step> {
        self.invocations().into_iter().filter(|i| i.project == project).map(|i| i.step).collect()
    }

    /// How often `step` ran for `project`.
    pub fn count_step(&self, project: &str, step: Step) -> usize {
        self.steps_for(project).into_iter().filter(|s| *s == step).count()
    }

    /// Whether any cmake step ran at all.
    pub fn ran_cmake(&self) -> bool {
        self.invocations()
            .iter()
            .any(|i| matches!(i.step, Step::Configure | Step::Build | Step::Install))
    }

    fn populate_clone(&self, invocation: &Invocation) {
        let Some(destination) = invocation.args.last().map(PathBuf::from) else {
            return;
        };
        let _ = std::fs::create_dir_all(&destination);
        let _ = std::fs::write(
            destination.join("CMakeLists.txt"),
            format!("project({})\n", invocation.project),
        );
        if let Some(manifest) = self.manifests.get(&invocation.project) {
            let _ = std::fs::write(destination.join(MANIFEST_FILE_NAME), manifest);
        }
        write_head(&destination, Self::INITIAL_COMMIT);
    }

    fn advance(&self, invocation: &Invocation) {
        if self.moving.contains(&invocation.project) {
            let pulls = self.count_step(&invocation.project, Step::Pull) + 1;
            write_head(&invocation.working_dir, &format!("{pulls:040x}"));
        }
    }
}

impl ToolRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation, sink: &mut dyn OutputSink) -> ActionStatus {
        if let Ok(mut calls) = self.invocations.lock() {
            calls.push(invocation.clone());
        }

        for line in &self.output {
            sink.line(Stream::Stdout, line);
        }

        if self.failures.contains(&(invocation.project.clone(), invocation.step)) {
            return ActionStatus::Failed {
                code: Some(1),
            };
        }

        match invocation.step {
            Step::Clone => self.populate_clone(invocation),
            Step::Pull => self.advance(invocation),
            _ => {}
        }
        ActionStatus::Success
    }
}

fn write_head(source_dir: &Path, commit: &str) {
    let git_dir = source_dir.join(".git");
    let _ = std::fs::create_dir_all(&git_dir);
    let _ = std::fs::write(git_dir.join("HEAD"), format!("{commit}\n"));
}
