//! External process execution.
//!
//! This is the only module that spawns processes. Everything else describes
//! work as [`Invocation`]s and hands them to a [`ToolRunner`], which lets the
//! pipeline run against [`ProcessRunner`] in production and a scripted runner
//! in tests.

mod guard;
mod sink;

pub use guard::WorkingDirGuard;
pub use sink::{OutputSink, Stream, TailSink};

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::action::{Action, Step};
use crate::core::BuildContext;

/// One fully resolved tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Project the call belongs to (log context only)
    pub project: String,
    /// Pipeline step
    pub step: Step,
    /// Executable name or path
    pub tool: String,
    /// Arguments, tool excluded
    pub args: Vec<String>,
    /// Effective working directory for the call
    pub working_dir: PathBuf,
}

impl Invocation {
    /// Resolve `action` against the context's tool binaries.
    ///
    /// A relative `working_dir` is anchored to the current directory here, so
    /// the runner's directory switch and the child's own working directory
    /// agree.
    pub fn new(
        project: impl Into<String>,
        action: &Action,
        context: &BuildContext,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        let working_dir = working_dir.into();
        Self {
            project: project.into(),
            step: action.step(),
            tool: action.tool(context).to_string(),
            args: action.build_args(),
            working_dir: std::path::absolute(&working_dir).unwrap_or(working_dir),
        }
    }

    /// `tool arg1 arg2 ...` for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.tool.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    /// Exit code zero
    Success,
    /// The tool ran and exited non-zero (or was killed by a signal)
    Failed {
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
    },
    /// The tool could not be started
    LaunchFailed {
        /// Why the launch failed
        reason: String,
    },
}

impl ActionStatus {
    /// Whether the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Short description of a failure.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Success => "success".to_string(),
            Self::Failed {
                code: Some(code),
            } => format!("exited with status {code}"),
            Self::Failed {
                code: None,
            } => "terminated by signal".to_string(),
            Self::LaunchFailed {
                reason,
            } => format!("could not be launched: {reason}"),
        }
    }
}

/// Runs tool invocations.
pub trait ToolRunner {
    /// Run `invocation`, streaming its output to `sink` line by line.
    fn run(
        &self,
        invocation: &Invocation,
        sink: &mut dyn OutputSink,
    ) -> impl Future<Output = ActionStatus>;
}

/// [`ToolRunner`] backed by real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation, sink: &mut dyn OutputSink) -> ActionStatus {
        let start = std::time::Instant::now();
        tracing::debug!(
            target: "glean::process",
            "({}) Executing in {}: {}",
            invocation.project,
            invocation.working_dir.display(),
            invocation.command_line()
        );

        let _guard = match WorkingDirGuard::enter(&invocation.working_dir) {
            Ok(guard) => guard,
            Err(e) => {
                return ActionStatus::LaunchFailed {
                    reason: format!("{e:#}"),
                };
            }
        };

        let status = stream_child(invocation, sink).await;

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(
                target: "glean::process::perf",
                "({}) {} took {:.2}s",
                invocation.project,
                invocation.step,
                elapsed.as_secs_f64()
            );
        }
        if !status.is_success() {
            tracing::debug!(
                target: "glean::process",
                "({}) {} {}",
                invocation.project,
                invocation.tool,
                status.describe()
            );
        }
        status
    }
}

async fn stream_child(invocation: &Invocation, sink: &mut dyn OutputSink) -> ActionStatus {
    let mut child = match Command::new(&invocation.tool)
        .args(&invocation.args)
        .current_dir(&invocation.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return ActionStatus::LaunchFailed {
                reason: format!("{}: {e}", invocation.tool),
            };
        }
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return ActionStatus::LaunchFailed {
            reason: "child output pipes unavailable".to_string(),
        };
    };

    // Tools are free to print bytes that are not UTF-8, so lines are read raw
    // and decoded lossily. Both pipes are read to EOF or the child can block.
    let mut stdout = BufReader::new(stdout);
    let mut stderr = BufReader::new(stderr);
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let mut stdout_open = true;
    let mut stderr_open = true;

    loop {
        tokio::select! {
            read = stdout.read_until(b'\n', &mut stdout_buf), if stdout_open => {
                stdout_open = forward_line(read, &mut stdout_buf, Stream::Stdout, sink);
            },
            read = stderr.read_until(b'\n', &mut stderr_buf), if stderr_open => {
                stderr_open = forward_line(read, &mut stderr_buf, Stream::Stderr, sink);
            },
            else => break,
        }
    }
    drop(stdout);
    drop(stderr);

    match child.wait().await {
        Ok(status) if status.success() => ActionStatus::Success,
        Ok(status) => ActionStatus::Failed {
            code: status.code(),
        },
        Err(e) => ActionStatus::LaunchFailed {
            reason: format!("failed waiting for {}: {e}", invocation.tool),
        },
    }
}

/// Hand one raw line to the sink. Returns whether the stream is still open.
fn forward_line(
    read: std::io::Result<usize>,
    buf: &mut Vec<u8>,
    stream: Stream,
    sink: &mut dyn OutputSink,
) -> bool {
    match read {
        Ok(0) => false,
        Ok(_) => {
            let line = String::from_utf8_lossy(buf);
            sink.line(stream, line.trim_end_matches(['\n', '\r']));
            buf.clear();
            true
        }
        Err(e) => {
            tracing::debug!(target: "glean::process", "{stream:?} read error: {e}");
            false
        }
    }
}
