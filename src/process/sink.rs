//! Destinations for streamed tool output.

use std::collections::VecDeque;

use crate::constants::OUTPUT_TAIL_LINES;

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// Receives tool output one line at a time.
pub trait OutputSink {
    /// Handle one line, without its trailing newline.
    fn line(&mut self, stream: Stream, line: &str);
}

/// Logs every line at debug level and keeps the most recent ones so a failed
/// step can report what the tool said last.
#[derive(Debug)]
pub struct TailSink {
    project: String,
    capacity: usize,
    lines: VecDeque<String>,
}

impl TailSink {
    /// Sink for `project` keeping [`OUTPUT_TAIL_LINES`] lines.
    pub fn new(project: impl Into<String>) -> Self {
        Self::with_capacity(project, OUTPUT_TAIL_LINES)
    }

    /// Sink keeping at most `capacity` lines.
    pub fn with_capacity(project: impl Into<String>, capacity: usize) -> Self {
        Self {
            project: project.into(),
            capacity,
            lines: VecDeque::with_capacity(capacity),
        }
    }

    /// Retained lines, oldest first.
    #[must_use]
    pub fn tail(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    /// Retained lines joined by newlines; empties the buffer.
    pub fn take_tail(&mut self) -> String {
        let text = self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n");
        self.lines.clear();
        text
    }
}

impl OutputSink for TailSink {
    fn line(&mut self, stream: Stream, line: &str) {
        match stream {
            Stream::Stdout => tracing::debug!(target: "glean::process", "[{}] {line}", self.project),
            Stream::Stderr => {
                tracing::debug!(target: "glean::process", "[{}] (stderr) {line}", self.project);
            }
        }

        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }
}
