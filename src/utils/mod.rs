//! Cross-platform helpers: tool names, home/path expansion and file writes.

pub mod fs;
pub mod platform;
