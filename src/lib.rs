//! glean - source-based dependency fetcher and CMake build orchestrator
//!
//! A project lists its third-party dependencies in `glean.json`. glean clones
//! each one with git into a per-dependency cache directory, looks inside the
//! fetched sources for their own `glean.json`, and repeats until the whole
//! dependency graph is known. It then configures, builds and installs every
//! dependency with CMake, children before parents, into one shared install
//! prefix.
//!
//! # Architecture Overview
//!
//! A run is a fixed sequence:
//!
//! 1. [`cli`] parses flags, [`config`] merges them with `~/.glean/config.toml`
//!    into an immutable [`core::BuildContext`]
//! 2. [`resolver`] walks manifests into a [`resolver::DependencyGraph`],
//!    acquiring each node's source once and rejecting cycles
//! 3. [`orchestrator`] drives every node through the [`pipeline`] in
//!    topological order for each requested build type, or renders the graph
//!    as a CMake `ExternalProject` list
//!
//! # Core Modules
//!
//! - [`action`] - git and CMake steps as closed enums producing argument lists
//! - [`process`] - running those steps as child processes, with output streaming
//! - [`cache`] - per-dependency cache layout and install stamps
//! - [`descriptor`] - per-node CMake initial-cache scripts and the export descriptor
//! - [`manifest`] - `glean.json` and `glean_options.json` parsing
//! - [`core`] - error taxonomy and the build context
//! - [`utils`] - filesystem and platform helpers
//!
//! # Manifest Format (glean.json)
//!
//! ```json
//! {
//!   "dependencies": [
//!     { "project_name": "fmt", "remote_uri": "https://github.com/fmtlib/fmt.git", "ref": "10.2.1" },
//!     { "project_name": "date", "remote_uri": "https://github.com/HowardHinnant/date.git" }
//!   ]
//! }
//! ```
//!
//! # Cache Layout
//!
//! ```text
//! <cache_root>/<project_name>/<escaped ref or %default>/
//! ├── src/                    cloned sources
//! ├── build/debug/            one build tree per build type
//! ├── build/release/
//! ├── glean_init.cmake        generated build descriptor
//! └── .glean_stamp_<type>     install fingerprints
//! ```

pub mod action;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod descriptor;
pub mod manifest;
pub mod orchestrator;
pub mod pipeline;
pub mod process;
pub mod resolver;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
