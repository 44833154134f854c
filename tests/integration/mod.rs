//! Integration test suite for glean
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: argument handling and fatal error exit codes of the binary
//! - **resolution**: discovery and orchestration end to end with a scripted runner
//! - **file_url**: real git clones from `file://` repositories (skipped without git)
//! - **build**: a real CMake configure/build/install (skipped without git or cmake)

#[path = "../common/mod.rs"]
mod common;

mod build;
mod cli;
mod file_url;
mod resolution;
