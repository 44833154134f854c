//! Core types shared by every layer of glean.
//!
//! - [`error`] - the [`GleanError`] taxonomy and the CLI-facing [`ErrorContext`]
//! - [`context`] - the immutable [`BuildContext`] threaded through a run

pub mod context;
pub mod error;

pub use context::{BuildContext, BuildSelection, BuildType, PassContext, UpdatePolicy};
pub use error::{ErrorContext, GleanError, user_friendly_error};
