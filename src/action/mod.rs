//! Argument builders for every external tool invocation.
//!
//! Each action describes exactly one `git` or `cmake` call. Building its
//! arguments is pure: no filesystem access, no environment lookups. The
//! [`crate::process`] module is the only place that turns them into processes.

pub mod cmake;
pub mod git;

pub use cmake::CmakeAction;
pub use git::GitAction;

use std::fmt;

use crate::core::BuildContext;

/// Pipeline step an action belongs to, used in logs and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// `git clone`
    Clone,
    /// `git pull --ff-only`
    Pull,
    /// `git checkout <ref>`
    Checkout,
    /// `git reset --hard`
    Reset,
    /// Descriptor write plus `cmake -S ... -B ...`
    Configure,
    /// `cmake --build`
    Build,
    /// `cmake --install`
    Install,
}

impl Step {
    /// Lowercase step name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clone => "clone",
            Self::Pull => "pull",
            Self::Checkout => "checkout",
            Self::Reset => "reset",
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either kind of tool action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A git invocation
    Git(GitAction),
    /// A cmake invocation
    Cmake(CmakeAction),
}

impl Action {
    /// The executable this action runs, as configured in the context.
    #[must_use]
    pub fn tool<'a>(&self, context: &'a BuildContext) -> &'a str {
        match self {
            Self::Git(_) => &context.git_binary,
            Self::Cmake(_) => &context.cmake_binary,
        }
    }

    /// The step this action implements.
    #[must_use]
    pub const fn step(&self) -> Step {
        match self {
            Self::Git(action) => action.step(),
            Self::Cmake(action) => action.step(),
        }
    }

    /// Full argument list, tool name excluded.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        match self {
            Self::Git(action) => action.build_args(),
            Self::Cmake(action) => action.build_args(),
        }
    }
}

impl From<GitAction> for Action {
    fn from(action: GitAction) -> Self {
        Self::Git(action)
    }
}

impl From<CmakeAction> for Action {
    fn from(action: CmakeAction) -> Self {
        Self::Cmake(action)
    }
}
