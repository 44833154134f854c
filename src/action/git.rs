//! Git invocations used for source acquisition.

use std::path::PathBuf;

use super::Step;

/// One git call. Every variant except [`GitAction::Clone`] runs inside the
/// dependency's source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitAction {
    /// `git clone [--recurse-submodules] <remote> <destination>`
    Clone {
        /// Remote to clone
        remote_uri: String,
        /// Pass `--recurse-submodules`
        recurse_submodules: bool,
        /// Target directory of the clone
        destination: PathBuf,
    },
    /// `git checkout <ref>`
    Checkout {
        /// Branch, tag or commit
        reference: String,
    },
    /// `git pull --ff-only`
    Pull,
    /// `git reset --hard`
    Reset,
}

impl GitAction {
    /// Clone `remote_uri` into `destination`.
    pub fn clone_into(
        remote_uri: impl Into<String>,
        recurse_submodules: bool,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self::Clone {
            remote_uri: remote_uri.into(),
            recurse_submodules,
            destination: destination.into(),
        }
    }

    /// Check out `reference`.
    pub fn checkout_version(reference: impl Into<String>) -> Self {
        Self::Checkout {
            reference: reference.into(),
        }
    }

    /// Pipeline step of this call.
    #[must_use]
    pub const fn step(&self) -> Step {
        match self {
            Self::Clone { .. } => Step::Clone,
            Self::Checkout { .. } => Step::Checkout,
            Self::Pull => Step::Pull,
            Self::Reset => Step::Reset,
        }
    }

    /// Arguments passed to git.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        match self {
            Self::Clone {
                remote_uri,
                recurse_submodules,
                destination,
            } => {
                let mut args = vec!["clone".to_string()];
                if *recurse_submodules {
                    args.push("--recurse-submodules".to_string());
                }
                args.push(remote_uri.clone());
                args.push(destination.display().to_string());
                args
            }
            Self::Checkout {
                reference,
            } => vec!["checkout".to_string(), reference.clone()],
            Self::Pull => vec!["pull".to_string(), "--ff-only".to_string()],
            Self::Reset => vec!["reset".to_string(), "--hard".to_string()],
        }
    }
}
