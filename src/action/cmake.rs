//! CMake invocations for configure, build and install.

use std::path::PathBuf;

use super::Step;
use crate::core::BuildType;

/// One cmake call. All variants run inside the build directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmakeAction {
    /// Configure `source_dir` into `build_dir`.
    Configure {
        /// Dependency source tree
        source_dir: PathBuf,
        /// Per build type binary directory
        build_dir: PathBuf,
        /// Initial cache script passed with `-C`
        descriptor: Option<PathBuf>,
        /// `CMAKE_BUILD_TYPE`
        build_type: BuildType,
        /// Shared install prefix; also the package search prefix
        install_prefix: PathBuf,
        /// Whether the dependency has its own `glean.json`
        has_glean: bool,
        /// Effective extra arguments, appended last
        custom_args: Vec<String>,
    },
    /// `cmake --build <dir> --config <T> --parallel <jobs>`
    Build {
        /// Binary directory
        build_dir: PathBuf,
        /// Configuration to build
        build_type: BuildType,
        /// Compile parallelism
        jobs: u32,
    },
    /// `cmake --install <dir> --config <T>`
    Install {
        /// Binary directory
        build_dir: PathBuf,
        /// Configuration to install
        build_type: BuildType,
    },
}

impl CmakeAction {
    /// Pipeline step of this call.
    #[must_use]
    pub const fn step(&self) -> Step {
        match self {
            Self::Configure { .. } => Step::Configure,
            Self::Build { .. } => Step::Build,
            Self::Install { .. } => Step::Install,
        }
    }

    /// Arguments passed to cmake.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        match self {
            Self::Configure {
                source_dir,
                build_dir,
                descriptor,
                build_type,
                install_prefix,
                has_glean,
                custom_args,
            } => {
                let prefix = install_prefix.display();
                let mut args = vec![
                    "-S".to_string(),
                    source_dir.display().to_string(),
                    "-B".to_string(),
                    build_dir.display().to_string(),
                ];
                if let Some(descriptor) = descriptor {
                    args.push("-C".to_string());
                    args.push(descriptor.display().to_string());
                }
                args.push(format!("-DCMAKE_BUILD_TYPE={}", build_type.cmake_name()));
                args.push(format!("-DCMAKE_INSTALL_PREFIX={prefix}"));
                args.push(format!("-DCMAKE_PREFIX_PATH={prefix}"));
                // Nested glean projects locate their own dependencies through this.
                if *has_glean {
                    args.push(format!("-DGLEAN_INSTALL_ROOT={prefix}"));
                }
                args.extend(custom_args.iter().cloned());
                args
            }
            Self::Build {
                build_dir,
                build_type,
                jobs,
            } => vec![
                "--build".to_string(),
                build_dir.display().to_string(),
                "--config".to_string(),
                build_type.cmake_name().to_string(),
                "--parallel".to_string(),
                jobs.to_string(),
            ],
            Self::Install {
                build_dir,
                build_type,
            } => vec![
                "--install".to_string(),
                build_dir.display().to_string(),
                "--config".to_string(),
                build_type.cmake_name().to_string(),
            ],
        }
    }
}
