//! Global constants used throughout the glean codebase.
//!
//! File names, default locations and numeric defaults that more than one
//! module needs live here so the magic values stay discoverable.

/// Manifest file name looked up in the project root and in every fetched
/// dependency's source tree.
pub const MANIFEST_FILE_NAME: &str = "glean.json";

/// Optional per-dependency option override file, next to the root manifest.
pub const OPTIONS_FILE_NAME: &str = "glean_options.json";

/// Directory name of the default cache root under the user's home directory.
pub const DEFAULT_CACHE_DIR_NAME: &str = ".glean_cache";

/// Install prefix directory, relative to the working directory, used when
/// `--prefix` is not given.
pub const DEFAULT_PREFIX_DIR_NAME: &str = "glean_install";

/// Build descriptor written into every node's cache directory.
///
/// This is a CMake initial-cache script passed to the configure step with `-C`.
pub const DESCRIPTOR_FILE_NAME: &str = "glean_init.cmake";

/// Ref directory of a dependency that pins no ref. Starts with `%`, which
/// escaped refs never do.
pub const UNPINNED_REF_DIR_NAME: &str = "%default";

/// Source subdirectory of a cache entry.
pub const SOURCE_DIR_NAME: &str = "src";

/// Build subdirectory of a cache entry. Each build type gets its own child.
pub const BUILD_DIR_NAME: &str = "build";

/// Ref substituted into the descriptor when a dependency pins none.
pub const DEFAULT_REF: &str = "master";

/// Option name for extra CMake arguments in the option override file.
pub const CMAKE_ARGS_OPTION: &str = "cmake_args";

/// Prefix of the stamp file written after a successful install.
pub const STAMP_FILE_PREFIX: &str = ".glean_stamp";

/// Number of trailing tool output lines attached to a failed step.
pub const OUTPUT_TAIL_LINES: usize = 20;

/// Fallback compile parallelism when the CPU count cannot be detected.
pub const FALLBACK_JOBS: u32 = 2;

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "GLEAN_CACHE_DIR";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "GLEAN_CONFIG";

/// Default compile parallelism: the number of available cores.
pub fn default_jobs() -> u32 {
    std::thread::available_parallelism()
        .ok()
        .and_then(|n| u32::try_from(n.get()).ok())
        .unwrap_or(FALLBACK_JOBS)
}
