//! Install stamps for the `stamp` update policy.
//!
//! A stamp records the fingerprint of the last successful install of one
//! build type. The fingerprint covers the commit checked out in the source
//! tree, so a branch that moved on `pull` never reads as up to date.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;

use super::CacheEntry;
use crate::core::{BuildType, PassContext};
use crate::manifest::DependencySpec;
use crate::utils::fs::atomic_write;

/// SHA-256 over everything that changes what an install produces.
#[must_use]
pub fn fingerprint(
    spec: &DependencySpec,
    revision: &str,
    effective_args: &[String],
    pass: PassContext<'_>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"remote\0");
    hasher.update(spec.remote_uri.as_bytes());
    hasher.update(b"\0ref\0");
    hasher.update(spec.reference().unwrap_or_default().as_bytes());
    hasher.update(b"\0commit\0");
    hasher.update(revision.as_bytes());
    hasher.update(b"\0prefix\0");
    hasher.update(pass.install_prefix().to_string_lossy().as_bytes());
    hasher.update(b"\0type\0");
    hasher.update(pass.build_type.dir_name().as_bytes());
    for arg in effective_args {
        hasher.update(b"\0arg\0");
        hasher.update(arg.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Commit checked out in `source_dir`, read from the repository metadata.
///
/// Follows a symbolic `HEAD` through loose refs and then `packed-refs`.
/// `None` when the tree is not a git checkout or the ref cannot be resolved.
#[must_use]
pub fn source_revision(source_dir: &Path) -> Option<String> {
    let git_dir = source_dir.join(".git");
    let head = std::fs::read_to_string(git_dir.join("HEAD")).ok()?;
    let head = head.trim();

    let Some(reference) = head.strip_prefix("ref: ") else {
        return is_commit_id(head).then(|| head.to_string());
    };
    if let Ok(loose) = std::fs::read_to_string(git_dir.join(reference)) {
        let loose = loose.trim();
        return is_commit_id(loose).then(|| loose.to_string());
    }

    let packed = std::fs::read_to_string(git_dir.join("packed-refs")).ok()?;
    packed.lines().filter(|line| !line.starts_with(['#', '^'])).find_map(|line| {
        let (id, name) = line.split_once(' ')?;
        (name == reference && is_commit_id(id)).then(|| id.to_string())
    })
}

fn is_commit_id(s: &str) -> bool {
    matches!(s.len(), 40 | 64) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Record a successful install.
pub fn write(
    entry: &CacheEntry,
    spec: &DependencySpec,
    effective_args: &[String],
    pass: PassContext<'_>,
) -> Result<()> {
    let revision = source_revision(&entry.source_dir).with_context(|| {
        format!("No checked-out commit found in {}", entry.source_dir.display())
    })?;
    let value = fingerprint(spec, &revision, effective_args, pass);
    atomic_write(&entry.stamp_file(pass.build_type), value.as_bytes())
}

/// Forget the last install of `build_type`. A missing stamp is fine.
pub fn clear(entry: &CacheEntry, build_type: BuildType) -> Result<()> {
    let path = entry.stamp_file(build_type);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove install stamp {}", path.display())),
    }
}

/// Read a stamp; unreadable or missing stamps read as `None`.
#[must_use]
pub fn read(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}
