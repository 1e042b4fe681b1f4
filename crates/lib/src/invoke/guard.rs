//! Incremental build guard.
//!
//! Decides whether the external configure + build pass can be skipped. The
//! decision is driven by a named [`CachePolicy`] so the pipeline's contract
//! does not change when the policy does.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::util::hash::ContentHash;

/// When a previously built artifact may be reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
  /// Reuse the artifact whenever it exists. Stale artifacts are not detected.
  #[default]
  ArtifactExists,
  /// Never reuse; configure and build on every run.
  AlwaysBuild,
  /// Reuse only when the stamp next to the artifact matches the configure inputs.
  ConfigHash,
}

/// Why a build has to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildReason {
  ArtifactMissing,
  AlwaysBuild,
  StampMismatch,
}

/// Outcome of the guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
  Skip,
  Build(BuildReason),
}

/// Decide whether the configure + build pass is needed.
///
/// # Arguments
///
/// * `policy` - The cache policy in effect
/// * `artifact` - Path of the expected static library
/// * `stamp` - Stamp file consulted by [`CachePolicy::ConfigHash`]
/// * `fingerprint` - Hash of the configure inputs of this run
pub fn check(policy: CachePolicy, artifact: &Path, stamp: &Path, fingerprint: &ContentHash) -> GuardDecision {
  if policy == CachePolicy::AlwaysBuild {
    return GuardDecision::Build(BuildReason::AlwaysBuild);
  }

  if !artifact.is_file() {
    debug!(artifact = %artifact.display(), "artifact missing");
    return GuardDecision::Build(BuildReason::ArtifactMissing);
  }

  if policy == CachePolicy::ConfigHash {
    let recorded = fs::read_to_string(stamp).ok();
    if recorded.as_deref().map(str::trim) != Some(fingerprint.0.as_str()) {
      debug!(stamp = %stamp.display(), "build stamp does not match configuration");
      return GuardDecision::Build(BuildReason::StampMismatch);
    }
  }

  info!(artifact = %artifact.display(), policy = ?policy, "artifact up to date, skipping build");
  GuardDecision::Skip
}

/// Forget any recorded build before the build directory is touched.
///
/// A stamp must never outlive the artifact it describes, whatever policy
/// produced the next build.
pub fn clear(stamp: &Path) -> io::Result<()> {
  match fs::remove_file(stamp) {
    Ok(()) => {
      debug!(stamp = %stamp.display(), "removed build stamp");
      Ok(())
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e),
  }
}

/// Record a successful build for later [`check`] calls.
///
/// Only [`CachePolicy::ConfigHash`] writes a stamp; other policies remove a
/// stamp left behind by an earlier run.
pub fn record(policy: CachePolicy, stamp: &Path, fingerprint: &ContentHash) -> io::Result<()> {
  match policy {
    CachePolicy::ConfigHash => fs::write(stamp, format!("{}\n", fingerprint.0)),
    CachePolicy::ArtifactExists | CachePolicy::AlwaysBuild => clear(stamp),
  }
}
