//! Locating the installed dependency.
//!
//! The host's dependency installer places packages under a libdeps root,
//! usually in a per-configuration subdirectory (`<root>/<env>/<name>`).
//! Resolution tries, in order:
//!
//! 1. `<root>/<env>/<name>` when `<root>/<env>` exists
//! 2. `<root>/<name>`
//! 3. any directory called `<name>` below `<root>`
//!
//! The recursive fallback is deterministic: the shallowest match wins and ties
//! are broken by path order. Multiple matches are reported with a warning.
//!
//! # Submodules
//!
//! - [`layout`] - Fixed subpaths inside the located package

pub mod layout;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub use layout::DependencyLayout;

/// Errors that can occur while locating the dependency.
#[derive(Debug, Error)]
pub enum LocateError {
  #[error("could not find installed library '{name}' under {}", root.display())]
  LocationNotFound { name: String, root: PathBuf },
}

/// Where the dependency lives on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyLocation {
  /// The installed package directory.
  pub library_dir: PathBuf,
  /// Directory whose other entries are the dependency's installed peers.
  ///
  /// This is `<root>/<env>` when that directory exists, otherwise `<root>`.
  pub scan_dir: PathBuf,
}

/// Resolve the installed package directory.
///
/// # Arguments
///
/// * `root` - The libdeps root the host installs dependencies into
/// * `env_name` - Optional per-configuration subdirectory
/// * `name` - The package's directory name
pub fn locate(root: &Path, env_name: Option<&str>, name: &str) -> Result<DependencyLocation, LocateError> {
  let not_found = || LocateError::LocationNotFound {
    name: name.to_string(),
    root: root.to_path_buf(),
  };

  if !root.is_dir() {
    return Err(not_found());
  }

  let scan_dir = match env_name.filter(|e| !e.is_empty()) {
    Some(env) if root.join(env).is_dir() => root.join(env),
    Some(env) => {
      debug!(env = %env, root = %root.display(), "per-environment libdeps dir missing, using root");
      root.to_path_buf()
    }
    None => root.to_path_buf(),
  };

  let library_dir = [scan_dir.join(name), root.join(name)]
    .into_iter()
    .find(|candidate| candidate.is_dir())
    .or_else(|| search_recursive(root, name))
    .ok_or_else(not_found)?;

  let library_dir = dunce::canonicalize(&library_dir).unwrap_or(library_dir);
  let scan_dir = dunce::canonicalize(&scan_dir).unwrap_or(scan_dir);
  info!(path = %library_dir.display(), "located dependency");

  Ok(DependencyLocation { library_dir, scan_dir })
}

/// Find every directory named `name` under `root` and pick the shallowest.
fn search_recursive(root: &Path, name: &str) -> Option<PathBuf> {
  let mut matches: Vec<(usize, PathBuf)> = Vec::new();

  let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name().into_iter();
  while let Some(entry) = walker.next() {
    let entry = match entry {
      Ok(entry) => entry,
      Err(e) => {
        warn!(error = %e, "skipping unreadable entry during dependency search");
        continue;
      }
    };

    if entry.file_type().is_dir() && entry.file_name() == name {
      matches.push((entry.depth(), entry.into_path()));
      // Don't descend into a matched package.
      walker.skip_current_dir();
    }
  }

  matches.sort();

  if matches.len() > 1 {
    let candidates: Vec<String> = matches.iter().map(|(_, p)| p.display().to_string()).collect();
    warn!(
      name = %name,
      chosen = %candidates[0],
      candidates = ?candidates,
      "multiple installed copies found, using the shallowest"
    );
  }

  matches.into_iter().next().map(|(_, path)| path)
}
