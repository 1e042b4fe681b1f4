//! Injecting build results into the host environment.
//!
//! Given the located layout, the built artifact and the extracted metadata,
//! [`inject`] applies, in order:
//!
//! 1. the extracted defines to both build contexts
//! 2. the include search paths (existing directories, deduplicated)
//! 3. the library search path and the library's short name
//! 4. one compilation-unit group per source directory

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::host::{ContextKind, HostEnvironment, SourceGroup, SourceKind};
use crate::locate::DependencyLayout;
use crate::metadata::{DefineSet, SourceManifest};
use crate::options::OptionError;

/// Errors that can occur during injection.
#[derive(Debug, Error)]
pub enum InjectError {
  /// No HAL sources survived; the host cannot link against the library without them.
  #[error("no HAL sources found (searched {})", searched.display())]
  MetadataMissing { searched: PathBuf },

  #[error("invalid defines from the external build: {0}")]
  Defines(#[from] OptionError),
}

/// Inputs of a single injection.
#[derive(Debug, Clone, Copy)]
pub struct Injection<'a> {
  pub layout: &'a DependencyLayout,
  /// Directory whose subdirectories are the dependency's installed peers.
  pub scan_dir: &'a Path,
  pub defines: &'a DefineSet,
  pub manifest: &'a SourceManifest,
  /// Where HAL sources were looked up, for error messages.
  pub hal_origin: &'a Path,
}

/// What was injected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectionSummary {
  pub library_name: String,
  pub include_dirs: Vec<PathBuf>,
  pub groups: Vec<String>,
}

/// Derive the linker short name from a static library file name.
///
/// `libtropic.a` becomes `tropic`; anything without both the `lib` prefix and
/// the `.a` suffix keeps its file stem.
pub fn short_library_name(artifact: &Path) -> String {
  let file_name = artifact.file_name().and_then(|n| n.to_str()).unwrap_or_default();

  if let Some(short) = file_name
    .strip_prefix("lib")
    .and_then(|rest| rest.strip_suffix(".a"))
    .filter(|short| !short.is_empty())
  {
    return short.to_string();
  }

  artifact
    .file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_default()
}

/// Group existing source files by their containing directory.
///
/// Groups keep the order in which their directory was first seen.
pub fn group_by_directory(sources: &[PathBuf]) -> Vec<(PathBuf, Vec<PathBuf>)> {
  let mut groups: Vec<(PathBuf, Vec<PathBuf>)> = Vec::new();

  for source in sources.iter().filter(|s| s.is_file()) {
    let Some(dir) = source.parent() else {
      continue;
    };
    match groups.iter_mut().find(|(d, _)| d == dir) {
      Some((_, files)) => files.push(source.clone()),
      None => groups.push((dir.to_path_buf(), vec![source.clone()])),
    }
  }

  groups
}

/// Conventional header locations of every installed peer of the dependency.
///
/// For each subdirectory of `scan_dir` (sorted by name): `include`, `src`,
/// `src/include`, and the subdirectory itself.
pub fn peer_include_candidates(scan_dir: &Path) -> Vec<PathBuf> {
  let entries = match std::fs::read_dir(scan_dir) {
    Ok(entries) => entries,
    Err(e) => {
      warn!(dir = %scan_dir.display(), error = %e, "cannot list installed dependencies, skipping peer includes");
      return Vec::new();
    }
  };

  let mut peers: Vec<PathBuf> = entries
    .filter_map(Result::ok)
    .map(|e| e.path())
    .filter(|p| p.is_dir())
    .collect();
  peers.sort();

  peers
    .into_iter()
    .flat_map(|peer| {
      [
        peer.join("include"),
        peer.join("src"),
        peer.join("src").join("include"),
        peer,
      ]
    })
    .collect()
}

/// Keep existing directories only, first occurrence wins.
pub fn existing_unique_dirs(candidates: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
  let mut result: Vec<PathBuf> = Vec::new();
  for dir in candidates {
    if dir.is_dir() && !result.contains(&dir) {
      result.push(dir);
    }
  }
  result
}

fn source_groups(kind: SourceKind, sources: &[PathBuf], library_name: &str, build_dir: &Path) -> Vec<SourceGroup> {
  let grouped = group_by_directory(sources);
  let indexed = grouped.len() > 1;

  grouped
    .into_iter()
    .enumerate()
    .map(|(index, (src_dir, files))| {
      let name = if indexed {
        format!("lib_{}_{}_{}", library_name, kind.suffix(), index)
      } else {
        format!("lib_{}_{}", library_name, kind.suffix())
      };
      SourceGroup {
        target_dir: build_dir.join(&name),
        name,
        kind,
        src_dir,
        sources: files,
      }
    })
    .collect()
}

/// Apply the build results to the host environment.
pub fn inject(env: &mut HostEnvironment, injection: &Injection<'_>) -> Result<InjectionSummary, InjectError> {
  let Injection {
    layout,
    scan_dir,
    defines,
    manifest,
    hal_origin,
  } = *injection;

  let library_name = short_library_name(&layout.artifact);

  let hal_groups = source_groups(SourceKind::Hal, &manifest.hal_sources, &library_name, &env.build_dir);
  if hal_groups.is_empty() {
    return Err(InjectError::MetadataMissing {
      searched: hal_origin.to_path_buf(),
    });
  }
  let crypto_groups = source_groups(SourceKind::Crypto, &manifest.crypto_sources, &library_name, &env.build_dir);

  let flags = defines.joined();
  info!(defines = %flags, "injecting dependency defines");
  env.process_flags(ContextKind::Primary, &flags)?;
  env.process_flags(ContextKind::Project, &flags)?;

  let candidates = [layout.public_include_dir(), layout.internal_src_dir()]
    .into_iter()
    .chain(manifest.include_dirs().cloned())
    .chain(peer_include_candidates(scan_dir))
    .chain(hal_groups.iter().chain(&crypto_groups).map(|g| g.src_dir.clone()));
  let include_dirs = existing_unique_dirs(candidates);
  debug!(count = include_dirs.len(), "adding include directories");
  env.append_include_dirs(include_dirs.clone());

  let lib_dir = layout.artifact.parent().unwrap_or(layout.build_dir.as_path());
  env.append_lib_path(lib_dir);
  env.append_lib(&library_name);
  info!(artifact = %layout.artifact.display(), lib = %library_name, "linking static library");

  let mut groups = Vec::new();
  for group in hal_groups.into_iter().chain(crypto_groups) {
    info!(group = %group.name, src = %group.src_dir.display(), files = group.sources.len(), "compiling sources");
    groups.push(group.name.clone());
    env.build_sources(group);
  }

  Ok(InjectionSummary {
    library_name,
    include_dirs,
    groups,
  })
}
