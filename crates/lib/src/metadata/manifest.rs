//! The source/include manifest.
//!
//! The metadata pass emits a JSON document such as:
//!
//! ```json
//! {
//!   "hal_sources": ["hal/port/arduino/lt_port_arduino.cpp"],
//!   "hal_include_dirs": ["hal/port/arduino"],
//!   "crypto_sources": ["/abs/path/to/lt_crypto_trezor.c"],
//!   "crypto_include_dirs": []
//! }
//! ```
//!
//! Every key is optional and unknown keys are ignored, but at least one of the
//! four must be present. Relative entries are resolved against the
//! native-library subroot.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::MetadataError;
use crate::consts::HAL_SOURCE_EXTENSIONS;

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
  #[serde(default)]
  hal_sources: Option<Vec<String>>,
  #[serde(default)]
  hal_include_dirs: Option<Vec<String>>,
  #[serde(default)]
  crypto_sources: Option<Vec<String>>,
  #[serde(default)]
  crypto_include_dirs: Option<Vec<String>>,
}

/// Resolved source and include lists of the dependency's port layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceManifest {
  pub hal_sources: Vec<PathBuf>,
  pub hal_include_dirs: Vec<PathBuf>,
  pub crypto_sources: Vec<PathBuf>,
  pub crypto_include_dirs: Vec<PathBuf>,
}

fn resolve_all(entries: Option<Vec<String>>, base: &Path) -> Vec<PathBuf> {
  entries
    .unwrap_or_default()
    .into_iter()
    .map(|entry| {
      let path = PathBuf::from(entry);
      if path.is_absolute() { path } else { base.join(path) }
    })
    .collect()
}

impl SourceManifest {
  /// Parse manifest JSON, resolving relative entries against `base`.
  ///
  /// No filesystem checks happen here.
  pub fn from_json(content: &str, base: &Path) -> Result<Self, serde_json::Error> {
    let raw: RawManifest = serde_json::from_str(content)?;
    if raw.hal_sources.is_none()
      && raw.hal_include_dirs.is_none()
      && raw.crypto_sources.is_none()
      && raw.crypto_include_dirs.is_none()
    {
      return Err(serde_json::Error::custom("no recognized source or include key"));
    }
    Ok(Self {
      hal_sources: resolve_all(raw.hal_sources, base),
      hal_include_dirs: resolve_all(raw.hal_include_dirs, base),
      crypto_sources: resolve_all(raw.crypto_sources, base),
      crypto_include_dirs: resolve_all(raw.crypto_include_dirs, base),
    })
  }

  /// Load the manifest emitted by the metadata pass.
  ///
  /// Entries that do not exist on disk are dropped with a warning.
  pub fn load(path: &Path, base: &Path) -> Result<Self, MetadataError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(MetadataError::MetadataMissing { path: path.to_path_buf() });
      }
      Err(source) => {
        return Err(MetadataError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let mut manifest = Self::from_json(&content, base).map_err(|e| MetadataError::ManifestMalformed {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;
    manifest.retain_existing();

    debug!(
      path = %path.display(),
      hal_sources = manifest.hal_sources.len(),
      crypto_sources = manifest.crypto_sources.len(),
      "loaded source manifest"
    );
    Ok(manifest)
  }

  /// Build a manifest from a HAL port directory.
  ///
  /// Its C/C++ sources (sorted by name) become the HAL sources and the
  /// directory itself the HAL include directory.
  pub fn from_hal_dir(dir: &Path) -> Result<Self, MetadataError> {
    let entries = match fs::read_dir(dir) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(MetadataError::MetadataMissing { path: dir.to_path_buf() });
      }
      Err(source) => {
        return Err(MetadataError::Read {
          path: dir.to_path_buf(),
          source,
        });
      }
    };

    let mut sources = Vec::new();
    for entry in entries {
      let path = entry
        .map_err(|source| MetadataError::Read {
          path: dir.to_path_buf(),
          source,
        })?
        .path();
      let is_source = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| HAL_SOURCE_EXTENSIONS.contains(&ext));
      if is_source && path.is_file() {
        sources.push(path);
      }
    }
    sources.sort();

    Ok(Self {
      hal_sources: sources,
      hal_include_dirs: vec![dir.to_path_buf()],
      ..Default::default()
    })
  }

  /// Drop source files and include directories that do not exist.
  pub fn retain_existing(&mut self) {
    retain_logged(&mut self.hal_sources, Path::is_file, "hal source");
    retain_logged(&mut self.crypto_sources, Path::is_file, "crypto source");
    retain_logged(&mut self.hal_include_dirs, Path::is_dir, "hal include dir");
    retain_logged(&mut self.crypto_include_dirs, Path::is_dir, "crypto include dir");
  }

  /// HAL include directories followed by crypto include directories.
  pub fn include_dirs(&self) -> impl Iterator<Item = &PathBuf> {
    self.hal_include_dirs.iter().chain(&self.crypto_include_dirs)
  }
}

fn retain_logged(paths: &mut Vec<PathBuf>, exists: fn(&Path) -> bool, what: &str) {
  paths.retain(|p| {
    let keep = exists(p);
    if !keep {
      warn!(path = %p.display(), kind = what, "manifest entry does not exist, ignoring");
    }
    keep
  });
}
