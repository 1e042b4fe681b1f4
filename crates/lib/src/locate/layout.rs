//! Fixed subpaths inside the installed package.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{
  DEFAULT_ARTIFACT, DEFAULT_BUILD_DIR, DEFAULT_HAL_PORT_DIR, DEFAULT_MANIFEST, DEFAULT_METADATA_DIR, DEFAULT_SUBROOT,
  STAMP_FILENAME,
};

/// Relative names of the package's layout, as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LayoutNames {
  /// Native-library subroot holding the CMake project.
  pub subroot: String,
  /// CMake build directory.
  pub build_dir: String,
  /// Build directory of the metadata pass.
  pub metadata_dir: String,
  /// Manifest file name inside `metadata_dir`.
  pub manifest: String,
  /// Static library, relative to `build_dir`.
  pub artifact: String,
  /// HAL port directory relative to the subroot, scanned when there is no metadata pass.
  pub hal_port_dir: String,
}

impl Default for LayoutNames {
  fn default() -> Self {
    Self {
      subroot: DEFAULT_SUBROOT.to_string(),
      build_dir: DEFAULT_BUILD_DIR.to_string(),
      metadata_dir: DEFAULT_METADATA_DIR.to_string(),
      manifest: DEFAULT_MANIFEST.to_string(),
      artifact: DEFAULT_ARTIFACT.to_string(),
      hal_port_dir: DEFAULT_HAL_PORT_DIR.to_string(),
    }
  }
}

/// Absolute paths derived from the located package directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyLayout {
  pub library_dir: PathBuf,
  pub subroot: PathBuf,
  pub build_dir: PathBuf,
  pub metadata_dir: PathBuf,
  pub manifest: PathBuf,
  pub artifact: PathBuf,
  pub hal_port_dir: PathBuf,
}

impl DependencyLayout {
  pub fn new(library_dir: &Path, names: &LayoutNames) -> Self {
    let subroot = library_dir.join(&names.subroot);
    let build_dir = library_dir.join(&names.build_dir);
    let metadata_dir = library_dir.join(&names.metadata_dir);
    Self {
      library_dir: library_dir.to_path_buf(),
      manifest: metadata_dir.join(&names.manifest),
      artifact: build_dir.join(&names.artifact),
      hal_port_dir: subroot.join(&names.hal_port_dir),
      subroot,
      build_dir,
      metadata_dir,
    }
  }

  /// Public headers of the native library.
  pub fn public_include_dir(&self) -> PathBuf {
    self.subroot.join("include")
  }

  /// Internal sources of the native library.
  pub fn internal_src_dir(&self) -> PathBuf {
    self.subroot.join("src")
  }

  /// CMake's generated `flags.make` for a target.
  pub fn flags_make(&self, target: &str) -> PathBuf {
    self
      .build_dir
      .join("CMakeFiles")
      .join(format!("{}.dir", target))
      .join("flags.make")
  }

  pub fn stamp(&self) -> PathBuf {
    self.build_dir.join(STAMP_FILENAME)
  }
}
