//! Build metadata produced by the external build.
//!
//! Two formats are read:
//!
//! - [`defines`]: the `C_DEFINES` / `CXX_DEFINES` lines of CMake's generated
//!   `flags.make` for the library target
//! - [`manifest`]: the JSON source/include manifest emitted by the metadata
//!   pass, or synthesized from the HAL port directory when there is none
//!
//! Each parser returns a specific failure instead of substituting defaults.

pub mod defines;
pub mod manifest;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use defines::{DefineSet, read_defines};
pub use manifest::SourceManifest;

/// Errors that can occur while reading build metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
  /// An expected generated file or directory does not exist.
  #[error("build metadata not found: {}", path.display())]
  MetadataMissing { path: PathBuf },

  /// A generated file exists but does not have the expected content.
  #[error("malformed build metadata in {}: {message}", path.display())]
  ManifestMalformed { path: PathBuf, message: String },

  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}
