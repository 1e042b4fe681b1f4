//! Define extraction from CMake's `flags.make`.
//!
//! CMake writes one `flags.make` per target, e.g.
//!
//! ```text
//! # compile C with /usr/bin/cc
//! C_DEFINES = -DLT_HELPERS -DLT_USE_TREZOR_CRYPTO
//! C_INCLUDES = -I/deps/libtropic/include
//! C_FLAGS = -Os
//! ```
//!
//! Only the first `C_DEFINES` and `CXX_DEFINES` lines are used.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::MetadataError;

static DEFINE_LINE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?m)^[ \t]*(C_DEFINES|CXX_DEFINES)[ \t]*=(.*)$").expect("define line pattern is valid")
});

/// Defines recovered from the generated build description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DefineSet {
  /// Value of `C_DEFINES`, trimmed.
  pub c: Option<String>,
  /// Value of `CXX_DEFINES`, trimmed.
  pub cxx: Option<String>,
}

impl DefineSet {
  /// Scan `flags.make` content.
  ///
  /// Returns `None` when neither recognized key is present. A key with an empty
  /// value counts as present.
  pub fn parse(content: &str) -> Option<Self> {
    let mut set = DefineSet::default();

    for caps in DEFINE_LINE.captures_iter(content) {
      let value = caps[2].trim().to_string();
      let slot = match &caps[1] {
        "C_DEFINES" => &mut set.c,
        _ => &mut set.cxx,
      };
      if slot.is_none() {
        *slot = Some(value);
      }
    }

    if set.c.is_none() && set.cxx.is_none() {
      return None;
    }
    Some(set)
  }

  /// C defines followed by C++ defines, space separated.
  pub fn joined(&self) -> String {
    [self.c.as_deref(), self.cxx.as_deref()]
      .into_iter()
      .flatten()
      .filter(|v| !v.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Read the defines of a target from its `flags.make`.
///
/// Bytes that are not UTF-8 (e.g. a Latin-1 toolchain path in a comment) are
/// replaced rather than failing the read.
pub fn read_defines(path: &Path) -> Result<DefineSet, MetadataError> {
  let bytes = match fs::read(path) {
    Ok(bytes) => bytes,
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

  let content = String::from_utf8_lossy(&bytes);
  debug!(path = %path.display(), "parsing flags.make");

  DefineSet::parse(&content).ok_or_else(|| MetadataError::ManifestMalformed {
    path: path.to_path_buf(),
    message: "no C_DEFINES/CXX_DEFINES found".to_string(),
  })
}
