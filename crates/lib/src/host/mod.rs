//! The host build environment mutated by the integrator.
//!
//! A [`HostEnvironment`] is an explicit context value that every pipeline stage
//! receives by `&mut` reference. It holds two build contexts:
//!
//! - `primary`: the environment the dependency-adjacent code compiles in
//! - `project`: the derived environment the project's own sources compile in
//!
//! Every mutation is also appended to a journal so the sequence of side effects
//! can be inspected after a run.
//!
//! # Submodules
//!
//! - [`cargo`] - Render the environment as Cargo build-script directives

pub mod cargo;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::options::{BuildOption, OptionError, OptionList};

/// Toolchain values supplied by the host build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
  /// C compiler path.
  pub cc: Option<String>,
  /// C++ compiler path.
  pub cxx: Option<String>,
  /// Archiver path.
  pub ar: Option<String>,
  /// C-only compiler flags.
  pub cflags: Vec<String>,
  /// Flags shared by C and C++.
  pub ccflags: Vec<String>,
  /// C++-only compiler flags.
  pub cxxflags: Vec<String>,
  /// `PATH` for external processes, when it differs from ours.
  pub path: Option<String>,
}

/// Which of the two build contexts a mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
  Primary,
  Project,
}

/// One compilation context of the host build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
  /// Preprocessor defines in `NAME` or `NAME=VALUE` form.
  pub defines: Vec<String>,
  /// Include search directories.
  pub include_dirs: Vec<PathBuf>,
  /// Flags that are neither defines nor include directories.
  pub flags: Vec<String>,
  /// Library search directories.
  pub lib_paths: Vec<PathBuf>,
  /// Libraries to link, by short name.
  pub libs: Vec<String>,
}

impl BuildContext {
  fn process_options(&mut self, options: &OptionList) {
    for option in options {
      match option {
        BuildOption::Define { .. } => {
          if let Some(entry) = option.define_entry() {
            self.defines.push(entry);
          }
        }
        BuildOption::Generic(token) => match token.strip_prefix("-I") {
          Some(dir) if !dir.is_empty() => self.include_dirs.push(PathBuf::from(dir)),
          _ => self.flags.push(token.clone()),
        },
      }
    }
  }
}

/// Category of dependency sources compiled into the host build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  /// Hardware-abstraction port sources. Mandatory.
  Hal,
  /// Cryptographic-abstraction port sources. Optional.
  Crypto,
}

impl SourceKind {
  /// Suffix used in the group's target directory name.
  pub fn suffix(self) -> &'static str {
    match self {
      SourceKind::Hal => "hal",
      SourceKind::Crypto => "crypto",
    }
  }
}

/// A directory of sources compiled as its own unit of the host build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceGroup {
  /// Target subdirectory name, e.g. `lib_tropic_hal`.
  pub name: String,
  pub kind: SourceKind,
  /// Directory holding the sources.
  pub src_dir: PathBuf,
  /// Where the host places the objects (`<build dir>/<name>`).
  pub target_dir: PathBuf,
  /// The existing source files of this group.
  pub sources: Vec<PathBuf>,
}

/// A single recorded mutation of the host environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EnvMutation {
  ProcessFlags { context: ContextKind, flags: String },
  AppendIncludeDirs { dirs: Vec<PathBuf> },
  AppendLibPath { dir: PathBuf },
  AppendLib { name: String },
  BuildSources { name: String, src_dir: PathBuf },
}

/// The consuming build environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostEnvironment {
  /// Toolchain forwarded to the external build.
  pub toolchain: Toolchain,
  /// The host's raw build flags.
  pub build_flags: OptionList,
  /// The host's build output directory.
  pub build_dir: PathBuf,
  pub primary: BuildContext,
  pub project: BuildContext,
  pub source_groups: Vec<SourceGroup>,
  pub journal: Vec<EnvMutation>,
}

impl HostEnvironment {
  pub fn new(build_dir: impl Into<PathBuf>, toolchain: Toolchain, build_flags: OptionList) -> Self {
    Self {
      toolchain,
      build_flags,
      build_dir: build_dir.into(),
      ..Default::default()
    }
  }

  pub fn context(&self, kind: ContextKind) -> &BuildContext {
    match kind {
      ContextKind::Primary => &self.primary,
      ContextKind::Project => &self.project,
    }
  }

  fn context_mut(&mut self, kind: ContextKind) -> &mut BuildContext {
    match kind {
      ContextKind::Primary => &mut self.primary,
      ContextKind::Project => &mut self.project,
    }
  }

  /// Parse a flag string and merge it into one context.
  ///
  /// Defines land in `defines`, `-I` tokens in `include_dirs`, the rest in `flags`.
  pub fn process_flags(&mut self, kind: ContextKind, flags: &str) -> Result<(), OptionError> {
    let options = OptionList::parse(flags)?;
    debug!(context = ?kind, count = options.len(), "processing flags");
    self.context_mut(kind).process_options(&options);
    self.journal.push(EnvMutation::ProcessFlags {
      context: kind,
      flags: flags.to_string(),
    });
    Ok(())
  }

  /// Append include directories to the primary context.
  ///
  /// Directories already on the search list are not added twice.
  pub fn append_include_dirs(&mut self, dirs: Vec<PathBuf>) {
    let mut added = Vec::new();
    for dir in dirs {
      if !self.primary.include_dirs.contains(&dir) && !added.contains(&dir) {
        added.push(dir);
      }
    }
    if added.is_empty() {
      return;
    }
    self.primary.include_dirs.extend(added.iter().cloned());
    self.journal.push(EnvMutation::AppendIncludeDirs { dirs: added });
  }

  pub fn append_lib_path(&mut self, dir: &Path) {
    self.primary.lib_paths.push(dir.to_path_buf());
    self.journal.push(EnvMutation::AppendLibPath { dir: dir.to_path_buf() });
  }

  pub fn append_lib(&mut self, name: &str) {
    self.primary.libs.push(name.to_string());
    self.journal.push(EnvMutation::AppendLib { name: name.to_string() });
  }

  /// Register a new compilation-unit group.
  pub fn build_sources(&mut self, group: SourceGroup) {
    self.journal.push(EnvMutation::BuildSources {
      name: group.name.clone(),
      src_dir: group.src_dir.clone(),
    });
    self.source_groups.push(group);
  }
}
