//! Project configuration.
//!
//! Settings come from a `depbuild.toml` next to the project, overridden by the
//! environment the host build exports:
//!
//! ```toml
//! [dependency]
//! name = "LibtropicArduino"
//! libdeps-dir = ".pio/libdeps"
//! environment = "esp32"
//!
//! [build]
//! target = "tropic"
//! options = "-DLT_USE_TREZOR_CRYPTO=1 -DLT_HELPERS=ON"
//! forwarding = "defines-only"
//! cache = "config-hash"
//! metadata-pass = true
//!
//! [host]
//! build-dir = ".pio/build/esp32"
//! cc = "xtensa-esp32-elf-gcc"
//! ccflags = ["-mlongcalls", "-Os"]
//! ```
//!
//! Option fields accept either a single shell-quoted string or an array of
//! tokens. Relative paths are resolved against the directory of the file.
//!
//! # Environment overrides
//!
//! | Variable               | Overrides              |
//! |------------------------|------------------------|
//! | `PROJECT_LIBDEPS_DIR`  | `dependency.libdeps-dir` |
//! | `PIOENV`               | `dependency.environment` |
//! | `BUILD_DIR`            | `host.build-dir`       |
//! | `CC` / `CXX` / `AR`    | `host.cc` / `host.cxx` / `host.ar` |
//! | `CFLAGS` / `CCFLAGS` / `CXXFLAGS` | `host.cflags` / `host.ccflags` / `host.cxxflags` |
//! | `DEPBUILD_BUILD_FLAGS` | `host.build-flags`     |

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::consts::{DEFAULT_BUILD_TARGET, DEFAULT_CMAKE, DEFAULT_LIB_NAME, DEFAULT_METADATA_TARGET};
use crate::host::{HostEnvironment, Toolchain};
use crate::invoke::{BuildConfiguration, CachePolicy, ForwardingPolicy};
use crate::locate::layout::LayoutNames;
use crate::options::{OptionError, OptionList};

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  /// A required setting is neither in the file nor in the environment.
  #[error("missing setting '{field}' (set it in the config file or via ${env})")]
  Missing { field: &'static str, env: &'static str },

  #[error("invalid options in '{field}': {source}")]
  InvalidOption {
    field: &'static str,
    #[source]
    source: OptionError,
  },
}

/// An option field: a shell-quoted line or a list of tokens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawOptions {
  Line(String),
  List(Vec<String>),
}

impl Default for RawOptions {
  fn default() -> Self {
    RawOptions::List(Vec::new())
  }
}

impl RawOptions {
  /// The individual tokens.
  pub fn split(&self) -> Result<Vec<String>, OptionError> {
    match self {
      RawOptions::Line(line) => shlex::split(line).ok_or_else(|| OptionError::Unbalanced(line.clone())),
      RawOptions::List(tokens) => Ok(tokens.clone()),
    }
  }

  pub fn to_options(&self) -> Result<OptionList, OptionError> {
    OptionList::from_tokens(self.split()?)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct DependencySection {
  /// Directory name of the installed package.
  pub name: String,
  /// Root the host installs dependencies into.
  pub libdeps_dir: Option<PathBuf>,
  /// Per-configuration subdirectory of `libdeps_dir`.
  pub environment: Option<String>,
}

impl Default for DependencySection {
  fn default() -> Self {
    Self {
      name: DEFAULT_LIB_NAME.to_string(),
      libdeps_dir: None,
      environment: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildSection {
  pub target: String,
  pub options: RawOptions,
  pub forwarding: ForwardingPolicy,
  pub cache: CachePolicy,
  /// Run the manifest-emitting configure+build before the main one.
  pub metadata_pass: bool,
  pub metadata_target: String,
  pub cmake: String,
}

impl Default for BuildSection {
  fn default() -> Self {
    Self {
      target: DEFAULT_BUILD_TARGET.to_string(),
      options: RawOptions::default(),
      forwarding: ForwardingPolicy::default(),
      cache: CachePolicy::default(),
      metadata_pass: false,
      metadata_target: DEFAULT_METADATA_TARGET.to_string(),
      cmake: DEFAULT_CMAKE.to_string(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct HostSection {
  pub build_dir: Option<PathBuf>,
  pub build_flags: RawOptions,
  pub cc: Option<String>,
  pub cxx: Option<String>,
  pub ar: Option<String>,
  pub cflags: RawOptions,
  pub ccflags: RawOptions,
  pub cxxflags: RawOptions,
  /// `PATH` for the external build processes.
  pub path: Option<String>,
}

/// The full configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  pub dependency: DependencySection,
  pub layout: LayoutNames,
  pub build: BuildSection,
  pub host: HostSection,
  /// Directory relative paths are resolved against.
  #[serde(skip)]
  pub base_dir: PathBuf,
}

fn env_value(key: &str) -> Option<String> {
  std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl Config {
  /// Parse configuration text. No environment overrides are applied.
  pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
    let mut config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(config)
  }

  /// Load a config file and apply environment overrides.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let mut config = Self::parse(&content, path)?;
    config.apply_env();
    debug!(path = %path.display(), "loaded config");
    Ok(config)
  }

  /// Configuration from the environment alone, relative to `base_dir`.
  pub fn from_env(base_dir: &Path) -> Self {
    let mut config = Config {
      base_dir: base_dir.to_path_buf(),
      ..Default::default()
    };
    config.apply_env();
    config
  }

  /// Overlay the host build's environment variables.
  pub fn apply_env(&mut self) {
    if let Some(dir) = env_value("PROJECT_LIBDEPS_DIR") {
      self.dependency.libdeps_dir = Some(PathBuf::from(dir));
    }
    if let Some(env) = env_value("PIOENV") {
      self.dependency.environment = Some(env);
    }
    if let Some(dir) = env_value("BUILD_DIR") {
      self.host.build_dir = Some(PathBuf::from(dir));
    }

    let host = &mut self.host;
    for (key, slot) in [("CC", &mut host.cc), ("CXX", &mut host.cxx), ("AR", &mut host.ar)] {
      if let Some(value) = env_value(key) {
        *slot = Some(value);
      }
    }
    for (key, slot) in [
      ("CFLAGS", &mut host.cflags),
      ("CCFLAGS", &mut host.ccflags),
      ("CXXFLAGS", &mut host.cxxflags),
      ("DEPBUILD_BUILD_FLAGS", &mut host.build_flags),
    ] {
      if let Some(value) = env_value(key) {
        *slot = RawOptions::Line(value);
      }
    }
  }

  fn resolve(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.base_dir.join(path)
    }
  }

  pub fn libdeps_dir(&self) -> Result<PathBuf, ConfigError> {
    self
      .dependency
      .libdeps_dir
      .as_deref()
      .map(|p| self.resolve(p))
      .ok_or(ConfigError::Missing {
        field: "dependency.libdeps-dir",
        env: "PROJECT_LIBDEPS_DIR",
      })
  }

  pub fn build_dir(&self) -> Result<PathBuf, ConfigError> {
    self
      .host
      .build_dir
      .as_deref()
      .map(|p| self.resolve(p))
      .ok_or(ConfigError::Missing {
        field: "host.build-dir",
        env: "BUILD_DIR",
      })
  }

  pub fn toolchain(&self) -> Result<Toolchain, ConfigError> {
    let split = |field: &'static str, raw: &RawOptions| {
      raw.split().map_err(|source| ConfigError::InvalidOption { field, source })
    };
    Ok(Toolchain {
      cc: self.host.cc.clone(),
      cxx: self.host.cxx.clone(),
      ar: self.host.ar.clone(),
      cflags: split("host.cflags", &self.host.cflags)?,
      ccflags: split("host.ccflags", &self.host.ccflags)?,
      cxxflags: split("host.cxxflags", &self.host.cxxflags)?,
      path: self.host.path.clone(),
    })
  }

  fn host_build_flags(&self) -> Result<OptionList, ConfigError> {
    self
      .host
      .build_flags
      .to_options()
      .map_err(|source| ConfigError::InvalidOption {
        field: "host.build-flags",
        source,
      })
  }

  /// The host environment the integration starts from.
  pub fn host_environment(&self) -> Result<HostEnvironment, ConfigError> {
    Ok(HostEnvironment::new(
      self.build_dir()?,
      self.toolchain()?,
      self.host_build_flags()?,
    ))
  }

  pub fn build_configuration(&self) -> Result<BuildConfiguration, ConfigError> {
    let options = self
      .build
      .options
      .to_options()
      .map_err(|source| ConfigError::InvalidOption {
        field: "build.options",
        source,
      })?;

    Ok(BuildConfiguration {
      cmake: self.build.cmake.clone(),
      toolchain: self.toolchain()?,
      target: self.build.target.clone(),
      options,
      host_flags: self.host_build_flags()?,
      forwarding: self.build.forwarding,
      cache: self.build.cache,
      metadata_target: self.build.metadata_pass.then(|| self.build.metadata_target.clone()),
    })
  }
}
