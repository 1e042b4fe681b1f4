//! Driving the dependency's CMake build.
//!
//! A build pass is a configure step followed by a build step:
//!
//! ```text
//! cmake -S <subroot> -B <build dir> [-DCMAKE_C_COMPILER=..] [-DCMAKE_CXX_COMPILER=..] [-DCMAKE_AR=..] <options>
//! cmake --build <build dir> --target <target>
//! ```
//!
//! When a metadata pass is configured, the same pair runs first against the
//! metadata build directory with the manifest target, which makes the external
//! build emit its source manifest.
//!
//! The whole sequence is gated by the [`guard`]: with a reusable artifact no
//! process is started at all.
//!
//! # Submodules
//!
//! - [`guard`] - Cache policies deciding whether to skip the build
//! - [`runner`] - Process execution seam

pub mod guard;
pub mod runner;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::consts::BUILTIN_DEFINES;
use crate::host::Toolchain;
use crate::locate::DependencyLayout;
use crate::options::OptionList;
use crate::util::hash::{Fingerprint, HashError};

pub use guard::{BuildReason, CachePolicy, GuardDecision};
pub use runner::{CommandRunner, CommandSpec, SystemRunner};

/// Errors that can occur while building the dependency.
#[derive(Debug, Error)]
pub enum InvokeError {
  /// An external process exited unsuccessfully.
  #[error("command failed with {}: {cmd}", describe_exit(.code))]
  BuildInvocationFailed { cmd: String, code: Option<i32> },

  /// An external process could not be started.
  #[error("failed to start command '{cmd}': {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: io::Error,
  },

  /// The build succeeded but did not produce the expected library.
  #[error("could not find produced static library at {}", .0.display())]
  ArtifactMissing(PathBuf),

  #[error("failed to create build directory {}: {source}", path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write build stamp {}: {source}", path.display())]
  Stamp {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to fingerprint build commands: {0}")]
  Fingerprint(#[from] HashError),
}

fn describe_exit(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {}", code),
    None => "termination by signal".to_string(),
  }
}

/// Which option tokens reach the external configure step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForwardingPolicy {
  /// Every configured option token, verbatim.
  #[default]
  Passthrough,
  /// Host and configured defines, the built-in defines, and the host's
  /// compiler flags threaded into `CMAKE_C_FLAGS` / `CMAKE_CXX_FLAGS`.
  DefinesOnly,
}

/// Everything the invoker needs to configure and build the dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
  /// The CMake executable.
  pub cmake: String,
  pub toolchain: Toolchain,
  /// Target producing the static library.
  pub target: String,
  /// Configured option tokens.
  pub options: OptionList,
  /// The host's raw build flags, consulted by [`ForwardingPolicy::DefinesOnly`].
  pub host_flags: OptionList,
  pub forwarding: ForwardingPolicy,
  pub cache: CachePolicy,
  /// Target of the metadata pass, if one runs.
  pub metadata_target: Option<String>,
}

/// What the invoker did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvokeOutcome {
  /// The existing artifact was reused.
  Cached,
  /// Configure and build ran.
  Built,
}

/// Option tokens passed to the configure step, in order.
pub fn forwarded_options(config: &BuildConfiguration) -> Vec<String> {
  match config.forwarding {
    ForwardingPolicy::Passthrough => config.options.tokens(),
    ForwardingPolicy::DefinesOnly => {
      let mut tokens: Vec<String> = config
        .host_flags
        .defines()
        .chain(config.options.defines())
        .map(|o| o.as_token().to_string())
        .collect();
      tokens.extend(BUILTIN_DEFINES.iter().map(|d| d.to_string()));

      let tc = &config.toolchain;
      let c_flags: Vec<&str> = tc.cflags.iter().chain(&tc.ccflags).map(String::as_str).collect();
      if !c_flags.is_empty() {
        tokens.push(format!("-DCMAKE_C_FLAGS={}", c_flags.join(" ")));
      }
      let cxx_flags: Vec<&str> = tc.ccflags.iter().chain(&tc.cxxflags).map(String::as_str).collect();
      if !cxx_flags.is_empty() {
        tokens.push(format!("-DCMAKE_CXX_FLAGS={}", cxx_flags.join(" ")));
      }

      tokens
    }
  }
}

fn base_command(config: &BuildConfiguration) -> CommandSpec {
  let cmd = CommandSpec::new(&config.cmake);
  match &config.toolchain.path {
    Some(path) => cmd.env("PATH", path),
    None => cmd,
  }
}

/// The configure command for one build directory.
pub fn configure_command(config: &BuildConfiguration, src_dir: &Path, build_dir: &Path) -> CommandSpec {
  let tc = &config.toolchain;
  let mut cmd = base_command(config)
    .arg("-S")
    .arg(src_dir.display().to_string())
    .arg("-B")
    .arg(build_dir.display().to_string());

  if let Some(cc) = &tc.cc {
    cmd = cmd.arg(format!("-DCMAKE_C_COMPILER={}", cc));
  }
  if let Some(cxx) = &tc.cxx {
    cmd = cmd.arg(format!("-DCMAKE_CXX_COMPILER={}", cxx));
  }
  if let Some(ar) = &tc.ar {
    cmd = cmd.arg(format!("-DCMAKE_AR={}", ar));
  }

  cmd.args(forwarded_options(config))
}

/// The build command for one build directory and target.
pub fn build_command(config: &BuildConfiguration, build_dir: &Path, target: &str) -> CommandSpec {
  base_command(config)
    .arg("--build")
    .arg(build_dir.display().to_string())
    .arg("--target")
    .arg(target)
}

/// The full command sequence of a build pass.
pub fn plan_commands(layout: &DependencyLayout, config: &BuildConfiguration) -> Vec<CommandSpec> {
  let mut commands = Vec::with_capacity(4);
  if let Some(target) = &config.metadata_target {
    commands.push(configure_command(config, &layout.subroot, &layout.metadata_dir));
    commands.push(build_command(config, &layout.metadata_dir, target));
  }
  commands.push(configure_command(config, &layout.subroot, &layout.build_dir));
  commands.push(build_command(config, &layout.build_dir, &config.target));
  commands
}

fn create_dir(path: &Path) -> Result<(), InvokeError> {
  fs::create_dir_all(path).map_err(|source| InvokeError::CreateDir {
    path: path.to_path_buf(),
    source,
  })
}

/// Build the dependency unless the guard allows reusing the artifact.
///
/// Commands run strictly in sequence; the first failure aborts the pass
/// without retrying.
pub fn invoke<R: CommandRunner>(
  runner: &mut R,
  layout: &DependencyLayout,
  config: &BuildConfiguration,
) -> Result<InvokeOutcome, InvokeError> {
  let commands = plan_commands(layout, config);
  let fingerprint = commands[..].fingerprint()?;
  let stamp = layout.stamp();

  match guard::check(config.cache, &layout.artifact, &stamp, &fingerprint) {
    GuardDecision::Skip => return Ok(InvokeOutcome::Cached),
    GuardDecision::Build(reason) => {
      info!(reason = ?reason, target = %config.target, "building dependency");
    }
  }

  create_dir(&layout.build_dir)?;
  guard::clear(&stamp).map_err(|source| InvokeError::Stamp {
    path: stamp.clone(),
    source,
  })?;
  if config.metadata_target.is_some() {
    create_dir(&layout.metadata_dir)?;
  }

  for cmd in &commands {
    runner.run(cmd)?;
  }

  if !layout.artifact.is_file() {
    return Err(InvokeError::ArtifactMissing(layout.artifact.clone()));
  }

  guard::record(config.cache, &stamp, &fingerprint).map_err(|source| InvokeError::Stamp { path: stamp, source })?;

  info!(artifact = %layout.artifact.display(), "dependency built");
  Ok(InvokeOutcome::Built)
}
