//! The integration pipeline.
//!
//! [`Integrator::run`] executes the stages strictly in order over one host
//! environment:
//!
//! 1. locate the installed package
//! 2. build it, unless the cache policy allows reusing the artifact
//! 3. read the target's defines from `flags.make`
//! 4. read the source manifest, or scan the HAL port directory
//! 5. inject everything into the host environment
//!
//! The first failing stage aborts the run.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::IntegrateError;
use crate::host::HostEnvironment;
use crate::inject::{self, Injection};
use crate::invoke::{self, CommandRunner, InvokeOutcome};
use crate::locate::{self, DependencyLayout, DependencyLocation};
use crate::metadata::{SourceManifest, read_defines};

/// Summary of a completed integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrationReport {
  pub library_dir: PathBuf,
  pub artifact: PathBuf,
  /// Short name the library is linked by.
  pub library_name: String,
  /// Whether an existing artifact was reused.
  pub cached: bool,
  pub defines: String,
  pub include_dirs: Vec<PathBuf>,
  pub source_groups: Vec<String>,
}

/// Runs the integration stages with a given process runner.
#[derive(Debug)]
pub struct Integrator<R: CommandRunner> {
  config: Config,
  runner: R,
}

impl<R: CommandRunner> Integrator<R> {
  pub fn new(config: Config, runner: R) -> Self {
    Self { config, runner }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn runner(&self) -> &R {
    &self.runner
  }

  /// Resolve the installed package and its layout.
  pub fn locate(&self) -> Result<(DependencyLocation, DependencyLayout), IntegrateError> {
    let root = self.config.libdeps_dir()?;
    let location = locate::locate(
      &root,
      self.config.dependency.environment.as_deref(),
      &self.config.dependency.name,
    )?;
    let layout = DependencyLayout::new(&location.library_dir, &self.config.layout);
    Ok((location, layout))
  }

  /// Run every stage against `env`.
  ///
  /// The toolchain and raw build flags forwarded to the external build are
  /// taken from `env`.
  pub fn run(&mut self, env: &mut HostEnvironment) -> Result<IntegrationReport, IntegrateError> {
    let (location, layout) = self.locate()?;

    let mut build = self.config.build_configuration()?;
    build.toolchain = env.toolchain.clone();
    build.host_flags = env.build_flags.clone();

    let outcome = invoke::invoke(&mut self.runner, &layout, &build)?;
    if outcome == InvokeOutcome::Cached {
      info!(artifact = %layout.artifact.display(), "reusing existing artifact");
    }

    let defines = read_defines(&layout.flags_make(&build.target))?;

    let (manifest, hal_origin) = if build.metadata_target.is_some() {
      (SourceManifest::load(&layout.manifest, &layout.subroot)?, &layout.manifest)
    } else {
      (SourceManifest::from_hal_dir(&layout.hal_port_dir)?, &layout.hal_port_dir)
    };

    let summary = inject::inject(
      env,
      &Injection {
        layout: &layout,
        scan_dir: &location.scan_dir,
        defines: &defines,
        manifest: &manifest,
        hal_origin,
      },
    )?;

    Ok(IntegrationReport {
      library_dir: location.library_dir,
      artifact: layout.artifact,
      library_name: summary.library_name,
      cached: outcome == InvokeOutcome::Cached,
      defines: defines.joined(),
      include_dirs: summary.include_dirs,
      source_groups: summary.groups,
    })
  }
}
