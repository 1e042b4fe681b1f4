//! Implementation of the `depbuild integrate` command.
//!
//! Runs the full pipeline against a host environment built from the config
//! and prints the result as text, JSON, or Cargo directives.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use depbuild_lib::host::HostEnvironment;
use depbuild_lib::host::cargo::write_cargo_directives;
use depbuild_lib::invoke::SystemRunner;
use depbuild_lib::{IntegrationReport, Integrator};

use super::load_config;
use crate::output::{OutputFormat, format_mapping, print_item, print_json, print_stat, print_success, print_warning};

#[derive(Serialize)]
struct IntegrateOutput<'a> {
  report: &'a IntegrationReport,
  environment: &'a HostEnvironment,
}

pub fn cmd_integrate(config: Option<&Path>, format: OutputFormat) -> Result<()> {
  let config = load_config(config)?;
  // Location comes first, so a missing libdeps root is reported before host settings.
  config.libdeps_dir().context("Failed to locate dependency")?;
  let mut env = config
    .host_environment()
    .context("Failed to prepare host environment")?;

  let mut integrator = Integrator::new(config, SystemRunner);
  let report = integrator.run(&mut env).context("Integration failed")?;

  match format {
    OutputFormat::Text => print_text(&report, &env),
    OutputFormat::Json => print_json(&IntegrateOutput {
      report: &report,
      environment: &env,
    })?,
    OutputFormat::Cargo => {
      let mut stdout = std::io::stdout().lock();
      write_cargo_directives(&env, &mut stdout).context("Failed to write cargo directives")?;
      stdout.flush()?;
    }
  }

  Ok(())
}

fn print_text(report: &IntegrationReport, env: &HostEnvironment) {
  if report.cached {
    print_success(&format!("Reused {}", report.artifact.display()));
  } else {
    print_success(&format!("Built {}", report.artifact.display()));
  }
  print_stat("Library", &report.library_dir.display().to_string());
  print_stat("Link", &format!("-l{}", report.library_name));
  print_stat("Defines", &report.defines);

  print_stat("Include dirs", &report.include_dirs.len().to_string());
  for dir in &report.include_dirs {
    print_item(&dir.display().to_string());
  }

  print_stat("Source groups", &env.source_groups.len().to_string());
  for group in &env.source_groups {
    print_item(&format_mapping(
      &group.src_dir.display().to_string(),
      &group.target_dir.display().to_string(),
    ));
  }

  if report.defines.is_empty() {
    print_warning("The dependency build recorded no defines");
  }
}
