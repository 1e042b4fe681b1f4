use std::path::Path;

use anyhow::{Context, Result};

use depbuild_lib::invoke::SystemRunner;
use depbuild_lib::Integrator;

use super::load_config;

pub fn cmd_locate(config: Option<&Path>) -> Result<()> {
  let config = load_config(config)?;
  let (location, _) = Integrator::new(config, SystemRunner)
    .locate()
    .context("Failed to locate dependency")?;

  println!("{}", location.library_dir.display());
  Ok(())
}
