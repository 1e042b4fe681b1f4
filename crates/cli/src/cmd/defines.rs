use std::path::Path;

use anyhow::{Context, Result};

use depbuild_lib::metadata::read_defines;

pub fn cmd_defines(file: &Path) -> Result<()> {
  let defines = read_defines(file).with_context(|| format!("Failed to read defines from {}", file.display()))?;
  println!("{}", defines.joined());
  Ok(())
}
