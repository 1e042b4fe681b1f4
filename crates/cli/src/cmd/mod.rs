mod defines;
mod integrate;
mod locate;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use depbuild_lib::config::Config;
use depbuild_lib::consts::CONFIG_FILENAME;

pub use defines::cmd_defines;
pub use integrate::cmd_integrate;
pub use locate::cmd_locate;

/// Load the explicit config file, or `./depbuild.toml`, or the environment alone.
fn load_config(path: Option<&Path>) -> Result<Config> {
  let default_path = Path::new(CONFIG_FILENAME);
  let path = match path {
    Some(path) => path,
    None if default_path.is_file() => default_path,
    None => {
      let cwd = std::env::current_dir().context("Failed to determine current directory")?;
      debug!(cwd = %cwd.display(), "no config file, using environment only");
      return Ok(Config::from_env(&cwd));
    }
  };

  let path = dunce::canonicalize(path).with_context(|| format!("Config file not found: {}", path.display()))?;
  debug!(path = %path.display(), "using config file");
  Config::load(&path).with_context(|| format!("Failed to load config: {}", path.display()))
}
