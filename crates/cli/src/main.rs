mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{cmd_defines, cmd_integrate, cmd_locate};
use crate::output::OutputFormat;

/// depbuild - Build a CMake dependency and wire it into the host build
#[derive(Parser)]
#[command(name = "depbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Locate, build and inject the dependency
  Integrate {
    /// Path to the config file (default: ./depbuild.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How to print the result
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Print the installed dependency directory
  Locate {
    /// Path to the config file (default: ./depbuild.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
  },

  /// Print the defines recorded in a CMake flags.make
  Defines {
    /// Path to the flags.make file
    file: PathBuf,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Integrate { config, format } => cmd_integrate(config.as_deref(), format),
    Commands::Locate { config } => cmd_locate(config.as_deref()),
    Commands::Defines { file } => cmd_defines(&file),
  }
}
