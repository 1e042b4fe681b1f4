//! Running external processes.
//!
//! The invoker only describes commands as [`CommandSpec`] values; a
//! [`CommandRunner`] executes them. [`SystemRunner`] spawns real processes and
//! blocks until they exit.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::InvokeError;

/// A fully resolved external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  /// Variables set on top of the inherited environment.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub env: BTreeMap<String, String>,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      env: BTreeMap::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }
}

impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// Executes commands to completion.
pub trait CommandRunner {
  /// Run a command and fail unless it exits successfully.
  fn run(&mut self, cmd: &CommandSpec) -> Result<(), InvokeError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
  fn run(&mut self, cmd: &CommandSpec) -> Result<(), InvokeError> {
    (**self).run(cmd)
  }
}

/// Spawns real processes.
///
/// The child's stdout is sent to our stderr, keeping stdout free for
/// machine-readable output. There is no timeout: a hung process blocks the
/// caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&mut self, cmd: &CommandSpec) -> Result<(), InvokeError> {
    info!(cmd = %cmd, "executing command");

    let mut command = Command::new(&cmd.program);
    command.args(&cmd.args).envs(&cmd.env).stdout(Stdio::from(io::stderr()));

    debug!(program = %cmd.program, env = ?cmd.env, "spawning process");

    let status = command.status().map_err(|source| InvokeError::Spawn {
      cmd: cmd.to_string(),
      source,
    })?;

    if !status.success() {
      return Err(InvokeError::BuildInvocationFailed {
        cmd: cmd.to_string(),
        code: status.code(),
      });
    }

    Ok(())
  }
}
