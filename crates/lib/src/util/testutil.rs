//! Test utilities for depbuild-lib.
//!
//! Cross-platform shell helpers, a recording [`CommandRunner`], and helpers for
//! laying out fake dependency trees.

use std::fs;
use std::path::{Path, PathBuf};

use crate::invoke::{CommandRunner, CommandSpec, InvokeError};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, content: &str) {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, content).unwrap();
}

/// A runner that records commands instead of spawning them.
///
/// It can simulate the external build by writing files when a command
/// containing a given argument runs, and fail at a chosen call.
#[derive(Debug, Default)]
pub struct RecordingRunner {
  pub commands: Vec<CommandSpec>,
  produces: Vec<(String, PathBuf, String)>,
  fail_at: Option<usize>,
}

impl RecordingRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create `path` whenever a command with `arg` among its args runs.
  pub fn produce_on(self, arg: &str, path: PathBuf) -> Self {
    self.produce_with(arg, path, "")
  }

  /// Like [`Self::produce_on`], writing `content` into the file.
  pub fn produce_with(mut self, arg: &str, path: PathBuf, content: &str) -> Self {
    self.produces.push((arg.to_string(), path, content.to_string()));
    self
  }

  /// Fail the call with the given zero-based index.
  pub fn fail_at(mut self, index: usize) -> Self {
    self.fail_at = Some(index);
    self
  }
}

impl CommandRunner for RecordingRunner {
  fn run(&mut self, cmd: &CommandSpec) -> Result<(), InvokeError> {
    let index = self.commands.len();
    self.commands.push(cmd.clone());

    if self.fail_at == Some(index) {
      return Err(InvokeError::BuildInvocationFailed {
        cmd: cmd.to_string(),
        code: Some(1),
      });
    }

    for (arg, path, content) in &self.produces {
      if cmd.args.iter().any(|a| a == arg) {
        write_file(path, content);
      }
    }

    Ok(())
  }
}
