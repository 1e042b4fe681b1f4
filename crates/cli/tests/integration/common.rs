//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const LIB_NAME: &str = "LibtropicArduino";
pub const PIO_ENV: &str = "esp32";

/// Isolated test project.
///
/// Each test gets its own temporary directory holding a libdeps tree with one
/// installed package, a host build directory, and a `depbuild.toml`.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  /// A project whose package has headers and a HAL port source, but no build yet.
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("depbuild.toml");
    let env = Self { temp, config_path };
    env.write_file("libdeps/esp32/LibtropicArduino/libtropic/include/libtropic.h", "");
    env.write_file("libdeps/esp32/LibtropicArduino/libtropic/src/lt_l2.c", "");
    env.write_file(
      "libdeps/esp32/LibtropicArduino/libtropic/hal/port/arduino/lt_port_arduino.cpp",
      "",
    );
    env.write_config("");
    env
  }

  /// Write `depbuild.toml` pointing at the test tree, followed by `extra`.
  pub fn write_config(&self, extra: &str) {
    let content = format!(
      "[dependency]\nlibdeps-dir = 'libdeps'\nenvironment = '{}'\n\n[host]\nbuild-dir = 'build'\n\n{}",
      PIO_ENV, extra
    );
    std::fs::write(&self.config_path, content).unwrap();
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// The installed package, canonicalized.
  pub fn library_dir(&self) -> PathBuf {
    let p = self.temp.path().join("libdeps").join(PIO_ENV).join(LIB_NAME);
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn build_dir(&self) -> PathBuf {
    self.library_dir().join("libtropic_build")
  }

  /// Lay down the outputs of a previous CMake run.
  pub fn prebuilt(&self, defines: &str) {
    let build = self.build_dir();
    write_abs(&build.join("libtropic.a"), "!<arch>\n");
    write_abs(
      &build.join("CMakeFiles").join("tropic.dir").join("flags.make"),
      &format!("C_DEFINES = {}\n", defines),
    );
  }

  /// Get a pre-configured Command for the depbuild binary.
  ///
  /// Runs inside the project directory with the host build variables that
  /// would override the config file removed.
  pub fn depbuild_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("depbuild");
    cmd.current_dir(self.temp.path());
    for key in [
      "PROJECT_LIBDEPS_DIR",
      "PIOENV",
      "BUILD_DIR",
      "CC",
      "CXX",
      "AR",
      "CFLAGS",
      "CCFLAGS",
      "CXXFLAGS",
      "DEPBUILD_BUILD_FLAGS",
    ] {
      cmd.env_remove(key);
    }
    cmd
  }
}

fn write_abs(path: &Path, content: &str) {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, content).unwrap();
}

/// Install an executable script standing in for `cmake`.
///
/// The script appends its arguments to `cmake.log` and, on `--build`, writes
/// the artifact and `flags.make` into the build directory it was given.
#[cfg(unix)]
pub fn install_fake_cmake(env: &TestEnv, exit_code: i32) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let log = env.temp.path().join("cmake.log");
  let script = format!(
    r#"#!/bin/sh
echo "$@" >> '{log}'
if [ "$1" = "--build" ]; then
  mkdir -p "$2/CMakeFiles/tropic.dir"
  printf 'C_DEFINES = -DLT_HELPERS -DLT_USE_TREZOR_CRYPTO\n' > "$2/CMakeFiles/tropic.dir/flags.make"
  printf '!<arch>\n' > "$2/libtropic.a"
fi
exit {exit_code}
"#,
    log = log.display(),
    exit_code = exit_code,
  );

  let path = env.temp.path().join("fake-cmake");
  std::fs::write(&path, script).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}
