//! Cargo build-script output for a populated [`HostEnvironment`].
//!
//! Lets a `build.rs` drive the integrator and hand the result to Cargo:
//! library search paths and static libraries become `rustc-link-*`
//! directives, include directories and defines are exported as `links`
//! metadata (`DEP_<LINKS>_INCLUDE`, `DEP_<LINKS>_DEFINES`).

use std::io::{self, Write};

use super::HostEnvironment;

pub fn write_cargo_directives<W: Write>(env: &HostEnvironment, out: &mut W) -> io::Result<()> {
  for dir in &env.primary.lib_paths {
    writeln!(out, "cargo:rustc-link-search=native={}", dir.display())?;
  }
  for lib in &env.primary.libs {
    writeln!(out, "cargo:rustc-link-lib=static={}", lib)?;
  }

  if !env.primary.include_dirs.is_empty() {
    let joined = std::env::join_paths(&env.primary.include_dirs)
      .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    writeln!(out, "cargo:include={}", joined.to_string_lossy())?;
  }
  if !env.primary.defines.is_empty() {
    writeln!(out, "cargo:defines={}", env.primary.defines.join(" "))?;
  }

  Ok(())
}
