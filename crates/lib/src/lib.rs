//! depbuild-lib: Integrating an out-of-band CMake dependency into a host build
//!
//! This crate provides the stages of an integration run:
//! - `locate`: find the installed package under the host's libdeps tree
//! - `invoke`: configure and build it with CMake, behind a cache guard
//! - `metadata`: recover defines and the source manifest the build emitted
//! - `inject`: apply the results to a `HostEnvironment`
//! - `pipeline`: run the stages in order

pub mod config;
pub mod consts;
pub mod error;
pub mod host;
pub mod inject;
pub mod invoke;
pub mod locate;
pub mod metadata;
pub mod options;
pub mod pipeline;
pub mod util;

pub use error::IntegrateError;
pub use pipeline::{IntegrationReport, Integrator};
