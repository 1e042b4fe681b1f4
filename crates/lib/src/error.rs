//! The error type of a whole integration run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::inject::InjectError;
use crate::invoke::InvokeError;
use crate::locate::LocateError;
use crate::metadata::MetadataError;

/// Errors that abort an integration. None of them is retried.
#[derive(Debug, Error)]
pub enum IntegrateError {
  #[error("configuration error: {0}")]
  Config(#[from] ConfigError),

  #[error("locate error: {0}")]
  Locate(#[from] LocateError),

  /// Configure or build of the dependency failed.
  #[error("build error: {0}")]
  Invoke(#[from] InvokeError),

  #[error("metadata error: {0}")]
  Metadata(#[from] MetadataError),

  #[error("inject error: {0}")]
  Inject(#[from] InjectError),
}
