use std::collections::TryReserveError;
use std::io::Error as IOError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VtfError {
  /// The byte source or sink failed. Never retried.
  #[error("I/O error: {0}")]
  Io(#[from] IOError),
  /// Truncated or malformed file, or a texture that cannot be encoded.
  #[error("malformed texture: {0}")]
  Format(String),
  #[error("invalid argument: {0}")]
  Argument(String),
  /// Reported by an `ImageProcessor`.
  #[error("image processing failed: {0}")]
  Processing(String),
  #[error("failed to allocate output buffer: {0}")]
  Allocation(#[from] TryReserveError),
}

pub type VtfResult<T> = Result<T, VtfError>;

impl VtfError {
  pub(crate) fn format<S: Into<String>>(message: S) -> Self {
    VtfError::Format(message.into())
  }

  pub(crate) fn argument<S: Into<String>>(message: S) -> Self {
    VtfError::Argument(message.into())
  }
}
