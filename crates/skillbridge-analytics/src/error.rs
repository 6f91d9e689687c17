//! Error type for `skillbridge-analytics`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Caller contract violation: bad range, category or bin width.
  #[error(transparent)]
  Core(#[from] skillbridge_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
