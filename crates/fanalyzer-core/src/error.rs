//! Error types for `fanalyzer-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required input field was missing or malformed.
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  NotFound(String),

  /// An identifier is already taken by a different post kind.
  #[error("{0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("cache error: {0}")]
  Cache(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("completion service error: {0}")]
  Completion(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Box a backend error. Used as `.map_err(Error::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn cache<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Cache(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
