//! Error type for `fanalyzer-cache`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("redis error: {0}")]
  Redis(#[from] redis::RedisError),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for fanalyzer_core::Error {
  fn from(e: Error) -> Self { fanalyzer_core::Error::cache(e) }
}
